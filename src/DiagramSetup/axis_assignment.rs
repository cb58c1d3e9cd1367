//! The configuration record the setup dialog edits: diagram type, axis
//! components and one concentration spec per component.
use super::component_roles::ChemSystem;
use super::concentration_types::{ConcType, DiagramType};
use crate::defaults_manager::DiagramDefaults;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `NaN` ("not applicable") bounds are written as JSON `null`
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// concentration of one component: representation plus stored bounds.
/// For fixed types only `low` matters and `high` is usually `NaN`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConcentrationSpec {
    pub conc_type: ConcType,
    #[serde(with = "nan_as_null")]
    pub low: f64,
    #[serde(with = "nan_as_null")]
    pub high: f64,
}

impl ConcentrationSpec {
    pub fn fixed(conc_type: ConcType, value: f64) -> Self {
        Self {
            conc_type,
            low: value,
            high: f64::NAN,
        }
    }

    pub fn varied(conc_type: ConcType, low: f64, high: f64) -> Self {
        Self {
            conc_type,
            low,
            high,
        }
    }

    pub fn is_varied(&self) -> bool {
        self.conc_type.is_varied()
    }
}

// NaN == NaN here, so that "has it changed" is a plain structural comparison
impl PartialEq for ConcentrationSpec {
    fn eq(&self, other: &Self) -> bool {
        self.conc_type == other.conc_type
            && same_value(self.low, other.low)
            && same_value(self.high, other.high)
    }
}

/// which axis a component selection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// The setup record. `comp_x` and `comp_main` are component indices;
/// `comp_y` is a component index for predominance diagrams and a species
/// index (components first, then reaction products) for fraction and
/// relative-activity diagrams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisAssignment {
    pub diagram_type: DiagramType,
    pub comp_x: Option<usize>,
    pub comp_y: Option<usize>,
    pub comp_main: Option<usize>,
    /// min/max of the plotted Y quantity for SED diagrams that have one
    pub y_range: Option<(f64, f64)>,
    pub ionic_strength: f64,
    /// °C
    pub temperature: f64,
    pub use_eh_for_electron: bool,
    pub allow_reversed_ranges: bool,
    #[serde(default)]
    pub title: Option<String>,
    pub specs: BTreeMap<usize, ConcentrationSpec>,
}

impl AxisAssignment {
    /// fresh record for a newly loaded system: no axes chosen yet, every
    /// component at its role default
    pub fn seeded(system: &ChemSystem, defaults: &DiagramDefaults) -> Self {
        let use_eh = defaults.use_eh_for_electron;
        let specs = system
            .components
            .iter()
            .map(|c| {
                (
                    c.index,
                    defaults.role_default_fixed(c.role, use_eh, defaults.temperature),
                )
            })
            .collect();
        Self {
            diagram_type: DiagramType::PredominanceArea,
            comp_x: None,
            comp_y: None,
            comp_main: None,
            y_range: None,
            ionic_strength: defaults.ionic_strength,
            temperature: defaults.temperature,
            use_eh_for_electron: use_eh,
            allow_reversed_ranges: defaults.allow_reversed_ranges,
            title: None,
            specs,
        }
    }

    pub fn spec(&self, index: usize) -> Option<&ConcentrationSpec> {
        self.specs.get(&index)
    }

    pub fn axis_component(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::X => self.comp_x,
            Axis::Y => self.comp_y,
        }
    }

    /// component whose concentration is varied along an axis
    pub fn is_on_axis(&self, index: usize) -> bool {
        self.comp_x == Some(index)
            || (self.diagram_type.is_predominance() && self.comp_y == Some(index))
    }

    /// components with a varied concentration, in index order
    pub fn varied_components(&self) -> Vec<usize> {
        self.specs
            .iter()
            .filter(|(_, spec)| spec.is_varied())
            .map(|(i, _)| *i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_equality_treats_nan_as_equal() {
        let a = ConcentrationSpec::fixed(ConcType::TotalFixed, 1e-3);
        let b = ConcentrationSpec::fixed(ConcType::TotalFixed, 1e-3);
        assert_eq!(a, b);
        assert_ne!(a, ConcentrationSpec::fixed(ConcType::TotalFixed, 2e-3));
        assert_ne!(a, ConcentrationSpec::varied(ConcType::TotalVaried, 1e-3, 1e-2));
    }

    #[test]
    fn test_json_keeps_nan_bounds_and_codes() {
        let system = ChemSystem::from_identifiers(&["H+", "Fe+3", "H2O"], &[]);
        let mut assignment = AxisAssignment::seeded(&system, &DiagramDefaults::default());
        assignment.comp_x = Some(0);
        assignment
            .specs
            .insert(0, ConcentrationSpec::varied(ConcType::PhVaried, -12.0, -1.0));

        let json = serde_json::to_string(&assignment).unwrap();
        assert!(json.contains("null"));
        assert!(json.contains("\"conc_type\":7"));
        let back: AxisAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assignment);
        assert!(back.spec(1).unwrap().high.is_nan());
    }

    #[test]
    fn test_seeded_record() {
        let system = ChemSystem::from_identifiers(&["H+", "e-", "Cl-", "Fe+3", "H2O"], &[]);
        let assignment = AxisAssignment::seeded(&system, &DiagramDefaults::default());
        assert_eq!(assignment.specs.len(), 5);
        assert_eq!(assignment.spec(0).unwrap().conc_type, ConcType::PhFixed);
        assert_eq!(assignment.spec(1).unwrap().conc_type, ConcType::PeFixed);
        assert_eq!(assignment.spec(3).unwrap().conc_type, ConcType::TotalFixed);
        assert_eq!(assignment.spec(4).unwrap().conc_type, ConcType::ActivityFixed);
        assert!(assignment.varied_components().is_empty());
        assert_eq!(assignment.comp_x, None);
    }
}
