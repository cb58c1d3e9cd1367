//! # Diagram configurator
//!
//! Owns the [`AxisAssignment`] while a diagram is being set up. Every user
//! action is a named method; each one applies the transition-specific
//! changes and then runs the full repair pass of
//! [`consistency_validator`](super::consistency_validator), returning the
//! warnings produced along the way.
//!
//! Transitions between diagram types:
//! - leaving a predominance diagram, the Y component loses its axis and its
//!   varied spec becomes the nearest fixed one; fraction and relative-activity
//!   diagrams take the old main component as their Y species
//! - entering a predominance diagram from a fraction or relative-activity
//!   diagram, the old Y component becomes the main component
//! - calculated pH / pe (Eh) diagrams need H+ / e- in the system, otherwise a
//!   logarithmic diagram is set up instead; the calculated species leaves the
//!   X axis and is given as a total concentration
//! - the Y range survives a transition only between diagrams plotting the same quantity
use super::axis_assignment::{Axis, AxisAssignment, ConcentrationSpec};
use super::component_roles::{ChemSystem, Role};
use super::concentration_types::{
    ActivityScale, ConcType, DiagramType, activity_fixed_for, legal_types_for, role_equivalent,
};
use super::consistency_validator::{
    check_invariants, main_candidates, repair, retype_spec, x_candidates, y_candidates,
};
use super::range_converter::{activity_to_pe, eh_to_pe, pe_to_activity, pe_to_eh};
use super::setup_errors::{SetupError, SetupWarning};
use crate::defaults_manager::DiagramDefaults;
use log::{error, info, warn};

/// lowest and highest temperature (°C) the diagram programs accept
const MIN_TEMPERATURE: f64 = -50.0;
const MAX_TEMPERATURE: f64 = 400.0;

pub struct DiagramConfigurator {
    system: ChemSystem,
    assignment: AxisAssignment,
    /// assignment as loaded or last confirmed
    snapshot: AxisAssignment,
    defaults: DiagramDefaults,
}

fn parse_number(text: &str) -> Result<f64, SetupError> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SetupError::NumericParse {
            text: trimmed.to_string(),
        }),
    }
}

/// the diagram type actually set up: calculated pH / pe diagrams fall back to
/// a logarithmic diagram when the system lacks the species they calculate
fn fall_back_if_missing(
    a: &mut AxisAssignment,
    system: &ChemSystem,
    defaults: &DiagramDefaults,
) -> Option<SetupWarning> {
    let species = match a.diagram_type {
        DiagramType::CalculatedPh if !system.has_proton() => "H+",
        DiagramType::CalculatedPeOrEh if !system.has_electron() => "e-",
        _ => return None,
    };
    let requested = a.diagram_type;
    a.diagram_type = DiagramType::Logarithmic;
    a.y_range = Some(defaults.log_y_range);
    Some(SetupWarning::MissingSpecies {
        species: species.to_string(),
        requested,
        fallback: DiagramType::Logarithmic,
    })
}

impl DiagramConfigurator {
    /// Takes over a chemical system and the record persisted with it (or a
    /// fresh one), and repairs whatever the record gets wrong for this system.
    pub fn load(
        system: ChemSystem,
        seed: Option<AxisAssignment>,
        defaults: DiagramDefaults,
    ) -> (Self, Vec<SetupWarning>) {
        let mut assignment = seed.unwrap_or_else(|| AxisAssignment::seeded(&system, &defaults));
        let mut warnings = Vec::new();
        if let Some(w) = fall_back_if_missing(&mut assignment, &system, &defaults) {
            warn!("{}", w);
            warnings.push(w);
        }
        warnings.extend(repair(&mut assignment, &system, &defaults));
        info!(
            "diagram setup loaded: {} components, {} reaction products, \"{}\"",
            system.n_components(),
            system.n_products(),
            assignment.diagram_type.label(assignment.use_eh_for_electron)
        );
        let snapshot = assignment.clone();
        (
            Self {
                system,
                assignment,
                snapshot,
                defaults,
            },
            warnings,
        )
    }

    pub fn system(&self) -> &ChemSystem {
        &self.system
    }

    pub fn assignment(&self) -> &AxisAssignment {
        &self.assignment
    }

    pub fn defaults(&self) -> &DiagramDefaults {
        &self.defaults
    }

    pub fn x_candidates(&self) -> Vec<usize> {
        x_candidates(&self.system, self.assignment.diagram_type)
    }

    pub fn y_candidates(&self) -> Vec<usize> {
        y_candidates(&self.system, self.assignment.diagram_type, self.assignment.comp_x)
    }

    pub fn main_candidates(&self) -> Vec<usize> {
        if self.assignment.diagram_type.is_predominance() {
            main_candidates(&self.system)
        } else {
            Vec::new()
        }
    }

    /// representations the selector offers for a component right now
    pub fn legal_types(&self, index: usize) -> Result<Vec<ConcType>, SetupError> {
        let role = self
            .system
            .role(index)
            .ok_or(SetupError::UnknownComponent(index))?;
        Ok(legal_types_for(
            role,
            self.assignment.diagram_type,
            self.assignment.is_on_axis(index),
            self.assignment.use_eh_for_electron,
        ))
    }

    /// true when the assignment differs from the one loaded or last confirmed
    pub fn is_modified(&self) -> bool {
        self.assignment != self.snapshot
    }

    fn finish(&mut self, mut warnings: Vec<SetupWarning>) -> Vec<SetupWarning> {
        for w in &warnings {
            warn!("{}", w);
        }
        warnings.extend(repair(&mut self.assignment, &self.system, &self.defaults));
        warnings
    }

    /// spec of a component that leaves an axis
    fn revert_to_default(&mut self, index: usize) {
        let Some(role) = self.system.role(index) else {
            return;
        };
        let a = &mut self.assignment;
        let spec = self
            .defaults
            .role_default_fixed(role, a.use_eh_for_electron, a.temperature);
        info!(
            "{} leaves the axis: \"{}\"",
            self.system.name(index),
            spec.conc_type.label()
        );
        a.specs.insert(index, spec);
    }

    /// a component that left an axis keeps its spec while it is still on the
    /// other axis or, for predominance diagrams, is the main component
    fn still_required(&self, index: usize) -> bool {
        let a = &self.assignment;
        a.comp_x == Some(index)
            || (a.diagram_type.is_predominance()
                && (a.comp_y == Some(index) || a.comp_main == Some(index)))
    }

    fn release_axis(&mut self, old: Option<usize>) {
        if let Some(old) = old {
            if !self.still_required(old) {
                self.revert_to_default(old);
            }
        }
    }

    pub fn on_diagram_type_changed(&mut self, new: DiagramType) -> Vec<SetupWarning> {
        let old = self.assignment.diagram_type;
        if new == old {
            return self.finish(Vec::new());
        }
        info!(
            "diagram type \"{}\" -> \"{}\"",
            old.label(self.assignment.use_eh_for_electron),
            new.label(self.assignment.use_eh_for_electron)
        );
        let n = self.system.n_components();
        let a = &mut self.assignment;

        if old.is_predominance() {
            if let Some(y) = a.comp_y.filter(|y| Some(*y) != a.comp_x) {
                if let (Some(role), Some(spec)) = (self.system.role(y), a.specs.get(&y).copied()) {
                    let fixed = activity_fixed_for(role, a.use_eh_for_electron);
                    let new_spec = retype_spec(&spec, fixed, role, &self.defaults, a.temperature);
                    info!("{} leaves the Y axis: \"{}\"", self.system.name(y), fixed.label());
                    a.specs.insert(y, new_spec);
                }
            }
            a.comp_y = if new.uses_y_species() {
                a.comp_main.filter(|m| Some(*m) != a.comp_x)
            } else {
                None
            };
        } else if new.is_predominance() && old.uses_y_species() {
            if let Some(y) = a.comp_y.filter(|y| *y < n) {
                a.comp_main = Some(y);
            }
            a.comp_y = None;
        }

        let keep_y_range = a.y_range.is_some() && old.shares_y_scale(new);
        if !keep_y_range {
            a.y_range = self.defaults.y_range_for(new, a.use_eh_for_electron);
        }
        a.diagram_type = new;

        let mut warnings = Vec::new();
        match fall_back_if_missing(a, &self.system, &self.defaults) {
            Some(w) => warnings.push(w),
            None => self.prepare_calculated_species(),
        }
        self.finish(warnings)
    }

    /// the species a calculated pH / pe diagram solves for is taken off the
    /// X axis and given by its total concentration
    fn prepare_calculated_species(&mut self) {
        let calculated = match self.assignment.diagram_type {
            DiagramType::CalculatedPh => self.system.proton(),
            DiagramType::CalculatedPeOrEh => self.system.electron(),
            _ => None,
        };
        let Some(index) = calculated else {
            return;
        };
        let Some(role) = self.system.role(index) else {
            return;
        };
        let a = &mut self.assignment;
        if a.comp_x == Some(index) {
            a.comp_x = None;
        }
        if a.spec(index).is_some_and(|s| s.conc_type == ConcType::TotalFixed) {
            return;
        }
        let spec = self
            .defaults
            .fixed_spec(role, ConcType::TotalFixed, a.temperature);
        info!("{} is calculated: total concentration {}", self.system.name(index), spec.low);
        a.specs.insert(index, spec);
    }

    /// New component for the X axis, or for the Y selection (Y axis of a
    /// predominance diagram, Y species of fraction and relative-activity
    /// diagrams). Both axes follow the same rules; choosing for one axis the
    /// component of the other swaps them in a predominance diagram.
    pub fn on_axis_component_changed(
        &mut self,
        axis: Axis,
        index: usize,
    ) -> Result<Vec<SetupWarning>, SetupError> {
        if self.system.species(index).is_none() {
            return Err(SetupError::UnknownComponent(index));
        }
        let diagram = self.assignment.diagram_type;
        let label = diagram.label(self.assignment.use_eh_for_electron);
        let name = self.system.name(index).to_string();

        let allowed = match axis {
            Axis::X => x_candidates(&self.system, diagram),
            Axis::Y => y_candidates(&self.system, diagram, None),
        };
        if !allowed.contains(&index) {
            let w = SetupWarning::invalid(
                &name,
                format!("cannot be the {:?} component of a \"{}\" diagram; not changed", axis, label),
            );
            return Ok(self.finish(vec![w]));
        }
        if self.assignment.axis_component(axis) == Some(index) {
            return Ok(self.finish(Vec::new()));
        }

        let predominance = diagram.is_predominance();
        let a = &mut self.assignment;
        let (old_x, old_y) = (a.comp_x, a.comp_y);
        let mut released = None;
        match axis {
            Axis::X if old_y == Some(index) => {
                a.comp_x = Some(index);
                if predominance {
                    a.comp_y = old_x;
                } else {
                    // the Y species is chosen again for the new X
                    a.comp_y = None;
                    released = old_x;
                }
            }
            Axis::X => {
                a.comp_x = Some(index);
                released = old_x;
            }
            Axis::Y if old_x == Some(index) => {
                if !predominance {
                    let w = SetupWarning::invalid(
                        &name,
                        format!("is on the X-axis and cannot also be the Y species of a \"{}\" diagram", label),
                    );
                    return Ok(self.finish(vec![w]));
                }
                a.comp_y = Some(index);
                a.comp_x = old_y;
            }
            Axis::Y => {
                a.comp_y = Some(index);
                if predominance {
                    released = old_y;
                }
            }
        }
        info!("{:?} component set to {}", axis, name);
        self.release_axis(released);
        Ok(self.finish(Vec::new()))
    }

    /// Main component of a predominance diagram. Fraction and relative-activity
    /// diagrams have no separate main component: the choice selects the Y species.
    pub fn on_main_component_changed(&mut self, index: usize) -> Result<Vec<SetupWarning>, SetupError> {
        if self.system.species(index).is_none() {
            return Err(SetupError::UnknownComponent(index));
        }
        let diagram = self.assignment.diagram_type;
        if diagram.uses_y_species() {
            return self.on_axis_component_changed(Axis::Y, index);
        }
        if !diagram.is_predominance() || !main_candidates(&self.system).contains(&index) {
            let w = SetupWarning::invalid(
                self.system.name(index),
                format!(
                    "cannot be the main component of a \"{}\" diagram; not changed",
                    diagram.label(self.assignment.use_eh_for_electron)
                ),
            );
            return Ok(self.finish(vec![w]));
        }
        self.assignment.comp_main = Some(index);
        info!("main component set to {}", self.system.name(index));
        Ok(self.finish(Vec::new()))
    }

    /// Switches e- between pe and Eh. Stored values are converted with the
    /// Nernst factor so the potential they describe stays the same.
    pub fn on_use_eh_toggled(&mut self, use_eh: bool) -> Vec<SetupWarning> {
        let a = &mut self.assignment;
        if a.use_eh_for_electron == use_eh {
            return self.finish(Vec::new());
        }
        a.use_eh_for_electron = use_eh;
        let t = a.temperature;
        if let Some(e) = self.system.electron() {
            if let Some(spec) = a.specs.get(&e).copied() {
                let target = role_equivalent(spec.conc_type, Role::Electron, use_eh);
                let new_spec = retype_spec(&spec, target, Role::Electron, &self.defaults, t);
                info!(
                    "{}: \"{}\" -> \"{}\"",
                    self.system.name(e),
                    spec.conc_type.label(),
                    target.label()
                );
                a.specs.insert(e, new_spec);
            }
        }
        if a.diagram_type == DiagramType::CalculatedPeOrEh {
            if let Some((low, high)) = a.y_range {
                let convert = |shown: f64| {
                    if use_eh {
                        pe_to_eh(pe_to_activity(shown), t)
                    } else {
                        activity_to_pe(eh_to_pe(shown, t))
                    }
                };
                a.y_range = Some((convert(low), convert(high)));
            }
        }
        self.finish(Vec::new())
    }

    /// Representation and stored values chosen for one component. A
    /// representation not offered for the component in its current place is
    /// replaced by the nearest one that is.
    pub fn on_concentration_changed(
        &mut self,
        index: usize,
        spec: ConcentrationSpec,
    ) -> Result<Vec<SetupWarning>, SetupError> {
        let role = self
            .system
            .role(index)
            .ok_or(SetupError::UnknownComponent(index))?;
        let a = &self.assignment;
        let diagram = a.diagram_type;
        let on_axis = a.is_on_axis(index);
        let legal = legal_types_for(role, diagram, on_axis, a.use_eh_for_electron);
        let t = spec.conc_type;
        // linear axes of predominance diagrams are upgraded by the repair pass
        let upgraded_later = diagram.is_predominance() && on_axis && t == ConcType::TotalVaried;

        let mut warnings = Vec::new();
        let spec = if role == Role::Water || legal.contains(&t) || upgraded_later {
            spec
        } else {
            let nearest = if on_axis {
                t.varied_counterpart()
            } else {
                t.fixed_counterpart()
            };
            let nearest = role_equivalent(nearest, role, a.use_eh_for_electron);
            let target = if legal.contains(&nearest) {
                nearest
            } else if nearest == ConcType::TotalVaried && legal.contains(&ConcType::LogTotalVaried) {
                ConcType::LogTotalVaried
            } else {
                // only water has no legal type, and its spec is taken as given above
                match legal.first() {
                    Some(first) => *first,
                    None => {
                        return Err(SetupError::InvariantViolation(format!(
                            "{} has no legal concentration type",
                            self.system.name(index)
                        )));
                    }
                }
            };
            warnings.push(SetupWarning::invalid(
                self.system.name(index),
                format!("\"{}\" is not available here, changed to \"{}\"", t.label(), target.label()),
            ));
            retype_spec(&spec, target, role, &self.defaults, a.temperature)
        };
        self.assignment.specs.insert(index, spec);
        Ok(self.finish(warnings))
    }

    /// Value(s) typed for a component, in the units shown to the user (pH,
    /// pe, V, mol/L, log units). `high_text` is read for varied types only.
    /// Malformed text leaves the assignment untouched.
    pub fn on_range_text_entered(
        &mut self,
        index: usize,
        low_text: &str,
        high_text: &str,
    ) -> Result<Vec<SetupWarning>, SetupError> {
        let current = *self
            .assignment
            .spec(index)
            .ok_or(SetupError::UnknownComponent(index))?;
        let scale = current.conc_type.scale();
        let low = scale.from_display(parse_number(low_text)?);
        let spec = if current.is_varied() {
            let high = scale.from_display(parse_number(high_text)?);
            ConcentrationSpec::varied(current.conc_type, low, high)
        } else {
            ConcentrationSpec::fixed(current.conc_type, low)
        };
        self.on_concentration_changed(index, spec)
    }

    /// Y range of the plotted quantity, as shown to the user
    pub fn set_y_range(&mut self, low: f64, high: f64) -> Result<Vec<SetupWarning>, SetupError> {
        if !self.assignment.diagram_type.uses_y_range() {
            let w = SetupWarning::invalid(
                "Y-axis",
                format!(
                    "\"{}\" has no Y range; not changed",
                    self.assignment.diagram_type.label(self.assignment.use_eh_for_electron)
                ),
            );
            return Ok(self.finish(vec![w]));
        }
        for value in [low, high] {
            if !value.is_finite() {
                return Err(SetupError::OutOfRange {
                    what: "Y range".to_string(),
                    value,
                });
            }
        }
        self.assignment.y_range = Some((low, high));
        Ok(self.finish(Vec::new()))
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<Vec<SetupWarning>, SetupError> {
        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(SetupError::OutOfRange {
                what: "temperature (°C)".to_string(),
                value: temperature,
            });
        }
        self.assignment.temperature = temperature;
        Ok(self.finish(Vec::new()))
    }

    pub fn set_ionic_strength(&mut self, ionic_strength: f64) -> Result<Vec<SetupWarning>, SetupError> {
        if !ionic_strength.is_finite() {
            return Err(SetupError::OutOfRange {
                what: "ionic strength".to_string(),
                value: ionic_strength,
            });
        }
        self.assignment.ionic_strength = ionic_strength;
        Ok(self.finish(Vec::new()))
    }

    pub fn set_allow_reversed_ranges(&mut self, allow: bool) -> Vec<SetupWarning> {
        self.assignment.allow_reversed_ranges = allow;
        self.finish(Vec::new())
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.assignment.title = title.filter(|t| !t.trim().is_empty());
    }

    /// Hands the assignment over. Refused while an invariant is broken; the
    /// configurator stays usable either way.
    pub fn confirm(&mut self) -> Result<AxisAssignment, SetupError> {
        if let Err(e) = check_invariants(&self.assignment, &self.system) {
            error!("diagram setup not confirmed: {}", e);
            return Err(e);
        }
        self.snapshot = self.assignment.clone();
        Ok(self.assignment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configurator(components: &[&str], products: &[&str]) -> DiagramConfigurator {
        let system = ChemSystem::from_identifiers(components, products);
        DiagramConfigurator::load(system, None, DiagramDefaults::default()).0
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 7.5 ").unwrap(), 7.5);
        assert!(matches!(
            parse_number("7,5"),
            Err(SetupError::NumericParse { .. })
        ));
        assert!(parse_number("NaN").is_err());
    }

    #[test]
    fn test_fresh_load_is_unmodified() {
        let c = configurator(&["H+", "Fe+3", "H2O"], &["OH-"]);
        assert!(!c.is_modified());
        assert_eq!(c.assignment().comp_x, Some(0));
        assert_eq!(c.assignment().comp_y, Some(1));
    }

    #[test]
    fn test_bad_text_keeps_value() {
        let mut c = configurator(&["H+", "e-", "Fe+3"], &[]);
        let before = c.assignment().clone();
        assert!(c.on_range_text_entered(0, "abc", "12").is_err());
        assert_eq!(c.assignment(), &before);
        assert!(!c.is_modified());
    }

    #[test]
    fn test_range_text_in_display_units() {
        let mut c = configurator(&["H+", "e-", "Fe+3"], &[]);
        let warnings = c.on_range_text_entered(0, "2", "10").unwrap();
        assert!(warnings.is_empty());
        let spec = c.assignment().spec(0).unwrap();
        assert_eq!(spec.conc_type, ConcType::PhVaried);
        assert_eq!((spec.low, spec.high), (-10.0, -2.0));
        assert!(c.is_modified());
    }

    #[test]
    fn test_unknown_index() {
        let mut c = configurator(&["H+", "Fe+3"], &[]);
        assert!(matches!(
            c.on_axis_component_changed(Axis::X, 9),
            Err(SetupError::UnknownComponent(9))
        ));
        assert!(c.on_concentration_changed(9, ConcentrationSpec::fixed(ConcType::TotalFixed, 1.0)).is_err());
    }

    #[test]
    fn test_temperature_limits() {
        let mut c = configurator(&["H+", "Fe+3"], &[]);
        assert!(c.set_temperature(401.0).is_err());
        assert!(c.set_temperature(60.0).is_ok());
        assert_eq!(c.assignment().temperature, 60.0);
    }

    #[test]
    fn test_confirm_resets_modified() {
        let mut c = configurator(&["H+", "e-", "Fe+3"], &[]);
        c.set_ionic_strength(0.1).unwrap();
        assert!(c.is_modified());
        let confirmed = c.confirm().unwrap();
        assert_eq!(confirmed.ionic_strength, 0.1);
        assert!(!c.is_modified());
    }

    #[test]
    fn test_title() {
        let mut c = configurator(&["H+", "e-", "Fe+3"], &[]);
        c.set_title(Some("Fe-H2O at 25 °C".to_string()));
        assert_eq!(c.assignment().title.as_deref(), Some("Fe-H2O at 25 °C"));
        assert!(c.is_modified());
        c.set_title(Some("   ".to_string()));
        assert_eq!(c.assignment().title, None);
    }
}
