//! The closed set of concentration representations, the diagram types, and
//! the table of which representations a component may use.
use super::component_roles::Role;
use super::range_converter::{activity_to_pe, activity_to_ph, pe_to_activity, ph_to_activity};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// kind of number stored in a ConcentrationSpec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
    /// total concentration, mol/L
    LinearTotal,
    /// log10 of the total concentration
    LogTotal,
    /// log10 activity (also pH, pe and log P, which are stored as log activity)
    LogActivity,
    /// electrode potential, V
    Eh,
}

/// concentration representation of one component.
/// Persisted as its numeric code 1..13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ConcType {
    TotalFixed,
    TotalVaried,
    LogTotalVaried,
    ActivityFixed,
    ActivityVaried,
    PhFixed,
    PhVaried,
    PeFixed,
    PeVaried,
    EhFixed,
    EhVaried,
    LogPFixed,
    LogPVaried,
}

impl ConcType {
    pub const ALL: [ConcType; 13] = [
        ConcType::TotalFixed,
        ConcType::TotalVaried,
        ConcType::LogTotalVaried,
        ConcType::ActivityFixed,
        ConcType::ActivityVaried,
        ConcType::PhFixed,
        ConcType::PhVaried,
        ConcType::PeFixed,
        ConcType::PeVaried,
        ConcType::EhFixed,
        ConcType::EhVaried,
        ConcType::LogPFixed,
        ConcType::LogPVaried,
    ];

    pub fn code(self) -> u8 {
        ConcType::ALL
            .iter()
            .position(|t| *t == self)
            .map_or(0, |i| i as u8 + 1)
    }

    pub fn from_code(code: u8) -> Option<ConcType> {
        if code == 0 {
            return None;
        }
        ConcType::ALL.get(code as usize - 1).copied()
    }

    pub fn is_varied(self) -> bool {
        matches!(
            self,
            ConcType::TotalVaried
                | ConcType::LogTotalVaried
                | ConcType::ActivityVaried
                | ConcType::PhVaried
                | ConcType::PeVaried
                | ConcType::EhVaried
                | ConcType::LogPVaried
        )
    }

    pub fn family(self) -> ValueFamily {
        match self {
            ConcType::TotalFixed | ConcType::TotalVaried => ValueFamily::LinearTotal,
            ConcType::LogTotalVaried => ValueFamily::LogTotal,
            ConcType::EhFixed | ConcType::EhVaried => ValueFamily::Eh,
            _ => ValueFamily::LogActivity,
        }
    }

    /// true for the activity slot: log activity, pH, pe, Eh, log P
    pub fn is_activity_kind(self) -> bool {
        !matches!(
            self,
            ConcType::TotalFixed | ConcType::TotalVaried | ConcType::LogTotalVaried
        )
    }

    /// nearest non-varied representation
    pub fn fixed_counterpart(self) -> ConcType {
        match self {
            ConcType::TotalVaried | ConcType::LogTotalVaried => ConcType::TotalFixed,
            ConcType::ActivityVaried => ConcType::ActivityFixed,
            ConcType::PhVaried => ConcType::PhFixed,
            ConcType::PeVaried => ConcType::PeFixed,
            ConcType::EhVaried => ConcType::EhFixed,
            ConcType::LogPVaried => ConcType::LogPFixed,
            fixed => fixed,
        }
    }

    /// nearest varied representation
    pub fn varied_counterpart(self) -> ConcType {
        match self {
            ConcType::TotalFixed => ConcType::TotalVaried,
            ConcType::ActivityFixed => ConcType::ActivityVaried,
            ConcType::PhFixed => ConcType::PhVaried,
            ConcType::PeFixed => ConcType::PeVaried,
            ConcType::EhFixed => ConcType::EhVaried,
            ConcType::LogPFixed => ConcType::LogPVaried,
            varied => varied,
        }
    }

    /// label shown in the concentration-type selector
    pub fn label(self) -> &'static str {
        match self {
            ConcType::TotalFixed => "Total conc.",
            ConcType::TotalVaried => "Total conc. varied",
            ConcType::LogTotalVaried => "log (Total conc.) varied",
            ConcType::ActivityFixed => "log (activity)",
            ConcType::ActivityVaried => "log (activity) varied",
            ConcType::PhFixed => "pH",
            ConcType::PhVaried => "pH varied",
            ConcType::PeFixed => "pe",
            ConcType::PeVaried => "pe varied",
            ConcType::EhFixed => "Eh",
            ConcType::EhVaried => "Eh varied",
            ConcType::LogPFixed => "log P",
            ConcType::LogPVaried => "log P varied",
        }
    }

    /// lookup by selector label, the reverse of `label`
    pub fn from_label(label: &str) -> Option<ConcType> {
        ConcType::ALL.iter().copied().find(|t| t.label() == label.trim())
    }

    /// how the stored number is shown to the user
    pub fn scale(self) -> ScaleKind {
        match self {
            ConcType::PhFixed | ConcType::PhVaried => PhScale.into(),
            ConcType::PeFixed | ConcType::PeVaried => PeScale.into(),
            ConcType::EhFixed | ConcType::EhVaried => EhScale.into(),
            _ => PlainScale.into(),
        }
    }
}

impl From<ConcType> for u8 {
    fn from(t: ConcType) -> u8 {
        t.code()
    }
}

impl TryFrom<u8> for ConcType {
    type Error = String;
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        ConcType::from_code(code).ok_or_else(|| format!("unknown concentration type code {}", code))
    }
}

/// conversion between the stored number and the number the user reads and types
#[enum_dispatch]
pub trait ActivityScale {
    fn to_display(&self, stored: f64) -> f64;
    fn from_display(&self, shown: f64) -> f64;
    /// true when the displayed value runs opposite to the stored one
    fn is_inverted(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlainScale;
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhScale;
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeScale;
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EhScale;

impl ActivityScale for PlainScale {
    fn to_display(&self, stored: f64) -> f64 {
        stored
    }
    fn from_display(&self, shown: f64) -> f64 {
        shown
    }
}

impl ActivityScale for PhScale {
    fn to_display(&self, stored: f64) -> f64 {
        activity_to_ph(stored)
    }
    fn from_display(&self, shown: f64) -> f64 {
        ph_to_activity(shown)
    }
    fn is_inverted(&self) -> bool {
        true
    }
}

impl ActivityScale for PeScale {
    fn to_display(&self, stored: f64) -> f64 {
        activity_to_pe(stored)
    }
    fn from_display(&self, shown: f64) -> f64 {
        pe_to_activity(shown)
    }
    fn is_inverted(&self) -> bool {
        true
    }
}

// Eh is stored in volts already
impl ActivityScale for EhScale {
    fn to_display(&self, stored: f64) -> f64 {
        stored
    }
    fn from_display(&self, shown: f64) -> f64 {
        shown
    }
}

/// display scale of a concentration type: none, pH, pe or Eh
#[enum_dispatch(ActivityScale)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleKind {
    Plain(PlainScale),
    Ph(PhScale),
    Pe(PeScale),
    Eh(EhScale),
}

/// the nine diagram types of the setup dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramType {
    PredominanceArea,
    Fraction,
    LogSolubilities,
    Logarithmic,
    RelativeActivities,
    CalculatedPeOrEh,
    CalculatedPh,
    LogActivities,
    HAffinitySpectrum,
}

impl DiagramType {
    pub const ALL: [DiagramType; 9] = [
        DiagramType::PredominanceArea,
        DiagramType::Fraction,
        DiagramType::LogSolubilities,
        DiagramType::Logarithmic,
        DiagramType::RelativeActivities,
        DiagramType::CalculatedPeOrEh,
        DiagramType::CalculatedPh,
        DiagramType::LogActivities,
        DiagramType::HAffinitySpectrum,
    ];

    pub fn label(self, use_eh: bool) -> &'static str {
        match self {
            DiagramType::PredominanceArea => "Predominance Area",
            DiagramType::Fraction => "Fraction",
            DiagramType::LogSolubilities => "log Solubilities",
            DiagramType::Logarithmic => "Logarithmic",
            DiagramType::RelativeActivities => "Relative activities",
            DiagramType::CalculatedPeOrEh if use_eh => "Calculated Eh",
            DiagramType::CalculatedPeOrEh => "Calculated pe",
            DiagramType::CalculatedPh => "Calculated pH",
            DiagramType::LogActivities => "log Activities",
            DiagramType::HAffinitySpectrum => "H+ affinity spectrum",
        }
    }

    pub fn from_label(label: &str) -> Option<DiagramType> {
        let label = label.trim();
        DiagramType::ALL
            .iter()
            .copied()
            .find(|d| d.label(false) == label || d.label(true) == label)
    }

    pub fn is_predominance(self) -> bool {
        self == DiagramType::PredominanceArea
    }

    /// diagrams computed by the SED program
    pub fn is_sed(self) -> bool {
        !self.is_predominance()
    }

    /// a Y component (or species) and a main component are part of the setup
    pub fn needs_y_and_main(self) -> bool {
        matches!(
            self,
            DiagramType::PredominanceArea | DiagramType::Fraction | DiagramType::RelativeActivities
        )
    }

    /// the Y selection is a species whose concentration is not varied
    pub fn uses_y_species(self) -> bool {
        matches!(self, DiagramType::Fraction | DiagramType::RelativeActivities)
    }

    /// the plotted Y quantity has user-editable min/max
    pub fn uses_y_range(self) -> bool {
        matches!(
            self,
            DiagramType::LogSolubilities
                | DiagramType::Logarithmic
                | DiagramType::RelativeActivities
                | DiagramType::CalculatedPeOrEh
                | DiagramType::CalculatedPh
                | DiagramType::LogActivities
        )
    }

    /// the Y ranges of both diagrams are in the same quantity
    pub fn shares_y_scale(self, other: DiagramType) -> bool {
        let log_scale = |d: DiagramType| {
            matches!(
                d,
                DiagramType::LogSolubilities | DiagramType::Logarithmic | DiagramType::LogActivities
            )
        };
        self == other || (log_scale(self) && log_scale(other))
    }
}

/// representation of the activity slot for a role
pub fn activity_varied_for(role: Role, use_eh: bool) -> ConcType {
    match role {
        Role::Proton => ConcType::PhVaried,
        Role::Electron if use_eh => ConcType::EhVaried,
        Role::Electron => ConcType::PeVaried,
        Role::Gas => ConcType::LogPVaried,
        _ => ConcType::ActivityVaried,
    }
}

pub fn activity_fixed_for(role: Role, use_eh: bool) -> ConcType {
    activity_varied_for(role, use_eh).fixed_counterpart()
}

/// whether a representation makes sense for a component of this role at all
pub fn fits_role(t: ConcType, role: Role, use_eh: bool) -> bool {
    if role == Role::Water {
        return t == ConcType::ActivityFixed;
    }
    if !t.is_activity_kind() {
        return true;
    }
    activity_varied_for(role, use_eh) == t.varied_counterpart()
}

/// same representation moved into the activity slot of `role`
pub fn role_equivalent(t: ConcType, role: Role, use_eh: bool) -> ConcType {
    if role == Role::Water {
        return ConcType::ActivityFixed;
    }
    if !t.is_activity_kind() {
        return t;
    }
    if t.is_varied() {
        activity_varied_for(role, use_eh)
    } else {
        activity_fixed_for(role, use_eh)
    }
}

/// legal representations, in selector order; the first entry is the default.
/// Axis components get varied types, all others fixed ones.
pub fn legal_types_for(
    role: Role,
    diagram: DiagramType,
    is_axis_component: bool,
    use_eh: bool,
) -> Vec<ConcType> {
    if role == Role::Water {
        return if is_axis_component {
            Vec::new()
        } else {
            vec![ConcType::ActivityFixed]
        };
    }
    if is_axis_component {
        let mut legal = vec![activity_varied_for(role, use_eh), ConcType::LogTotalVaried];
        if diagram.is_sed() {
            legal.push(ConcType::TotalVaried);
        }
        legal
    } else {
        vec![activity_fixed_for(role, use_eh), ConcType::TotalFixed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ConcType::TotalFixed.code(), 1);
        assert_eq!(ConcType::LogPVaried.code(), 13);
        for t in ConcType::ALL {
            assert_eq!(ConcType::from_code(t.code()), Some(t));
            assert_eq!(ConcType::from_label(t.label()), Some(t));
        }
        assert_eq!(ConcType::from_code(0), None);
        assert_eq!(ConcType::from_code(14), None);
        assert!(ConcType::try_from(20u8).is_err());
    }

    #[test]
    fn test_counterparts() {
        for t in ConcType::ALL {
            assert!(!t.fixed_counterpart().is_varied());
            assert!(t.varied_counterpart().is_varied());
        }
        assert_eq!(ConcType::LogTotalVaried.fixed_counterpart(), ConcType::TotalFixed);
        assert_eq!(ConcType::PhFixed.varied_counterpart(), ConcType::PhVaried);
    }

    #[test]
    fn test_predominance_offers_two_axis_choices() {
        let legal = legal_types_for(Role::Proton, DiagramType::PredominanceArea, true, false);
        assert_eq!(legal, vec![ConcType::PhVaried, ConcType::LogTotalVaried]);
        let legal = legal_types_for(Role::Electron, DiagramType::PredominanceArea, true, true);
        assert_eq!(legal, vec![ConcType::EhVaried, ConcType::LogTotalVaried]);
    }

    #[test]
    fn test_sed_offers_three_axis_choices() {
        let legal = legal_types_for(Role::Cation, DiagramType::Fraction, true, false);
        assert_eq!(
            legal,
            vec![
                ConcType::ActivityVaried,
                ConcType::LogTotalVaried,
                ConcType::TotalVaried
            ]
        );
        let legal = legal_types_for(Role::Gas, DiagramType::Logarithmic, true, false);
        assert_eq!(legal[0], ConcType::LogPVaried);
        assert!(legal_types_for(Role::Water, DiagramType::Logarithmic, true, false).is_empty());
    }

    #[test]
    fn test_role_fit() {
        assert!(fits_role(ConcType::PhFixed, Role::Proton, false));
        assert!(!fits_role(ConcType::PhFixed, Role::Cation, false));
        assert!(!fits_role(ConcType::PeVaried, Role::Electron, true));
        assert!(fits_role(ConcType::EhVaried, Role::Electron, true));
        assert!(fits_role(ConcType::TotalFixed, Role::Gas, false));
        assert!(!fits_role(ConcType::TotalFixed, Role::Water, false));
        assert_eq!(
            role_equivalent(ConcType::ActivityVaried, Role::Proton, false),
            ConcType::PhVaried
        );
        assert_eq!(
            role_equivalent(ConcType::PeFixed, Role::Electron, true),
            ConcType::EhFixed
        );
    }

    #[test]
    fn test_scales() {
        assert_eq!(ConcType::PhVaried.scale().to_display(-7.0), 7.0);
        assert_eq!(ConcType::PeFixed.scale().from_display(4.0), -4.0);
        assert!(ConcType::PeFixed.scale().is_inverted());
        assert_eq!(ConcType::EhVaried.scale().to_display(0.3), 0.3);
        assert_eq!(ConcType::TotalFixed.scale(), ScaleKind::Plain(PlainScale));
    }

    #[test]
    fn test_diagram_labels() {
        assert_eq!(DiagramType::CalculatedPeOrEh.label(false), "Calculated pe");
        assert_eq!(DiagramType::CalculatedPeOrEh.label(true), "Calculated Eh");
        assert_eq!(
            DiagramType::from_label("Calculated Eh"),
            Some(DiagramType::CalculatedPeOrEh)
        );
        assert!(DiagramType::Logarithmic.shares_y_scale(DiagramType::LogActivities));
        assert!(!DiagramType::Logarithmic.shares_y_scale(DiagramType::CalculatedPh));
    }
}
