//! Human-readable summary of an assignment: one line per component, axis
//! labels and a table for the terminal. Everything here is a pure function
//! of the assignment.
use super::axis_assignment::{AxisAssignment, ConcentrationSpec};
use super::component_roles::ChemSystem;
use super::concentration_types::{ActivityScale, ConcType, DiagramType};
use prettytable::{Table, row};

/// quantity shown for a spec, e.g. "pH", "log activity (Cl-)", "Total conc. (Fe+3)"
pub fn quantity_name(conc_type: ConcType, identifier: &str) -> String {
    match conc_type {
        ConcType::PhFixed | ConcType::PhVaried => "pH".to_string(),
        ConcType::PeFixed | ConcType::PeVaried => "pe".to_string(),
        ConcType::EhFixed | ConcType::EhVaried => "Eh".to_string(),
        ConcType::ActivityFixed | ConcType::ActivityVaried => {
            format!("log activity ({})", identifier)
        }
        ConcType::LogPFixed | ConcType::LogPVaried => format!("log P ({})", identifier),
        ConcType::TotalFixed | ConcType::TotalVaried => format!("Total conc. ({})", identifier),
        ConcType::LogTotalVaried => format!("log Total conc. ({})", identifier),
    }
}

fn trim_number(text: String) -> String {
    let trimmed = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if trimmed == "-0" { "0".to_string() } else { trimmed }
}

/// shown number: totals outside 1e-3..1e4 in scientific notation,
/// everything else with at most four decimals
pub fn format_value(value: f64, conc_type: ConcType) -> String {
    if value.is_nan() {
        return "?".to_string();
    }
    let linear_total = matches!(conc_type, ConcType::TotalFixed | ConcType::TotalVaried);
    let magnitude = value.abs();
    if linear_total && value != 0.0 && !(1e-3..1e4).contains(&magnitude) {
        format!("{:e}", value)
    } else {
        trim_number(format!("{:.4}", value))
    }
}

/// shown (low, high) of a varied spec; ascending unless reversed ranges are allowed
fn display_bounds(spec: &ConcentrationSpec, allow_reversed: bool) -> (f64, f64) {
    let scale = spec.conc_type.scale();
    let (low, high) = (scale.to_display(spec.low), scale.to_display(spec.high));
    if !allow_reversed && low > high {
        (high, low)
    } else {
        (low, high)
    }
}

/// one line for a component
pub fn describe_spec(spec: &ConcentrationSpec, identifier: &str, allow_reversed: bool) -> String {
    let quantity = quantity_name(spec.conc_type, identifier);
    if spec.is_varied() {
        let (low, high) = display_bounds(spec, allow_reversed);
        format!(
            "{} varied from {} to {}",
            quantity,
            format_value(low, spec.conc_type),
            format_value(high, spec.conc_type)
        )
    } else {
        let value = spec.conc_type.scale().to_display(spec.low);
        format!("{} = {}", quantity, format_value(value, spec.conc_type))
    }
}

/// one line per component, in component order
pub fn describe(assignment: &AxisAssignment, system: &ChemSystem) -> Vec<String> {
    system
        .components
        .iter()
        .map(|c| match assignment.spec(c.index) {
            Some(spec) => describe_spec(spec, &c.identifier, assignment.allow_reversed_ranges),
            None => format!("{}: no concentration given", c.identifier),
        })
        .collect()
}

fn axis_quantity(conc_type: ConcType, identifier: &str) -> String {
    match conc_type {
        ConcType::EhFixed | ConcType::EhVaried => "Eh / V".to_string(),
        ConcType::TotalFixed | ConcType::TotalVaried => format!("Total conc. ({}) / M", identifier),
        other => quantity_name(other, identifier),
    }
}

pub fn x_axis_label(assignment: &AxisAssignment, system: &ChemSystem) -> String {
    match assignment.comp_x.and_then(|x| assignment.spec(x).map(|s| (x, s))) {
        Some((x, spec)) => axis_quantity(spec.conc_type, system.name(x)),
        None => String::new(),
    }
}

pub fn y_axis_label(assignment: &AxisAssignment, system: &ChemSystem) -> String {
    let species = |i: Option<usize>| i.map_or("?", |i| system.name(i)).to_string();
    match assignment.diagram_type {
        DiagramType::PredominanceArea => {
            match assignment.comp_y.and_then(|y| assignment.spec(y).map(|s| (y, s))) {
                Some((y, spec)) => axis_quantity(spec.conc_type, system.name(y)),
                None => String::new(),
            }
        }
        DiagramType::Fraction => format!("Fraction ({})", species(assignment.comp_y)),
        DiagramType::RelativeActivities => {
            format!("log (relative activity) ({})", species(assignment.comp_y))
        }
        DiagramType::LogSolubilities => "log Solubility".to_string(),
        DiagramType::Logarithmic => "log Concentration".to_string(),
        DiagramType::LogActivities => "log Activity".to_string(),
        DiagramType::CalculatedPh => "pH".to_string(),
        DiagramType::CalculatedPeOrEh if assignment.use_eh_for_electron => "Eh / V".to_string(),
        DiagramType::CalculatedPeOrEh => "pe".to_string(),
        DiagramType::HAffinitySpectrum => "H+ affinity".to_string(),
    }
}

/// overview table: diagram, axes, Y range, conditions and every concentration
pub fn concentration_table(assignment: &AxisAssignment, system: &ChemSystem) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Parameter", "Value"]);
    table.add_row(row![
        "Diagram",
        assignment.diagram_type.label(assignment.use_eh_for_electron)
    ]);
    table.add_row(row!["X-axis", x_axis_label(assignment, system)]);
    let y_label = y_axis_label(assignment, system);
    if !y_label.is_empty() {
        table.add_row(row!["Y-axis", y_label]);
    }
    if let Some((low, high)) = assignment.y_range {
        table.add_row(row![
            "Y range",
            format!("{} to {}", trim_number(format!("{:.4}", low)), trim_number(format!("{:.4}", high)))
        ]);
    }
    if assignment.diagram_type.is_predominance() {
        if let Some(main) = assignment.comp_main {
            table.add_row(row!["Main component", system.name(main)]);
        }
    }
    table.add_row(row!["Temperature (°C)", format!("{:.1}", assignment.temperature)]);
    table.add_row(row!["Ionic strength (M)", format!("{:.3}", assignment.ionic_strength)]);
    for (i, line) in describe(assignment, system).into_iter().enumerate() {
        table.add_row(row![format!("Component {}", i + 1), line]);
    }
    table
}

pub fn print_concentration_table(assignment: &AxisAssignment, system: &ChemSystem) {
    concentration_table(assignment, system).printstd();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(7.0, ConcType::PhFixed), "7");
        assert_eq!(format_value(-0.0, ConcType::ActivityFixed), "0");
        assert_eq!(format_value(0.05916, ConcType::EhFixed), "0.0592");
        assert_eq!(format_value(1e-3, ConcType::TotalFixed), "0.001");
        assert_eq!(format_value(1e-6, ConcType::TotalVaried), "1e-6");
        assert_eq!(format_value(-6.0, ConcType::LogTotalVaried), "-6");
        assert_eq!(format_value(f64::NAN, ConcType::TotalFixed), "?");
    }

    #[test]
    fn test_describe_lines() {
        let fixed_ph = ConcentrationSpec::fixed(ConcType::PhFixed, -7.0);
        assert_eq!(describe_spec(&fixed_ph, "H+", false), "pH = 7");
        let varied_ph = ConcentrationSpec::varied(ConcType::PhVaried, -12.0, -1.0);
        assert_eq!(describe_spec(&varied_ph, "H+", false), "pH varied from 1 to 12");
        assert_eq!(describe_spec(&varied_ph, "H+", true), "pH varied from 12 to 1");
        let cl = ConcentrationSpec::fixed(ConcType::ActivityFixed, -3.0);
        assert_eq!(describe_spec(&cl, "Cl-", false), "log activity (Cl-) = -3");
        let fe = ConcentrationSpec::fixed(ConcType::TotalFixed, 1e-5);
        assert_eq!(describe_spec(&fe, "Fe+3", false), "Total conc. (Fe+3) = 1e-5");
        let co2 = ConcentrationSpec::varied(ConcType::LogPVaried, -6.0, 0.0);
        assert_eq!(describe_spec(&co2, "CO2(g)", false), "log P (CO2(g)) varied from -6 to 0");
    }

    #[test]
    fn test_describe_follows_component_order() {
        let system = ChemSystem::from_identifiers(&["H+", "Fe+3", "H2O"], &[]);
        let assignment =
            AxisAssignment::seeded(&system, &crate::defaults_manager::DiagramDefaults::default());
        let lines = describe(&assignment, &system);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "pH = 7");
        assert_eq!(lines[1], "Total conc. (Fe+3) = 0.001");
        assert_eq!(lines[2], "log activity (H2O) = 0");
        assert_eq!(x_axis_label(&assignment, &system), "");
    }
}
