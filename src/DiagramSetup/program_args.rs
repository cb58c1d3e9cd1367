//! Command line for the program that computes the diagram: `Predom` for
//! predominance diagrams, `SED` for all others.
use super::axis_assignment::AxisAssignment;
use super::component_roles::ChemSystem;
use super::consistency_validator::check_invariants;
use super::setup_errors::SetupError;
use crate::defaults_manager::{NumberFormat, ProgramOptions};
use log::info;
use std::fmt;

const DEFAULT_TEMPERATURE: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramProgram {
    Predom,
    Sed,
}

impl DiagramProgram {
    pub fn for_assignment(assignment: &AxisAssignment) -> Self {
        if assignment.diagram_type.is_predominance() {
            DiagramProgram::Predom
        } else {
            DiagramProgram::Sed
        }
    }

    pub fn executable_name(self) -> &'static str {
        match self {
            DiagramProgram::Predom => "Predom",
            DiagramProgram::Sed => "SED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInvocation {
    pub program: DiagramProgram,
    pub args: Vec<String>,
}

impl fmt::Display for ProgramInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.executable_name())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Builds the argument list. Only an assignment that satisfies every
/// invariant is handed to the programs.
pub fn build_invocation(
    assignment: &AxisAssignment,
    system: &ChemSystem,
    data_file: &str,
    plot_file: &str,
    options: &ProgramOptions,
) -> Result<ProgramInvocation, SetupError> {
    check_invariants(assignment, system)?;
    if data_file.trim().is_empty() {
        return Err(SetupError::TaskFormat("no data file given".to_string()));
    }
    if plot_file.trim().is_empty() {
        return Err(SetupError::TaskFormat("no plot file given".to_string()));
    }

    let mut args = vec![format!("-d={}", data_file), format!("-p={}", plot_file)];
    if assignment.temperature != DEFAULT_TEMPERATURE {
        args.push(format!("-t={}", assignment.temperature));
    }
    if assignment.ionic_strength != 0.0 {
        args.push(format!("-i={}", assignment.ionic_strength));
        args.push(format!("-m={}", options.activity_model));
    }
    args.push(format!("-n={}", options.steps));
    if options.aqueous_only {
        args.push("-aqu".to_string());
    }
    if options.display_ph_pe {
        args.push("-pH".to_string());
    }
    if assignment.allow_reversed_ranges {
        args.push("-rev".to_string());
    }
    if options.units != 0 {
        args.push(format!("-units={}", options.units));
    }
    match options.number_format {
        NumberFormat::Scientific => args.push("-sci".to_string()),
        NumberFormat::Engineering => args.push("-eng".to_string()),
        NumberFormat::Default => {}
    }

    let invocation = ProgramInvocation {
        program: DiagramProgram::for_assignment(assignment),
        args,
    };
    info!("diagram program: {}", invocation);
    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagramSetup::consistency_validator::repair;
    use crate::defaults_manager::DiagramDefaults;
    use crate::DiagramSetup::concentration_types::DiagramType;

    fn valid_assignment(system: &ChemSystem) -> AxisAssignment {
        let defaults = DiagramDefaults::default();
        let mut a = AxisAssignment::seeded(system, &defaults);
        repair(&mut a, system, &defaults);
        a
    }

    #[test]
    fn test_minimal_arguments() {
        let system = ChemSystem::from_identifiers(&["H+", "e-", "Fe+3"], &[]);
        let a = valid_assignment(&system);
        let inv = build_invocation(&a, &system, "fe.dat", "fe.plt", &ProgramOptions::default()).unwrap();
        assert_eq!(inv.program, DiagramProgram::Predom);
        assert_eq!(inv.args, vec!["-d=fe.dat", "-p=fe.plt", "-n=50", "-pH"]);
        assert_eq!(inv.to_string(), "Predom -d=fe.dat -p=fe.plt -n=50 -pH");
    }

    #[test]
    fn test_all_options() {
        let system = ChemSystem::from_identifiers(&["H+", "e-", "Fe+3"], &[]);
        let mut a = valid_assignment(&system);
        a.diagram_type = DiagramType::Logarithmic;
        repair(&mut a, &system, &DiagramDefaults::default());
        a.temperature = 50.0;
        a.ionic_strength = 0.1;
        a.allow_reversed_ranges = true;
        let options = ProgramOptions {
            steps: 100,
            activity_model: 1,
            units: 1,
            aqueous_only: true,
            display_ph_pe: false,
            number_format: NumberFormat::Scientific,
        };
        let inv = build_invocation(&a, &system, "my data.dat", "fe.plt", &options).unwrap();
        assert_eq!(inv.program, DiagramProgram::Sed);
        assert_eq!(
            inv.args,
            vec![
                "-d=my data.dat",
                "-p=fe.plt",
                "-t=50",
                "-i=0.1",
                "-m=1",
                "-n=100",
                "-aqu",
                "-rev",
                "-units=1",
                "-sci"
            ]
        );
        assert!(inv.to_string().contains("\"-d=my data.dat\""));
    }

    #[test]
    fn test_broken_assignment_is_refused() {
        let system = ChemSystem::from_identifiers(&["H+", "e-", "Fe+3"], &[]);
        let mut a = valid_assignment(&system);
        a.comp_main = None;
        assert!(matches!(
            build_invocation(&a, &system, "fe.dat", "fe.plt", &ProgramOptions::default()),
            Err(SetupError::InvariantViolation(_))
        ));
        let a = valid_assignment(&system);
        assert!(build_invocation(&a, &system, " ", "fe.plt", &ProgramOptions::default()).is_err());
    }
}
