//! # Diagram setup
//!
//! Configuration engine for chemical-speciation diagrams: which component
//! lies on which axis, how the concentration of every component is given,
//! and how all of it is kept consistent while the user changes the diagram
//! type or the axis components.
//!
//! Data flow: a user action reaches
//! [`DiagramConfigurator`](diagram_state_machine::DiagramConfigurator), which
//! changes the [`AxisAssignment`](axis_assignment::AxisAssignment) and runs
//! [`repair`](consistency_validator::repair); numbers move between
//! representations through [`range_converter`], and
//! [`concentration_list`] turns the result into text.

/// `SetupError` and `SetupWarning`
pub mod setup_errors;
/// roles of components derived from their identifiers
pub mod component_roles;
/// the 13 concentration representations and the 9 diagram types
pub mod concentration_types;
/// pH / pe / Eh / log total conversions
pub mod range_converter;
/// the configuration record
pub mod axis_assignment;
/// repair pass and invariant check
pub mod consistency_validator;
/// user actions and diagram-type transitions
pub mod diagram_state_machine;
/// text summary, axis labels and table
pub mod concentration_list;
/// arguments of the SED / Predom programs
pub mod program_args;
