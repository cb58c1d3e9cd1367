//! Task files: the chemical system and the diagram setup stored together.
//!
//! ```text
//! COMPONENTS
//! H+, e-, Cl-, Fe+3, H2O
//! PRODUCTS
//! OH-, FeCl+2, Fe(OH)3(s)
//! PLOT
//! { ...AxisAssignment as JSON... }
//! ```
//! Each section runs until the next header. `PRODUCTS` and `PLOT` are optional.
use crate::DiagramSetup::axis_assignment::AxisAssignment;
use crate::DiagramSetup::component_roles::{ChemSystem, IdentifierClassifier};
use crate::DiagramSetup::setup_errors::SetupError;
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

const COMPONENTS_HEADER: &str = "COMPONENTS";
const PRODUCTS_HEADER: &str = "PRODUCTS";
const PLOT_HEADER: &str = "PLOT";
const HEADERS: [&str; 3] = [COMPONENTS_HEADER, PRODUCTS_HEADER, PLOT_HEADER];

/// contents of a task file
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramTask {
    pub components: Vec<String>,
    pub products: Vec<String>,
    /// diagram setup saved with the task, if any
    pub plot: Option<AxisAssignment>,
}

impl DiagramTask {
    pub fn system(&self) -> ChemSystem {
        ChemSystem::new(&self.components, &self.products, &IdentifierClassifier)
    }
}

pub struct LoadData {
    pub file_name: String,
}

impl LoadData {
    pub fn new(file_name: String) -> Self {
        LoadData { file_name }
    }
    pub fn load_task(&self) -> Result<DiagramTask, SetupError> {
        load_task(&self.file_name)
    }
    pub fn save_task(&self, task: &DiagramTask) -> Result<(), SetupError> {
        save_task(&self.file_name, task)
    }
}

fn is_header(line: &str) -> bool {
    let trimmed = line.trim().to_uppercase();
    HEADERS.contains(&trimmed.as_str())
}

/// (first line, end) of the section under `header`, the header line excluded
fn find_section(lines: &[String], header: &str) -> Option<(usize, usize)> {
    let start_index = lines
        .iter()
        .position(|line| line.trim().to_uppercase() == header)?
        + 1;
    let end_index = lines[start_index..]
        .iter()
        .position(|line| is_header(line))
        .map_or(lines.len(), |offset| start_index + offset);
    Some((start_index, end_index))
}

/// identifiers separated by commas or whitespace
fn parse_identifiers(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_plot(lines: &[String], start_index: usize, end_index: usize, file_name: &str) -> Result<Option<AxisAssignment>, SetupError> {
    let plot_section = lines[start_index..end_index].join("\n");
    if plot_section.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<AxisAssignment>(&plot_section) {
        Ok(plot) => Ok(Some(plot)),
        Err(e) => {
            let error_line = e.line();
            let error_column = e.column();
            let actual_line = start_index + error_line.saturating_sub(1);
            let error_msg = format!(
                "Error parsing diagram setup at line {}, column {} (line {} in file '{}'): {}",
                error_line,
                error_column,
                actual_line + 1,
                file_name,
                e
            );
            error!("{}", error_msg);
            if let Some(problem_line) = lines.get(actual_line) {
                error!("Problematic line: {}", problem_line);
                if error_column >= 1 && error_column <= problem_line.len() {
                    error!("{}", " ".repeat(error_column - 1) + "^");
                }
            }
            Err(SetupError::TaskFormat(error_msg))
        }
    }
}

pub fn load_task(file_name: &str) -> Result<DiagramTask, SetupError> {
    let path = Path::new(file_name);
    if !path.exists() {
        return Err(SetupError::TaskFormat(format!(
            "File '{}' does not exist",
            file_name
        )));
    }
    let reader = BufReader::new(File::open(path)?);
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;

    let (start_index, end_index) = find_section(&lines, COMPONENTS_HEADER).ok_or_else(|| {
        SetupError::TaskFormat(format!(
            "No '{}' header found in file '{}'",
            COMPONENTS_HEADER, file_name
        ))
    })?;
    let components = parse_identifiers(&lines[start_index..end_index].join("\n"));
    if components.is_empty() {
        return Err(SetupError::TaskFormat(format!(
            "No components found in file '{}'",
            file_name
        )));
    }

    let products = match find_section(&lines, PRODUCTS_HEADER) {
        Some((start_index, end_index)) => parse_identifiers(&lines[start_index..end_index].join("\n")),
        None => Vec::new(),
    };

    let plot = match find_section(&lines, PLOT_HEADER) {
        Some((start_index, end_index)) => parse_plot(&lines, start_index, end_index, file_name)?,
        None => {
            warn!("No diagram setup in '{}', defaults will be used", file_name);
            None
        }
    };

    info!(
        "Loaded task '{}': {} components, {} reaction products",
        file_name,
        components.len(),
        products.len()
    );
    Ok(DiagramTask {
        components,
        products,
        plot,
    })
}

pub fn save_task(file_name: &str, task: &DiagramTask) -> Result<(), SetupError> {
    let mut content = format!("{}\n{}\n", COMPONENTS_HEADER, task.components.join(", "));
    if !task.products.is_empty() {
        content.push_str(&format!("{}\n{}\n", PRODUCTS_HEADER, task.products.join(", ")));
    }
    if let Some(plot) = &task.plot {
        content.push_str(&format!("{}\n{}\n", PLOT_HEADER, serde_json::to_string_pretty(plot)?));
    }
    fs::write(file_name, content)?;
    info!("Task saved to '{}'", file_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DiagramSetup::axis_assignment::ConcentrationSpec;
    use crate::DiagramSetup::concentration_types::ConcType;
    use crate::defaults_manager::DiagramDefaults;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_components_and_products() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "COMPONENTS").unwrap();
        writeln!(temp_file, "H+, e-, Cl-").unwrap();
        writeln!(temp_file, "Fe+3 H2O").unwrap();
        writeln!(temp_file, "PRODUCTS").unwrap();
        writeln!(temp_file, "OH-, FeCl+2, Fe(OH)3(s)").unwrap();

        let task = load_task(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(task.components, vec!["H+", "e-", "Cl-", "Fe+3", "H2O"]);
        assert_eq!(task.products, vec!["OH-", "FeCl+2", "Fe(OH)3(s)"]);
        assert!(task.plot.is_none());
        let system = task.system();
        assert_eq!(system.n_components(), 5);
        assert_eq!(system.n_species(), 8);
    }

    #[test]
    fn test_component_named_like_a_word_is_not_a_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "COMPONENTS").unwrap();
        writeln!(temp_file, "CO").unwrap();
        writeln!(temp_file, "H+").unwrap();
        let task = load_task(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(task.components, vec!["CO", "H+"]);
    }

    #[test]
    fn test_no_components_header() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "PRODUCTS").unwrap();
        writeln!(temp_file, "OH-").unwrap();
        let result = load_task(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(SetupError::TaskFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_task("/nonexistent/task.txt").is_err());
    }

    #[test]
    fn test_broken_plot_section() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "COMPONENTS").unwrap();
        writeln!(temp_file, "H+, Fe+3").unwrap();
        writeln!(temp_file, "PLOT").unwrap();
        writeln!(temp_file, "{{ \"diagram_type\": ").unwrap();
        let result = load_task(temp_file.path().to_str().unwrap());
        assert!(matches!(result, Err(SetupError::TaskFormat(_))));
    }

    #[test]
    fn test_save_and_load_task() {
        let components: Vec<String> = ["H+", "Fe+3", "H2O"].iter().map(|s| s.to_string()).collect();
        let products = vec!["OH-".to_string()];
        let system = ChemSystem::new(&components, &products, &IdentifierClassifier);
        let mut plot = AxisAssignment::seeded(&system, &DiagramDefaults::default());
        plot.comp_x = Some(0);
        plot.title = Some("Fe hydrolysis".to_string());
        plot.specs
            .insert(0, ConcentrationSpec::varied(ConcType::PhVaried, -12.0, -1.0));
        let task = DiagramTask {
            components,
            products,
            plot: Some(plot),
        };

        let temp_file = NamedTempFile::new().unwrap();
        let loader = LoadData::new(temp_file.path().to_str().unwrap().to_string());
        loader.save_task(&task).unwrap();
        let loaded = loader.load_task().unwrap();
        assert_eq!(loaded, task);
    }
}
