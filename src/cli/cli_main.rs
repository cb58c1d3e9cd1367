use crate::DiagramSetup::axis_assignment::{Axis, ConcentrationSpec};
use crate::DiagramSetup::component_roles::{ChemSystem, IdentifierClassifier};
use crate::DiagramSetup::concentration_list::{describe, print_concentration_table};
use crate::DiagramSetup::concentration_types::{ActivityScale, ConcType, DiagramType};
use crate::DiagramSetup::diagram_state_machine::DiagramConfigurator;
use crate::DiagramSetup::program_args::build_invocation;
use crate::DiagramSetup::setup_errors::{SetupError, SetupWarning};
use crate::Utils::load_from_file::{DiagramTask, LoadData};
use crate::defaults_manager::{with_defaults_manager, with_defaults_manager_mut};
use log::error;
use std::io::{self, Write};

/// diagram being set up and the task file it belongs to
struct Session {
    configurator: DiagramConfigurator,
    task_file: Option<String>,
}

pub fn run_interactive_menu() {
    let mut session: Option<Session> = None;
    loop {
        show_main_menu(session.as_ref());
        let choice = get_user_input("Enter your choice: ");

        match choice.as_str() {
            "1" => {
                if let Some(s) = load_task_menu() {
                    session = Some(s);
                }
            }
            "2" => {
                if let Some(s) = enter_components_menu() {
                    session = Some(s);
                }
            }
            "11" => defaults_menu(),
            "0" => {
                if session.as_ref().is_some_and(|s| s.configurator.is_modified()) {
                    println!("\x1b[33mThe diagram setup has unsaved changes.\x1b[0m");
                }
                println!("Goodbye!");
                break;
            }
            other => match session.as_mut() {
                Some(s) => session_menu(other, s),
                None => println!("Load a task file or enter components first."),
            },
        }
    }
}

fn session_menu(choice: &str, s: &mut Session) {
    match choice {
        "3" => diagram_type_menu(&mut s.configurator),
        "4" => component_menu(&mut s.configurator),
        "5" => {
            let use_eh = !s.configurator.assignment().use_eh_for_electron;
            report(s.configurator.on_use_eh_toggled(use_eh));
        }
        "6" => concentration_menu(&mut s.configurator),
        "7" => conditions_menu(&mut s.configurator),
        "8" => print_concentration_table(s.configurator.assignment(), s.configurator.system()),
        "9" => show_program_arguments(s),
        "10" => save_task_menu(s),
        _ => println!("Invalid choice. Please try again."),
    }
}

/* colors
Blue (\x1b[34m) - header text
Yellow (\x1b[33m) - menu options and warnings
Cyan (\x1b[36m) - prompts
Reset (\x1b[0m) - back to normal after each colored section
*/
fn show_main_menu(session: Option<&Session>) {
    println!("\x1b[34m\n Diagram setup for chemical speciation diagrams \n\x1b[0m");
    if let Some(s) = session {
        let a = s.configurator.assignment();
        println!(
            "\x1b[34m Current: \"{}\"{}\x1b[0m",
            a.diagram_type.label(a.use_eh_for_electron),
            if s.configurator.is_modified() { " (modified)" } else { "" }
        );
        for line in describe(a, s.configurator.system()) {
            println!("   {}", line);
        }
    }
    println!("\x1b[33m1. Load task file\x1b[0m");
    println!("\x1b[33m2. Enter components\x1b[0m");
    println!("\x1b[33m3. Diagram type\x1b[0m");
    println!("\x1b[33m4. X / Y / main component\x1b[0m");
    println!("\x1b[33m5. Toggle pe / Eh\x1b[0m");
    println!("\x1b[33m6. Edit concentration\x1b[0m");
    println!("\x1b[33m7. Title, temperature and ionic strength\x1b[0m");
    println!("\x1b[33m8. Show concentration table\x1b[0m");
    println!("\x1b[33m9. Show program arguments\x1b[0m");
    println!("\x1b[33m10. Save task file\x1b[0m");
    println!("\x1b[33m11. Defaults for new diagrams\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
}

fn get_user_input(prompt: &str) -> String {
    print!("\x1b[36m{}\x1b[0m", prompt);
    if let Err(e) = io::stdout().flush() {
        error!("stdout: {}", e);
    }
    let mut input = String::new();
    if let Err(e) = io::stdin().read_line(&mut input) {
        error!("Failed to read input: {}", e);
    }
    input.trim().to_string()
}

fn choose_index(prompt: &str, len: usize) -> Option<usize> {
    let input = get_user_input(prompt);
    match input.parse::<usize>() {
        Ok(i) if (1..=len).contains(&i) => Some(i - 1),
        _ => {
            println!("Invalid choice.");
            None
        }
    }
}

fn report(warnings: Vec<SetupWarning>) {
    for w in warnings {
        println!("\x1b[33m! {}\x1b[0m", w);
    }
}

fn new_session(system: ChemSystem, task: Option<DiagramTask>, task_file: Option<String>) -> Session {
    let defaults = with_defaults_manager(|manager| manager.get_config().clone());
    let seed = task.and_then(|t| t.plot);
    let (configurator, warnings) = DiagramConfigurator::load(system, seed, defaults);
    report(warnings);
    Session {
        configurator,
        task_file,
    }
}

fn load_task_menu() -> Option<Session> {
    let file_name = get_user_input("Task file: ");
    match LoadData::new(file_name.clone()).load_task() {
        Ok(task) => {
            let system = task.system();
            Some(new_session(system, Some(task), Some(file_name)))
        }
        Err(e) => {
            println!("\x1b[33m{}\x1b[0m", e);
            None
        }
    }
}

fn enter_components_menu() -> Option<Session> {
    let split = |text: String| -> Vec<String> {
        text.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    let components = split(get_user_input("Components (e.g. H+, e-, Cl-, Fe+3, H2O): "));
    if components.is_empty() {
        println!("No components given.");
        return None;
    }
    let products = split(get_user_input("Reaction products (may be empty): "));
    let system = ChemSystem::new(&components, &products, &IdentifierClassifier);
    Some(new_session(system, None, None))
}

fn diagram_type_menu(configurator: &mut DiagramConfigurator) {
    let use_eh = configurator.assignment().use_eh_for_electron;
    for (i, d) in DiagramType::ALL.iter().enumerate() {
        println!("\x1b[33m{}. {}\x1b[0m", i + 1, d.label(use_eh));
    }
    if let Some(i) = choose_index("Diagram type: ", DiagramType::ALL.len()) {
        report(configurator.on_diagram_type_changed(DiagramType::ALL[i]));
    }
}

fn pick_species(configurator: &DiagramConfigurator, candidates: &[usize]) -> Option<usize> {
    if candidates.is_empty() {
        println!("Nothing to choose for this diagram type.");
        return None;
    }
    for (i, c) in candidates.iter().enumerate() {
        println!("\x1b[33m{}. {}\x1b[0m", i + 1, configurator.system().name(*c));
    }
    choose_index("Component: ", candidates.len()).map(|i| candidates[i])
}

fn component_menu(configurator: &mut DiagramConfigurator) {
    println!("\x1b[33m1. X-axis\x1b[0m");
    println!("\x1b[33m2. Y-axis / Y species\x1b[0m");
    println!("\x1b[33m3. Main component\x1b[0m");
    let result = match get_user_input("Which: ").as_str() {
        "1" => {
            let candidates = configurator.x_candidates();
            pick_species(configurator, &candidates)
                .map(|i| configurator.on_axis_component_changed(Axis::X, i))
        }
        "2" => {
            let candidates = configurator.y_candidates();
            pick_species(configurator, &candidates)
                .map(|i| configurator.on_axis_component_changed(Axis::Y, i))
        }
        "3" => {
            let candidates = configurator.main_candidates();
            pick_species(configurator, &candidates).map(|i| configurator.on_main_component_changed(i))
        }
        _ => {
            println!("Invalid choice.");
            None
        }
    };
    match result {
        Some(Ok(warnings)) => report(warnings),
        Some(Err(e)) => println!("\x1b[33m{}\x1b[0m", e),
        None => {}
    }
}

fn concentration_menu(configurator: &mut DiagramConfigurator) {
    let n = configurator.system().n_components();
    let lines = describe(configurator.assignment(), configurator.system());
    for (i, line) in lines.iter().enumerate() {
        println!("\x1b[33m{}. {}\x1b[0m", i + 1, line);
    }
    let Some(index) = choose_index("Component: ", n) else {
        return;
    };
    let legal = match configurator.legal_types(index) {
        Ok(legal) => legal,
        Err(e) => {
            println!("\x1b[33m{}\x1b[0m", e);
            return;
        }
    };
    for (i, t) in legal.iter().enumerate() {
        println!("\x1b[33m{}. {}\x1b[0m", i + 1, t.label());
    }
    let Some(choice) = choose_index("Representation: ", legal.len()) else {
        return;
    };
    let conc_type: ConcType = legal[choice];
    let scale = conc_type.scale();
    let parse = |prompt: &str| get_user_input(prompt).parse::<f64>().ok();
    let spec = if conc_type.is_varied() {
        match (parse("From: "), parse("To: ")) {
            (Some(low), Some(high)) => Some(ConcentrationSpec::varied(
                conc_type,
                scale.from_display(low),
                scale.from_display(high),
            )),
            _ => None,
        }
    } else {
        parse("Value: ").map(|v| ConcentrationSpec::fixed(conc_type, scale.from_display(v)))
    };
    match spec {
        Some(spec) => match configurator.on_concentration_changed(index, spec) {
            Ok(warnings) => report(warnings),
            Err(e) => println!("\x1b[33m{}\x1b[0m", e),
        },
        None => println!("\x1b[33mNot a number, concentration not changed.\x1b[0m"),
    }
}

fn conditions_menu(configurator: &mut DiagramConfigurator) {
    let a = configurator.assignment();
    println!(
        "Title: {}, temperature: {} °C, ionic strength: {} M",
        a.title.as_deref().unwrap_or("none"),
        a.temperature,
        a.ionic_strength
    );
    let title = get_user_input("Title (empty to keep, '-' to clear): ");
    match title.as_str() {
        "" => {}
        "-" => configurator.set_title(None),
        _ => configurator.set_title(Some(title)),
    }
    let t = get_user_input("Temperature (°C, empty to keep): ");
    if !t.is_empty() {
        match t.parse::<f64>() {
            Ok(t) => match configurator.set_temperature(t) {
                Ok(warnings) => report(warnings),
                Err(e) => println!("\x1b[33m{}\x1b[0m", e),
            },
            Err(_) => println!("\x1b[33m'{}' is not a valid number\x1b[0m", t),
        }
    }
    let i = get_user_input("Ionic strength (M, empty to keep): ");
    if !i.is_empty() {
        match i.parse::<f64>() {
            Ok(i) => match configurator.set_ionic_strength(i) {
                Ok(warnings) => report(warnings),
                Err(e) => println!("\x1b[33m{}\x1b[0m", e),
            },
            Err(_) => println!("\x1b[33m'{}' is not a valid number\x1b[0m", i),
        }
    }
}

fn show_program_arguments(session: &Session) {
    let options = with_defaults_manager(|manager| manager.get_config().program.clone());
    let base = session
        .task_file
        .as_deref()
        .map_or("diagram", |f| f.rsplit_once('.').map_or(f, |(stem, _)| stem));
    let configurator = &session.configurator;
    match build_invocation(
        configurator.assignment(),
        configurator.system(),
        &format!("{}.dat", base),
        &format!("{}.plt", base),
        &options,
    ) {
        Ok(invocation) => println!("{}", invocation),
        Err(e) => println!("\x1b[33m{}\x1b[0m", e),
    }
}

fn save_task_menu(session: &mut Session) {
    let file_name = match &session.task_file {
        Some(f) => f.clone(),
        None => get_user_input("Task file: "),
    };
    let assignment = match session.configurator.confirm() {
        Ok(a) => a,
        Err(e) => {
            println!("\x1b[33m{}\x1b[0m", e);
            return;
        }
    };
    let system = session.configurator.system();
    let task = DiagramTask {
        components: system.components.iter().map(|c| c.identifier.clone()).collect(),
        products: system.products.iter().map(|p| p.identifier.clone()).collect(),
        plot: Some(assignment),
    };
    match LoadData::new(file_name.clone()).save_task(&task) {
        Ok(()) => {
            println!("Saved to '{}'", file_name);
            session.task_file = Some(file_name);
        }
        Err(e) => println!("\x1b[33m{}\x1b[0m", e),
    }
}

/// two numbers separated by commas or whitespace
fn parse_pair(text: &str) -> Option<(f64, f64)> {
    let values: Vec<f64> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [low, high] => Some((*low, *high)),
        _ => None,
    }
}

fn defaults_menu() {
    let d = with_defaults_manager(|manager| manager.get_config().clone());
    println!("\x1b[34m Defaults for new diagrams \x1b[0m");
    println!("\x1b[33m1. Electron as Eh instead of pe ({})\x1b[0m", d.use_eh_for_electron);
    println!("\x1b[33m2. Allow reversed ranges ({})\x1b[0m", d.allow_reversed_ranges);
    println!("\x1b[33m3. Temperature ({} °C)\x1b[0m", d.temperature);
    println!("\x1b[33m4. Ionic strength ({} M)\x1b[0m", d.ionic_strength);
    println!("\x1b[33m5. pH range\x1b[0m");
    println!("\x1b[33m6. pe range\x1b[0m");
    println!("\x1b[33m7. Eh range (V)\x1b[0m");
    println!("\x1b[33m8. log total concentration range\x1b[0m");
    println!("\x1b[33m9. Reset to built-in defaults\x1b[0m");
    let choice = get_user_input("Which: ");
    let number = |prompt: &str| {
        let text = get_user_input(prompt);
        text.parse::<f64>().map_err(|_| SetupError::NumericParse { text })
    };
    let pair = |prompt: &str| {
        let text = get_user_input(prompt);
        parse_pair(&text).ok_or(SetupError::NumericParse { text })
    };
    let result = match choice.as_str() {
        "1" => with_defaults_manager_mut(|m| m.set_use_eh(!d.use_eh_for_electron)),
        "2" => with_defaults_manager_mut(|m| m.set_allow_reversed_ranges(!d.allow_reversed_ranges)),
        "3" => number("Temperature (°C): ")
            .and_then(|t| with_defaults_manager_mut(|m| m.set_temperature(t))),
        "4" => number("Ionic strength (M): ")
            .and_then(|i| with_defaults_manager_mut(|m| m.set_ionic_strength(i))),
        "5" => pair("pH from, to: ")
            .and_then(|(low, high)| with_defaults_manager_mut(|m| m.set_ph_range(low, high))),
        "6" => pair("pe from, to: ")
            .and_then(|(low, high)| with_defaults_manager_mut(|m| m.set_pe_range(low, high))),
        "7" => pair("Eh from, to: ")
            .and_then(|(low, high)| with_defaults_manager_mut(|m| m.set_eh_range(low, high))),
        "8" => pair("log total from, to: ")
            .and_then(|(low, high)| with_defaults_manager_mut(|m| m.set_log_total_range(low, high))),
        "9" => with_defaults_manager_mut(|m| m.reset_to_defaults()),
        _ => {
            println!("Invalid choice.");
            return;
        }
    };
    match result {
        Ok(()) => println!("Defaults updated; they apply to the next loaded task."),
        Err(e) => println!("\x1b[33m{}\x1b[0m", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("2, 10"), Some((2.0, 10.0)));
        assert_eq!(parse_pair(" -0.5  0.8 "), Some((-0.5, 0.8)));
        assert_eq!(parse_pair("2"), None);
        assert_eq!(parse_pair("2, x"), None);
        assert_eq!(parse_pair("1 2 3"), None);
    }
}
