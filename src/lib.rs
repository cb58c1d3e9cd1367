#[allow(non_snake_case)]
pub mod DiagramSetup;
#[allow(non_snake_case)]
pub mod Utils;
pub mod cli;
pub mod defaults_manager;
