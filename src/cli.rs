/// interactive text menu
pub mod cli_main;
