/// task files: components, reaction products and the saved diagram setup
pub mod load_from_file;
