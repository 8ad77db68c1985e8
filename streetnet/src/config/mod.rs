mod import_options;
mod settings;

pub use import_options::ImportOptions;
pub use settings::Settings;
