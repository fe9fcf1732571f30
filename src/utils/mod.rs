pub mod config;
pub mod identities;
pub mod logger;
pub mod settings;

pub use identities::{default_output_path, identities_from_file};
pub use logger::setup_logging;
pub use settings::{Settings, load_settings, resolve_token};
