//! Config - settings files and resolved configuration

mod dock;
mod loader;

pub use dock::{
    DockConfig, DockSettings, PtySizeConfig, DEFAULT_COMMAND_TIMEOUT_SECS,
    MAX_COMMAND_TIMEOUT_SECS, MIN_COMMAND_TIMEOUT_SECS,
};
pub use loader::{
    load_settings_from_file, strip_json_comments, ConfigLoader, CONFIG_DIR_NAME, SETTINGS_FILE,
};
