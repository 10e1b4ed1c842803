pub mod settings;

pub use settings::{ConfigError, EmulatorConfig, SimConfig};
