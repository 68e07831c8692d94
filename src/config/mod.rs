#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::cli::{CliConfig, Command};
pub use self::toml_config::TomlConfig;
