#[cfg(feature = "cli")]
pub mod cli;
pub mod settings;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, ContextKind, DisplayArgs, HeadArgs};
pub use settings::AdSettings;
