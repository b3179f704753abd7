pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, MemoryStore};
pub use app::PageRenderer;
pub use config::AdSettings;
pub use core::head::HeadScriptComposer;
pub use core::resolver::AdConfigurationResolver;
pub use core::generator::ScriptGenerator;
pub use domain::model::{PageContext, ResolvedAdConfiguration};
pub use utils::error::{AdError, Result};
