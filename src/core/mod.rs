pub mod catalog;
pub mod display;
pub mod generator;
pub mod head;
pub mod page_type;
pub mod resolver;
pub mod runtime;
pub mod script;
pub mod submission;

pub use crate::domain::model::{PageContext, ResolvedAdConfiguration};
pub use crate::domain::ports::{MetadataStore, SettingsStore};
pub use crate::utils::error::Result;
