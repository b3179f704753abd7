pub mod renderer;

pub use renderer::{PageRenderer, AD_CONFIGURATION_META_KEY, OPTIONS_KEY, PAGETYPE_META_KEY};
