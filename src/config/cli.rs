use crate::domain::model::PageContext;
use crate::utils::error::{AdError, Result};
use crate::utils::validation::{self, Validate};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "gam-slots")]
#[command(about = "Render Google Ad Manager slot scripts from ad settings")]
pub struct CliConfig {
    /// Directory holding the options file and `meta/<item>.json` files
    #[arg(long, default_value = ".")]
    pub settings_dir: String,

    #[arg(long, default_value = crate::app::OPTIONS_KEY)]
    pub options_key: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the head script for a page
    Head(HeadArgs),
    /// Print the placeholder markup for one slot
    Display(DisplayArgs),
    /// Validate the settings and report problems
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContextKind {
    Home,
    Single,
    Category,
    Tag,
    Page,
    Archive,
    NotFound,
    Other,
}

#[derive(Debug, Clone, Args)]
pub struct HeadArgs {
    #[arg(long, value_enum, default_value = "home")]
    pub context: ContextKind,

    /// Category, tag or page slug
    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long, default_value = "post")]
    pub post_type: String,

    /// Category and tag slugs of a single post
    #[arg(long, value_delimiter = ',')]
    pub slugs: Vec<String>,

    /// Content item whose metadata holds the page override
    #[arg(long)]
    pub item_id: Option<String>,

    /// Comma-separated page types, overriding the item's metadata
    #[arg(long)]
    pub pagetype: Option<String>,

    /// Log impression and refresh events to the browser console
    #[arg(long)]
    pub debug_console: bool,
}

impl HeadArgs {
    pub fn page_context(&self) -> Result<PageContext> {
        let slug = || {
            self.slug.clone().ok_or_else(|| AdError::MissingConfigError {
                field: "slug".to_string(),
            })
        };
        Ok(match self.context {
            ContextKind::Home => PageContext::Home,
            ContextKind::Single => PageContext::Single {
                post_type: self.post_type.clone(),
                slugs: self.slugs.clone(),
            },
            ContextKind::Category => PageContext::Category { slug: slug()? },
            ContextKind::Tag => PageContext::Tag { slug: slug()? },
            ContextKind::Page => PageContext::Page {
                slug: self.slug.clone().unwrap_or_default(),
                item_id: self.item_id.clone(),
                pagetype_meta: self.pagetype.clone(),
            },
            ContextKind::Archive => PageContext::Archive,
            ContextKind::NotFound => PageContext::NotFound,
            ContextKind::Other => PageContext::Other,
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct DisplayArgs {
    #[arg(long)]
    pub unit: String,

    #[arg(long)]
    pub position: Option<String>,

    #[arg(long)]
    pub class: Option<String>,

    #[arg(long)]
    pub style: Option<String>,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("settings_dir", &self.settings_dir)?;
        validation::validate_non_empty_string("options_key", &self.options_key)?;
        if let Command::Display(args) = &self.command {
            validation::validate_non_empty_string("unit", &args.unit)?;
        }
        Ok(())
    }
}
