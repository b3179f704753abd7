use clap::Parser;
use gam_slots::core::display::DisplayOptions;
use gam_slots::utils::error::{AdError, ErrorSeverity};
use gam_slots::utils::{logger, validation::Validate};
use gam_slots::{CliConfig, LocalStorage, PageRenderer};
use gam_slots::config::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting gam-slots CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&config).await {
        tracing::error!(
            "❌ gam-slots failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> Result<(), AdError> {
    let storage = LocalStorage::new(&config.settings_dir);
    let renderer = PageRenderer::new(storage.clone(), storage).with_options_key(&config.options_key);
    let settings = renderer.load_settings().await?;

    match &config.command {
        Command::Head(args) => {
            let context = args.page_context()?;
            match renderer.render_head(&settings, &context, args.debug_console).await? {
                Some(script) => print!("{}", script),
                None => tracing::info!("No ads for this page"),
            }
        }
        Command::Display(args) => {
            let options = DisplayOptions {
                classes: args.class.clone(),
                styles: args.style.clone(),
            };
            if let Some(html) = renderer.render_display(&settings, &args.unit, args.position.as_deref(), &options) {
                print!("{}", html);
            }
        }
        Command::Check => {
            settings.validate()?;
            let warnings = settings.warnings();
            for warning in &warnings {
                tracing::warn!("{}", warning);
                println!("⚠️  {}", warning);
            }
            println!(
                "✅ Settings are valid ({} ad units, {} size mappings, {} warnings)",
                settings.taxonomy.len(),
                settings.size_mappings.len(),
                warnings.len()
            );
        }
    }
    Ok(())
}
