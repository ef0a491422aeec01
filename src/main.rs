use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aimon::config::{Command, Config};
use aimon::feed::{self, Format};
use aimon::ui::App;
use aimon_core::config::{Settings, SettingsStore};
use aimon_core::usage::{CommandSource, RefreshController, UsageSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.merge_into(&mut settings);
    settings.validate();

    let source: Arc<dyn UsageSource> = Arc::new(CommandSource::from_settings(&settings.data_source));
    let settings = SettingsStore::shared(settings);

    match cli.command() {
        Command::Popup => {
            let mut app = App::new(settings, source);
            app.run().await
        }
        Command::Status { json } => {
            let mut handle = RefreshController::new(source, Arc::clone(&settings)).spawn();
            let line = feed::status(handle.subscribe(), &settings, format(json)).await;
            handle.teardown().await;
            println!("{}", line?);
            Ok(())
        }
        Command::Watch { json } => {
            info!("Watching usage");
            let mut handle = RefreshController::new(source, Arc::clone(&settings)).spawn();
            let mut stdout = std::io::stdout();
            let result = feed::watch(handle.subscribe(), &settings, format(json), &mut stdout).await;
            handle.teardown().await;
            result
        }
    }
}

fn format(json: bool) -> Format {
    if json {
        Format::Json
    } else {
        Format::Text
    }
}

fn setup_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("aimon=debug,aimon_core=debug")
        } else {
            EnvFilter::new("aimon=info,aimon_core=info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
