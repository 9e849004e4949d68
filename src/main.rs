use std::process;

use headshakers::{
    cache::{CacheConfig, InvalidationEvent},
    commands, config,
    error::AppError,
    infra::{events::read_event_file, telemetry},
};
use tracing::{Dispatch, Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    let limits = CacheConfig::from(&settings.cache).limits;

    match cli_args.command {
        config::Command::Tags(args) => {
            let event = InvalidationEvent::from(args.event);
            let tags = commands::event_tags(&event, limits)?;
            debug!(event = event.name(), count = tags.len(), "Resolved invalidation tags");
            println!("{}", commands::render_tags(&tags, args.json)?);
        }
        config::Command::Events(args) => {
            let events = read_event_file(&args.file).await?;
            let tags = commands::merged_event_tags(&events, limits)?;
            info!(
                events = events.len(),
                tags = tags.len(),
                "Resolved invalidation tags for event file"
            );
            println!("{}", commands::render_tags(&tags, args.json)?);
        }
        config::Command::CheckConfig => {
            println!("{}", commands::settings_summary(&settings));
        }
    }

    Ok(())
}
