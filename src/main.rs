//! Event planner command line entry point.

mod cli;

use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand};
use event_planner_lib::catalog::SelfTestReport;
use event_planner_lib::config::ConfigStore;
use event_planner_lib::models::{AddToPlanner, Event};
use event_planner_lib::page::{DiningSearchForm, EventSearchForm};
use event_planner_lib::planner::RemoveOutcome;
use event_planner_lib::render::NO_EVENTS_MESSAGE;
use event_planner_lib::{App, SearchOutcome};

fn setup_logging(cli_log_level: Option<&str>) {
    let filter = match cli_log_level {
        Some(level) => EnvFilter::new(level.to_lowercase()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    let store = match &cli.config {
        Some(path) => ConfigStore::load_from(path),
        None => ConfigStore::load(),
    }
    .context("failed to load configuration")?;

    if let Command::Config { command } = &cli.command {
        return run_config(&store, command);
    }

    let config = store.read().with_env();
    let app = App::from_config(&config).context("failed to start planner")?;

    let explicit_self_test = matches!(cli.command, Command::SelfTest);
    if config.self_test_on_startup && !cli.no_self_test && !explicit_self_test {
        app.self_test().await;
    }

    let result = dispatch(&app, cli.command).await;

    if let Some(path) = &cli.html {
        fs::write(path, app.render().await)
            .with_context(|| format!("failed to write page to {}", path.display()))?;
        info!("page written to {}", path.display());
    }

    result
}

fn run_config(store: &ConfigStore, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let mut config = store.read().with_env();
            if config.catalog_api_key.is_some() {
                config.catalog_api_key = Some("********".to_string());
            }
            println!("# {}", store.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::SetApiKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            store
                .update(|config| config.catalog_api_key = Some(key.to_string()))
                .context("failed to save configuration")?;
            println!("API key saved to {}", store.path().display());
        }
    }
    Ok(())
}

async fn dispatch(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Search {
            location,
            event_type,
            date,
        } => {
            let form = EventSearchForm {
                location,
                event_type,
                date_range: date,
            };
            match app.handle_event_search(&form).await {
                Ok(SearchOutcome::Applied(events)) => print_events(&events),
                Ok(SearchOutcome::Superseded) => {}
                Err(err) => bail!(err.user_message()),
            }
        }
        Command::Dining { location, cuisine } => {
            app.handle_dining_search(&DiningSearchForm { location, cuisine })
                .await;
            println!("{}", app.page().await.dining_results);
        }
        Command::Add {
            id,
            name,
            date,
            venue,
        } => {
            app.add_to_planner(AddToPlanner {
                id,
                name,
                date,
                venue,
            })
            .await;
            for notice in app.take_notices().await {
                println!("{notice}");
            }
        }
        Command::Remove { id } => match app.remove_from_planner(&id).await {
            RemoveOutcome::Removed(entry) => println!("Removed \"{}\" from your planner", entry.name),
            RemoveOutcome::Absent => println!("{id} is not in your planner"),
        },
        Command::Planner => {
            let entries = app.planner_entries().await;
            if entries.is_empty() {
                println!("Your planner is empty.");
            }
            for entry in entries {
                println!("{}  {}", entry.id, entry.name);
                println!("    {} | {}", entry.date, entry.venue);
            }
        }
        Command::Page => {
            println!("{}", app.render().await);
        }
        Command::SelfTest => match app.self_test().await {
            SelfTestReport::Passed { count, first } => {
                println!("Catalog OK: {count} events, first is \"{first}\"")
            }
            SelfTestReport::NoEvents => println!("Catalog reachable but returned no events"),
            SelfTestReport::Failed(reason) => bail!("catalog self-test failed: {reason}"),
        },
        Command::Config { .. } => {}
    }
    Ok(())
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("{NO_EVENTS_MESSAGE}");
        return;
    }
    for event in events {
        println!("{}  {}", event.id, event.name);
        println!(
            "    {} {} | {} | {}",
            event.date_label(),
            event.time_label(),
            event.venue_label(),
            event.price_label()
        );
    }
}
