//! `garden`: tend a map of fading memories from the terminal.

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use garden_rs::{init_logging, load_config, marker_line, open_garden};
use garden_rs_core::RecordDraft;
use garden_rs_protocol::{IconId, RecordId};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line options for the garden client.
#[derive(Debug, Parser)]
#[command(name = "garden", version)]
struct Cli {
    /// Optional path to a garden.json5 config applied over the layered config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Record store endpoint, overriding config and GARDEN_ENDPOINT
    #[arg(long, global = true)]
    endpoint: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Open the interactive map (default)
    Map,
    /// Print every memory with its freshness
    List {
        /// Print marker views as JSON
        #[arg(long)]
        json: bool,
    },
    /// Plant a new memory
    Plant {
        #[arg(long, allow_hyphen_values = true)]
        lat: String,
        #[arg(long, allow_hyphen_values = true)]
        lng: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Icon number, 1 to 6
        #[arg(long, default_value_t = 1)]
        icon: u8,
    },
    /// Water a memory so it is fully fresh again
    Water {
        /// Record id (its creation timestamp)
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Map);
    // the map owns the terminal; keep log output off it unless asked for
    if command != Command::Map || std::env::var_os("RUST_LOG").is_some() {
        init_logging();
    }
    info!(
        "starting garden (config_set={}, endpoint_set={}, command={:?})",
        cli.config.is_some(),
        cli.endpoint.is_some(),
        command
    );

    let cwd = std::env::current_dir().context("cwd")?;
    let config = load_config(&cwd, cli.config.as_deref(), cli.endpoint.as_deref())?;
    let garden = Arc::new(open_garden(config)?);

    match command {
        Command::Map => garden_rs_tui::run(garden).await?,
        Command::List { json } => {
            garden.load().await.context("failed to load memories")?;
            let markers = garden.markers();
            if json {
                println!("{}", serde_json::to_string_pretty(&markers)?);
            } else {
                for marker in &markers {
                    println!("{}", marker_line(marker));
                }
            }
        }
        Command::Plant {
            lat,
            lng,
            title,
            body,
            icon,
        } => {
            let icon = IconId::from_number(icon)
                .ok_or_else(|| anyhow!("icon must be between 1 and 6 (got {icon})"))?;
            let draft = RecordDraft {
                lat,
                lng,
                title,
                body,
                icon,
            };
            let record = garden.plant(&draft).await.context("failed to plant memory")?;
            println!("Saved! {}", record.id);
        }
        Command::Water { id } => {
            let at = garden
                .water(&RecordId::new(id))
                .await
                .context("failed to water memory")?;
            println!("Watered at {}", at.to_rfc3339());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_to_map() {
        let cli = Cli::try_parse_from(["garden"]).expect("parse");
        assert_eq!(cli.command, None);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_plant_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "garden",
            "plant",
            "--lat",
            "12.5",
            "--lng",
            "-7.25",
            "--title",
            "A",
            "--icon",
            "3",
            "--endpoint",
            "http://localhost:9/exec",
        ])
        .expect("parse");
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9/exec"));
        assert_eq!(
            cli.command,
            Some(Command::Plant {
                lat: "12.5".to_string(),
                lng: "-7.25".to_string(),
                title: "A".to_string(),
                body: String::new(),
                icon: 3,
            })
        );
    }

    #[test]
    fn parses_list_and_water() {
        let cli = Cli::try_parse_from(["garden", "list", "--json"]).expect("parse");
        assert_eq!(cli.command, Some(Command::List { json: true }));
        let cli = Cli::try_parse_from(["garden", "water", "2025-03-01T10:00:00.000Z"])
            .expect("parse");
        assert_eq!(
            cli.command,
            Some(Command::Water {
                id: "2025-03-01T10:00:00.000Z".to_string()
            })
        );
    }

    #[test]
    fn water_requires_an_id() {
        assert!(Cli::try_parse_from(["garden", "water"]).is_err());
    }
}
