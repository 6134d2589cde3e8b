//! Sheet Schema CLI
//!
//! Inspect configured tables, check sheet headers for drift, and try out
//! forks. Forks live only for the duration of the command; schemas are
//! defined in config.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sheet_schemas::SchemaConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheet-schema")]
#[command(about = "Versioned field-to-header schemas for spreadsheet tables")]
struct Cli {
    /// Config file (added on top of sheet-schemas.toml and SHEET_SCHEMAS__* variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables and their active versions
    Tables,

    /// List the versions of a table
    Versions {
        table: String,
    },

    /// Print the header row of a table
    Headers {
        table: String,
        /// Version to print (default: active)
        #[arg(short, long)]
        version: Option<String>,
    },

    /// Compare actual sheet headers with the active schema
    Drift {
        table: String,
        /// Headers as they appear in the sheet
        headers: Vec<String>,
    },

    /// Decode one row into a JSON record
    Decode {
        table: String,
        /// Comma-separated sheet headers
        #[arg(long, value_delimiter = ',')]
        headers: Vec<String>,
        /// Comma-separated cell values
        #[arg(long, value_delimiter = ',')]
        row: Vec<String>,
    },

    /// Fork the active schema with one more field
    Fork {
        table: String,
        field: String,
        header: String,
        new_version: String,
        /// Switch to the new version afterwards
        #[arg(long)]
        activate: bool,
    },

    /// Compare two versions of a table
    Diff {
        table: String,
        from: String,
        to: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = SchemaConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let mut registry = config.build_registry().context("building registry")?;

    match cli.command {
        Commands::Tables => {
            let tables = registry.tables();
            if tables.is_empty() {
                println!("No tables configured.");
            }
            for table in tables {
                match registry.active_version(table)? {
                    Some(active) => println!("{}  ({})", table, active),
                    None => println!("{}  (no active version)", table),
                }
            }
        }

        Commands::Versions { table } => {
            let active = registry.active_version(&table)?.cloned();
            for entry in registry.entries(&table)? {
                let marker = if Some(&entry.id) == active.as_ref() { " (active)" } else { "" };
                let parent = entry
                    .forked_from
                    .as_ref()
                    .map(|p| format!(" <- {}", p))
                    .unwrap_or_default();
                println!(
                    "{} {} {} {} fields{}{}",
                    entry.id,
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.checksum.short(),
                    entry.schema.len(),
                    parent,
                    marker
                );
            }
        }

        Commands::Headers { table, version } => {
            let headers = match version {
                Some(v) => registry.headers_at(&table, &v)?,
                None => registry.get_headers(&table)?,
            };
            println!("{}", headers.join("\t"));
        }

        Commands::Drift { table, headers } => {
            let changes = registry.detect_schema_changes(&table, headers.as_slice())?;
            if !changes.has_changes {
                println!("No drift: headers match the active schema");
                return Ok(0);
            }
            for missing in &changes.missing {
                println!("missing: {}", missing);
            }
            for extra in &changes.extra {
                println!("extra:   {:?}", extra);
            }
            return Ok(2);
        }

        Commands::Decode { table, headers, row } => {
            let row: Vec<Option<String>> = row.into_iter().map(Some).collect();
            let record = registry.map_row_to_object(&table, headers.as_slice(), row.as_slice())?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        Commands::Fork {
            table,
            field,
            header,
            new_version,
            activate,
        } => {
            registry.add_field(&table, &field, &header, &new_version)?;
            if activate {
                registry.set_version(&table, &new_version)?;
            }
            println!("{}", registry.headers_at(&table, &new_version)?.join("\t"));
        }

        Commands::Diff { table, from, to } => {
            let diff = registry.diff_versions(&table, &from, &to)?;
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
    }

    Ok(0)
}
