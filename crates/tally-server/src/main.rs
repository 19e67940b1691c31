//! `tally` — sales ingestion and analysis.
//!
//! Reads `tally.toml` (or the path given with `--config`) and `TALLY_*`
//! environment variables, opens the SQLite store, then either serves the JSON
//! API or runs one pipeline step and prints the result as JSON.
//!
//! ```text
//! tally serve
//! tally import products produits.csv
//! tally import-all
//! tally analyze
//! tally list analysis_log
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tally_core::{analysis::AnalysisStatus, table::Table};
use tally_server::{AppPipeline, ServerConfig};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally sales pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API.
  Serve,
  /// Import one source into one table.
  Import {
    /// products, stores or sales.
    table:  Table,
    /// A name below the data directory or an http(s) URL.
    source: String,
  },
  /// Import the configured stores, products and sales extracts, in order.
  ImportAll,
  /// Run every analysis and record the non-empty results.
  Analyze,
  /// List the tables present in storage.
  Tables,
  /// Print every row of a table.
  List { table: Table },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let config = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read configuration from {:?}", cli.config))?;
  let pipeline = tally_server::pipeline(&config).await?;

  match cli.command {
    Command::Serve => serve(&config, pipeline).await,
    Command::Import { table, source } => {
      let report = pipeline
        .run_ingestion(table, &source)
        .await
        .with_context(|| format!("failed to import {source} into {table}"))?;
      print_json(&report)
    }
    Command::ImportAll => import_all(&config, &pipeline).await,
    Command::Analyze => analyze(&pipeline).await,
    Command::Tables => print_json(&pipeline.list_table_names().await?),
    Command::List { table } => print_json(&pipeline.list(table).await?),
  }
}

async fn serve(config: &ServerConfig, pipeline: AppPipeline) -> anyhow::Result<()> {
  let app = tally_api::api_router(pipeline).layer(TraceLayer::new_for_http());
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn import_all(config: &ServerConfig, pipeline: &AppPipeline) -> anyhow::Result<()> {
  let outcomes = pipeline.import_all(&config.sources.ordered()).await;

  let mut failed = 0;
  let summary: Vec<_> = outcomes
    .iter()
    .map(|o| match &o.result {
      Ok(report) => json!({ "table": o.table, "source": o.source_name, "report": report }),
      Err(e) => {
        failed += 1;
        json!({ "table": o.table, "source": o.source_name, "error": e.to_string() })
      }
    })
    .collect();
  print_json(&summary)?;

  anyhow::ensure!(failed == 0, "{failed} of {} imports failed", outcomes.len());
  Ok(())
}

async fn analyze(pipeline: &AppPipeline) -> anyhow::Result<()> {
  let reports = pipeline.run_all_analyses().await;
  print_json(&reports)?;

  let failed = reports
    .iter()
    .filter(|r| matches!(r.status, AnalysisStatus::Failed { .. }))
    .count();
  anyhow::ensure!(failed == 0, "{failed} of {} analyses failed", reports.len());
  Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
