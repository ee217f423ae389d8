//! Colloquia batch import CLI
//!
//! Imports every TEI document in a directory into one conference and
//! reports the succeeded/failed path lists, so operators can correct
//! and re-run only the failures.

use clap::Parser;
use colloquia_common::db::schema::create_schema;
use colloquia_common::{AppConfig, Store, VERSION};
use colloquia_ingestion::Importer;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "colloquia-import",
    version,
    about = "Import TEI conference programs into the Colloquia store"
)]
struct Args {
    /// Directory containing the TEI documents
    #[arg(long)]
    dir: PathBuf,

    /// Target conference id
    #[arg(long)]
    conference: Uuid,

    /// Database URL (overrides configuration)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Create the schema before importing (fresh stores only)
    #[arg(long)]
    init_schema: bool,

    /// Emit the outcome as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.observability.log_level.clone()));
    if config.observability.json_logging {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Starting Colloquia import v{}", VERSION);

    let store = Store::connect(&config.database).await?;
    if args.init_schema {
        create_schema(store.conn()).await?;
        info!("Schema created");
    }

    let importer = Importer::new(store.conn().clone(), config.import.clone());
    let outcome = importer.import_directory(&args.dir, args.conference).await?;

    if args.json {
        let report = serde_json::json!({
            "succeeded": outcome
                .succeeded
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>(),
            "failed": outcome
                .failed
                .iter()
                .map(|(p, e)| serde_json::json!({
                    "path": p.display().to_string(),
                    "error": e.to_string(),
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Imported {} document(s), {} failed",
            outcome.succeeded.len(),
            outcome.failed.len()
        );
        for path in &outcome.succeeded {
            println!("  ok   {}", path.display());
        }
        for (path, err) in &outcome.failed {
            println!("  fail {}: {}", path.display(), err);
        }
    }

    if !outcome.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}
