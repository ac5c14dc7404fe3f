//! Atelier CLI: upload, remove and probe files against the configured store.
//!
//! Storage settings come from the environment (see `UploadConfig::from_env`).
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::Context;
use atelier_cli::{init_tracing, read_upload_file};
use atelier_core::{AccessLocator, StorageBackend, UploadConfig, UploadFile, UploadStrategy};
use atelier_storage::create_storage;
use atelier_upload::UploadService;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "atelier", about = "Atelier upload diagnostics")]
struct Cli {
    /// Override STORAGE_BACKEND (s3, local, memory)
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files in order, stopping at the first failure
    Upload {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Destination folder (defaults to UPLOAD_DEFAULT_FOLDER)
        #[arg(long)]
        folder: Option<String>,
        /// Retry blocked uploads once on the folder-less fallback path
        #[arg(long)]
        fallback: bool,
    },
    /// Upload a 3D asset (.glb or .gltf)
    UploadModel {
        /// Path to the model file
        file: PathBuf,
    },
    /// Delete a stored file by its access locator (best effort)
    Remove {
        /// Access locator returned by an upload
        locator: String,
    },
    /// Store a small probe object through the fallback-capable path, then remove it
    Probe {
        /// Folder to probe
        #[arg(long)]
        folder: Option<String>,
    },
}

#[derive(Serialize)]
struct UploadReport {
    locators: Vec<AccessLocator>,
}

#[derive(Serialize)]
struct ProbeReport {
    backend: StorageBackend,
    folder: String,
    locator: AccessLocator,
    duration_ms: f64,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = UploadConfig::from_env().context("Failed to load upload configuration")?;
    if let Some(backend) = cli.backend.as_deref() {
        config.storage_backend = backend.parse::<StorageBackend>()?;
        config.validate()?;
    }

    let store = create_storage(&config)
        .await
        .context("Failed to create storage backend")?;
    let service = UploadService::new(store, config);

    match cli.command {
        Commands::Upload {
            files,
            folder,
            fallback,
        } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_upload_file(path).await?);
            }
            let strategy = if fallback {
                UploadStrategy::WithFallback
            } else {
                UploadStrategy::Direct
            };

            let locators = service
                .upload_all(uploads, folder.as_deref(), strategy)
                .await?;
            print_json(&UploadReport { locators })?;
        }
        Commands::UploadModel { file } => {
            let upload = read_upload_file(&file).await?;
            let locator = service.upload_model(upload).await?;
            print_json(&UploadReport {
                locators: vec![locator],
            })?;
        }
        Commands::Remove { locator } => {
            service.remove(&locator).await;
            tracing::info!(locator = %locator, "Remove requested");
        }
        Commands::Probe { folder } => {
            let folder = folder.unwrap_or_else(|| service.config().default_folder.clone());
            let probe = UploadFile::new(
                b"atelier probe".to_vec(),
                format!("probe-{}.txt", uuid::Uuid::new_v4()),
                "text/plain",
            );

            let start = Instant::now();
            let locator = service
                .upload_all(vec![probe], Some(folder.as_str()), UploadStrategy::WithFallback)
                .await?
                .into_iter()
                .next()
                .context("Probe upload returned no locator")?;
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

            service.remove(locator.as_str()).await;

            print_json(&ProbeReport {
                backend: service.store().backend_type(),
                folder,
                locator,
                duration_ms,
            })?;
        }
    }

    Ok(())
}
