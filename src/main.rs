use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use picbed::config;
use picbed::host::{registry, HostType};
use picbed::upload::{NoopCompressor, UploadObserver, UploadSource};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")");

#[derive(Parser)]
#[command(name = "picbed", version = VERSION, about = "Upload images to configured image hosts")]
struct Cli {
    /// Path to config.json (defaults to $PICBED_CONFIG, then ./config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one or more files and print their public URLs
    Upload {
        /// Host id (defaults to the configured default host)
        #[arg(long)]
        host: Option<String>,
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List configured hosts
    Hosts,
    /// Show the configuration fields of a host type
    Fields {
        /// Host type code, e.g. 9 for Amazon S3
        #[arg(allow_hyphen_values = true)]
        code: i32,
    },
}

/// Console observer / 控制台输出
struct ConsoleObserver {
    file: String,
}

impl UploadObserver for ConsoleObserver {
    fn on_start(&self) {
        tracing::debug!("Uploading {}", self.file);
    }

    fn on_progress(&self, fraction: f64) {
        tracing::debug!("{}: {:.0}%", self.file, fraction * 100.0);
    }

    fn on_completed(&self, url: &str) {
        println!("{}", url);
    }

    fn on_failed(&self, message: &str) {
        eprintln!("{}: {}", self.file, message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "picbed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration / 加载配置
    let config_path = config::get_config_path(cli.config);
    let app_config = config::load_config(&config_path).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Upload { host, files } => {
            let entry = app_config
                .find_host(host.as_deref())
                .ok_or_else(|| anyhow!("No image host configured in {:?}", config_path))?;
            let host = entry.to_host();
            tracing::info!("Using image host {} ({})", host.name, host.host_type);

            let mut context = app_config
                .uploader_context(Arc::new(NoopCompressor))
                .map_err(|e| anyhow!(e))?;

            // Ctrl-C cancels in-flight uploads / Ctrl-C 取消上传
            let cancel = CancellationToken::new();
            context.cancel = Some(cancel.clone());
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupted, cancelling uploads");
                    cancel.cancel();
                }
            });

            let manager = picbed::create_uploader_manager(context).await;
            let uploads = files.into_iter().map(|file| {
                let observer = Arc::new(ConsoleObserver {
                    file: file.display().to_string(),
                });
                manager.upload(Some(&host), UploadSource::File(file), observer)
            });
            let results = join_all(uploads).await;

            let failed = results.iter().filter(|r| r.is_err()).count();
            if failed > 0 {
                return Err(anyhow!("{} of {} uploads failed", failed, results.len()));
            }
        }
        Commands::Hosts => {
            if app_config.hosts.is_empty() {
                println!("No image hosts configured in {:?}", config_path);
            }
            let default = app_config.find_host(None).map(|h| h.id.clone());
            for entry in &app_config.hosts {
                let host = entry.to_host();
                let marker = if default.as_deref() == Some(entry.id.as_str()) { "*" } else { " " };
                let missing = host
                    .data
                    .as_ref()
                    .map(|data| data.missing_required())
                    .unwrap_or_default();
                if missing.is_empty() {
                    println!("{} {}\t{}\t{}", marker, host.id, host.name, host.host_type);
                } else {
                    println!(
                        "{} {}\t{}\t{}\t(missing: {})",
                        marker,
                        host.id,
                        host.name,
                        host.host_type,
                        missing.join(", ")
                    );
                }
            }
        }
        Commands::Fields { code } => {
            let host_type = HostType::from_code(code)
                .ok_or_else(|| anyhow!("Unknown host type code: {}", code))?;
            match registry::create(host_type) {
                Some(config) => {
                    let items = serde_json::to_string_pretty(&config.items())
                        .context("Failed to serialize config items")?;
                    println!("{}", items);
                }
                None => println!("{} needs no configuration", host_type),
            }
        }
    }

    Ok(())
}
