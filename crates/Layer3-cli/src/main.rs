//! Kiln CLI - Main entry point

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use kiln_core::bootstrap::{platform_manifest, BootstrapLoader, BootstrapObserver, BootstrapSink};
use kiln_core::loader::{HttpTransport, ResourceLoader};
use kiln_core::registry::{ClassRegistry, Namespace};
use kiln_core::{LoadOutcome, ResourceLoadTask};
use kiln_foundation::{install_fatal_sink, FatalReport, FatalSink, KilnConfig, KILN_CONFIG_FILE};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Kiln - dependency-ordered module loading for the terminal
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to kiln.toml (defaults to ./kiln.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL override for resource fetches
    #[arg(long)]
    base_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the one-shot bootstrap over a manifest
    Bootstrap {
        /// Manifest JSON path (defaults to the built-in platform manifest)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Write fetched resources into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Load a single namespace and report the outcome
    Load {
        /// Dot-delimited namespace, e.g. app.screen.Home
        namespace: String,

        /// Resource kind: class, style, template, remote_proc
        #[arg(short, long, default_value = "class")]
        kind: String,
    },
    /// Print the URL a namespace resolves to, without fetching
    Url {
        /// Dot-delimited namespace
        namespace: String,

        /// Resource kind: class, style, template, remote_proc
        #[arg(short, long, default_value = "class")]
        kind: String,
    },
}

// ============================================================================
// Fatal sink / bootstrap consumers
// ============================================================================

/// Prints fatal reports to stderr; the CLI's stand-in for a UI mask.
struct StderrSink;

impl FatalSink for StderrSink {
    fn on_fatal(&self, report: &FatalReport) {
        eprintln!("FATAL [{}]: {}", report.source, report.message);
    }
}

/// Progress lines in the shape of the platform's load indicator.
struct ProgressPrinter;

impl BootstrapObserver for ProgressPrinter {
    fn on_resource_loaded(&self, id: &str, percent: f64) {
        println!("{id} loaded... {percent:.2} %");
    }
}

/// Writes fetched bundles to a local directory.
struct DirSink {
    out_dir: PathBuf,
}

impl DirSink {
    fn write(&self, id: &str, extension: &str, source: &str) -> kiln_foundation::Result<()> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{id}.{extension}"));
        std::fs::write(&path, source)?;
        debug!(path = %path.display(), "wrote bootstrap resource");
        Ok(())
    }
}

impl BootstrapSink for DirSink {
    fn install_script(&self, id: &str, source: &str) -> kiln_foundation::Result<()> {
        self.write(id, "js", source)
    }

    fn install_stylesheet(&self, id: &str, source: &str) -> kiln_foundation::Result<()> {
        self.write(id, "css", source)
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);
    install_fatal_sink(Arc::new(StderrSink));

    let config = load_config(&args)?;
    let transport = Arc::new(HttpTransport::new(&config)?);

    match args.command {
        Command::Bootstrap { manifest, out_dir } => {
            let tasks = match manifest.or(config.bootstrap_manifest.clone()) {
                Some(path) => read_manifest(&path)?,
                None => platform_manifest(),
            };

            let mut loader = BootstrapLoader::new(transport).with_observer(Arc::new(ProgressPrinter));
            if let Some(out_dir) = out_dir {
                loader = loader.with_sink(Arc::new(DirSink { out_dir }));
            }

            let report = loader.run(&tasks).await?;
            if report.is_complete() {
                println!("bootstrap complete: {} resources", report.total);
            } else {
                bail!(
                    "bootstrap incomplete, unschedulable tasks: {}",
                    report.pending.join(", ")
                );
            }
        }
        Command::Load { namespace, kind } => {
            let registry = Arc::new(ClassRegistry::new());
            let kind = registry
                .catalog()
                .by_name(&kind)
                .with_context(|| format!("unknown kind '{kind}'"))?;
            let namespace = Namespace::new(namespace)?;

            let loader = ResourceLoader::new(registry, transport);
            loader
                .load_async(
                    &namespace,
                    &kind,
                    Box::new(|loaded, outcome| match outcome {
                        LoadOutcome::Fetched(payload) => {
                            println!("{loaded}: fetched {} bytes", payload.len())
                        }
                        LoadOutcome::AlreadyRegistered => {
                            println!("{loaded}: already registered")
                        }
                        LoadOutcome::AlreadyResolvable => {
                            println!("{loaded}: resolved in memory, registered without hooks")
                        }
                    }),
                )
                .await?;
        }
        Command::Url { namespace, kind } => {
            let catalog = kiln_core::registry::KindCatalog::standard();
            let kind = catalog
                .by_name(&kind)
                .with_context(|| format!("unknown kind '{kind}'"))?;
            let namespace = Namespace::new(namespace)?;
            println!("{}{}", config.base_url, kind.url_for(&namespace));
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> anyhow::Result<KilnConfig> {
    let mut config = match &args.config {
        Some(path) => KilnConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None if std::path::Path::new(KILN_CONFIG_FILE).exists() => {
            KilnConfig::from_file(KILN_CONFIG_FILE)?
        }
        None => KilnConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn read_manifest(path: &PathBuf) -> anyhow::Result<Vec<ResourceLoadTask>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let tasks: Vec<ResourceLoadTask> = serde_json::from_str(&raw)?;
    Ok(tasks)
}
