use clap::{Parser, Subcommand};
use demo_museum::config::{self, MuseumConfig};
use demo_museum::events::Event;
use demo_museum::pipeline::{self, PipelineError};
use demo_museum::runner::SystemRunner;
use demo_museum::{output, scan};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

#[derive(Parser)]
#[command(name = "demo-museum")]
#[command(about = "Build a gallery of demo directories into static output")]
#[command(long_about = "\
Build a gallery of demo directories into static output

Every sub-directory of the content root is a demo. Its metadata comes from
a demo.json sidecar, YAML front-matter in its main markdown document, or is
inferred from its files. Each demo is built by type, and an index.json is
written for the gallery front-end.

Content structure:

  demos/
  ├── particle-sim/            # web-app: vite.config.* or package.json + index.html
  │   ├── demo.json            # Sidecar metadata (highest precedence)
  │   ├── package.json         # → pnpm install && pnpm build
  │   └── src/
  ├── markdown-essay/          # markdown: any non-readme .md
  │   └── index.md             # Front-matter read from index/content/main.md first
  ├── openai-chat-example/     # chat: name contains \"chat\"
  ├── research-agents/         # research: name contains \"research\"
  └── sorting-snippet/         # code-snippet: source files only
      └── sort.py

Metadata resolution (per field, first available wins):
  demo.json → front-matter → inference → default

Run 'demo-museum gen-config' to generate a documented museum.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing museum.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Content directory, relative to --root (overrides content_dir)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory, relative to --root (overrides output_dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Show debug diagnostics
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the demos found in the content directory
    Scan,
    /// Resolve every demo's metadata without writing anything
    Check,
    /// Write the index without building demos
    Index,
    /// Run the full pipeline: scan → resolve → index → gallery → demos
    Build,
    /// Print a stock museum.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;
    let root = cli.root.as_path();

    match cli.command {
        Command::Scan => {
            let config = prepare(&cli)?;
            let content = config.content_path(root);
            let items = scan::scan(&content);
            output::print_scan_output(&items, &content);
        }
        Command::Check => {
            let config = prepare(&cli)?;
            println!("==> Checking {}", config.content_path(root).display());
            let (tx, printer) = spawn_printer(cli.quiet);
            let discovery = pipeline::discover(root, &config, &tx);
            finish_printer(tx, printer);
            output::print_check_output(&discovery.metadata);
        }
        Command::Index => {
            let config = prepare(&cli)?;
            let (tx, printer) = spawn_printer(cli.quiet);
            let result = pipeline::write_index_only(root, &config, &tx);
            finish_printer(tx, printer);
            result?;
        }
        Command::Build => {
            let config = prepare(&cli)?;
            println!("==> Building {}", config.content_path(root).display());
            let (tx, printer) = spawn_printer(cli.quiet);
            let result = pipeline::run(root, &config, &SystemRunner, &tx);
            finish_printer(tx, printer);
            let summary = result?;
            println!();
            output::print_summary(&summary);
            println!("==> Build complete: {}", config.output_path(root).display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config and size the worker pool from it.
fn prepare(cli: &Cli) -> Result<MuseumConfig, PipelineError> {
    let config = load_config(cli)?;
    init_thread_pool(&config.processing);
    Ok(config)
}

/// Load `museum.toml` and apply the `--source` / `--output` overrides.
fn load_config(cli: &Cli) -> Result<MuseumConfig, PipelineError> {
    let mut config = config::load_config(&cli.root)?;
    if let Some(source) = &cli.source {
        config.content_dir = path_setting(source);
    }
    if let Some(output) = &cli.output {
        config.output_dir = path_setting(output);
    }
    Ok(config)
}

fn path_setting(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("MUSEUM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| format!("failed to initialize tracing subscriber: {e}"))?;
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Drain pipeline events on a separate thread, printing each one.
fn spawn_printer(quiet: bool) -> (Sender<Event>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<Event>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            if quiet {
                continue;
            }
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

fn finish_printer(tx: Sender<Event>, printer: JoinHandle<()>) {
    drop(tx);
    if printer.join().is_err() {
        tracing::error!("event printer panicked");
    }
}
