mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blog-kit")]
#[command(version, about = "Static site generator for Prismic-backed blogs", long_about = None)]
struct Cli {
    /// Log requests and pagination steps (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create a blog.toml in an existing directory
    Init {
        /// Path to blog directory
        path: PathBuf,

        /// Site title
        #[arg(long)]
        title: Option<String>,

        /// Prismic API endpoint, e.g. https://my-repo.cdn.prismic.io/api/v2
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Validate blog configuration
    Validate {
        /// Path to blog directory
        path: PathBuf,
    },

    /// Preview site locally, rendering from Prismic on every request
    Preview {
        /// Path to blog directory
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Build the static site
    Build {
        /// Path to blog directory
        path: PathBuf,

        /// Output directory for generated site
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Page through posts in the terminal
    Browse {
        /// Path to blog directory
        path: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Init {
            path,
            title,
            endpoint,
        } => commands::init::run(path, title, endpoint).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Build { path, output } => commands::build::run(path, output).await,
        Command::Browse { path } => commands::browse::run(path).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "blog-kit", &mut io::stdout());
            Ok(())
        }
    }
}
