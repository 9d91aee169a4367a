//! CLI entry point for ignite-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ignite_blog::Blog;

#[derive(Parser)]
#[command(name = "ignite-blog")]
#[command(author = "Vitor Franco")]
#[command(version)]
#[command(about = "A blog front-end that renders posts from a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Read documents from a JSON file instead of the CMS
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Read documents from a JSON file instead of the CMS
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Clean the public folder
    Clean,

    /// List every post in the CMS
    List {
        /// Read documents from a JSON file instead of the CMS
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn load_blog(base_dir: &Path, fixtures: Option<&Path>) -> Result<Blog> {
    match fixtures {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            };
            Blog::from_fixtures(base_dir, path)
        }
        None => Blog::new(base_dir),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "ignite_blog=debug,info"
    } else {
        "ignite_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            ignite_blog::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::Generate { fixtures } => {
            let blog = load_blog(&base_dir, fixtures.as_deref())?;
            tracing::info!("Generating static files...");
            ignite_blog::commands::generate::run(&blog).await?;
            println!("Generated successfully!");
        }

        Commands::Server {
            port,
            ip,
            open,
            fixtures,
        } => {
            let blog = load_blog(&base_dir, fixtures.as_deref())?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            ignite_blog::server::start(&blog, &ip, port, open).await?;
        }

        Commands::Clean => {
            let config = Blog::load_config(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            ignite_blog::commands::clean::run(&base_dir.join(&config.public_dir))?;
            println!("Cleaned successfully!");
        }

        Commands::List { fixtures } => {
            let blog = load_blog(&base_dir, fixtures.as_deref())?;
            ignite_blog::commands::list::run(&blog).await?;
        }

        Commands::Version => {
            println!("ignite-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
