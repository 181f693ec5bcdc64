//! CLI entry point for postindex

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postindex::config::Mode;
use postindex::{commands, server, Site};

#[derive(Parser)]
#[command(name = "postindex")]
#[command(version)]
#[command(
    about = "Index a directory of markdown posts into an ordered, linked collection",
    long_about = None
)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Show drafts (development mode)
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest posts and write the snapshot
    #[command(alias = "b")]
    Build,

    /// List indexed posts
    List {
        /// Read the last snapshot instead of the posts directory
        #[arg(long)]
        cached: bool,
    },

    /// Show a single post
    Show {
        /// Slug of the post
        slug: String,
    },

    /// Build, then rebuild on every change
    #[command(alias = "w")]
    Watch,

    /// Serve the index as JSON
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Disable file watching
        #[arg(long)]
        no_watch: bool,
    },

    /// Create a new draft post
    New {
        /// Title of the new post
        title: String,
    },

    /// Remove the snapshot file
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postindex=debug,info"
    } else {
        "postindex=info"
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

    let open_site = || -> Result<Site> {
        let site = Site::new(&base_dir)?;
        Ok(if cli.dev {
            site.with_mode(Mode::Development)
        } else {
            site
        })
    };

    match cli.command {
        Commands::Build => {
            let site = open_site()?;
            tracing::info!("Indexing {:?} ({} mode)", site.posts_dir, site.mode.as_str());
            let report = commands::build::run(&site)?;
            println!("{}", commands::build::summary(&report));
            println!("Wrote {:?}", site.cache_path);
        }

        Commands::List { cached } => {
            let site = open_site()?;
            commands::list::run(&site, cached)?;
        }

        Commands::Show { slug } => {
            let site = open_site()?;
            commands::show::run(&site, &slug)?;
        }

        Commands::Watch => {
            let site = open_site()?;
            tokio::task::spawn_blocking(move || commands::watch::run(&site)).await??;
        }

        Commands::Serve { port, ip, no_watch } => {
            let site = open_site()?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&site, &ip, port, !no_watch).await?;
        }

        Commands::New { title } => {
            let site = open_site()?;
            let path = commands::new::create_post(&site, &title)?;
            println!("Created: {:?}", path);
        }

        Commands::Clean => {
            let site = open_site()?;
            if commands::clean::run(&site)? {
                println!("Cleaned successfully!");
            } else {
                println!("Nothing to clean");
            }
        }

        Commands::Version => {
            println!("postindex version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
