//! CLI entry point for folio

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::Folio;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "A Markdown-driven personal blog server", long_about = None)]
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
    /// Start the blog server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (defaults to server.ip)
        #[arg(short, long)]
        ip: Option<String>,

        /// Rebuild the content index on file changes
        #[arg(short, long)]
        watch: bool,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// List site information
    List {
        /// Type of content to list (post, tag, category)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Print sitemap.xml
    Sitemap,

    /// Print robots.txt
    Robots {
        /// Host used for the sitemap line (defaults to the site url)
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the table of contents of an article
    Toc {
        /// Article slug, e.g. rust/ownership
        slug: String,
    },

    /// Run the SEO audit over every page
    Audit {
        /// Fail when any page scores below this
        #[arg(long, default_value = "0")]
        min_score: u32,

        /// Print full markdown reports
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show site statistics
    Stats,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "folio=debug,info"
    } else {
        "folio=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    if let Commands::Version = cli.command {
        println!("folio version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let folio = Folio::new(&base_dir)?;

    match cli.command {
        Commands::Serve {
            port,
            ip,
            watch,
            open,
        } => {
            let ip = ip.unwrap_or_else(|| folio.config.server.ip.clone());
            let port = port.unwrap_or(folio.config.server.port);
            folio.serve(&ip, port, watch, open).await?;
        }

        Commands::List { r#type } => folio.list(&r#type)?,

        Commands::Sitemap => folio::commands::docs::sitemap(&folio)?,

        Commands::Robots { host } => folio::commands::docs::robots(&folio, host.as_deref())?,

        Commands::Toc { slug } => folio::commands::docs::toc(&folio, &slug)?,

        Commands::Audit { min_score, verbose } => {
            folio::commands::audit::run(&folio, min_score, verbose).await?
        }

        Commands::Stats => folio::commands::stats::run(&folio)?,

        Commands::Version => {}
    }

    Ok(())
}
