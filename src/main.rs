use anyhow::{Context, Result};
use chronofeed::build::{build_site, derive_routes, Cancellation};
use chronofeed::config::Config;
use chronofeed::parser::FileSystemStore;
use chronofeed::route::RouteKind;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Turns a directory of dated, tagged markdown documents into page routes and
/// syndication feeds.
#[derive(Parser)]
#[command(name = "chronofeed", version)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Build the site and write it to the output directory
    Build {
        /// Directory in which to look for chronofeed.yaml (or any parent)
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "public")]
        output: PathBuf,
    },

    /// Print the route table without writing anything
    Routes {
        /// Directory in which to look for chronofeed.yaml (or any parent)
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancellation = Cancellation::new();
    let handler_cancellation = cancellation.clone();
    ctrlc::set_handler(move || handler_cancellation.cancel())
        .context("Failed to set Ctrl+C handler")?;

    match cli.command {
        Command::Build { project, output } => {
            let config = Config::from_directory(&project, &output)?;
            let routes = build_site(&config, &cancellation)?;
            println!(
                "Wrote {} routes to {}",
                routes.len(),
                config.output_directory.display()
            );
        }
        Command::Routes { project } => {
            let config = Config::from_directory(&project, Path::new("public"))?;
            let store = FileSystemStore::new(&config.content_directory);
            for route in derive_routes(&store, &config.site, &cancellation)? {
                let kind = match route.kind() {
                    RouteKind::Page => "page",
                    RouteKind::Feed => "feed",
                };
                println!("{}\t{}", kind, route.path);
            }
        }
    }

    Ok(())
}
