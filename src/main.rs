mod config;
mod http_server;
mod logging;
mod ports;
mod services;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config,
    http_server::{
        app::HttpServerConfig,
        state::{AppState, DynYoutubeService},
    },
    logging::init_tracing,
    services::youtube::{
        YoutubeService,
        matcher::DurationInput,
        search::YoutubeSearchAdapter,
        types::SongQuery,
        ytdlp::YtDlpAdapter,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "YTUNE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `ytune_backend=debug,tower_http=info`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// OTLP collector endpoint to export traces to
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// The address to listen on
        #[arg(long, default_value = "0.0.0.0", env = "HOST")]
        host: String,

        /// The port to run the server on
        #[arg(short, long, default_value = "5000", env = "PORT")]
        port: u16,
    },
    /// Find the best matching video for a song and print it as JSON
    Search {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        artist: String,

        /// Expected duration in seconds or as M:SS / H:MM:SS
        #[arg(short, long)]
        duration: Option<String>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn build_service(config: &Config) -> DynYoutubeService {
    YoutubeService::new(
        Box::new(YoutubeSearchAdapter::new()),
        Box::new(YtDlpAdapter::new(
            config.yt_dlp_path(),
            config.cookies_file_path(),
            config.yt_dlp_timeout(),
        )),
        config.service_options(),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(
        env!("CARGO_PKG_NAME"),
        args.otlp_endpoint.as_deref(),
        &args.log_level,
    )?;

    let result = run(args).await;

    if let Some(tracer_provider) = tracer_provider
        && let Err(e) = tracer_provider.shutdown()
    {
        eprintln!("Failed to flush traces: {e}");
    }

    result
}

async fn run(args: Args) -> Result<()> {
    tracing::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load ytune config")?;

    match args.command {
        Commands::Serve { host, port } => {
            tracing::info!("Starting YTune backend on {}:{}", host, port);
            http_server::app::start(HttpServerConfig {
                host,
                port,
                state: AppState {
                    youtube: build_service(&config),
                },
            })
            .await?;
        }
        Commands::Search {
            title,
            artist,
            duration,
        } => {
            let duration_secs = duration.and_then(|d| DurationInput::Text(d).to_seconds());
            let query = SongQuery::new(title, artist, duration_secs);
            match build_service(&config).search_song(&query).await? {
                Some(song) => println!("{}", serde_json::to_string_pretty(&song)?),
                None => {
                    return Err(color_eyre::eyre::eyre!(
                        "No videos found for '{}' by '{}'",
                        query.title,
                        query.artist
                    ));
                }
            }
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}
