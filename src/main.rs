use clap::{Parser, Subcommand};
use snaplink::commands::{self, ClientCommands};
use snaplink::config::{Config, LogFormat};
use snaplink::error::AppResult;
use snaplink::server;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// snaplink - A deduplicating URL shortener
#[derive(Parser, Debug)]
#[command(name = "snaplink")]
#[command(version)]
#[command(about = "A deduplicating URL shortener", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Server {
        /// Host to bind to (overrides SERVER_HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides SERVER_PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Talk to a running server and manage the local history
    Client {
        #[command(subcommand)]
        client_command: ClientCommands,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    init_tracing(config.logging.format);

    match cli.command {
        Commands::Server { host, port } => {
            let explicit_base_url = std::env::var("BASE_URL").is_ok();

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            // Re-compute base_url after CLI overrides
            if !explicit_base_url {
                config.url.base_url = config.server.default_base_url();
            }

            let addr = config.server.bind_addr();
            server::run_server(config, addr).await
        }
        Commands::Client { client_command } => commands::run(config, client_command).await,
    }
}
