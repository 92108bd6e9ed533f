/*
[INPUT]:  CLI arguments, optional YAML settings file, OS shutdown signals
[OUTPUT]: Signed headers, HTTP responses, or streamed messages on stdout
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, subcommands, or startup flow
*/

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use xsign_adapter::StreamKind;
use xsign_cli::{CommonArgs, Settings, commands};

#[derive(Parser, Debug)]
#[command(name = "xsign", version, about = "Sign and send authenticated API requests")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign a URL and JSON body read from stdin, then print the auth headers
    Sign {
        /// URL to sign; prompted for when omitted
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },
    /// Open an authenticated WebSocket stream and print each message
    Websocket {
        /// Stream URL; prompted for when omitted
        #[arg(long, value_name = "URL")]
        url: Option<String>,
        /// Message kind: raw, core-client (action), liquidity-hub (liquidity)
        #[arg(long, value_name = "KIND", default_value = "raw")]
        stream: StreamKind,
    },
    /// Sign and send a stored request definition
    Send {
        /// Name of the directory under --requests-dir
        #[arg(value_name = "REQUEST")]
        request: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = Settings::resolve(&args.common).context("resolve settings")?;
    init_tracing(&settings.log_level)?;
    debug!(
        token_mode = %settings.token_mode,
        pemfile = %settings.pemfile.display(),
        "settings resolved"
    );

    match args.command {
        Command::Sign { url } => commands::sign(&settings, url),
        Command::Websocket { url, stream } => commands::websocket(&settings, url, stream).await,
        Command::Send { request } => commands::send(&settings, &request).await,
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
