//! Prospect application shell.
//!
//! Reads one request as JSON (from a file or stdin), runs it through the
//! extraction service and prints the response as JSON. Business logic lives
//! in the `crates/` directory.

pub mod state;

use anyhow::{bail, Context};
use prospect_core::AppConfig;
use prospect_scanner::{CommentsRequest, ExtractionResponse, SearchRequest};
use state::AppState;
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// Which extraction to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// People search
    Search,
    /// Comment thread of one post
    Comments,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Extraction to run
    pub mode: Mode,
    /// Request file; stdin when absent or `-`
    pub request_path: Option<PathBuf>,
}

/// Decoded request for either mode.
#[derive(Debug, Clone)]
pub enum Request {
    /// People-search request
    Search(SearchRequest),
    /// Comment-thread request
    Comments(CommentsRequest),
}

const USAGE: &str = "usage: prospect <search|comments> [REQUEST.json | -]";

/// Parse arguments (without the program name).
pub fn parse_args<I, S>(args: I) -> anyhow::Result<Invocation>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = args.into_iter().map(Into::into);

    let mode = match args.next().as_deref() {
        Some("search") => Mode::Search,
        Some("comments") => Mode::Comments,
        Some(other) => bail!("unknown command '{other}'\n{USAGE}"),
        None => bail!(USAGE),
    };
    let request_path = args.next().filter(|p| p != "-").map(PathBuf::from);
    if let Some(extra) = args.next() {
        bail!("unexpected argument '{extra}'\n{USAGE}");
    }

    Ok(Invocation { mode, request_path })
}

/// Decode a request body for `mode`.
pub fn decode_request(mode: Mode, body: &str) -> anyhow::Result<Request> {
    let request = match mode {
        Mode::Search => Request::Search(
            serde_json::from_str(body).context("invalid search request JSON")?,
        ),
        Mode::Comments => Request::Comments(
            serde_json::from_str(body).context("invalid comments request JSON")?,
        ),
    };
    Ok(request)
}

fn read_body(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request from {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read request from stdin")?;
            Ok(body)
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,prospect=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Serve one request end to end.
pub async fn execute(state: &AppState, request: Request) -> ExtractionResponse {
    match request {
        Request::Search(request) => state.service.search(request).await,
        Request::Comments(request) => state.service.comments(request).await,
    }
}

/// Entry point for the `prospect` binary.
pub fn run() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting Prospect v{}", env!("CARGO_PKG_VERSION"));

    let invocation = parse_args(std::env::args().skip(1))?;
    let request = decode_request(invocation.mode, &read_body(invocation.request_path.as_ref())?)?;
    let config = AppConfig::load_with_env().context("failed to load configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let response = runtime.block_on(async {
        let state = AppState::new(config).await?;
        let response = execute(&state, request).await;
        state.shutdown().await;
        anyhow::Ok(response)
    })?;

    info!("{} ({} records)", response.message, response.record_count);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
