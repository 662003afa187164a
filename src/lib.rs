pub mod cli;
pub mod config;
pub mod conversation;
pub mod http;
pub mod llm;
pub mod relay;
pub mod server;
pub mod trace;

use anyhow::{Result, anyhow};
use cli::theme::{Theme, color_enabled};
use cli::{ChatSession, CliArgs, CliCommand, run_repl};
use config::AppConfig;
use conversation::Conversation;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use llm::openai::OpenAiBackend;
use relay::{HttpRelay, PromptRelay};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use trace::SessionTrace;

const DEFAULT_LOG_FILTER: &str = "pathway_ai=info";

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let debug = HttpDebugConfig::from_verbose(args.verbose);
    let client = build_http_client(&config)?;

    match &args.command {
        Some(CliCommand::Serve { addr }) => {
            let addr = addr.clone().unwrap_or_else(|| config.server_addr.clone());
            run_server(&config, HttpClient::new(client, debug), &addr).await
        }
        None => run_chat(&args, &config, client, debug).await,
    }
}

async fn run_server(config: &AppConfig, http: HttpClient, addr: &str) -> Result<()> {
    init_tracing();

    let relay = local_relay(config, http);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| anyhow!("Failed to bind relay server to {addr}: {err}"))?;
    server::serve(listener, relay).await
}

async fn run_chat(
    args: &CliArgs,
    config: &AppConfig,
    client: reqwest::Client,
    debug: HttpDebugConfig,
) -> Result<()> {
    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;
    let http = HttpClient::new(client, debug).with_trace(trace.clone());

    let mode = args.mode.unwrap_or(config.default_mode);
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| config.openai_model.clone());
    let conversation = Conversation::new(mode, model);
    let theme = Theme::from_config(color_enabled(), &config.theme);

    match &args.relay_url {
        Some(url) => {
            let mut session = ChatSession {
                conversation,
                relay: HttpRelay::new(http, url.clone()),
                theme,
                trace,
                startup_message: None,
            };
            run_repl(&mut session).await
        }
        None => {
            let startup_message = config.openai_api_key.is_none().then(|| {
                "OPENAI_API_KEY not configured. Set it in your shell or .env file (example: OPENAI_API_KEY=your_key).".to_string()
            });
            let mut session = ChatSession {
                conversation,
                relay: local_relay(config, http),
                theme,
                trace,
                startup_message,
            };
            run_repl(&mut session).await
        }
    }
}

fn local_relay(config: &AppConfig, http: HttpClient) -> PromptRelay<OpenAiBackend> {
    let backend = OpenAiBackend::new(
        http,
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )
    .ok();
    PromptRelay::new(backend, config.openai_model.clone())
}

fn build_http_client(config: &AppConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|err| anyhow!("Failed to build HTTP client: {err}"))
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    // A subscriber may already be installed when embedded in tests.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
