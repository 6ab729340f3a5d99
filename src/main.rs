use acgate_auth::Exchanger;
use acgate_config::{Config, LogFormat};
use acgate_proxy::AppState;
use acgate_types::{ByteStream, Credentials, GateError, SESSION_HEADER, new_session_id};
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use futures_util::{StreamExt as _, TryStreamExt as _};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "acgate",
    version,
    about = "acgate: credential exchange and streaming relay for agent runtimes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Override the listening port (default: 8019).
        #[arg(short, long)]
        port: Option<u16>,
        /// Override the listening address (default: 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },
    /// Exchange a username and password for a bearer token.
    Login {
        /// Path to the YAML configuration file.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short, long)]
        username: String,
        #[arg(long, env = "ACGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Send a prompt to the gateway (or a runtime) and print the reply.
    Invoke {
        /// Invocation endpoint.
        #[arg(
            long,
            env = "ACGATE_INVOKE_URL",
            default_value = "http://127.0.0.1:8019/api/invoke"
        )]
        url: String,
        /// Bearer token from `acgate login`.
        #[arg(long, env = "BEARER_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Session id to continue; a new one is generated when omitted.
        #[arg(long)]
        session: Option<String>,
        /// Prompt text.
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, host } => cmd_serve(config, port, host).await,
        Commands::Login {
            config,
            username,
            password,
        } => cmd_login(config, &username, password).await,
        Commands::Invoke {
            url,
            token,
            session,
            prompt,
        } => cmd_invoke(&url, token, session, &prompt.join(" ")).await,
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`; logs go to
/// stderr so command output on stdout stays clean.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().with_target(true).init(),
        LogFormat::Text => builder.with_target(false).init(),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    Config::load(path).map_err(|e| anyhow::anyhow!("config error: {e}"))
}

async fn cmd_serve(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(p) = port {
        config.port = p;
    }
    if let Some(h) = host {
        config.host = h;
    }
    init_tracing(&config.log.level, config.log.format);

    if let Err(e) = config.identity.validate() {
        tracing::warn!(error = %e, "identity settings incomplete; login requests will fail");
    }

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        runtime = %config.runtime.url,
        variant = ?config.identity.variant,
        "starting gateway"
    );
    let state = AppState::new(Arc::new(config))?;
    let app = acgate_proxy::make_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    eprintln!("acgate listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn cmd_login(config_path: Option<PathBuf>, username: &str, password: String) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    init_tracing("warn", config.log.format);

    let credentials = Credentials::new(username, SecretString::from(password))?;
    let exchanger = Exchanger::from_config(config.identity, &config.http)?;
    let token = exchanger
        .exchange(&credentials)
        .await
        .map_err(|e| anyhow::anyhow!("login failed: {e}"))?;
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}

async fn cmd_invoke(
    url: &str,
    token: Option<String>,
    session: Option<String>,
    prompt: &str,
) -> Result<()> {
    init_tracing("warn", LogFormat::Text);

    let session = session.unwrap_or_else(|| {
        let id = new_session_id();
        eprintln!("session: {id}");
        id
    });

    let mut req = reqwest::Client::new()
        .post(url)
        .header(SESSION_HEADER, &session)
        .json(&json!({ "prompt": prompt }));
    if let Some(t) = token.filter(|t| !t.is_empty()) {
        let value = if t.starts_with("Bearer ") {
            t
        } else {
            format!("Bearer {t}")
        };
        req = req.header(reqwest::header::AUTHORIZATION, value);
    }

    let resp = req.send().await.context("invoke request failed")?;
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("runtime returned {status}: {body}");
    }

    if content_type.starts_with("text/event-stream") {
        let body: ByteStream = Box::pin(resp.bytes_stream().map_err(GateError::from));
        print_stream(body).await
    } else {
        let bytes = resp.bytes().await?;
        print_document(&bytes)
    }
}

/// Print each `data: ` payload as it arrives, then line/event counts.
async fn print_stream(body: ByteStream) -> Result<()> {
    let mut lines = acgate_sse::decode(body);
    let (mut line_count, mut event_count) = (0usize, 0usize);
    while let Some(line) = lines.next().await {
        let line = line?;
        line_count += 1;
        if let Some(data) = line.data() {
            event_count += 1;
            println!("{data}");
        } else if !line.is_blank() {
            tracing::debug!(line = line.as_str(), "non-data line");
        }
    }
    eprintln!("stream finished: {line_count} lines, {event_count} events");
    Ok(())
}

/// Pretty-print a single JSON reply, preferring `response[0]`.
fn print_document(bytes: &[u8]) -> Result<()> {
    let Ok(json) = serde_json::from_slice::<Value>(bytes) else {
        println!("{}", String::from_utf8_lossy(bytes));
        return Ok(());
    };
    match json.get("response").and_then(|r| r.get(0)) {
        Some(Value::String(s)) => println!("{s}"),
        Some(first) => println!("{}", serde_json::to_string_pretty(first)?),
        None => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}
