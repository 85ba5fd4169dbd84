//! ledgerseal gateway
//!
//! A WebSocket endpoint for the sealed login handshake. On startup it:
//! - generates the server keypair (before anything is accepted)
//! - logs the exported public key once for distribution
//! - loads registered clients from a JSON file
//! - starts the prune sweep for sessions and nonces
//!
//! Usage:
//!   ledgerseal-gateway [--port 8765] [--host 0.0.0.0] [--clients clients.json]

use clap::{Parser, ValueEnum};
use ledgerseal::config::{Config, ConfigOverrides};
use ledgerseal::handshake::{LoginHandshake, MemoryClientDirectory};
use ledgerseal::keys::KeyManager;
use ledgerseal::replay::NonceGuard;
use ledgerseal::session::SessionRegistry;
use ledgerseal::transport::{serve_connection, WebSocketTransport};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tracing::{error, info, warn};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// ledgerseal gateway
#[derive(Parser)]
#[command(name = "ledgerseal-gateway")]
#[command(about = "WebSocket gateway for the ledgerseal login handshake")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8765")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// JSON file of registered clients: [{"id": ..., "passwordHash": ...}]
    #[arg(short, long)]
    clients: Option<PathBuf>,

    /// Session lifetime in seconds (overrides LEDGERSEAL_SESSION_TTL_SECS)
    #[arg(long)]
    session_ttl_secs: Option<u64>,

    /// Prune sweep interval in seconds (overrides LEDGERSEAL_PRUNE_INTERVAL_SECS)
    #[arg(long)]
    prune_interval_secs: Option<u64>,

    /// Nonce replay window in seconds (overrides LEDGERSEAL_NONCE_TTL_SECS)
    #[arg(long)]
    nonce_ttl_secs: Option<u64>,

    /// RSA modulus size (overrides LEDGERSEAL_KEY_BITS)
    #[arg(long)]
    key_bits: Option<usize>,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ledgerseal=info,ledgerseal_gateway=info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

fn load_config(args: &Args) -> Result<Config, BoxError> {
    let mut config = Config::from_env()?;
    config.apply(&ConfigOverrides {
        session_ttl_secs: args.session_ttl_secs,
        prune_interval_secs: args.prune_interval_secs,
        nonce_ttl_secs: args.nonce_ttl_secs,
        key_bits: args.key_bits,
    });
    config.validate()?;
    Ok(config)
}

/// Handle a single WebSocket connection
async fn handle_connection(stream: TcpStream, addr: SocketAddr, handshake: Arc<LoginHandshake>) {
    info!("New connection from: {}", addr);

    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };

    match serve_connection(WebSocketTransport::from_stream(ws), handshake).await {
        Ok(()) => info!("Client {} disconnected", addr),
        Err(e) => warn!("Connection {} ended: {}", addr, e),
    }
}

/// Recurring sweep; the registry itself holds no timer
fn spawn_pruner(config: &Config, sessions: Arc<SessionRegistry>, nonces: Arc<NonceGuard>) {
    let mut ticker = tokio::time::interval(config.prune_interval());
    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            sessions.prune_expired(SystemTime::now());
            nonces.evict_expired();
        }
    });
}

async fn run(args: Args) -> Result<(), BoxError> {
    let config = load_config(&args)?;

    let bits = config.key_bits;
    let keys = Arc::new(
        tokio::task::spawn_blocking(move || KeyManager::generate_with_bits(bits)).await??,
    );
    info!(public_key = %keys.export_public_key_base64()?, "server public key");

    let clients = match &args.clients {
        Some(path) => MemoryClientDirectory::load_json(path)?,
        None => {
            warn!("No client file given; every login will fail authentication");
            MemoryClientDirectory::new()
        }
    };
    info!(clients = clients.len(), "client directory loaded");

    let sessions = Arc::new(SessionRegistry::new(config.session_ttl()));
    let nonces = Arc::new(NonceGuard::new(config.nonce_ttl()));
    spawn_pruner(&config, sessions.clone(), nonces.clone());

    let handshake = Arc::new(LoginHandshake::new(keys, nonces, sessions, Arc::new(clients)));

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("ledgerseal gateway listening on ws://{}", addr);

    while let Ok((stream, addr)) = listener.accept().await {
        tokio::spawn(handle_connection(stream, addr, handshake.clone()));
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.log_format);

    if let Err(e) = run(args).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
