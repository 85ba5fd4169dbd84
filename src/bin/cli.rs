//! ledgerseal CLI tool
//!
//! Registers password hashes and drives the login handshake against a
//! running gateway.

use clap::{Parser, Subcommand};
use ledgerseal::handshake::{Client, LoginClient};
use ledgerseal::keys::KeyManager;
use ledgerseal::transport::{ClientTransport, GatewayClient, TransportError};
use std::sync::Arc;

/// ledgerseal: sealed logins and short-lived session keys
#[derive(Parser)]
#[command(name = "ledgerseal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a client directory entry for a password
    HashPassword {
        /// Client id to register
        #[arg(long)]
        client_id: String,

        /// Cleartext password
        #[arg(long)]
        password: String,
    },

    /// Fetch the gateway's public key
    PublicKey {
        /// Gateway URL
        #[arg(long, default_value = "ws://127.0.0.1:8765")]
        url: String,
    },

    /// Log in and print the issued session
    Login {
        /// Gateway URL
        #[arg(long, default_value = "ws://127.0.0.1:8765")]
        url: String,

        /// Client id
        #[arg(long)]
        client_id: String,

        /// Password
        #[arg(long)]
        password: String,

        /// Also print the base64 session key
        #[arg(long)]
        show_key: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword {
            client_id,
            password,
        } => cmd_hash_password(&client_id, &password),
        Commands::PublicKey { url } => cmd_public_key(&url).await,
        Commands::Login {
            url,
            client_id,
            password,
            show_key,
        } => cmd_login(&url, &client_id, &password, show_key).await,
    }
}

fn cmd_hash_password(client_id: &str, password: &str) {
    let client = Client::with_password(client_id, password);
    match serde_json::to_string_pretty(&client) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding client: {}", e);
            std::process::exit(1);
        }
    }
}

async fn connect(url: &str) -> GatewayClient<ClientTransport> {
    match ClientTransport::connect(url).await {
        Ok(transport) => GatewayClient::new(transport),
        Err(e) => {
            eprintln!("Error connecting to {}: {}", url, e);
            std::process::exit(1);
        }
    }
}

async fn cmd_public_key(url: &str) {
    let mut gateway = connect(url).await;

    match gateway.fetch_public_key().await {
        Ok(key) => {
            println!("Fingerprint: {}", key.fingerprint());
            match key.to_base64() {
                Ok(encoded) => println!("{}", encoded),
                Err(e) => {
                    eprintln!("Error encoding key: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error fetching public key: {}", e);
            std::process::exit(1);
        }
    }
    let _ = gateway.close().await;
}

async fn cmd_login(url: &str, client_id: &str, password: &str, show_key: bool) {
    let mut gateway = connect(url).await;

    let server_key = match gateway.fetch_public_key().await {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Error fetching public key: {}", e);
            std::process::exit(1);
        }
    };

    println!("Generating client keypair...");
    let keys = match tokio::task::spawn_blocking(KeyManager::generate).await {
        Ok(Ok(keys)) => Arc::new(keys),
        Ok(Err(e)) => {
            eprintln!("Error generating keypair: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Key generation task failed: {}", e);
            std::process::exit(1);
        }
    };

    let client = LoginClient::new(server_key, keys);
    let request = match client.seal_login(client_id, password) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error sealing login: {}", e);
            std::process::exit(1);
        }
    };

    let response = match gateway.login(request).await {
        Ok(response) => response,
        Err(TransportError::Rejected { category, fields }) if fields.is_empty() => {
            eprintln!("Login rejected: {}", category);
            std::process::exit(1);
        }
        Err(TransportError::Rejected { category, fields }) => {
            eprintln!("Login rejected: {} ({})", category, fields.join(", "));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match client.open_grant(&response) {
        Ok(grant) => {
            println!("Logged in successfully!");
            println!("Session: {}", grant.session_id());
            if show_key {
                println!("Key:     {}", grant.session_key().to_base64());
            }
        }
        Err(e) => {
            eprintln!("Error opening grant: {}", e);
            std::process::exit(1);
        }
    }
    let _ = gateway.close().await;
}
