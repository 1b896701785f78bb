//! Signaling server binary entry point
//!
//! Starts the paircall signaling broker for two-party video sessions.
//!
//! # Usage
//!
//! ```bash
//! # Start on the default port (5001)
//! cargo run -p paircall-signaling-server
//!
//! # Bind elsewhere
//! cargo run -p paircall-signaling-server -- --bind-addr 127.0.0.1 --port 8443
//!
//! # Environment overrides
//! PAIRCALL_PORT=9000 RUST_LOG=debug cargo run -p paircall-signaling-server
//! ```

use clap::Parser;
use paircall_signaling::{BrokerConfig, SignalingServer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// paircall signaling server
///
/// Brokers two-party rooms and relays session-negotiation messages
/// between their participants.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[arg(long, default_value = "0.0.0.0", env = "PAIRCALL_BIND_ADDR")]
    bind_addr: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 5001, env = "PAIRCALL_PORT")]
    port: u16,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Ctrl+C flips the flag; the async main polls it.
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_handler = Arc::clone(&shutdown_flag);
    ctrlc::set_handler(move || {
        if shutdown_flag_handler.swap(true, Ordering::SeqCst) {
            eprintln!("shutdown already in progress, forcing immediate exit");
            std::process::exit(0);
        }
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("signaling-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args, shutdown_flag))
}

async fn async_main(
    args: Args,
    shutdown_flag: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_addr = %args.bind_addr,
        port = args.port,
        "paircall signaling server starting"
    );

    let config = BrokerConfig {
        bind_addr: args.bind_addr,
        port: args.port,
    };
    config.validate()?;

    let handle = SignalingServer::new(config).start().await?;
    info!("Server running. Press Ctrl+C to shutdown.");

    while !shutdown_flag.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    info!("Shutdown signal received, cleaning up...");
    handle.shutdown().await;
    info!("signaling server shut down gracefully");

    Ok(())
}

fn init_tracing() {
    // EnvFilter keeps RUST_LOG in charge of verbosity.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
