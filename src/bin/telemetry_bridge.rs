use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use serialport::{DataBits, FlowControl, Parity, StopBits};

use telemetry_bridge::bridge::{Bridge, SerialSource};
use telemetry_bridge::clock::MonotonicClock;
use telemetry_bridge::config::{BridgeConfig, SerialConfig};
use telemetry_bridge::http::{router, AppState};
use telemetry_bridge::SharedSnapshot;

/// Read sensor telemetry from a serial port and serve it as JSON over HTTP.
#[derive(Debug, Parser)]
#[command(name = "telemetry_bridge", version)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long, env = "TELEMETRY_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Serial device of the sensor controller.
    #[arg(short = 'p', long)]
    serial_port: Option<String>,

    #[arg(short, long)]
    baud_rate: Option<u32>,

    /// Address the HTTP server listens on.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory holding index.html and style.css.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(port) = &args.serial_port {
        config.serial.port = port.clone();
    }
    if let Some(baud_rate) = args.baud_rate {
        config.serial.baud_rate = baud_rate;
    }
    if let Some(bind) = args.bind {
        config.http.bind = bind;
    }
    if let Some(dir) = &args.static_dir {
        config.http.static_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn open_serial(config: &SerialConfig) -> Result<SerialSource> {
    let port = serialport::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(config.read_timeout_ms))
        .open()
        .with_context(|| format!("Failed to open serial port {}", config.port))?;
    info!("Listening on {} at {} baud", config.port, config.baud_rate);
    Ok(SerialSource::new(port))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let clock = MonotonicClock::new();
    let snapshot = SharedSnapshot::new();
    let mut source = open_serial(&config.serial)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut bridge = Bridge::new(snapshot.clone(), clock)
        .with_diagnostic_interval(config.diagnostics.interval_ms);
    let serial_shutdown = Arc::clone(&shutdown);
    let serial = std::thread::Builder::new()
        .name("serial".into())
        .spawn(move || {
            if let Err(e) = bridge.run(&mut source, &serial_shutdown) {
                error!("{}, no further readings will be received", e);
            }
        })?;

    let state = Arc::new(AppState {
        snapshot,
        clock,
        static_dir: config.http.static_dir.clone(),
    });
    let listener = tokio::net::TcpListener::bind(config.http.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.http.bind))?;
    info!("Web server started on http://{}", config.http.bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    shutdown.store(true, Ordering::Relaxed);
    if serial.join().is_err() {
        anyhow::bail!("Serial thread panicked");
    }
    Ok(())
}
