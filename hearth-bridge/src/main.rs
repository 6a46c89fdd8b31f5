use std::sync::Arc;

use clap::Parser;

use hearth_ble::{BDAddr, BtleTransport, Link, LinkConfig};
use hearth_bridge::{Bridge, BridgeConfig};

#[derive(clap::Parser)]
#[command(name = "hearth-bridge")]
#[command(about = "HTTP to BLE bridge for a water-vapour fireplace")]
struct Cli {
    /// Path to a JSON config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// BLE address of the fireplace (overrides the config file)
    #[arg(long)]
    device: Option<String>,
    /// Command characteristic UUID (overrides the config file)
    #[arg(long)]
    characteristic: Option<String>,
    /// HTTP listen address (overrides the config file)
    #[arg(long)]
    listen: Option<String>,
    /// Seconds between reconnect attempts (overrides the config file)
    #[arg(long)]
    retry_backoff: Option<u64>,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(device) = cli.device {
        config.device = Some(device);
    }
    if let Some(characteristic) = cli.characteristic {
        config.characteristic = characteristic;
    }
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(secs) = cli.retry_backoff {
        config.retry_backoff_secs = secs;
    }

    let Some(device) = config.device.clone() else {
        eprintln!("no device address configured; pass --device or set \"device\" in the config file");
        std::process::exit(1);
    };
    let address: BDAddr = device.parse()?;
    let characteristic: uuid::Uuid = config.characteristic.parse()?;

    let link_config = LinkConfig::default()
        .with_retry_backoff(config.retry_backoff())
        .with_scan_window(config.scan_window());
    let transport = BtleTransport::new(address, characteristic, config.scan_window());
    let link = Link::new(transport, link_config);

    // Connect attempts start immediately, independent of HTTP traffic.
    let supervisor = link.clone();
    tokio::spawn(async move { supervisor.run().await });

    let bridge = Arc::new(Bridge::new(link, config.retry_backoff()));
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!(listen = %config.listen, device = %address, "hearth bridge listening");

    hearth_bridge::http::run_server(listener, bridge).await?;
    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
