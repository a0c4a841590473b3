//! thermpdo: reads a DS1621 thermometer over I2C and emits the temperature
//! as a periodic CAN PDO.

use anyhow::{Context, Result};
use tracing::{info, warn};

use thermpdo_bridge::args::BridgeArgs;
use thermpdo_bridge::config::ThermBridgeConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = BridgeArgs::from_env();

    let config = ThermBridgeConfig::from_args(&args).context("Invalid configuration")?;

    thermpdo_common::init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "thermpdo reads temperature from a Maxim/Dallas DS1621 thermometer connected by I2C"
    );
    for arg in &args.ignored {
        warn!(argument = %arg, "Unexpected argument ignored");
    }
    info!(
        i2c_bus = %config.sensor.i2c_bus.display(),
        address = %config.address(),
        interface = %config.can.interface,
        cob_id = %config.cob_id()?,
        interval_secs = config.can.interval_secs,
        "Configuration loaded"
    );

    run(config).await
}

#[cfg(target_os = "linux")]
async fn run(config: ThermBridgeConfig) -> Result<()> {
    use thermpdo_bridge::PeriodicPublisher;
    use thermpdo_bridge::adapters::SocketCanBus;

    let address = config.address();
    let reader = hardware::open_sensor(&config).await;

    let can = SocketCanBus::open(&config.can.interface)
        .with_context(|| format!("Failed to open CAN interface '{}'", config.can.interface))?;

    let publisher =
        PeriodicPublisher::initialize(reader, can, config.cob_id()?, config.interval()?, address)
            .await
            .context("Failed to start periodic PDO")?;

    let counters = publisher
        .run_until(shutdown_signal())
        .await
        .context("Failed to stop periodic PDO")?;

    info!(ticks = counters.ticks, "thermpdo stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
#[cfg(target_os = "linux")]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => Some(sigterm),
        Err(e) => {
            warn!(error = %e, "Failed to listen for SIGTERM");
            None
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
        },
        _ = async {
            match sigterm.as_mut() {
                Some(sigterm) => {
                    sigterm.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(not(target_os = "linux"))]
async fn run(_config: ThermBridgeConfig) -> Result<()> {
    anyhow::bail!("thermpdo needs Linux i2c-dev and SocketCAN support")
}

#[cfg(target_os = "linux")]
mod hardware {
    use thermpdo_bridge::SensorReader;
    use thermpdo_bridge::adapters::LinuxI2cBus;
    use thermpdo_bridge::config::ThermBridgeConfig;
    use tracing::{info, warn};

    /// Open the sensor, falling back to simulation mode on any failure.
    pub async fn open_sensor(config: &ThermBridgeConfig) -> SensorReader<LinuxI2cBus> {
        let address = config.address();

        let bus = match LinuxI2cBus::open(&config.sensor.i2c_bus, address) {
            Ok(bus) => bus,
            Err(e) => {
                warn!(error = %e, "Failed to initialize hardware, running in simulation mode");
                return SensorReader::simulated();
            }
        };

        let mut reader = SensorReader::new(bus);
        if config.sensor.one_shot {
            if let Err(e) = reader.enable_one_shot(address).await {
                warn!(error = %e, "Failed to initialize hardware, running in simulation mode");
                return SensorReader::simulated();
            }
        }

        info!(%address, "DS1621 initialized");
        reader
    }
}
