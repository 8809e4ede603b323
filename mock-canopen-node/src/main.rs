//! # Mock CANopen Node
//!
//! Runs the proxy driver against the in-memory slave and logs the traffic
//! it produces.
//!
//! ## Usage
//!
//! ```bash
//! # Simulate node 4 with verbose proxy logs
//! cargo run -p mock-canopen-node -- --node-id 4 --log-level canopen_proxy_driver=debug
//! ```

mod opts;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use canopen_common::{CoData, CoReadRequest, CoReadResponse, TriggerRequest, TriggerResponse};
use canopen_proxy_driver::diagnostics::DEVICE_KEY;
use canopen_proxy_driver::{
    logging, ActivationFlag, ConfigError, DiagnosticCollector, DiagnosticLevel, DiagnosticsCollector,
    LocalNode, NodeInterface, ProxyConfig, ProxyDriver, ProxyError, Publisher,
};
use log::{debug, error, info, warn};
use mock_canopen_node::MockDriver;
use opts::InputFlags;
use tokio::sync::broadcast::error::RecvError;

fn main() {
    let flags = match InputFlags::read() {
        Ok(flags) => flags,
        Err(e) => {
            eprintln!("{}", e);
            opts::print_usage();
            process::exit(2);
        }
    };
    if flags.help {
        opts::print_usage();
        return;
    }

    let (mut config, source) = load_config(flags.config.or_else(ProxyConfig::config_file_path));
    if let Some(node_id) = flags.node_id {
        config.node_id = node_id;
    }
    if let Some(level) = flags.log_level {
        config.log_level = level;
    }

    logging::init(&config.log_level);
    source.report();

    if flags.save_config {
        if let Err(e) = config.save_default_location() {
            error!("Could not save configuration: {}", e);
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(config)) {
        error!("Mock node stopped: {}", e);
        process::exit(1);
    }
}

/// Where the configuration came from, reported once logging is up.
#[derive(Debug)]
enum ConfigSource {
    Defaults,
    File(PathBuf),
    Invalid(PathBuf, ConfigError),
}

impl ConfigSource {
    fn report(&self) {
        match self {
            ConfigSource::Defaults => info!("No configuration file, using defaults"),
            ConfigSource::File(path) => info!("Loaded configuration from {:?}", path),
            ConfigSource::Invalid(path, e) => {
                warn!("{} ({:?}), using default configuration", e, path)
            }
        }
    }
}

fn load_config(path: Option<PathBuf>) -> (ProxyConfig, ConfigSource) {
    match path {
        Some(path) if path.exists() => match ProxyConfig::load(&path) {
            Ok(config) => (config, ConfigSource::File(path)),
            Err(e) => (ProxyConfig::default(), ConfigSource::Invalid(path, e)),
        },
        _ => (ProxyConfig::default(), ConfigSource::Defaults),
    }
}

async fn run(config: ProxyConfig) -> Result<(), ProxyError> {
    let driver = Arc::new(
        MockDriver::with_test_objects(config.node_id)
            .with_latency(Duration::from_millis(config.sdo_latency_ms)),
    );
    let objects = driver.dictionary_summary();
    info!("Object dictionary loaded with {} objects", objects.len());
    for object in &objects {
        debug!("  {}", object);
    }

    let activation = ActivationFlag::new(false);
    let diagnostics = Arc::new(DiagnosticsCollector::new());
    let proxy = Arc::new(
        ProxyDriver::new(driver.clone(), Arc::new(activation.clone()), diagnostics.clone())
            .with_queue_depth(config.queue_depth),
    );

    let node = LocalNode::new(config.node_name.clone(), tokio::runtime::Handle::current());
    proxy.init(&node)?;
    let path = |suffix: &str| format!("{}/{}", node.name(), suffix);

    let mut nmt_states = node.subscribe::<String>(&path("nmt_state"))?;
    let mut rpdos = node.subscribe::<CoData>(&path("rpdo"))?;
    let tpdo = node.create_publisher::<CoData>(&path("tpdo"), config.queue_depth)?;

    activation.activate();
    diagnostics.update_all(DiagnosticLevel::Ok, "Device activated", DEVICE_KEY, "ACTIVE");
    driver.boot();

    let identity: CoReadResponse = node
        .call_service(&path("sdo_read"), CoReadRequest::new(0x1018, 0x01))
        .await?;
    if identity.success {
        info!("Slave 0x{:X}: vendor ID 0x{:08X}", config.node_id, identity.data);
    } else {
        warn!("Slave 0x{:X}: identity object not readable", config.node_id);
    }

    let started: TriggerResponse = node.call_service(&path("nmt_start_node"), TriggerRequest).await?;
    if !started.success {
        warn!("Could not start node: {}", started.message);
    }

    // Controlword "enable operation"
    tpdo.publish(CoData::new(0x6040, 0x00, 0x000F))?;

    let broadcaster = driver.spawn_tpdo_broadcaster(Duration::from_millis(config.tpdo_interval_ms));
    info!(
        "Mock node {} running, TPDO1 every {} ms. Press Ctrl+C to stop",
        config.node_name, config.tpdo_interval_ms
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            state = nmt_states.recv() => match state {
                Ok(state) => info!("NMT state: {}", state),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} NMT state updates", missed),
                Err(RecvError::Closed) => break,
            },
            data = rpdos.recv() => match data {
                Ok(data) => debug!("RPDO {}", data),
                Err(RecvError::Lagged(missed)) => warn!("Missed {} RPDO values", missed),
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    broadcaster.abort();
    activation.deactivate();
    info!("Controlword writes received: {}", driver.transmitted().len());

    let snapshot = proxy.diagnostic_snapshot();
    info!("Diagnostics: {} ({})", snapshot.level, snapshot.message);
    for (key, value) in snapshot.entries() {
        info!("  {}: {}", key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_is_resolved_before_logging() {
        let dir = tempfile::tempdir().unwrap();

        let (config, source) = load_config(Some(dir.path().join("missing.toml")));
        assert_eq!(config, ProxyConfig::default());
        assert!(matches!(source, ConfigSource::Defaults));

        let valid = dir.path().join("node.toml");
        std::fs::write(&valid, "node_name = \"drive\"\nlog_level = \"debug\"\n").unwrap();
        let (config, source) = load_config(Some(valid.clone()));
        assert_eq!(config.node_name, "drive");
        assert_eq!(config.log_level, "debug");
        assert!(matches!(source, ConfigSource::File(path) if path == valid));

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "node_id = \"four\"").unwrap();
        let (config, source) = load_config(Some(broken));
        assert_eq!(config, ProxyConfig::default());
        assert!(matches!(source, ConfigSource::Invalid(_, ConfigError::Parse(_))));
    }
}
