pub mod bridge;

use std::io::{Read, Write};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use log::{debug, info};

pub use bridge::{Bridge, BridgeError, BridgeStats, Step};

use crate::config::Config;
use crate::constants::common;
use crate::format::{FormatError, FrameFormatter};
use crate::lsl::{Inlet, Resolver};
use crate::serial::SerialLink;

/// Opens the serial device, greets it, waits for a matching stream and
/// forwards samples until `stop` is raised or `max_samples` is reached.
pub fn run(config: &Config, stop: &AtomicBool) -> Result<BridgeStats, BridgeError> {
    let link = SerialLink::open(&config.serial)?;
    run_with(link, config, stop)
}

/// Same as `run` over an already opened link.
pub fn run_with<P: Read + Write>(
    mut link: SerialLink<P>,
    config: &Config,
    stop: &AtomicBool,
) -> Result<BridgeStats, BridgeError> {
    info!("Connected to {}", link.name());

    if config.serial.clear_on_open {
        let dropped = link.clear_input(common::MAX_LINE_LENGTH);
        debug!("cleared {} stale bytes", dropped);
    }
    if !config.serial.greeting.is_empty() {
        link.send(&config.serial.greeting)?;
    }

    info!(
        "looking for a stream with {}='{}'...",
        config.stream.property, config.stream.value
    );
    let resolver = Resolver::new(config.discovery_addr()?);
    let info = resolver.resolve_one(
        &config.stream.property,
        &config.stream.value,
        Duration::from_millis(common::RESOLVE_WAIT_MS),
        config.stream.resolve_timeout_ms.map(Duration::from_millis),
        stop,
    )?;

    let inlet = Inlet::open(&info, Duration::from_millis(config.stream.connect_timeout_ms))?;
    let formatter = FrameFormatter::from_config(&config.frame);
    let available = inlet.info().channel_count;
    if available < formatter.required_channels() {
        return Err(FormatError::MissingChannel {
            index: formatter.required_channels() - 1,
            available,
        }
        .into());
    }

    let mut bridge = Bridge::new(inlet, link, formatter)
        .with_labels(config.frame.labels.clone())
        .with_read_ack(config.serial.read_ack)
        .with_pull_timeout(Duration::from_millis(config.stream.pull_timeout_ms))
        .with_max_samples(config.max_samples);
    bridge.run(stop)
}
