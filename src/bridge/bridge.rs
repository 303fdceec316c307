use std::fmt;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use log::{debug, info, log_enabled, warn, Level};
use thiserror::Error;

use crate::config::ConfigError;
use crate::constants::common;
use crate::format::{render_value, FormatError, FrameFormatter};
use crate::lsl::{LslError, Sample, SampleSource};
use crate::serial::{SerialError, SerialLink};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lsl(#[from] LslError),

    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub samples: u64,
    pub acks: u64,
    pub missed_acks: u64,
    pub idle_polls: u64,
}

impl fmt::Display for BridgeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples sent, {} acknowledged, {} without reply, {} idle polls",
            self.samples, self.acks, self.missed_acks, self.idle_polls
        )
    }
}

/// Outcome of a single `Bridge::step`.
#[derive(Debug, PartialEq)]
pub enum Step {
    /// No sample within the pull timeout.
    Idle,
    /// A frame went out; `ack` holds the line read back, if any.
    Forwarded { frame: String, ack: Option<Vec<u8>> },
}

/// Moves samples from a source to the serial link, one at a time.
pub struct Bridge<S, P> {
    source: S,
    link: SerialLink<P>,
    formatter: FrameFormatter,
    labels: Vec<String>,
    read_ack: bool,
    pull_timeout: Duration,
    max_samples: Option<u64>,
    stats: BridgeStats,
}

impl<S: SampleSource, P: Read + Write> Bridge<S, P> {
    pub fn new(source: S, link: SerialLink<P>, formatter: FrameFormatter) -> Self {
        Self {
            source,
            link,
            formatter,
            labels: Vec::new(),
            read_ack: true,
            pull_timeout: Duration::from_millis(common::PULL_TIMEOUT_MS),
            max_samples: None,
            stats: BridgeStats::default(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_read_ack(mut self, read_ack: bool) -> Self {
        self.read_ack = read_ack;
        self
    }

    pub fn with_pull_timeout(mut self, pull_timeout: Duration) -> Self {
        self.pull_timeout = pull_timeout;
        self
    }

    pub fn with_max_samples(mut self, max_samples: Option<u64>) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    pub fn into_parts(self) -> (S, SerialLink<P>) {
        (self.source, self.link)
    }

    pub fn step(&mut self) -> Result<Step, BridgeError> {
        let Some(sample) = self.source.pull_sample(self.pull_timeout)? else {
            self.stats.idle_polls += 1;
            return Ok(Step::Idle);
        };

        let frame = self.formatter.format(&sample.values)?;
        if log_enabled!(Level::Debug) {
            debug!("{:.6} {}", sample.timestamp, self.describe(&sample));
        }
        self.link.send(&frame)?;
        self.stats.samples += 1;

        if !self.read_ack {
            return Ok(Step::Forwarded { frame, ack: None });
        }

        let ack = self.link.read_line()?;
        match &ack {
            Some(line) => {
                self.stats.acks += 1;
                let now = Local::now();
                println!(
                    "{} - {}",
                    now.format(common::TIMESTAMP_FORMAT),
                    String::from_utf8_lossy(line).trim_end()
                );
            }
            None => {
                self.stats.missed_acks += 1;
                debug!("no reply from {} after sample {}", self.link.name(), self.stats.samples);
            }
        }
        Ok(Step::Forwarded { frame, ack })
    }

    /// Runs until `stop` is raised or `max_samples` frames went out.
    /// The first error ends the run.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<BridgeStats, BridgeError> {
        info!("forwarding samples to {}", self.link.name());
        let result = self.forward_until(stop);
        match &result {
            Ok(()) => info!("done: {}", self.stats),
            Err(e) => warn!("stopped by error after {}: {}", self.stats, e),
        }
        result.map(|()| self.stats.clone())
    }

    fn forward_until(&mut self, stop: &AtomicBool) -> Result<(), BridgeError> {
        while !stop.load(Ordering::SeqCst) {
            if self.max_samples.map_or(false, |max| self.stats.samples >= max) {
                break;
            }
            self.step()?;
        }
        Ok(())
    }

    fn describe(&self, sample: &Sample) -> String {
        self.formatter
            .channels()
            .iter()
            .enumerate()
            .map(|(i, &index)| {
                let label = self
                    .labels
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("ch{}", index));
                match sample.values.get(index) {
                    Some(value) => format!("{}={}", label, render_value(*value)),
                    None => format!("{}=?", label),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
