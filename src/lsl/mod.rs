//! Lab Streaming Layer (LSL) stream discovery and data inlet
//!
//! Discovery sends a `LSL:shortinfo` query over UDP (multicast by default)
//! and collects `LSL:shortinfo {json}` replies from outlets. The data feed is
//! a TCP stream carrying a `LSL:streaminfo/<len>:` XML header followed by
//! fixed-size records of `[timestamp: f64][value: f32 * channel_count]`,
//! all little-endian.

mod inlet;
mod resolver;
mod types;

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::constants::common;
use crate::parser::ParseError;

pub use inlet::Inlet;
pub use resolver::{parse_shortinfo, Resolver};
pub use types::{Sample, StreamInfo};

/// LSL errors
#[derive(Debug, Error)]
pub enum LslError {
    /// Network I/O error
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),

    /// Malformed data feed
    #[error("malformed stream feed: {0}")]
    Parse(#[from] ParseError),

    /// No stream matched before the resolve limit
    #[error("no stream with {property}='{value}' found")]
    NoStreamsFound { property: String, value: String },

    /// Outlet closed the connection
    #[error("stream disconnected")]
    Disconnected,

    /// Stream header did not arrive in time
    #[error("timed out waiting for the stream header")]
    Timeout,

    /// Stop was requested while waiting
    #[error("interrupted")]
    Interrupted,
}

/// LSL result type
pub type LslResult<T> = Result<T, LslError>;

/// `timeout` from now, clamped to the latest instant the platform can hold.
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(Duration::from_millis(common::MAX_TIMEOUT_MS)))
        .unwrap_or(now)
}

/// Anything that yields multi-channel samples.
pub trait SampleSource {
    /// Waits at most `timeout`; `Ok(None)` means nothing arrived.
    fn pull_sample(&mut self, timeout: Duration) -> LslResult<Option<Sample>>;
}
