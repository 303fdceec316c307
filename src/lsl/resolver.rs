use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Deserialize;

use super::{deadline_after, LslError, LslResult, StreamInfo};
use crate::constants::common;

/// Body of a `LSL:shortinfo` reply.
#[derive(Debug, Deserialize)]
struct ShortInfo {
    name: String,
    #[serde(rename = "type")]
    stream_type: String,
    channel_count: usize,
    #[serde(default)]
    nominal_srate: f64,
    #[serde(default)]
    source_id: String,
    #[serde(default)]
    hostname: String,
    port: u16,
}

/// Finds streams by querying the discovery address.
pub struct Resolver {
    discovery_addr: SocketAddr,
}

impl Resolver {
    pub fn new(discovery_addr: SocketAddr) -> Self {
        Self { discovery_addr }
    }

    pub fn discovery_addr(&self) -> SocketAddr {
        self.discovery_addr
    }

    /// Sends one query and gathers matching replies for `wait`.
    ///
    /// Replies that fail to parse or do not match are ignored; the same
    /// outlet answering twice is reported once.
    pub fn resolve(&self, property: &str, value: &str, wait: Duration) -> LslResult<Vec<StreamInfo>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let query = format!("{}\r\n{}='{}'\r\n", common::SHORTINFO_PREFIX, property, value);
        socket.send_to(query.as_bytes(), self.discovery_addr)?;

        let deadline = deadline_after(wait);
        let mut streams: Vec<StreamInfo> = Vec::new();
        let mut buf = [0u8; common::DISCOVERY_PACKET_SIZE];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            socket.set_read_timeout(Some(remaining))?;

            match socket.recv_from(&mut buf) {
                Ok((n, addr)) => {
                    let Some(info) = parse_shortinfo(&buf[..n], addr) else {
                        debug!("ignoring malformed discovery reply from {}", addr);
                        continue;
                    };
                    if !info.matches(property, value) {
                        continue;
                    }
                    let seen = streams
                        .iter()
                        .any(|s| s.source_id == info.source_id && s.data_addr == info.data_addr);
                    if !seen {
                        info!(
                            "found stream '{}' ({}, {} channels @ {} Hz) at {}",
                            info.name, info.stream_type, info.channel_count, info.nominal_srate, info.data_addr
                        );
                        streams.push(info);
                    }
                }
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(streams)
    }

    /// Queries in `wait`-long rounds until a stream turns up.
    ///
    /// Gives up with `NoStreamsFound` once `limit` has elapsed, or with
    /// `Interrupted` when `stop` is raised. Without a limit it waits forever.
    pub fn resolve_one(
        &self,
        property: &str,
        value: &str,
        wait: Duration,
        limit: Option<Duration>,
        stop: &AtomicBool,
    ) -> LslResult<StreamInfo> {
        let started = Instant::now();
        loop {
            if stop.load(Ordering::SeqCst) {
                return Err(LslError::Interrupted);
            }
            if let Some(info) = self.resolve(property, value, wait)?.into_iter().next() {
                return Ok(info);
            }
            if limit.map_or(false, |limit| started.elapsed() >= limit) {
                return Err(LslError::NoStreamsFound {
                    property: property.to_string(),
                    value: value.to_string(),
                });
            }
            debug!("no {}='{}' stream yet, asking again", property, value);
        }
    }
}

/// Parses a `LSL:shortinfo {json}` reply received from `from`.
pub fn parse_shortinfo(packet: &[u8], from: SocketAddr) -> Option<StreamInfo> {
    let text = std::str::from_utf8(packet).ok()?;
    let body = text.strip_prefix(common::SHORTINFO_PREFIX)?.trim();
    let short: ShortInfo = serde_json::from_str(body).ok()?;
    Some(StreamInfo {
        name: short.name,
        stream_type: short.stream_type,
        channel_count: short.channel_count,
        nominal_srate: short.nominal_srate,
        source_id: short.source_id,
        hostname: short.hostname,
        data_addr: SocketAddr::new(from.ip(), short.port),
    })
}
