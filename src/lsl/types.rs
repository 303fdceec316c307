use std::net::SocketAddr;

/// One multi-channel sample with its source timestamp (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub values: Vec<f32>,
}

/// Stream metadata as advertised during discovery
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Stream name (e.g., "Muse")
    pub name: String,
    /// Content type (e.g., "EEG")
    pub stream_type: String,
    /// Number of channels
    pub channel_count: usize,
    /// Nominal sample rate (Hz), 0 for irregular
    pub nominal_srate: f64,
    /// Unique source ID
    pub source_id: String,
    /// Hostname
    pub hostname: String,
    /// Where the data feed is served
    pub data_addr: SocketAddr,
}

impl StreamInfo {
    /// True if the named property equals `value`. Unknown properties never match.
    #[must_use]
    pub fn matches(&self, property: &str, value: &str) -> bool {
        match property {
            "name" => self.name == value,
            "type" => self.stream_type == value,
            "source_id" => self.source_id == value,
            "hostname" => self.hostname == value,
            _ => false,
        }
    }
}
