use thiserror::Error;

use crate::config::FrameConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("channel {index} requested but the sample has only {available}")]
    MissingChannel { index: usize, available: usize },
}

/// Renders selected channels of a sample as one text frame.
///
/// With the defaults a Muse sample becomes `"{tp9}, {af7}, {af8}, {tp10}"`.
#[derive(Debug, Clone)]
pub struct FrameFormatter {
    channels: Vec<usize>,
    separator: String,
    terminator: String,
}

impl Default for FrameFormatter {
    fn default() -> Self {
        Self::from_config(&FrameConfig::default())
    }
}

impl FrameFormatter {
    pub fn new(channels: Vec<usize>, separator: &str, terminator: &str) -> Self {
        Self {
            channels,
            separator: separator.to_string(),
            terminator: terminator.to_string(),
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new(config.channels.clone(), &config.separator, &config.terminator)
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    /// Smallest channel count a sample needs for `format` to succeed.
    pub fn required_channels(&self) -> usize {
        self.channels.iter().max().map_or(0, |&max| max + 1)
    }

    pub fn format(&self, values: &[f32]) -> Result<String, FormatError> {
        let mut frame = String::new();
        for (i, &index) in self.channels.iter().enumerate() {
            let value = values.get(index).ok_or(FormatError::MissingChannel {
                index,
                available: values.len(),
            })?;
            if i > 0 {
                frame.push_str(&self.separator);
            }
            frame.push_str(&render_value(*value));
        }
        frame.push_str(&self.terminator);
        Ok(frame)
    }
}

/// Shortest round-trip decimal, never in exponent form, with at least one
/// fractional digit. Non-finite values read `nan`, `inf` and `-inf`.
pub fn render_value(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}
