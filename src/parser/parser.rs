use std::collections::VecDeque;

use byteorder_slice::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::constants::common;
use crate::lsl::Sample;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("stream feed does not start with {prefix:?}", prefix = common::STREAMINFO_PREFIX)]
    BadPreamble,

    #[error("stream header length is not a number")]
    BadLength,

    #[error("stream header of {0} bytes exceeds the limit")]
    HeaderTooLarge(usize),

    #[error("stream header is not valid UTF-8")]
    NotUtf8,

    #[error("stream header has no usable channel_count")]
    MissingChannelCount,

    #[error("stream header declares {0} channels, more than the supported {max}", max = common::MAX_CHANNELS)]
    TooManyChannels(usize),
}

/// Stream description sent once at the start of a data feed.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamHeader {
    pub xml: String,
    pub channel_count: usize,
}

#[derive(Debug, PartialEq)]
pub enum Frame {
    StreamInfo(StreamHeader),
    Sample(Sample),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Samples { channel_count: usize },
}

/// Splits a stream feed into its header and fixed-size sample records.
///
/// Bytes may arrive in any chunking; incomplete frames stay queued until
/// the rest is pushed.
pub struct Parser {
    state: State,
    data_queue: VecDeque<u8>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Header,
            data_queue: VecDeque::new(),
        }
    }

    /// Push data into the parser's queue
    pub fn push_data(&mut self, data: &[u8]) {
        self.data_queue.extend(data);
    }

    pub fn buffered(&self) -> usize {
        self.data_queue.len()
    }

    /// Known once the header has been parsed.
    pub fn channel_count(&self) -> Option<usize> {
        match self.state {
            State::Header => None,
            State::Samples { channel_count } => Some(channel_count),
        }
    }

    /// Size of one sample record: f64 timestamp plus one f32 per channel.
    /// `None` if that does not fit in a `usize`.
    pub fn record_size(channel_count: usize) -> Option<usize> {
        channel_count.checked_mul(4)?.checked_add(8)
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, ParseError> {
        match self.state {
            State::Header => self.parse_header(),
            State::Samples { channel_count } => Ok(self.parse_sample(channel_count)),
        }
    }

    fn parse_header(&mut self) -> Result<Option<Frame>, ParseError> {
        let prefix = common::STREAMINFO_PREFIX.as_bytes();
        let available = self.data_queue.len();
        let bytes = self.data_queue.make_contiguous();

        let head = available.min(prefix.len());
        if bytes[..head] != prefix[..head] {
            return Err(ParseError::BadPreamble);
        }
        if available < prefix.len() {
            return Ok(None);
        }

        let rest = &bytes[prefix.len()..];
        let Some(colon) = rest.iter().position(|&b| b == b':') else {
            // usize never needs more than 20 digits
            if rest.len() > 20 {
                return Err(ParseError::BadLength);
            }
            return Ok(None);
        };
        let digits = &rest[..colon];
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
            return Err(ParseError::BadLength);
        }
        let xml_length: usize = std::str::from_utf8(digits)
            .map_err(|_| ParseError::BadLength)?
            .parse()
            .map_err(|_| ParseError::BadLength)?;
        if xml_length > common::MAX_HEADER_LENGTH {
            return Err(ParseError::HeaderTooLarge(xml_length));
        }

        let xml_start = prefix.len() + colon + 1;
        let total = xml_start + xml_length;
        if available < total {
            return Ok(None);
        }

        let xml = std::str::from_utf8(&bytes[xml_start..total])
            .map_err(|_| ParseError::NotUtf8)?
            .to_string();
        let channel_count = xml_tag(&xml, "channel_count")
            .and_then(|text| text.trim().parse::<usize>().ok())
            .filter(|&count| count > 0)
            .ok_or(ParseError::MissingChannelCount)?;
        if channel_count > common::MAX_CHANNELS || Self::record_size(channel_count).is_none() {
            return Err(ParseError::TooManyChannels(channel_count));
        }

        self.data_queue.drain(..total);
        self.state = State::Samples { channel_count };
        Ok(Some(Frame::StreamInfo(StreamHeader { xml, channel_count })))
    }

    fn parse_sample(&mut self, channel_count: usize) -> Option<Frame> {
        // Bounded by MAX_CHANNELS when the header was accepted
        let size = Self::record_size(channel_count)?;
        if self.data_queue.len() < size {
            return None;
        }
        let packet: Vec<u8> = self.data_queue.drain(..size).collect();
        let timestamp = LittleEndian::read_f64(&packet[..8]);
        let values: Vec<f32> = packet[8..]
            .chunks_exact(4)
            .map(|chunk| LittleEndian::read_f32(chunk))
            .collect();
        Some(Frame::Sample(Sample { timestamp, values }))
    }
}

/// Text between `<tag>` and `</tag>`, first occurrence only.
pub fn xml_tag<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(&xml[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = "<?xml version=\"1.0\"?>\n<info>\n  <name>Muse</name>\n  <type>EEG</type>\n  <channel_count>5</channel_count>\n</info>\n";

    fn header(xml: &str) -> Vec<u8> {
        format!("{}{}:{}", common::STREAMINFO_PREFIX, xml.len(), xml).into_bytes()
    }

    fn record(timestamp: f64, values: &[f32]) -> Vec<u8> {
        let mut out = timestamp.to_le_bytes().to_vec();
        for value in values {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    #[test]
    fn header_then_samples() {
        let mut parser = Parser::new();
        parser.push_data(&header(XML));
        parser.push_data(&record(1.5, &[1.0, 2.0, 3.0, 4.0, 5.0]));

        match parser.next_frame().unwrap() {
            Some(Frame::StreamInfo(info)) => {
                assert_eq!(info.channel_count, 5);
                assert_eq!(info.xml, XML);
            }
            other => panic!("expected stream info, got {:?}", other),
        }
        assert_eq!(parser.channel_count(), Some(5));
        assert_eq!(
            parser.next_frame().unwrap(),
            Some(Frame::Sample(Sample {
                timestamp: 1.5,
                values: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            }))
        );
        assert_eq!(parser.next_frame().unwrap(), None);
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn byte_at_a_time_feed() {
        let mut bytes = header(XML);
        bytes.extend(record(0.25, &[-1.0, 0.5, 812.5, 0.0, 7.0]));
        bytes.extend(record(0.5, &[1.0; 5]));

        let mut parser = Parser::new();
        let mut frames = Vec::new();
        for byte in bytes {
            parser.push_data(&[byte]);
            while let Some(frame) = parser.next_frame().unwrap() {
                frames.push(frame);
            }
        }
        assert_eq!(frames.len(), 3);
        assert!(matches!(frames[0], Frame::StreamInfo(_)));
        match &frames[1] {
            Frame::Sample(sample) => {
                assert_eq!(sample.timestamp, 0.25);
                assert_eq!(sample.values[2], 812.5);
            }
            other => panic!("expected sample, got {:?}", other),
        }
    }

    #[test]
    fn partial_record_waits() {
        let mut parser = Parser::new();
        parser.push_data(&header(XML));
        parser.next_frame().unwrap();

        let bytes = record(2.0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        parser.push_data(&bytes[..10]);
        assert_eq!(parser.next_frame().unwrap(), None);
        assert_eq!(parser.buffered(), 10);
        parser.push_data(&bytes[10..]);
        assert!(matches!(parser.next_frame().unwrap(), Some(Frame::Sample(_))));
    }

    #[test]
    fn rejects_foreign_preamble() {
        let mut parser = Parser::new();
        parser.push_data(b"HTTP/1.1 200 OK");
        assert_eq!(parser.next_frame(), Err(ParseError::BadPreamble));
    }

    #[test]
    fn rejects_bad_lengths() {
        let mut parser = Parser::new();
        parser.push_data(b"LSL:streaminfo/12a:");
        assert_eq!(parser.next_frame(), Err(ParseError::BadLength));

        let mut parser = Parser::new();
        parser.push_data(format!("LSL:streaminfo/{}:", common::MAX_HEADER_LENGTH + 1).as_bytes());
        assert_eq!(
            parser.next_frame(),
            Err(ParseError::HeaderTooLarge(common::MAX_HEADER_LENGTH + 1))
        );
    }

    #[test]
    fn requires_channel_count() {
        let mut parser = Parser::new();
        parser.push_data(&header("<info><name>x</name></info>"));
        assert_eq!(parser.next_frame(), Err(ParseError::MissingChannelCount));

        let mut parser = Parser::new();
        parser.push_data(&header("<info><channel_count>0</channel_count></info>"));
        assert_eq!(parser.next_frame(), Err(ParseError::MissingChannelCount));
    }

    #[test]
    fn rejects_oversized_channel_counts() {
        let huge = usize::MAX / 2;
        let mut parser = Parser::new();
        parser.push_data(&header(&format!("<info><channel_count>{}</channel_count></info>", huge)));
        assert_eq!(parser.next_frame(), Err(ParseError::TooManyChannels(huge)));
        parser.push_data(&[0u8; 16]);
        assert_eq!(parser.channel_count(), None);

        let mut parser = Parser::new();
        let count = common::MAX_CHANNELS + 1;
        parser.push_data(&header(&format!("<info><channel_count>{}</channel_count></info>", count)));
        assert_eq!(parser.next_frame(), Err(ParseError::TooManyChannels(count)));

        let mut parser = Parser::new();
        let count = common::MAX_CHANNELS;
        parser.push_data(&header(&format!("<info><channel_count>{}</channel_count></info>", count)));
        assert!(matches!(parser.next_frame(), Ok(Some(Frame::StreamInfo(_)))));
    }

    #[test]
    fn record_size_is_checked() {
        assert_eq!(Parser::record_size(5), Some(28));
        assert_eq!(Parser::record_size(usize::MAX / 2), None);
    }

    #[test]
    fn xml_tag_lookup() {
        assert_eq!(xml_tag(XML, "type"), Some("EEG"));
        assert_eq!(xml_tag(XML, "missing"), None);
    }
}
