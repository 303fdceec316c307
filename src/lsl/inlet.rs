use std::io::Read;
use std::net::TcpStream;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::{deadline_after, LslError, LslResult, Sample, SampleSource, StreamInfo};
use crate::constants::common;
use crate::parser::{Frame, Parser};

/// LSL data inlet (data receiver)
pub struct Inlet {
    info: StreamInfo,
    stream: TcpStream,
    parser: Parser,
    read_buffer: Vec<u8>,
}

impl Inlet {
    /// Connects to the outlet and waits for its stream header.
    ///
    /// The header's channel count wins over the one from discovery.
    pub fn open(info: &StreamInfo, connect_timeout: Duration) -> LslResult<Self> {
        let stream = TcpStream::connect_timeout(&info.data_addr, connect_timeout)?;
        stream.set_nodelay(true)?;

        let mut inlet = Self {
            info: info.clone(),
            stream,
            parser: Parser::new(),
            read_buffer: vec![0u8; common::LSL_READ_SIZE],
        };
        inlet.read_header(connect_timeout)?;
        Ok(inlet)
    }

    /// Get stream info
    #[must_use]
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn read_header(&mut self, timeout: Duration) -> LslResult<()> {
        let deadline = deadline_after(timeout);
        loop {
            if let Some(Frame::StreamInfo(header)) = self.parser.next_frame()? {
                if header.channel_count != self.info.channel_count {
                    warn!(
                        "stream '{}' advertised {} channels but sends {}",
                        self.info.name, self.info.channel_count, header.channel_count
                    );
                    self.info.channel_count = header.channel_count;
                }
                debug!("stream header: {} bytes of XML", header.xml.len());
                return Ok(());
            }
            if !self.fill(deadline)? {
                return Err(LslError::Timeout);
            }
        }
    }

    /// Reads once from the socket. `false` when the deadline passes with no data.
    fn fill(&mut self, deadline: Instant) -> LslResult<bool> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(false);
        }
        self.stream.set_read_timeout(Some(remaining))?;

        match self.stream.read(&mut self.read_buffer) {
            Ok(0) => Err(LslError::Disconnected),
            Ok(n) => {
                self.parser.push_data(&self.read_buffer[..n]);
                Ok(true)
            }
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl SampleSource for Inlet {
    fn pull_sample(&mut self, timeout: Duration) -> LslResult<Option<Sample>> {
        let deadline = deadline_after(timeout);
        loop {
            if let Some(Frame::Sample(sample)) = self.parser.next_frame()? {
                return Ok(Some(sample));
            }
            if !self.fill(deadline)? {
                return Ok(None);
            }
        }
    }
}
