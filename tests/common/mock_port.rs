use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

/// In-memory serial device. Clones share the same buffers, so a test can
/// keep one handle while the bridge owns another.
#[derive(Clone, Default)]
pub struct MockPort {
    written: Arc<Mutex<Vec<u8>>>,
    incoming: Arc<Mutex<VecDeque<u8>>>,
    reply: Option<Vec<u8>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `reply` as incoming data after every write.
    pub fn replying(reply: &[u8]) -> Self {
        Self {
            reply: Some(reply.to_vec()),
            ..Self::default()
        }
    }

    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written.lock().unwrap()).into_owned()
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut incoming = self.incoming.lock().unwrap();
        if incoming.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out"));
        }
        let n = buf.len().min(incoming.len());
        for (slot, byte) in buf.iter_mut().zip(incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        if let Some(reply) = &self.reply {
            self.incoming.lock().unwrap().extend(reply.iter().copied());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
