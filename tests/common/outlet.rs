use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::thread;
use std::time::Duration;

/// Loopback stand-in for an LSL outlet: answers discovery queries on UDP
/// and serves one data feed over TCP, then closes it.
pub struct TestOutlet {
    pub discovery_addr: SocketAddr,
    pub data_addr: SocketAddr,
}

impl TestOutlet {
    pub fn spawn(
        name: &str,
        stream_type: &str,
        channel_count: usize,
        samples: Vec<(f64, Vec<f32>)>,
    ) -> io::Result<Self> {
        Self::spawn_answering(name, stream_type, channel_count, samples, 1)
    }

    /// Like `spawn`, but every discovery query gets `answers` identical replies.
    pub fn spawn_answering(
        name: &str,
        stream_type: &str,
        channel_count: usize,
        samples: Vec<(f64, Vec<f32>)>,
        answers: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let data_addr = listener.local_addr()?;

        let discovery = UdpSocket::bind("127.0.0.1:0")?;
        discovery.set_read_timeout(Some(Duration::from_secs(10)))?;
        let discovery_addr = discovery.local_addr()?;

        let reply = format!(
            "LSL:shortinfo {}",
            serde_json::json!({
                "name": name,
                "type": stream_type,
                "channel_count": channel_count,
                "nominal_srate": 256,
                "source_id": format!("test-{}", name),
                "hostname": "localhost",
                "port": data_addr.port(),
            })
        );
        thread::spawn(move || {
            let mut buf = [0u8; 1024];
            while let Ok((n, from)) = discovery.recv_from(&mut buf) {
                if buf[..n].starts_with(b"LSL:shortinfo") {
                    for _ in 0..answers {
                        let _ = discovery.send_to(reply.as_bytes(), from);
                    }
                }
            }
        });

        let xml = stream_xml(name, stream_type, channel_count);
        thread::spawn(move || {
            let Ok((mut client, _)) = listener.accept() else {
                return;
            };
            let _ = client.set_nodelay(true);
            let _ = write!(client, "LSL:streaminfo/{}:{}", xml.len(), xml);
            for (timestamp, values) in samples {
                let record = record(timestamp, &values);
                // Split every record so the inlet sees partial reads.
                let (head, tail) = record.split_at(5);
                if client.write_all(head).is_err() {
                    return;
                }
                thread::sleep(Duration::from_millis(2));
                if client.write_all(tail).is_err() {
                    return;
                }
            }
            thread::sleep(Duration::from_millis(100));
        });

        Ok(Self {
            discovery_addr,
            data_addr,
        })
    }
}

pub fn stream_xml(name: &str, stream_type: &str, channel_count: usize) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<info>\n  <name>{}</name>\n  <type>{}</type>\n  <channel_count>{}</channel_count>\n  <nominal_srate>256</nominal_srate>\n  <channel_format>float32</channel_format>\n</info>\n",
        name, stream_type, channel_count
    )
}

pub fn record(timestamp: f64, values: &[f32]) -> Vec<u8> {
    let mut out = timestamp.to_le_bytes().to_vec();
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}
