pub const SERIAL_PORT: &str = "/dev/tty.usbmodem2101"; // Change this to match your serial port
pub const BAUDRATE: u32 = 115_200;
pub const SERIAL_TIMEOUT_MS: u64 = 1_000;
pub const SERIAL_READ_SIZE: usize = 256;
pub const MAX_LINE_LENGTH: usize = 4096;
pub const GREETING: &str = "hello\r";

pub const DEFAULT_CONFIG: &str = "config.json";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub const STREAM_PROPERTY: &str = "type";
pub const STREAM_VALUE: &str = "EEG";
pub const STREAM_PROPERTIES: [&str; 4] = ["name", "type", "source_id", "hostname"];

/// Muse headset layout: TP9, AF7, AF8, TP10, then the right AUX input.
pub const CHANNELS: [usize; 4] = [0, 1, 2, 3];
pub const CHANNEL_LABELS: [&str; 4] = ["TP9", "AF7", "AF8", "TP10"];
pub const SEPARATOR: &str = ", ";
pub const TERMINATOR: &str = "";

pub const LSL_MULTICAST_ADDR: &str = "224.0.0.183";
pub const LSL_MULTICAST_PORT: u16 = 16571;
pub const SHORTINFO_PREFIX: &str = "LSL:shortinfo";
pub const STREAMINFO_PREFIX: &str = "LSL:streaminfo/";
pub const MAX_HEADER_LENGTH: usize = 64 * 1024;
pub const MAX_CHANNELS: usize = 1024;
pub const LSL_READ_SIZE: usize = 4096;
pub const DISCOVERY_PACKET_SIZE: usize = 4096;

pub const RESOLVE_WAIT_MS: u64 = 1_000;
pub const PULL_TIMEOUT_MS: u64 = 1_000;
pub const CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Upper bound for every configured timeout (one hour).
pub const MAX_TIMEOUT_MS: u64 = 3_600_000;
