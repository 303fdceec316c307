//! Forwards EEG samples from a Lab Streaming Layer stream to a
//! microcontroller over a serial link, one text frame per sample.

pub mod bridge;
pub mod config;
pub mod constants;
pub mod format;
pub mod lsl;
pub mod parser;
pub mod serial;
pub mod utils;

pub use bridge::{run, run_with, Bridge, BridgeError, BridgeStats, Step};
pub use config::Config;
