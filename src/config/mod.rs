pub mod config;

pub use config::{
    load_or_default, parse_channel_list, unescape, Config, ConfigError, FrameConfig, Overrides,
    SerialConfig, StreamConfig,
};
