use std::io::Write;

use chrono::Local;

use crate::constants::common;

/// Installs the global logger. `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format(common::TIMESTAMP_FORMAT),
                record.level(),
                record.args()
            )
        })
        .init();
}
