use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use log::info;

use eeg_serial_bridge::config::{self, Overrides};
use eeg_serial_bridge::lsl::LslError;
use eeg_serial_bridge::BridgeError;
use eeg_serial_bridge::serial;
use eeg_serial_bridge::utils::logging;

/// Forward EEG samples from a Lab Streaming Layer stream to a serial device.
#[derive(FromArgs)]
struct Args {
    /// path to the configuration file (default: config.json if present)
    #[argh(option, short = 'c')]
    config: Option<String>,

    /// verbose mode
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// serial port to write to
    #[argh(option, short = 'p')]
    port: Option<String>,

    /// serial baud rate
    #[argh(option, short = 'b')]
    baud: Option<u32>,

    /// text sent once after opening the port; \r and \n are expanded
    #[argh(option)]
    greeting: Option<String>,

    /// do not read an acknowledgement line after each frame
    #[argh(switch)]
    no_ack: bool,

    /// stream property to match: name, type, source_id or hostname
    #[argh(option)]
    property: Option<String>,

    /// value the stream property must have
    #[argh(option)]
    value: Option<String>,

    /// comma-separated channel indices to send, e.g. 0,1,2,3
    #[argh(option)]
    channels: Option<String>,

    /// stop after this many samples
    #[argh(option, short = 'n')]
    count: Option<u64>,

    /// give up resolving after this many milliseconds
    #[argh(option)]
    resolve_timeout: Option<u64>,

    /// list available serial ports and exit
    #[argh(switch)]
    list_ports: bool,

    /// print the effective configuration as JSON and exit
    #[argh(switch)]
    print_config: bool,
}

impl Args {
    fn overrides(&self) -> Result<Overrides> {
        let channels = match &self.channels {
            Some(text) => Some(config::parse_channel_list(text)?),
            None => None,
        };
        Ok(Overrides {
            port: self.port.clone(),
            baud_rate: self.baud,
            greeting: self.greeting.as_deref().map(config::unescape),
            read_ack: self.no_ack.then_some(false),
            property: self.property.clone(),
            value: self.value.clone(),
            channels,
            max_samples: self.count,
            resolve_timeout_ms: self.resolve_timeout,
        })
    }
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    logging::init(args.verbose);

    if args.list_ports {
        let ports = serial::list_ports()?;
        if ports.is_empty() {
            println!("No serial ports found.");
        }
        for port in ports {
            println!("{}\t{}", port.name, port.description);
        }
        return Ok(());
    }

    let mut config = config::load_or_default(args.config.as_deref())?;
    config.apply(&args.overrides()?);
    config.validate()?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            println!("\nCtrl+C detected! Stopping...");
            stop.store(true, Ordering::SeqCst);
        })
        .context("Error setting Ctrl+C handler")?;
    }

    // The bridge logs its own final stats, on success and on error
    match eeg_serial_bridge::run(&config, &stop) {
        Err(BridgeError::Lsl(LslError::Interrupted)) => {
            info!("interrupted before a stream was found");
            Ok(())
        }
        result => result.map(|_| ()).map_err(Into::into),
    }
}
