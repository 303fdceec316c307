pub mod link;

pub use link::{list_ports, PortSummary, SerialError, SerialLink};
