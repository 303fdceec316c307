pub mod parser;

pub use parser::{xml_tag, Frame, ParseError, Parser, StreamHeader};
