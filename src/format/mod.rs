pub mod frame;

pub use frame::{render_value, FormatError, FrameFormatter};
