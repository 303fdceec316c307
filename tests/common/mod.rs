#![allow(dead_code)]

pub mod mock_port;
pub mod outlet;
pub mod test_utils;
