pub mod status_parser;

pub use status_parser::{parse, parse_float_or_zero};
