pub mod ini_parser;

pub use ini_parser::{parse_ini, ParseError, ParseErrorKind};
