pub mod record_parser;

pub use record_parser::{parse_facilities, Parser, RecordParser};
