pub mod parser;
pub mod serialiser;
pub mod types;

pub use parser::{parse_log_message, parse_record, RecordIter};
pub use serialiser::{serialise_log_message, serialise_record};
pub use types::{CodecError, LogMessage, SensorRecord};
