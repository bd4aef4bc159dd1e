pub mod parser;
pub mod types;
pub mod writer;


pub use parser::{parse_transcript, ParsedTranscript, UNKNOWN_MODEL};
pub use types::{ContentBlock, EntryKind, Message, MessageContent, ToolCall, TranscriptEntry};
pub use writer::TranscriptWriter;
