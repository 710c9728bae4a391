//! relay-ingest: export decoding, delimited parsing and header → field mapping.

pub mod encoding;
pub mod parser;
pub mod schema;
pub mod source;
pub mod types;

pub use encoding::{decode, TextEncoding};
pub use parser::{parse_export, parse_text, ExportRows};
pub use schema::{lookup_header, map_row, normalize_header, synonyms};
pub use source::{Attachment, ExportSource, MemorySource, MessageDescriptor};
pub use types::{CanonicalField, FieldSet};
