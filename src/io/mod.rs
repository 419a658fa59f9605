//! File and text I/O utilities.
//!
//! Plain-text file reading for note ingestion, plus a Unicode-aware helper
//! for safe text slicing.

pub mod reader;
pub mod unicode;

pub use reader::read_file;
pub use unicode::truncate_graphemes;
