// src/lib.rs
pub mod error;
pub mod filter;
pub mod formatters;
pub mod lines;
pub mod pipeline;
pub mod tokenize;

pub use error::SiftError;
pub use pipeline::{run, RunStats};

pub use filter::{extract_errors, Block, ErrorFilter, FilterStats};
pub use formatters::{classify, format_stream, CommandFormatter, FormatStats, LineKind, Policy};
pub use pipeline::config::{
    detect_width, FilterConfig, FormatConfig, SiftConfig, WidthSource, DEFAULT_INDENT,
    DEFAULT_WIDTH,
};
pub use tokenize::{tokenize, tokenize_bytes};
