use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("pattern '{pattern}' not found")]
    PatternNotFound { pattern: String },

    #[error(
        "replacement ({replacement_len} bytes) is longer than pattern ({pattern_len} bytes)"
    )]
    LengthOverflow {
        pattern_len: usize,
        replacement_len: usize,
    },

    #[error(
        "replacement must be the same length as the pattern ({pattern_len} bytes, got {replacement_len})"
    )]
    LengthMismatch {
        pattern_len: usize,
        replacement_len: usize,
    },

    #[error("empty pattern")]
    EmptyPattern,

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("ELF error: {0}")]
    Elf(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
