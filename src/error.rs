use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub struct IoContext {
    pub byte_pos: u64,
    pub line_num: u64,
}

impl IoContext {
    pub(crate) const START: IoContext = IoContext {
        byte_pos: 0,
        line_num: 0,
    };
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("stream ended inside a record ({lines} of 4 lines present)")]
    TruncatedRecord { lines: usize },
    #[error("gzip input found but the `gzip` feature is disabled")]
    GzipDisabled,
}

#[derive(Debug, Error)]
pub enum FastqError {
    #[error("I/O error at {ctx:?}: {source}")]
    Io {
        #[source]
        source: io::Error,
        ctx: IoContext,
    },
    #[error("format error at {ctx:?}: {source}")]
    Format {
        #[source]
        source: FormatError,
        ctx: IoContext,
    },
}

impl FastqError {
    pub(crate) fn io_err(source: io::Error, ctx: IoContext) -> Self {
        Self::Io { source, ctx }
    }
    pub(crate) fn fmt_err(source: FormatError, ctx: IoContext) -> Self {
        Self::Format { source, ctx }
    }
}

/// Invalid run configuration, detected before any output file is opened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("split position must be greater than 0 (e.g. 35)")]
    ZeroSplitPosition,
    #[error("no input given: use --r1 and --r2 for paired-end or --se for single-end")]
    NoInput,
    #[error("paired-end (--r1/--r2) and single-end (--se) inputs cannot be combined")]
    MixedLayouts,
    #[error("paired-end mode needs both mates, {0} is missing")]
    MissingMate(&'static str),
    #[error("compression level {0} is out of range 0..=9")]
    CompressionLevel(u32),
}

/// Fatal error surfaced by a split run.
#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("reading {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: FastqError,
    },
    #[error("writing {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("mates are out of sync: R1 '{r1}' paired with R2 '{r2}'")]
    PairMismatch { r1: String, r2: String },
    #[error("{0} stage panicked")]
    StagePanicked(&'static str),
}
