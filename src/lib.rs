//! Streaming FASTQ read splitter.
//!
//! Every read is cut at a fixed base position `n` into a head (`[0, n)`) and a
//! tail (`[n, len)`), written to separate gzip FASTQ files.
//!
//! - Paired-end (two inputs, four outputs) or single-end (one input, two outputs).
//! - Plain and `.gz` inputs (auto-detect); outputs are always gzip.
//! - Streaming, one record at a time; stages hand off over zero-capacity channels
//!   so memory stays constant whatever the input size.
//! - Reads with `n` bases or fewer are dropped with a `log` warning.
//! - Positional mate pairing by default, optional strict id matching.
//! - Optional tokio pipeline behind the `async` feature.

pub mod error;
pub mod pipeline;
pub mod policy;
pub mod reader;
pub mod record;
pub mod split;
mod util;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_pipeline;
#[cfg(feature = "async")]
pub mod async_reader;

pub use crate::error::{ConfigError, FastqError, FormatError, IoContext, SplitError};
pub use crate::pipeline::{Driver, Layout, SplitConfig, SplitSummary, output_paths, run};
pub use crate::policy::{ErrorPolicy, PairingMode, ReaderOptions};
pub use crate::reader::{FastqReader, Source};
pub use crate::record::FastqRecord;
pub use crate::split::{PairedSplit, Side, SingleSplit, SplitStats, SplitUnit, Splitter};
pub use crate::writer::{FastqSink, RecordSink, SplitWriter};

#[cfg(feature = "async")]
pub use crate::async_pipeline::run_async;
#[cfg(feature = "async")]
pub use crate::async_reader::AsyncFastqReader;
