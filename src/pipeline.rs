//! Run driver: opens the sinks, wires sources, coordinator and writer together,
//! then drains and closes everything in a fixed order.
//!
//! ```text
//! source R1 ─┐
//!            ├─> coordinator ──> SplitWriter ──> sinks
//! source R2 ─┘
//! ```
//!
//! Every handoff is a zero-capacity channel, so a stage blocks until the next
//! one takes its item and at most a handful of records are in flight.

use crate::error::{ConfigError, FastqError, SplitError};
use crate::policy::{PairingMode, ReaderOptions};
use crate::reader::FastqReader;
use crate::split::{PairCoordinator, SingleCoordinator, SourceItem, SplitStats, Splitter};
use crate::writer::{FastqSink, SplitWriter};

use crossbeam_channel::{Sender, bounded};
use flate2::Compression;
use log::{debug, info};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Experiment layout; exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Paired { r1: PathBuf, r2: PathBuf },
    Single { se: PathBuf },
}

impl Layout {
    /// Build a layout from optional CLI inputs.
    pub fn from_inputs(
        r1: Option<PathBuf>,
        r2: Option<PathBuf>,
        se: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        match (r1, r2, se) {
            (None, None, None) => Err(ConfigError::NoInput),
            (None, None, Some(se)) => Ok(Layout::Single { se }),
            (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => Err(ConfigError::MixedLayouts),
            (Some(r1), Some(r2), None) => Ok(Layout::Paired { r1, r2 }),
            (Some(_), None, None) => Err(ConfigError::MissingMate("R2")),
            (None, Some(_), None) => Err(ConfigError::MissingMate("R1")),
        }
    }
}

fn with_suffix(basename: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(basename.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// `[begin_R1, begin_R2, end_R1, end_R2]`
pub fn paired_paths(basename: &Path) -> [PathBuf; 4] {
    [
        with_suffix(basename, "_begin_R1.fq.gz"),
        with_suffix(basename, "_begin_R2.fq.gz"),
        with_suffix(basename, "_end_R1.fq.gz"),
        with_suffix(basename, "_end_R2.fq.gz"),
    ]
}

/// `[begin, end]`
pub fn single_paths(basename: &Path) -> [PathBuf; 2] {
    [
        with_suffix(basename, "_begin_SE.fq.gz"),
        with_suffix(basename, "_end_SE.fq.gz"),
    ]
}

/// Output files for a layout, in close order.
pub fn output_paths(basename: &Path, layout: &Layout) -> Vec<PathBuf> {
    match layout {
        Layout::Paired { .. } => paired_paths(basename).to_vec(),
        Layout::Single { .. } => single_paths(basename).to_vec(),
    }
}

#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Split position; heads get bases `[0, n)`.
    pub n: usize,
    pub layout: Layout,
    /// Output basename, suffixed per sink.
    pub out: PathBuf,
    /// gzip level for the outputs, 0..=9.
    pub compression: u32,
    pub pairing: PairingMode,
    pub reader: ReaderOptions,
}

impl SplitConfig {
    pub fn new<P: Into<PathBuf>>(n: usize, layout: Layout, out: P) -> Self {
        Self {
            n,
            layout,
            out: out.into(),
            compression: Compression::default().level(),
            pairing: PairingMode::default(),
            reader: ReaderOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n == 0 {
            return Err(ConfigError::ZeroSplitPosition);
        }
        if self.compression > 9 {
            return Err(ConfigError::CompressionLevel(self.compression));
        }
        Ok(())
    }
}

/// `Idle -> SinksOpen -> Streaming -> Draining -> Closed`; any failure goes
/// straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    SinksOpen,
    Streaming,
    Draining,
    Closed,
}

#[derive(Debug, Clone)]
pub struct SplitSummary {
    /// Input records, or record pairs in paired mode.
    pub records_in: u64,
    pub units_out: u64,
    pub discarded: u64,
    /// Output files in close order.
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// Executes one split run.
pub struct Driver {
    config: SplitConfig,
    state: RunState,
}

impl Driver {
    pub fn new(config: SplitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: RunState::Idle,
        })
    }

    fn enter(&mut self, next: RunState) {
        debug!("run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub fn run(mut self) -> Result<SplitSummary, SplitError> {
        let res = self.run_inner();
        self.enter(RunState::Closed);
        res
    }

    fn run_inner(&mut self) -> Result<SplitSummary, SplitError> {
        let started = Instant::now();
        let level = Compression::new(self.config.compression);
        let open = |p: &PathBuf| FastqSink::create(p, level);

        let ((stats, units), sinks) = match self.config.layout.clone() {
            Layout::Paired { r1, r2 } => {
                let [b1, b2, e1, e2] = paired_paths(&self.config.out);
                let mut writer =
                    SplitWriter::paired(open(&b1)?, open(&b2)?, open(&e1)?, open(&e2)?);
                self.enter(RunState::SinksOpen);
                info!(
                    "splitting {} and {} at position {}",
                    r1.display(),
                    r2.display(),
                    self.config.n
                );
                self.enter(RunState::Streaming);
                let streamed = self.stream_paired(r1, r2, &mut writer);
                reclaim_sinks(streamed, writer)?
            }
            Layout::Single { se } => {
                let [b, e] = single_paths(&self.config.out);
                let mut writer = SplitWriter::single(open(&b)?, open(&e)?);
                self.enter(RunState::SinksOpen);
                info!("splitting {} at position {}", se.display(), self.config.n);
                self.enter(RunState::Streaming);
                let streamed = self.stream_single(se, &mut writer);
                reclaim_sinks(streamed, writer)?
            }
        };

        self.enter(RunState::Draining);
        let outputs = sinks
            .into_iter()
            .map(FastqSink::finish)
            .collect::<Result<Vec<_>, _>>()?;

        let summary = SplitSummary {
            records_in: stats.records_in,
            units_out: units,
            discarded: stats.discarded,
            outputs,
            elapsed: started.elapsed(),
        };
        info!(
            "processed {} input records: {} units written, {} discarded, elapsed {:?}",
            summary.records_in, summary.units_out, summary.discarded, summary.elapsed
        );
        Ok(summary)
    }

    fn splitter(&self) -> Splitter {
        Splitter::new(self.config.n, self.config.pairing)
    }

    fn stream_paired(
        &self,
        r1: PathBuf,
        r2: PathBuf,
        writer: &mut SplitWriter<FastqSink>,
    ) -> Result<(SplitStats, u64), SplitError> {
        let (tx1, rx1) = bounded(0);
        let (tx2, rx2) = bounded(0);
        let (units_tx, units_rx) = bounded(0);

        let sources = [
            spawn_source(r1, self.config.reader.clone(), tx1),
            spawn_source(r2, self.config.reader.clone(), tx2),
        ];
        let coordinator = PairCoordinator::new(self.splitter());
        let coordinator = thread::spawn(move || coordinator.run(rx1, rx2, units_tx));

        let written = writer.run(units_rx);
        let coordinated = join_stage(coordinator, "coordinator").and_then(|stats| stats);
        for source in sources {
            join_stage(source, "record source")?;
        }
        let units = written?;
        Ok((coordinated?, units))
    }

    fn stream_single(
        &self,
        se: PathBuf,
        writer: &mut SplitWriter<FastqSink>,
    ) -> Result<(SplitStats, u64), SplitError> {
        let (tx, rx) = bounded(0);
        let (units_tx, units_rx) = bounded(0);

        let source = spawn_source(se, self.config.reader.clone(), tx);
        let coordinator = SingleCoordinator::new(self.splitter());
        let coordinator = thread::spawn(move || coordinator.run(rx, units_tx));

        let written = writer.run(units_rx);
        let coordinated = join_stage(coordinator, "coordinator").and_then(|stats| stats);
        join_stage(source, "record source")?;
        let units = written?;
        Ok((coordinated?, units))
    }
}

/// Convenience wrapper: validate, run once, return the summary.
pub fn run(config: SplitConfig) -> Result<SplitSummary, SplitError> {
    Driver::new(config)?.run()
}

/// Stop the writer lanes and take the sinks back. On a streaming failure the
/// sinks are dropped in whatever state they are in.
fn reclaim_sinks<T>(
    streamed: Result<T, SplitError>,
    writer: SplitWriter<FastqSink>,
) -> Result<(T, Vec<FastqSink>), SplitError> {
    let sinks = writer.finish();
    let value = streamed?;
    Ok((value, sinks?))
}

fn join_stage<T>(handle: JoinHandle<T>, stage: &'static str) -> Result<T, SplitError> {
    handle.join().map_err(|_| SplitError::StagePanicked(stage))
}

/// Read `path` on its own thread, handing each record over `tx`. Stops at the
/// first error (forwarded) or when the receiver hangs up.
fn spawn_source(path: PathBuf, opts: ReaderOptions, tx: Sender<SourceItem>) -> JoinHandle<()> {
    thread::spawn(move || {
        let input_err = |source: FastqError| SplitError::Input {
            path: path.clone(),
            source,
        };
        let reader = match FastqReader::from_path(&path, opts) {
            Ok(reader) => reader,
            Err(e) => {
                let _ = tx.send(Err(input_err(e)));
                return;
            }
        };
        for item in reader {
            let failed = item.is_err();
            if tx.send(item.map_err(input_err)).is_err() || failed {
                break;
            }
        }
    })
}
