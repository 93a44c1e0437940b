#![cfg(feature = "async")]
//! The split run on tokio: one task per record source, one coordinator task,
//! and the writer on the calling task. Handoffs are capacity-1 channels; the
//! two mate writes of a paired unit are joined before the next unit.

use crate::async_reader::AsyncFastqReader;
use crate::error::{FastqError, SplitError};
use crate::pipeline::{Layout, SplitConfig, SplitSummary, paired_paths, single_paths};
use crate::policy::ReaderOptions;
use crate::record::FastqRecord;
use crate::split::{PairedSplit, Side, SingleSplit, SourceItem, SplitStats, Splitter};

use async_compression::Level;
use async_compression::tokio::write::GzipEncoder;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

struct AsyncSink {
    path: PathBuf,
    inner: GzipEncoder<BufWriter<File>>,
    buf: Vec<u8>,
}

impl AsyncSink {
    async fn create(path: PathBuf, level: u32) -> Result<Self, SplitError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(|source| SplitError::Output {
                path: path.clone(),
                source,
            })?;
        let inner = GzipEncoder::with_quality(
            BufWriter::with_capacity(256 * 1024, file),
            Level::Precise(level as i32),
        );
        Ok(Self {
            path,
            inner,
            buf: Vec::with_capacity(512),
        })
    }

    async fn write_record(&mut self, rec: &FastqRecord) -> Result<(), SplitError> {
        self.buf.clear();
        let res = match rec.write_to(&mut self.buf) {
            Ok(()) => self.inner.write_all(&self.buf).await,
            Err(e) => Err(e),
        };
        res.map_err(|source| SplitError::Output {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the gzip trailer and flushes the file.
    async fn finish(mut self) -> Result<PathBuf, SplitError> {
        match self.inner.shutdown().await {
            Ok(()) => Ok(self.path),
            Err(source) => Err(SplitError::Output {
                path: self.path,
                source,
            }),
        }
    }
}

fn spawn_source(path: PathBuf, opts: ReaderOptions, tx: Sender<SourceItem>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let input_err = |source: FastqError| SplitError::Input {
            path: path.clone(),
            source,
        };
        let mut reader = match AsyncFastqReader::from_path(&path, opts).await {
            Ok(reader) => reader,
            Err(e) => {
                let _ = tx.send(Err(input_err(e))).await;
                return;
            }
        };
        while let Some(item) = reader.next_record().await {
            let failed = item.is_err();
            if tx.send(item.map_err(input_err)).await.is_err() || failed {
                break;
            }
        }
    })
}

async fn coordinate_paired(
    mut splitter: Splitter,
    mut r1: Receiver<SourceItem>,
    mut r2: Receiver<SourceItem>,
    out: Sender<PairedSplit>,
) -> Result<SplitStats, SplitError> {
    while let Some(read1) = r1.recv().await {
        let read1 = read1?;
        let Some(read2) = r2.recv().await else {
            warn!(
                "R2 input ended before R1; '{}' and any later R1 records are ignored",
                read1.id_lossy()
            );
            return Ok(splitter.stats());
        };
        if let Some(units) = splitter.split_pair(read1, read2?)? {
            for unit in units {
                if out.send(unit).await.is_err() {
                    return Ok(splitter.stats());
                }
            }
        }
    }
    if let Some(Ok(read2)) = r2.recv().await {
        warn!(
            "R1 input ended before R2; '{}' and any later R2 records are ignored",
            read2.id_lossy()
        );
    }
    Ok(splitter.stats())
}

async fn coordinate_single(
    mut splitter: Splitter,
    mut input: Receiver<SourceItem>,
    out: Sender<SingleSplit>,
) -> Result<SplitStats, SplitError> {
    while let Some(item) = input.recv().await {
        if let Some(units) = splitter.split_single(item?) {
            for unit in units {
                if out.send(unit).await.is_err() {
                    return Ok(splitter.stats());
                }
            }
        }
    }
    Ok(splitter.stats())
}

async fn join_stage<T>(handle: JoinHandle<T>, stage: &'static str) -> Result<T, SplitError> {
    handle.await.map_err(|_| SplitError::StagePanicked(stage))
}

async fn open_all<const N: usize>(
    paths: [PathBuf; N],
    level: u32,
) -> Result<Vec<AsyncSink>, SplitError> {
    let mut sinks = Vec::with_capacity(N);
    for path in paths {
        sinks.push(AsyncSink::create(path, level).await?);
    }
    Ok(sinks)
}

/// Async counterpart of [`crate::pipeline::run`]; must be called inside a tokio runtime.
pub async fn run_async(config: SplitConfig) -> Result<SplitSummary, SplitError> {
    config.validate()?;
    let started = Instant::now();
    let splitter = Splitter::new(config.n, config.pairing);
    let out: &Path = &config.out;

    let (stats, units, sinks) = match config.layout.clone() {
        Layout::Paired { r1, r2 } => {
            let mut sinks = open_all(paired_paths(out), config.compression).await?;
            info!(
                "splitting {} and {} at position {}",
                r1.display(),
                r2.display(),
                config.n
            );

            let (tx1, rx1) = mpsc::channel(1);
            let (tx2, rx2) = mpsc::channel(1);
            let (units_tx, mut units_rx) = mpsc::channel::<PairedSplit>(1);
            let sources = [
                spawn_source(r1, config.reader.clone(), tx1),
                spawn_source(r2, config.reader.clone(), tx2),
            ];
            let coordinator = tokio::spawn(coordinate_paired(splitter, rx1, rx2, units_tx));

            let written = async {
                let [b1, b2, e1, e2] = sinks.as_mut_slice() else {
                    return Err(SplitError::StagePanicked("sink setup"));
                };
                let mut units = 0u64;
                while let Some(unit) = units_rx.recv().await {
                    let (s1, s2) = match unit.side {
                        Side::Head => (&mut *b1, &mut *b2),
                        Side::Tail => (&mut *e1, &mut *e2),
                    };
                    let (w1, w2) =
                        tokio::join!(s1.write_record(&unit.first), s2.write_record(&unit.second));
                    w1?;
                    w2?;
                    units += 1;
                }
                Ok::<u64, SplitError>(units)
            }
            .await;
            drop(units_rx);

            let coordinated = join_stage(coordinator, "coordinator")
                .await
                .and_then(|stats| stats);
            for source in sources {
                join_stage(source, "record source").await?;
            }
            let units = written?;
            (coordinated?, units, sinks)
        }
        Layout::Single { se } => {
            let mut sinks = open_all(single_paths(out), config.compression).await?;
            info!("splitting {} at position {}", se.display(), config.n);

            let (tx, rx) = mpsc::channel(1);
            let (units_tx, mut units_rx) = mpsc::channel::<SingleSplit>(1);
            let source = spawn_source(se, config.reader.clone(), tx);
            let coordinator = tokio::spawn(coordinate_single(splitter, rx, units_tx));

            let written = async {
                let [begin, end] = sinks.as_mut_slice() else {
                    return Err(SplitError::StagePanicked("sink setup"));
                };
                let mut units = 0u64;
                while let Some(unit) = units_rx.recv().await {
                    let sink = match unit.side {
                        Side::Head => &mut *begin,
                        Side::Tail => &mut *end,
                    };
                    sink.write_record(&unit.read).await?;
                    units += 1;
                }
                Ok::<u64, SplitError>(units)
            }
            .await;
            drop(units_rx);

            let coordinated = join_stage(coordinator, "coordinator")
                .await
                .and_then(|stats| stats);
            join_stage(source, "record source").await?;
            let units = written?;
            (coordinated?, units, sinks)
        }
    };

    let mut outputs = Vec::with_capacity(sinks.len());
    for sink in sinks {
        outputs.push(sink.finish().await?);
    }

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
