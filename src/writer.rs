//! Output side: gzip FASTQ sinks and the writer stage that feeds them.
//!
//! ```text
//!                      ┌──────────> lane begin_R1 ──> sink
//!   units ──> SplitWriter ───────> lane begin_R2 ──> sink
//!                      ├──────────> lane end_R1   ──> sink
//!                      └──────────> lane end_R2   ──> sink
//! ```
//!
//! Each sink is owned by one lane thread and written by nobody else. A unit's
//! reads are handed to their lanes at once and the writer waits for every lane
//! to acknowledge before it accepts the next unit.

use crate::error::SplitError;
use crate::record::FastqRecord;
use crate::split::{Side, SplitUnit};
use crate::util::open_append;

use crossbeam_channel::{Receiver, Sender, bounded};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Destination for serialized records.
pub trait RecordSink: Send + 'static {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<(), SplitError>;
}

/// In-memory sink, handy for inspecting output.
impl RecordSink for Vec<u8> {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<(), SplitError> {
        rec.write_to(self).map_err(|source| SplitError::Output {
            path: PathBuf::from("<memory>"),
            source,
        })
    }
}

/// Append-created, buffered, gzip-compressed FASTQ output file.
pub struct FastqSink {
    path: PathBuf,
    inner: BufWriter<GzEncoder<File>>,
}

impl FastqSink {
    pub fn create<P: AsRef<Path>>(path: P, level: Compression) -> Result<Self, SplitError> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path).map_err(|source| SplitError::Output {
            path: path.clone(),
            source,
        })?;
        let inner = BufWriter::with_capacity(256 * 1024, GzEncoder::new(file, level));
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered bytes, write the gzip trailer and flush the file.
    pub fn finish(self) -> Result<PathBuf, SplitError> {
        let Self { path, inner } = self;
        let out_err = |source: io::Error| SplitError::Output {
            path: path.clone(),
            source,
        };
        let encoder = inner.into_inner().map_err(|e| out_err(e.into_error()))?;
        let mut file = encoder.finish().map_err(out_err)?;
        file.flush().map_err(out_err)?;
        Ok(path)
    }
}

impl RecordSink for FastqSink {
    fn write_record(&mut self, rec: &FastqRecord) -> Result<(), SplitError> {
        rec.write_to(&mut self.inner)
            .map_err(|source| SplitError::Output {
                path: self.path.clone(),
                source,
            })
    }
}

struct Lane<S> {
    tx: Sender<FastqRecord>,
    ack: Receiver<Result<(), SplitError>>,
    handle: JoinHandle<S>,
}

impl<S: RecordSink> Lane<S> {
    fn spawn(sink: S) -> Self {
        let (tx, rx) = bounded::<FastqRecord>(0);
        let (ack_tx, ack) = bounded(0);
        let handle = thread::spawn(move || {
            let mut sink = sink;
            for rec in rx.iter() {
                let res = sink.write_record(&rec);
                let failed = res.is_err();
                if ack_tx.send(res).is_err() || failed {
                    break;
                }
            }
            sink
        });
        Self { tx, ack, handle }
    }
}

/// Writer stage. Head units go to the head lanes, tail units to the tail lanes,
/// one read per lane.
pub struct SplitWriter<S> {
    head: Vec<Lane<S>>,
    tail: Vec<Lane<S>>,
    units: u64,
}

impl<S: RecordSink> SplitWriter<S> {
    pub fn paired(begin_r1: S, begin_r2: S, end_r1: S, end_r2: S) -> Self {
        Self {
            head: vec![Lane::spawn(begin_r1), Lane::spawn(begin_r2)],
            tail: vec![Lane::spawn(end_r1), Lane::spawn(end_r2)],
            units: 0,
        }
    }

    pub fn single(begin: S, end: S) -> Self {
        Self {
            head: vec![Lane::spawn(begin)],
            tail: vec![Lane::spawn(end)],
            units: 0,
        }
    }

    /// Units written so far.
    pub fn units(&self) -> u64 {
        self.units
    }

    /// Write every read of `unit` to its lane and wait for all of them.
    pub fn write_unit<U: SplitUnit>(&mut self, unit: U) -> Result<(), SplitError> {
        let lanes = match unit.side() {
            Side::Head => &self.head,
            Side::Tail => &self.tail,
        };

        let mut sent = 0;
        for (lane, rec) in lanes.iter().zip(unit.into_reads()) {
            lane.tx
                .send(rec)
                .map_err(|_| SplitError::StagePanicked("sink writer"))?;
            sent += 1;
        }

        // barrier: every lane reports back even when one of them failed
        let mut first_err = None;
        for lane in &lanes[..sent] {
            let res = lane
                .ack
                .recv()
                .unwrap_or(Err(SplitError::StagePanicked("sink writer")));
            if let Err(e) = res {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                self.units += 1;
                Ok(())
            }
        }
    }

    /// Consume units until the coordinator hangs up.
    pub fn run<U: SplitUnit>(&mut self, units: Receiver<U>) -> Result<u64, SplitError> {
        for unit in units.iter() {
            self.write_unit(unit)?;
        }
        Ok(self.units)
    }

    /// Stop the lanes and hand the sinks back: head lanes first, then tail lanes,
    /// each in R1, R2 order.
    pub fn finish(self) -> Result<Vec<S>, SplitError> {
        let Self { head, tail, .. } = self;
        head.into_iter()
            .chain(tail)
            .map(|Lane { tx, ack, handle }| {
                drop(tx);
                drop(ack);
                handle
                    .join()
                    .map_err(|_| SplitError::StagePanicked("sink writer"))
            })
            .collect()
    }
}
