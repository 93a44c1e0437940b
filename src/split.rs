//! Cutting reads at the split position and the coordinator stages that do it
//! on a stream.
//!
//! A coordinator pulls records (one from each mate in paired mode), emits the
//! head unit followed by the tail unit, and drops anything too short to split.
//! Writers depend on head always preceding tail for the same source record.

use crate::error::SplitError;
use crate::policy::PairingMode;
use crate::record::FastqRecord;

use crossbeam_channel::{Receiver, Sender};
use log::warn;

/// Item handed from a record source to a coordinator.
pub type SourceItem = Result<FastqRecord, SplitError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Bases `[0, n)`.
    Head,
    /// Bases `[n, len)`.
    Tail,
}

/// One half of a split read (or read pair), routed to the sinks of its side.
pub trait SplitUnit: Send {
    /// Fixed-size collection of reads, one per lane.
    type Reads: IntoIterator<Item = FastqRecord>;

    fn side(&self) -> Side;
    /// Reads in lane order: R1 then R2 for pairs.
    fn into_reads(self) -> Self::Reads;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedSplit {
    pub side: Side,
    pub first: FastqRecord,
    pub second: FastqRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleSplit {
    pub side: Side,
    pub read: FastqRecord,
}

impl SplitUnit for PairedSplit {
    type Reads = [FastqRecord; 2];

    fn side(&self) -> Side {
        self.side
    }
    fn into_reads(self) -> Self::Reads {
        [self.first, self.second]
    }
}

impl SplitUnit for SingleSplit {
    type Reads = [FastqRecord; 1];

    fn side(&self) -> Side {
        self.side
    }
    fn into_reads(self) -> Self::Reads {
        [self.read]
    }
}

/// Counters kept while splitting. In paired mode a pair counts once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SplitStats {
    pub records_in: u64,
    pub split: u64,
    pub discarded: u64,
}

/// Splits reads at a fixed position and logs a diagnostic for each discard.
#[derive(Debug, Clone)]
pub struct Splitter {
    n: usize,
    pairing: PairingMode,
    stats: SplitStats,
}

impl Splitter {
    pub fn new(n: usize, pairing: PairingMode) -> Self {
        Self {
            n,
            pairing,
            stats: SplitStats::default(),
        }
    }

    pub fn stats(&self) -> SplitStats {
        self.stats
    }

    /// Split a mate pair into `[head, tail]`, or `None` if either mate has `n`
    /// bases or fewer. Fails only in strict pairing mode, on a name mismatch.
    pub fn split_pair(
        &mut self,
        r1: FastqRecord,
        r2: FastqRecord,
    ) -> Result<Option<[PairedSplit; 2]>, SplitError> {
        self.stats.records_in += 1;
        if self.pairing == PairingMode::StrictId && r1.name() != r2.name() {
            return Err(SplitError::PairMismatch {
                r1: r1.id_lossy().into_owned(),
                r2: r2.id_lossy().into_owned(),
            });
        }

        match (r1.split_at(self.n), r2.split_at(self.n)) {
            (Some((h1, t1)), Some((h2, t2))) => {
                self.stats.split += 1;
                Ok(Some([
                    PairedSplit {
                        side: Side::Head,
                        first: h1,
                        second: h2,
                    },
                    PairedSplit {
                        side: Side::Tail,
                        first: t1,
                        second: t2,
                    },
                ]))
            }
            _ => {
                self.stats.discarded += 1;
                warn!("Discarded: {} and {}", r1.id_lossy(), r2.id_lossy());
                Ok(None)
            }
        }
    }

    /// Split a single-end read into `[head, tail]`, or `None` if it is too short.
    pub fn split_single(&mut self, read: FastqRecord) -> Option<[SingleSplit; 2]> {
        self.stats.records_in += 1;
        match read.split_at(self.n) {
            Some((head, tail)) => {
                self.stats.split += 1;
                Some([
                    SingleSplit {
                        side: Side::Head,
                        read: head,
                    },
                    SingleSplit {
                        side: Side::Tail,
                        read: tail,
                    },
                ])
            }
            None => {
                self.stats.discarded += 1;
                warn!("Discarded: {}", read.id_lossy());
                None
            }
        }
    }
}

/// Paired-end coordinator: positional pairing of two record streams.
pub struct PairCoordinator {
    splitter: Splitter,
}

impl PairCoordinator {
    pub fn new(splitter: Splitter) -> Self {
        Self { splitter }
    }

    /// Runs until either input is exhausted. The longer input is not drained:
    /// beyond the one record that shows it is longer, its records are never read.
    ///
    /// If the writer hangs up the loop stops quietly; the writer reports its own error.
    pub fn run(
        mut self,
        r1: Receiver<SourceItem>,
        r2: Receiver<SourceItem>,
        out: Sender<PairedSplit>,
    ) -> Result<SplitStats, SplitError> {
        loop {
            let Ok(read1) = r1.recv() else {
                // the R2 source is already holding its next record, if it has one
                if let Ok(Ok(read2)) = r2.recv() {
                    warn!(
                        "R1 input ended before R2; '{}' and any later R2 records are ignored",
                        read2.id_lossy()
                    );
                }
                break;
            };
            let read1 = read1?;
            let read2 = match r2.recv() {
                Ok(item) => item?,
                Err(_) => {
                    warn!(
                        "R2 input ended before R1; '{}' and any later R1 records are ignored",
                        read1.id_lossy()
                    );
                    break;
                }
            };

            if let Some(units) = self.splitter.split_pair(read1, read2)? {
                for unit in units {
                    if out.send(unit).is_err() {
                        return Ok(self.splitter.stats());
                    }
                }
            }
        }
        Ok(self.splitter.stats())
    }
}

/// Single-end coordinator.
pub struct SingleCoordinator {
    splitter: Splitter,
}

impl SingleCoordinator {
    pub fn new(splitter: Splitter) -> Self {
        Self { splitter }
    }

    pub fn run(
        mut self,
        input: Receiver<SourceItem>,
        out: Sender<SingleSplit>,
    ) -> Result<SplitStats, SplitError> {
        for item in input.iter() {
            if let Some(units) = self.splitter.split_single(item?) {
                for unit in units {
                    if out.send(unit).is_err() {
                        return Ok(self.splitter.stats());
                    }
                }
            }
        }
        Ok(self.splitter.stats())
    }
}
