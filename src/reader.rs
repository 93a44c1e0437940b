use crate::error::{FastqError, FormatError, IoContext};
use crate::policy::{ErrorPolicy, ReaderOptions};
use crate::record::FastqRecord;
use crate::util::{has_gz_extension, looks_like_gzip, open_file, trim_line_end};

#[cfg(feature = "gzip")]
use flate2::read::MultiGzDecoder;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Lines per FASTQ record: id, sequence, separator, quality.
pub(crate) const RECORD_LINES: usize = 4;

#[derive(Debug)]
pub enum Source {
    Path(PathBuf),
    Reader,
}

/// Sync FASTQ record source (plain/.gz), streaming, front to back.
///
/// Every four consecutive lines form one record; the third line is not
/// inspected. A group cut short by end of stream is handled per
/// [`ErrorPolicy`].
pub struct FastqReader {
    src: Source,
    rdr: Box<dyn BufRead + Send>,
    opts: ReaderOptions,
    line_num: u64,
    byte_pos: u64,
    finished: bool,
}

impl FastqReader {
    /// Open from a file path. Auto-detect `.gz` by extension or magic bytes.
    pub fn from_path<P: AsRef<Path>>(path: P, opts: ReaderOptions) -> Result<Self, FastqError> {
        let path = path.as_ref();
        let f = open_file(path).map_err(|e| FastqError::io_err(e, IoContext::START))?;

        let is_gz = has_gz_extension(path) || looks_like_gzip(&f).unwrap_or(false);

        let rdr: Box<dyn BufRead + Send> = if is_gz {
            #[cfg(feature = "gzip")]
            {
                let dec = MultiGzDecoder::new(f);
                Box::new(BufReader::with_capacity(256 * 1024, dec))
            }
            #[cfg(not(feature = "gzip"))]
            {
                return Err(FastqError::fmt_err(
                    FormatError::GzipDisabled,
                    IoContext::START,
                ));
            }
        } else {
            Box::new(BufReader::with_capacity(256 * 1024, f))
        };

        Ok(Self {
            src: Source::Path(path.to_path_buf()),
            rdr,
            opts,
            line_num: 0,
            byte_pos: 0,
            finished: false,
        })
    }

    /// Wrap an arbitrary `BufRead` (stdin, in-memory data, etc.).
    pub fn from_bufread<R: BufRead + Send + 'static>(reader: R, opts: ReaderOptions) -> Self {
        Self {
            src: Source::Reader,
            rdr: Box::new(reader),
            opts,
            line_num: 0,
            byte_pos: 0,
            finished: false,
        }
    }

    pub fn source(&self) -> &Source {
        &self.src
    }

    /// Iterator-style `next` record. Returns `None` once the stream is exhausted
    /// and keeps returning `None` after an error.
    pub fn next(&mut self) -> Option<Result<FastqRecord, FastqError>> {
        if self.finished {
            return None;
        }
        match self.read_one() {
            Ok(Some(rec)) => Some(Ok(rec)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }

    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_until(b'\n', buf)?;
        if n > 0 {
            self.line_num += 1;
            self.byte_pos += n as u64;
            trim_line_end(buf);
        }
        Ok(n)
    }

    fn read_one(&mut self) -> Result<Option<FastqRecord>, FastqError> {
        let mut lines: [Vec<u8>; RECORD_LINES] = Default::default();
        for (i, line) in lines.iter_mut().enumerate() {
            let n = self
                .read_line(line)
                .map_err(|e| FastqError::io_err(e, self.line_ctx()))?;
            if n == 0 {
                return self.truncated(i);
            }
        }

        let [id, seq, _plus, qual] = lines;
        Ok(Some(FastqRecord { id, seq, qual }))
    }

    fn truncated(&self, lines: usize) -> Result<Option<FastqRecord>, FastqError> {
        if lines == 0 {
            return Ok(None);
        }
        match self.opts.error_policy {
            ErrorPolicy::Skip => {
                log::debug!("dropping {lines} trailing line(s) that do not form a record");
                Ok(None)
            }
            ErrorPolicy::Return => Err(FastqError::fmt_err(
                FormatError::TruncatedRecord { lines },
                self.ctx(),
            )),
        }
    }

    #[inline]
    fn ctx(&self) -> IoContext {
        IoContext {
            byte_pos: self.byte_pos,
            line_num: self.line_num,
        }
    }

    /// Position of the line currently being read.
    #[inline]
    fn line_ctx(&self) -> IoContext {
        IoContext {
            byte_pos: self.byte_pos,
            line_num: self.line_num + 1,
        }
    }
}

impl Iterator for FastqReader {
    type Item = Result<FastqRecord, FastqError>;
    fn next(&mut self) -> Option<Self::Item> {
        FastqReader::next(self)
    }
}
