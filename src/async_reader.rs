#![cfg(feature = "async")]

use crate::error::{FastqError, FormatError, IoContext};
use crate::policy::{ErrorPolicy, ReaderOptions};
use crate::reader::RECORD_LINES;
use crate::record::FastqRecord;
use crate::util::{has_gz_extension, trim_line_end};

use async_compression::tokio::bufread::GzipDecoder;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

#[derive(Debug)]
pub enum AsyncSource {
    Path(PathBuf),
    Reader,
}

/// Async FASTQ record source (plain/.gz), streaming. Same record framing as
/// [`crate::FastqReader`].
pub struct AsyncFastqReader {
    src: AsyncSource,
    rdr: Box<dyn AsyncBufRead + Unpin + Send>,
    opts: ReaderOptions,
    line_num: u64,
    byte_pos: u64,
    finished: bool,
}

impl AsyncFastqReader {
    /// Open async from path; `.gz` auto-detect by extension or magic bytes.
    pub async fn from_path<P: AsRef<Path>>(
        path: P,
        opts: ReaderOptions,
    ) -> Result<Self, FastqError> {
        let path = path.as_ref().to_path_buf();
        let mut f = File::open(&path)
            .await
            .map_err(|e| FastqError::io_err(e, IoContext::START))?;

        let is_gz =
            has_gz_extension(&path) || looks_like_gzip_async(&mut f).await.unwrap_or(false);

        let rdr: Box<dyn AsyncBufRead + Unpin + Send> = if is_gz {
            let mut gz = GzipDecoder::new(BufReader::with_capacity(256 * 1024, f));
            gz.multiple_members(true);
            Box::new(BufReader::with_capacity(256 * 1024, gz))
        } else {
            Box::new(BufReader::with_capacity(256 * 1024, f))
        };

        Ok(Self {
            src: AsyncSource::Path(path),
            rdr,
            opts,
            line_num: 0,
            byte_pos: 0,
            finished: false,
        })
    }

    /// Wrap any async `AsyncBufRead`.
    pub fn from_async_bufread<R>(reader: R, opts: ReaderOptions) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        Self {
            src: AsyncSource::Reader,
            rdr: Box::new(reader),
            opts,
            line_num: 0,
            byte_pos: 0,
            finished: false,
        }
    }

    pub fn source(&self) -> &AsyncSource {
        &self.src
    }

    /// Fetch next record (async).
    pub async fn next_record(&mut self) -> Option<Result<FastqRecord, FastqError>> {
        if self.finished {
            return None;
        }
        match self.read_one().await {
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

    async fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        let n = self.rdr.read_until(b'\n', buf).await?;
        if n > 0 {
            self.line_num += 1;
            self.byte_pos += n as u64;
            trim_line_end(buf);
        }
        Ok(n)
    }

    async fn read_one(&mut self) -> Result<Option<FastqRecord>, FastqError> {
        let mut lines: [Vec<u8>; RECORD_LINES] = Default::default();
        for (i, line) in lines.iter_mut().enumerate() {
            let n = self
                .read_line(line)
                .await
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

async fn looks_like_gzip_async(f: &mut File) -> io::Result<bool> {
    let pos = f.stream_position().await?;
    let mut magic = [0u8; 2];
    let n = f.read(&mut magic).await?;
    f.seek(SeekFrom::Start(pos)).await?;
    Ok(n >= 2 && magic == [0x1F, 0x8B])
}
