use std::borrow::Cow;
use std::io::{self, Write};

/// One FASTQ record. `id` is the header line exactly as read (leading `@` included),
/// so that writing a record back reproduces its input bytes. No line has to be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord {
    pub id: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}

impl FastqRecord {
    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Read name without the `@`, any description, or a `/1` `/2` mate suffix.
    pub fn name(&self) -> &[u8] {
        let header = self.id.strip_prefix(b"@").unwrap_or(&self.id);
        let end = header
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(header.len());
        let name = &header[..end];
        name.strip_suffix(b"/1")
            .or_else(|| name.strip_suffix(b"/2"))
            .unwrap_or(name)
    }

    /// Header line as text for diagnostics; invalid UTF-8 is replaced.
    pub fn id_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.id)
    }

    /// Cut the record into bases `[0, n)` and `[n, len)`; both halves keep the id.
    ///
    /// Returns `None` when the record has `n` bases or fewer.
    pub fn split_at(&self, n: usize) -> Option<(FastqRecord, FastqRecord)> {
        if self.len() <= n {
            return None;
        }
        // quality is cut at the same offset; a short quality line yields a short half
        let q = n.min(self.qual.len());
        let head = FastqRecord {
            id: self.id.clone(),
            seq: self.seq[..n].to_vec(),
            qual: self.qual[..q].to_vec(),
        };
        let tail = FastqRecord {
            id: self.id.clone(),
            seq: self.seq[n..].to_vec(),
            qual: self.qual[q..].to_vec(),
        };
        Some((head, tail))
    }

    /// Serialize as `<id>\n<seq>\n+\n<qual>\n`.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.id)?;
        w.write_all(b"\n")?;
        w.write_all(&self.seq)?;
        w.write_all(b"\n+\n")?;
        w.write_all(&self.qual)?;
        w.write_all(b"\n")
    }
}
