/// What to do with a record cut short by the end of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Drop the incomplete trailing lines without a diagnostic.
    #[default]
    Skip,
    /// Return the truncated record to the caller as an error (strict).
    Return,
}

/// How R1 and R2 records are matched up in paired-end mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairingMode {
    /// The k-th R1 record is paired with the k-th R2 record, ids are not compared.
    /// Inputs that are not record-aligned yield silently mismatched pairs.
    #[default]
    Positional,
    /// Like `Positional`, but the read names must agree or the run aborts.
    StrictId,
}

#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    pub error_policy: ErrorPolicy,
}
