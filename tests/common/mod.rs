#![allow(dead_code)]

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub fn write_gz(path: &Path, text: &str) {
    write_gz_bytes(path, text.as_bytes());
}

pub fn write_gz_bytes(path: &Path, data: &[u8]) {
    let f = File::create(path).unwrap();
    let mut enc = flate2::write::GzEncoder::new(f, flate2::Compression::fast());
    enc.write_all(data).unwrap();
    enc.finish().unwrap();
}

pub fn read_gz(path: &Path) -> String {
    let mut out = String::new();
    MultiGzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut out)
        .unwrap();
    out
}

pub fn read_gz_bytes(path: &Path) -> Vec<u8> {
    let mut out = Vec::new();
    MultiGzDecoder::new(File::open(path).unwrap())
        .read_to_end(&mut out)
        .unwrap();
    out
}

/// Four-line FASTQ text for `(id, seq)` pairs; quality is `I` repeated.
pub fn fastq(records: &[(&str, &str)]) -> String {
    records
        .iter()
        .map(|(id, seq)| format!("@{id}\n{seq}\n+\n{}\n", "I".repeat(seq.len())))
        .collect()
}

/// Number of 4-line records in decoded FASTQ text.
pub fn count_records(text: &str) -> usize {
    text.lines().count() / 4
}
