use criterion::{Criterion, criterion_group, criterion_main};
use fq_split::{FastqReader, PairingMode, ReaderOptions, RecordSink, Splitter};
use std::io::BufReader;

fn sample() -> String {
    let mut data = String::new();
    for i in 0..2000 {
        data.push_str(&format!(
            "@r{i}\nACGTACGTACGTACGTACGTACGT\n+\n########################\n"
        ));
    }
    data
}

fn bench_parse_and_split(c: &mut Criterion) {
    // the reader takes an owned 'static source
    let data: &'static str = Box::leak(sample().into_boxed_str());
    c.bench_function("parse_split_2000_single", |b| {
        b.iter(|| {
            let rdr = BufReader::new(data.as_bytes());
            let fq = FastqReader::from_bufread(rdr, ReaderOptions::default());
            let mut splitter = Splitter::new(10, PairingMode::Positional);
            let mut out = Vec::with_capacity(data.len() + 4096);
            for rec in fq {
                if let Some(units) = splitter.split_single(rec.unwrap()) {
                    for unit in units {
                        out.write_record(&unit.read).unwrap();
                    }
                }
            }
            out.len()
        })
    });
}

criterion_group!(benches, bench_parse_and_split);
criterion_main!(benches);
