use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use fq_split::{ErrorPolicy, Layout, PairingMode, ReaderOptions, SplitConfig};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "fq-split",
    version,
    about = "Split every FASTQ read at base n into a head file and a tail file",
    after_help = "Example: fq-split --r1 sample_R1.fq.gz --r2 sample_R2.fq.gz -n 10 -o sample"
)]
struct Args {
    #[arg(
        short = 'n',
        long = "n",
        required = true,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Position to split reads at. Ex: n=3, seq=AAATTTTT gives AAA and TTTTT"
    )]
    n: u64,

    #[arg(long = "r1", value_name = "PATH", help = "R1 FASTQ file (paired-end)")]
    r1: Option<PathBuf>,

    #[arg(long = "r2", value_name = "PATH", help = "R2 FASTQ file (paired-end)")]
    r2: Option<PathBuf>,

    #[arg(
        long = "se",
        value_name = "PATH",
        conflicts_with_all = ["r1", "r2"],
        help = "Single-end FASTQ file"
    )]
    se: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "out",
        value_name = "BASENAME",
        default_value = "test-1",
        help = "Output basename; suffixes like _begin_R1.fq.gz are appended"
    )]
    out: PathBuf,

    #[arg(
        short = 'z',
        long = "compression",
        value_name = "LEVEL",
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(0..=9),
        help = "gzip level of the outputs"
    )]
    compression: u32,

    #[arg(long = "strict-pairing", help = "Abort when R1 and R2 read names disagree")]
    strict_pairing: bool,

    #[arg(
        long = "strict-records",
        help = "Fail on a truncated trailing record instead of dropping it"
    )]
    strict_records: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let layout = Layout::from_inputs(args.r1, args.r2, args.se)?;
    let n = usize::try_from(args.n).context("split position does not fit in memory")?;

    let mut config = SplitConfig::new(n, layout, args.out);
    config.compression = args.compression;
    if args.strict_pairing {
        config.pairing = PairingMode::StrictId;
    }
    if args.strict_records {
        config.reader = ReaderOptions {
            error_policy: ErrorPolicy::Return,
        };
    }

    let summary = fq_split::run(config)?;
    for path in &summary.outputs {
        info!("wrote {}", path.display());
    }
    Ok(())
}
