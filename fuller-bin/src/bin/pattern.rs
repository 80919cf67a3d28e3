use anyhow::Result;
use clap::Parser;
use fuller_bin::{Report, init_logging_with_progress};
use fuller_core::pattern::{PatternKind, find_offset, find_value_offset, generate};
use fuller_core::util::{Endianness, Rng};
use log::info;
use serde::Serialize;

/// CLI arguments for the `pattern` binary.
///
/// Generates a pattern and, if a value or needle is given, reports its offset
/// inside the pattern.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// Pattern kind (cyclic, increasing, decreasing, random, alphanumeric, unicode).
    #[clap(long = "kind", default_value = "cyclic")]
    kind: PatternKind,
    /// Pattern length in characters.
    #[clap(long = "length", default_value = "256")]
    length: usize,
    /// Seed for the random kinds. Drawn from the OS if omitted.
    #[clap(long = "seed")]
    seed: Option<u64>,
    /// 32-bit value to locate, e.g. from a crashed register (hex).
    #[clap(long = "value", value_parser = parse_hex_u32)]
    value: Option<u32>,
    /// Literal needle to locate, in written order.
    #[clap(long = "needle")]
    needle: Option<String>,
    /// Byte order of the target (little, big).
    #[clap(long = "endianness", default_value = "little")]
    endianness: Endianness,
    /// Output file for results (JSON format). Prints to stdout if omitted.
    #[clap(long = "output")]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct PatternRun {
    seed: u64,
    pattern: String,
    offset: Option<usize>,
}

fn parse_hex_u32(s: &str) -> Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(s.trim_start_matches("0x"), 16)
}

fn main() -> Result<()> {
    let _progress = init_logging_with_progress()?;
    let args = CliArgs::parse();

    let mut rng = match args.seed {
        Some(seed) => Rng::from_seed(seed),
        None => Rng::from_entropy(),
    };
    let pattern = generate(args.kind, args.length, &mut rng);
    let offset = match (args.value, &args.needle) {
        (Some(value), _) => find_value_offset(pattern.as_bytes(), value, args.endianness),
        (None, Some(needle)) => find_offset(pattern.as_bytes(), needle.as_bytes(), args.endianness),
        (None, None) => None,
    };
    if let Some(offset) = offset {
        info!("Found at offset {}", offset);
    }

    let run = PatternRun {
        seed: rng.seed(),
        pattern,
        offset,
    };
    Report::new(args.clone(), run).save(args.output.as_deref())
}
