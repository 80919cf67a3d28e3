use anyhow::Result;
use clap::Parser;
use fuller_bin::{Report, init_logging_with_progress};
use fuller_core::chain::{ChainOutcome, ChainRequest, ChainSession, Discovery, Target};
use fuller_core::gadget::{Architecture, Constraint, GadgetCatalog, GadgetKind, GadgetSearch};
use fuller_core::util::Endianness;
use log::{info, warn};
use serde::Serialize;

/// CLI arguments for the `chain` binary.
///
/// Loads a gadget catalog, builds and validates one chain and prints its
/// packed payload.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// The gadget catalog (JSON array of gadget records).
    #[clap(long = "gadgets", default_value = "config/gadgets-x64.json")]
    gadgets: String,
    /// The chain target (system_call, function_call, memory_write).
    #[clap(long = "target", default_value = "system_call")]
    target: Target,
    /// The target architecture (x86, x64, arm, arm64).
    #[clap(long = "arch", default_value = "x64")]
    arch: Architecture,
    /// Chain arguments; only the first one is used.
    #[clap(long = "arg", value_parser = parse_u64)]
    args: Vec<u64>,
    /// Gadget constraints, e.g. no_null_bytes.
    #[clap(long = "constraint")]
    constraints: Vec<Constraint>,
    /// Byte order of the packed payload (little, big).
    #[clap(long = "endianness", default_value = "little")]
    endianness: Endianness,
    /// Also list the gadgets matching these kinds.
    #[clap(long = "discover", value_delimiter = ',')]
    discover: Vec<GadgetKind>,
    /// Output file for results (JSON format). Prints to stdout if omitted.
    #[clap(long = "output")]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChainRun {
    chain: ChainOutcome,
    payload: Option<String>,
    discovery: Option<Discovery>,
}

/// Parses decimal or `0x`-prefixed hexadecimal numbers.
fn parse_u64(s: &str) -> Result<u64, std::num::ParseIntError> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn main() -> Result<()> {
    let _progress = init_logging_with_progress()?;
    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let catalog = GadgetCatalog::from_jsonfile(&args.gadgets)?;
    let mut session = ChainSession::new(catalog);

    let discovery = if args.discover.is_empty() {
        None
    } else {
        Some(session.discover_gadgets(&GadgetSearch {
            types: args.discover.clone(),
            constraints: args.constraints.clone(),
            architecture: args.arch,
        }))
    };

    let request = ChainRequest {
        target: args.target,
        args: args.args.clone(),
        constraints: args.constraints.clone(),
        architecture: args.arch,
    };
    let chain = session.auto_chain(&request)?;
    for issue in &chain.validation.issues {
        warn!("{}", issue);
    }
    for warning in &chain.validation.warnings {
        warn!("{}", warning);
    }
    info!(
        "Chain {} has {} words, reliability {}",
        chain.id,
        chain.addresses.len(),
        chain.validation.reliability
    );

    let payload = match session.chain(chain.id).map(|c| c.payload(args.endianness)) {
        Some(Ok(payload)) => Some(hex(&payload)),
        Some(Err(e)) => {
            warn!("Cannot pack chain: {}", e);
            None
        }
        None => None,
    };

    let run = ChainRun {
        chain,
        payload,
        discovery,
    };
    Report::new(args.clone(), run).save(args.output.as_deref())
}
