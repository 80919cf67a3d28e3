use anyhow::{Result, bail};
use clap::Parser;
use fuller_bin::{Report, init_logging_with_progress};
use fuller_core::layout::{
    Distribution, Encoding, GroomOutcome, GroomStrategy, HoleAnalysis, HoleConfig, HoleStrategy,
    LayoutSimulator, LayoutValidation, ReclaimMode, ReclaimReport, SprayConfig, SprayOutcome,
};
use fuller_core::pressure::{MemoryPressure, NoPressure};
use fuller_core::util::{GRADUAL_INTERVAL, SPRAY_SLOT_SIZE, Size};
use fuller_procfs::ProcPressure;
use log::info;
use serde::Serialize;

/// CLI arguments for the `groom` binary.
///
/// Grooms one allocation group, optionally punches holes into it, sprays and
/// reclaims, then reports the resulting layout.
#[derive(Debug, Parser, Serialize, Clone)]
struct CliArgs {
    /// Nominal object size in bytes.
    #[clap(long = "size", default_value = "256")]
    size: usize,
    /// Number of objects to groom.
    #[clap(long = "count", default_value = "100")]
    count: usize,
    /// Grooming strategy (linear, controlled, fragmented, aligned).
    #[clap(long = "strategy", default_value = "linear")]
    strategy: GroomStrategy,
    /// Hole punching strategy (every_other, fibonacci, prime, custom, gradual).
    #[clap(long = "holes")]
    holes: Option<HoleStrategy>,
    /// Slot indices for the custom hole strategy.
    #[clap(long = "pattern", value_delimiter = ',')]
    pattern: Vec<usize>,
    /// Stride increment for the gradual hole strategy.
    #[clap(long = "interval", default_value_t = GRADUAL_INTERVAL)]
    interval: usize,
    /// Number of buffers to spray; 0 disables spraying.
    #[clap(long = "spray-count", default_value = "0")]
    spray_count: usize,
    /// Size of each sprayed buffer in bytes.
    #[clap(long = "spray-size", default_value_t = SPRAY_SLOT_SIZE)]
    spray_size: usize,
    /// Base stamp of the sprayed buffers.
    #[clap(long = "spray-pattern", default_value = "1094795585")]
    spray_pattern: u32,
    /// Spray placement (uniform, scattered).
    #[clap(long = "distribution", default_value = "uniform")]
    distribution: Distribution,
    /// Spray stamp encoding (raw, incremental, rotated, xor).
    #[clap(long = "encoding", default_value = "raw")]
    encoding: Encoding,
    /// Reclamation mode to run last (gentle, aggressive, targeted, stress).
    #[clap(long = "reclaim")]
    reclaim: Option<ReclaimMode>,
    /// Memory pressure reader (procfs, none).
    #[clap(long = "pressure", default_value = "procfs")]
    pressure: String,
    /// Output file for results (JSON format). Prints to stdout if omitted.
    #[clap(long = "output")]
    output: Option<String>,
}

#[derive(Debug, Serialize)]
struct GroomRun {
    groom: GroomOutcome,
    holes: Option<HoleAnalysis>,
    spray: Option<SprayOutcome>,
    reclaim: Option<ReclaimReport>,
    validation: LayoutValidation,
}

fn main() -> Result<()> {
    let progress = init_logging_with_progress()?;
    let args = CliArgs::parse();
    info!("CLI args: {:?}", args);

    let pressure: Box<dyn MemoryPressure> = match args.pressure.as_str() {
        "procfs" => Box::new(ProcPressure::new()),
        "none" => Box::new(NoPressure::default()),
        other => bail!("Unknown pressure reader: {}", other),
    };
    let mut sim = LayoutSimulator::new(pressure).progress(progress);

    let groom = sim.groom(Size::B(args.size), args.count, args.strategy)?;
    let holes = match args.holes {
        Some(strategy) => {
            let config = HoleConfig {
                pattern: args.pattern.clone(),
                interval: args.interval,
            };
            let analysis = sim.punch_holes(groom.id, strategy, &config)?;
            info!(
                "{} holes, longest run {}, fragmentation {:.2}",
                analysis.total_holes, analysis.max_consecutive, analysis.fragmentation
            );
            Some(analysis)
        }
        None => None,
    };
    let spray = match args.spray_count {
        0 => None,
        count => Some(sim.spray(&SprayConfig {
            slot_size: Size::B(args.spray_size),
            count,
            base_pattern: args.spray_pattern,
            distribution: args.distribution,
            encoding: args.encoding,
        })?),
    };
    let reclaim = args.reclaim.map(|mode| sim.reclaim(mode));
    let validation = sim.validate();
    info!(
        "Layout valid: {} ({:.1}% fragmentation)",
        validation.valid, validation.overview.fragmentation
    );

    let run = GroomRun {
        groom,
        holes,
        spray,
        reclaim,
        validation,
    };
    Report::new(args.clone(), run).save(args.output.as_deref())
}
