//! Shared setup for the Fuller binaries.
//!
//! - `groom`: grooms a simulated heap, punches holes, sprays and reclaims.
//! - `chain`: loads a gadget catalog from JSON and builds a scored chain.
//! - `pattern`: generates patterns and locates offsets in them.
//!
//! All binaries log through `env_logger` (filter via `RUST_LOG`, default
//! `info`) and can write their results as JSON with `--output`.

use anyhow::Context;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};

pub fn init_logging_with_progress() -> anyhow::Result<MultiProgress> {
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let progress = MultiProgress::new();
    LogWrapper::new(progress.clone(), logger).try_init()?;
    Ok(progress)
}

/// A result document as written by `--output`.
#[derive(Debug, Serialize)]
pub struct Report<A: Serialize, R: Serialize> {
    /// RFC 3339 timestamp of the run
    pub date: String,
    /// The command line arguments
    pub args: A,
    /// The binary's result
    pub result: R,
}

impl<A: Serialize, R: Serialize> Report<A, R> {
    pub fn new(args: A, result: R) -> Self {
        Self {
            date: chrono::Local::now().to_rfc3339(),
            args,
            result,
        }
    }

    /// Writes the report as pretty JSON, or to stdout if `filename` is `None`.
    pub fn save(&self, filename: Option<&str>) -> anyhow::Result<()> {
        match filename {
            Some(filename) => {
                let file = File::create(filename)
                    .with_context(|| format!("failed to create {}", filename))?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, self)?;
                writer.flush()?;
                info!("Results saved to {}", filename);
            }
            None => println!("{}", serde_json::to_string_pretty(self)?),
        }
        Ok(())
    }
}
