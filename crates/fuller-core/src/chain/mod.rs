//! Gadget chain construction and scoring.
//!
//! A [`Chain`] is a sequence of stack words together with the gadgets that
//! were used to produce them. [`ChainBuilder`] assembles chains for a
//! [`Target`] from a [`GadgetCatalog`](crate::gadget::GadgetCatalog),
//! [`validate`] scores any chain, and [`ChainSession`] combines both and keeps
//! the built chains around.
mod builder;
mod session;
mod validator;

pub use self::builder::ChainBuilder;
pub use self::session::{ChainOutcome, ChainSession, Discovery};
pub use self::validator::{
    AslrCheck, CfiCheck, DepCheck, Performance, SecurityChecks, StackCookieCheck,
    ValidationReport, validate,
};

use crate::gadget::{Architecture, Constraint, Gadget};
use crate::util::{Endianness, pack_address};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building or packing chains.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A gadget required by the target is not in the catalog.
    #[error("Required gadget not found: {0}")]
    MissingGadget(String),
    /// Unknown target name.
    #[error("Unknown target: {0}")]
    UnknownTarget(String),
    /// The chain cannot be used as requested.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// One word of a chain.
///
/// Chains handed in by callers may contain placeholders that never resolved to
/// an address. Those are kept so that validation can report them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainWord {
    /// A numeric address or argument
    Value(u64),
    /// A symbolic placeholder
    Unresolved(String),
    /// A missing word
    Absent,
}

impl ChainWord {
    /// The numeric value, if any.
    pub fn value(&self) -> Option<u64> {
        match self {
            ChainWord::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<u64> for ChainWord {
    fn from(value: u64) -> Self {
        ChainWord::Value(value)
    }
}

/// Operation a chain is built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Load the first argument and trap into the kernel
    #[default]
    SystemCall,
    /// Load the first argument and call through a register
    FunctionCall,
    /// A single store gadget
    MemoryWrite,
}

impl FromStr for Target {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system_call" => Ok(Target::SystemCall),
            "function_call" => Ok(Target::FunctionCall),
            "memory_write" => Ok(Target::MemoryWrite),
            _ => Err(ChainError::UnknownTarget(s.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Target::SystemCall => "system_call",
            Target::FunctionCall => "function_call",
            Target::MemoryWrite => "memory_write",
        };
        write!(f, "{}", s)
    }
}

/// What a chain should do and under which constraints.
///
/// A built [`Chain`] keeps a copy as its metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainRequest {
    /// Operation to perform
    pub target: Target,
    /// Arguments; only the first one is used
    pub args: Vec<u64>,
    /// Constraints on the gadgets used
    pub constraints: Vec<Constraint>,
    /// Architecture to build for
    pub architecture: Architecture,
}

impl Default for ChainRequest {
    fn default() -> Self {
        Self {
            target: Target::SystemCall,
            args: vec![],
            constraints: vec![],
            architecture: Architecture::X64,
        }
    }
}

/// Metadata recorded on a [`Chain`].
pub type ChainMetadata = ChainRequest;

/// Opaque identifier of a chain stored in a [`ChainSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ChainId(pub(crate) u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rop-{}", self.0)
    }
}

/// A sequence of stack words and the gadgets they came from.
///
/// The two sequences are parallel in spirit only: arguments have no gadget,
/// so their lengths usually differ.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chain {
    #[serde(rename = "addresses")]
    words: Vec<ChainWord>,
    gadgets: Vec<Gadget>,
    metadata: ChainMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationReport>,
}

impl Chain {
    /// Creates a chain from its parts.
    pub fn new(words: Vec<ChainWord>, gadgets: Vec<Gadget>, metadata: ChainMetadata) -> Self {
        Self {
            words,
            gadgets,
            metadata,
            validation: None,
        }
    }

    /// The chain's words.
    pub fn words(&self) -> &[ChainWord] {
        &self.words
    }

    /// The gadgets used by the chain.
    pub fn gadgets(&self) -> &[Gadget] {
        &self.gadgets
    }

    /// The request the chain was built for.
    pub fn metadata(&self) -> &ChainMetadata {
        &self.metadata
    }

    /// The attached validation report, if any.
    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    /// Attaches a validation report.
    pub fn attach(&mut self, report: ValidationReport) {
        self.validation = Some(report);
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if the chain has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Packs every word at the width of the chain's architecture.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidInput`] if a word is unresolved or absent.
    pub fn payload(&self, endianness: Endianness) -> Result<Vec<u8>, ChainError> {
        let arch = self.metadata.architecture;
        let mut payload = Vec::with_capacity(self.words.len() * arch.word_size());
        for (i, word) in self.words.iter().enumerate() {
            let value = word.value().ok_or_else(|| {
                ChainError::InvalidInput(format!("word {} has no numeric value", i))
            })?;
            payload.extend(pack_address(value, arch, endianness));
        }
        Ok(payload)
    }
}
