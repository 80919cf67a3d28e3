//! Gadget records and the per-architecture gadget catalog.
//!
//! Fuller never disassembles anything. Gadgets are supplied by the caller,
//! either one by one through [`GadgetCatalog::add`] or as [`GadgetRecord`]s
//! loaded from JSON (see [`GadgetCatalog::from_jsonfile`]).
mod catalog;

pub use self::catalog::{GadgetCatalog, GadgetCategories, GadgetSearch, categorize};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while constructing or loading gadgets.
#[derive(Error, Debug)]
pub enum GadgetError {
    /// The address does not fit the architecture's word size.
    #[error("Address {address:#x} out of range for {architecture}")]
    AddressOutOfRange {
        /// Target architecture
        architecture: Architecture,
        /// Offending address
        address: u64,
    },
    /// Unknown architecture name.
    #[error("Unknown architecture: {0} (expected x86, x64, arm or arm64)")]
    UnknownArchitecture(String),
    /// Unknown gadget kind.
    #[error("Unknown gadget kind: {0}")]
    UnknownKind(String),
    /// A gadget file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A gadget file could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Instruction set a gadget belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 32-bit x86
    X86,
    /// x86-64
    X64,
    /// 32-bit ARM
    Arm,
    /// AArch64
    Arm64,
}

impl Architecture {
    /// Word size in bytes.
    pub fn word_size(&self) -> usize {
        match self {
            Architecture::X86 | Architecture::Arm => 4,
            Architecture::X64 | Architecture::Arm64 => 8,
        }
    }

    /// Largest representable address.
    pub fn max_address(&self) -> u64 {
        match self.word_size() {
            4 => u32::MAX as u64,
            _ => u64::MAX,
        }
    }

    /// Name of the gadget loading the first argument register.
    pub fn argument_loader(&self) -> &'static str {
        match self {
            Architecture::X64 => "pop_rdi",
            Architecture::X86 => "pop_ebx",
            Architecture::Arm => "pop_r0",
            Architecture::Arm64 => "pop_x0",
        }
    }

    /// Name of the gadget calling through a register.
    pub fn register_call(&self) -> &'static str {
        match self {
            Architecture::X64 => "call_rax",
            Architecture::X86 => "call_eax",
            Architecture::Arm => "blx_r3",
            Architecture::Arm64 => "blr_x8",
        }
    }
}

impl FromStr for Architecture {
    type Err = GadgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" => Ok(Architecture::X86),
            "x64" => Ok(Architecture::X64),
            "arm" => Ok(Architecture::Arm),
            "arm64" => Ok(Architecture::Arm64),
            _ => Err(GadgetError::UnknownArchitecture(s.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Arm => "arm",
            Architecture::Arm64 => "arm64",
        };
        write!(f, "{}", s)
    }
}

/// Semantic tag of a gadget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GadgetKind {
    /// Pops a value into a register
    Pop,
    /// Returns
    Ret,
    /// Calls through a register
    Call,
    /// Jumps through a register
    Jmp,
    /// Moves between registers or memory
    Mov,
    /// Adds
    Add,
    /// Subtracts
    Sub,
    /// Exclusive or, often used to zero a register
    Xor,
    /// Enters the kernel
    Syscall,
    /// Software interrupt (`int 0x80` on x86)
    Int,
    /// Pushes a register
    Push,
    /// Anything without a more specific tag
    Other,
}

/// Coarse grouping of [`GadgetKind`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GadgetCategory {
    /// `ret`, `call`, `jmp`
    Control,
    /// `add`, `sub`, `xor`
    Arithmetic,
    /// `mov`, `pop`, `push`
    Memory,
    /// `syscall`, `int`
    Syscall,
    /// Everything else
    Other,
}

impl GadgetKind {
    /// The category this kind belongs to.
    pub fn category(&self) -> GadgetCategory {
        match self {
            GadgetKind::Ret | GadgetKind::Call | GadgetKind::Jmp => GadgetCategory::Control,
            GadgetKind::Add | GadgetKind::Sub | GadgetKind::Xor => GadgetCategory::Arithmetic,
            GadgetKind::Mov | GadgetKind::Pop | GadgetKind::Push => GadgetCategory::Memory,
            GadgetKind::Syscall | GadgetKind::Int => GadgetCategory::Syscall,
            GadgetKind::Other => GadgetCategory::Other,
        }
    }

    /// Returns `true` for kinds that transfer control indirectly.
    pub fn is_indirect_branch(&self) -> bool {
        matches!(self, GadgetKind::Call | GadgetKind::Jmp)
    }
}

impl FromStr for GadgetKind {
    type Err = GadgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pop" => Ok(GadgetKind::Pop),
            "ret" => Ok(GadgetKind::Ret),
            "call" => Ok(GadgetKind::Call),
            "jmp" => Ok(GadgetKind::Jmp),
            "mov" => Ok(GadgetKind::Mov),
            "add" => Ok(GadgetKind::Add),
            "sub" => Ok(GadgetKind::Sub),
            "xor" => Ok(GadgetKind::Xor),
            "syscall" => Ok(GadgetKind::Syscall),
            "int" => Ok(GadgetKind::Int),
            "push" => Ok(GadgetKind::Push),
            "other" => Ok(GadgetKind::Other),
            _ => Err(GadgetError::UnknownKind(s.to_string())),
        }
    }
}

/// A code address with a semantic tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Gadget {
    architecture: Architecture,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "type")]
    kind: GadgetKind,
    address: u64,
}

impl Gadget {
    /// Creates an unnamed gadget.
    ///
    /// # Errors
    ///
    /// Returns [`GadgetError::AddressOutOfRange`] if `address` does not fit
    /// into a word of `architecture`.
    pub fn new(
        architecture: Architecture,
        kind: GadgetKind,
        address: u64,
    ) -> Result<Self, GadgetError> {
        if address > architecture.max_address() {
            return Err(GadgetError::AddressOutOfRange {
                architecture,
                address,
            });
        }
        Ok(Self {
            architecture,
            name: None,
            kind,
            address,
        })
    }

    /// Attaches a name such as `pop_rdi`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The gadget's architecture.
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    /// The gadget's name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The gadget's semantic tag.
    pub fn kind(&self) -> GadgetKind {
        self.kind
    }

    /// The gadget's address.
    pub fn address(&self) -> u64 {
        self.address
    }
}

impl fmt::Display for Gadget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x} {:?} ({})",
            self.address,
            self.kind,
            self.name.as_deref().unwrap_or("-")
        )
    }
}

/// A raw gadget as supplied by an external discovery tool.
///
/// ```json
/// { "architecture": "x64", "name": "pop_rdi", "type": "pop", "address": 4198451 }
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct GadgetRecord {
    /// Architecture name (`x86`, `x64`, `arm`, `arm64`)
    pub architecture: String,
    /// Optional gadget name
    #[serde(default)]
    pub name: Option<String>,
    /// Kind name
    #[serde(rename = "type")]
    pub kind: String,
    /// Code address
    pub address: u64,
}

impl TryFrom<GadgetRecord> for Gadget {
    type Error = GadgetError;

    fn try_from(record: GadgetRecord) -> Result<Self, Self::Error> {
        let architecture = record.architecture.parse()?;
        let kind = record.kind.parse()?;
        let gadget = Gadget::new(architecture, kind, record.address)?;
        Ok(match record.name {
            Some(name) => gadget.named(name),
            None => gadget,
        })
    }
}

/// Filter applied to gadget addresses during discovery.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Constraint {
    /// Exclude addresses whose hex representation contains `00`
    NoNullBytes,
    /// Any other constraint; carried along but not enforced
    Custom(String),
}

impl Constraint {
    /// Returns `true` if a gadget at `address` satisfies this constraint.
    pub fn admits(&self, address: u64) -> bool {
        match self {
            Constraint::NoNullBytes => !format!("{:x}", address).contains("00"),
            Constraint::Custom(_) => true,
        }
    }
}

impl From<String> for Constraint {
    fn from(s: String) -> Self {
        match s.as_str() {
            "no_null_bytes" => Constraint::NoNullBytes,
            _ => Constraint::Custom(s),
        }
    }
}

impl From<Constraint> for String {
    fn from(constraint: Constraint) -> Self {
        match constraint {
            Constraint::NoNullBytes => "no_null_bytes".to_string(),
            Constraint::Custom(s) => s,
        }
    }
}

impl FromStr for Constraint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.to_string().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_width() {
        assert!(Gadget::new(Architecture::X86, GadgetKind::Pop, 0xffff_ffff).is_ok());
        assert!(matches!(
            Gadget::new(Architecture::Arm, GadgetKind::Pop, 0x1_0000_0000),
            Err(GadgetError::AddressOutOfRange { .. })
        ));
        assert!(Gadget::new(Architecture::Arm64, GadgetKind::Ret, u64::MAX).is_ok());
    }

    #[test]
    fn test_record_conversion() {
        let record: GadgetRecord = serde_json::from_str(
            r#"{"architecture": "x64", "name": "pop_rdi", "type": "pop", "address": 4198451}"#,
        )
        .unwrap();
        let gadget = Gadget::try_from(record).unwrap();
        assert_eq!(gadget.architecture(), Architecture::X64);
        assert_eq!(gadget.name(), Some("pop_rdi"));
        assert_eq!(gadget.kind(), GadgetKind::Pop);
        assert_eq!(gadget.address(), 0x401033);
    }

    #[test]
    fn test_record_rejects_unknown_tags() {
        let record = GadgetRecord {
            architecture: "mips".into(),
            name: None,
            kind: "pop".into(),
            address: 0,
        };
        assert!(matches!(
            Gadget::try_from(record),
            Err(GadgetError::UnknownArchitecture(_))
        ));
        let record = GadgetRecord {
            architecture: "x86".into(),
            name: None,
            kind: "leave".into(),
            address: 0,
        };
        assert!(matches!(Gadget::try_from(record), Err(GadgetError::UnknownKind(_))));
    }

    #[test]
    fn test_no_null_bytes() {
        let c = Constraint::NoNullBytes;
        assert!(c.admits(0x7fff_1234));
        assert!(!c.admits(0x0040_1000));
        // leading zeros are not part of the hex representation
        assert!(c.admits(0x0812_3456));
        assert!(Constraint::Custom("bogus".into()).admits(0));
    }

    #[test]
    fn test_constraint_strings() {
        let parsed: Vec<Constraint> =
            serde_json::from_str(r#"["no_null_bytes", "ascii_only"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![Constraint::NoNullBytes, Constraint::Custom("ascii_only".into())]
        );
        assert_eq!(
            serde_json::to_string(&parsed).unwrap(),
            r#"["no_null_bytes","ascii_only"]"#
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(GadgetKind::Jmp.category(), GadgetCategory::Control);
        assert_eq!(GadgetKind::Push.category(), GadgetCategory::Memory);
        assert_eq!(GadgetKind::Int.category(), GadgetCategory::Syscall);
        assert_eq!(GadgetKind::Other.category(), GadgetCategory::Other);
    }
}
