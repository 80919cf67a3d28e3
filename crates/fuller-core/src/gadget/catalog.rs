use crate::gadget::{
    Architecture, Constraint, Gadget, GadgetCategory, GadgetError, GadgetKind, GadgetRecord,
};
use crate::util::GroupBy;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Per-architecture, append-only store of gadgets.
#[derive(Clone, Debug, Default)]
pub struct GadgetCatalog {
    gadgets: BTreeMap<Architecture, Vec<Gadget>>,
}

/// Parameters of a gadget search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GadgetSearch {
    /// Kinds to keep; an empty list keeps every kind
    pub types: Vec<GadgetKind>,
    /// Address constraints
    pub constraints: Vec<Constraint>,
    /// Architecture to search
    pub architecture: Architecture,
}

impl Default for GadgetSearch {
    fn default() -> Self {
        Self {
            types: vec![
                GadgetKind::Pop,
                GadgetKind::Ret,
                GadgetKind::Call,
                GadgetKind::Jmp,
            ],
            constraints: vec![],
            architecture: Architecture::X64,
        }
    }
}

/// Gadgets split by [`GadgetCategory`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GadgetCategories {
    /// Control transfer gadgets
    pub control: Vec<Gadget>,
    /// Arithmetic gadgets
    pub arithmetic: Vec<Gadget>,
    /// Register and memory moves
    pub memory: Vec<Gadget>,
    /// Kernel entry gadgets
    pub syscall: Vec<Gadget>,
    /// Untagged gadgets
    pub other: Vec<Gadget>,
}

impl GadgetCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a catalog from a JSON array of [`GadgetRecord`]s.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if any record
    /// names an unknown architecture or kind.
    pub fn from_jsonfile(filepath: &str) -> Result<GadgetCatalog, GadgetError> {
        let mut file = File::open(Path::new(filepath))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let records: Vec<GadgetRecord> = serde_json::from_str(&contents)?;
        let mut catalog = GadgetCatalog::new();
        catalog.extend(records)?;
        info!("Loaded {} gadgets from {}", catalog.len(), filepath);
        Ok(catalog)
    }

    /// Converts and adds every record.
    ///
    /// Records for architectures Fuller cannot model are skipped with a
    /// warning; such architectures simply have no gadgets. The remaining
    /// records are validated before any of them is added, so a failing record
    /// leaves the catalog unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error other than an unknown architecture.
    pub fn extend(
        &mut self,
        records: impl IntoIterator<Item = GadgetRecord>,
    ) -> Result<(), GadgetError> {
        let mut gadgets = vec![];
        for record in records {
            match Gadget::try_from(record) {
                Ok(gadget) => gadgets.push(gadget),
                Err(GadgetError::UnknownArchitecture(arch)) => {
                    warn!("Skipping gadget for unsupported architecture {}", arch)
                }
                Err(e) => return Err(e),
            }
        }
        for gadget in gadgets {
            self.add(gadget);
        }
        Ok(())
    }

    /// Appends a gadget under its architecture. Duplicates are kept.
    pub fn add(&mut self, gadget: Gadget) {
        debug!("Adding gadget {} for {}", gadget, gadget.architecture());
        self.gadgets
            .entry(gadget.architecture())
            .or_default()
            .push(gadget);
    }

    /// All gadgets of `arch` in insertion order.
    pub fn get(&self, arch: Architecture) -> &[Gadget] {
        self.gadgets.get(&arch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All gadgets of the architecture named `arch`.
    ///
    /// Unknown names are a valid query and yield an empty slice.
    pub fn get_by_name(&self, arch: &str) -> &[Gadget] {
        match arch.parse() {
            Ok(arch) => self.get(arch),
            Err(_) => {
                debug!("No gadgets for unknown architecture {}", arch);
                &[]
            }
        }
    }

    /// Total number of gadgets over all architectures.
    pub fn len(&self) -> usize {
        self.gadgets.values().map(Vec::len).sum()
    }

    /// Returns `true` if no gadget is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gadgets of `arch` that match `types` and satisfy every constraint.
    ///
    /// An empty `types` list keeps every kind. Insertion order is preserved.
    pub fn discover(
        &self,
        types: &[GadgetKind],
        constraints: &[Constraint],
        arch: Architecture,
    ) -> Vec<&Gadget> {
        self.get(arch)
            .iter()
            .filter(|g| types.is_empty() || types.contains(&g.kind()))
            .filter(|g| constraints.iter().all(|c| c.admits(g.address())))
            .collect()
    }

    /// [`discover`](GadgetCatalog::discover) driven by a [`GadgetSearch`].
    pub fn search(&self, search: &GadgetSearch) -> Vec<&Gadget> {
        self.discover(&search.types, &search.constraints, search.architecture)
    }
}

/// Splits gadgets by category, keeping their relative order.
pub fn categorize<'a>(gadgets: impl IntoIterator<Item = &'a Gadget>) -> GadgetCategories {
    let mut groups = gadgets
        .into_iter()
        .cloned()
        .collect::<Vec<_>>()
        .group_by(|g| g.kind().category());
    let mut take = |category: GadgetCategory| groups.remove(&category).unwrap_or_default();
    GadgetCategories {
        control: take(GadgetCategory::Control),
        arithmetic: take(GadgetCategory::Arithmetic),
        memory: take(GadgetCategory::Memory),
        syscall: take(GadgetCategory::Syscall),
        other: take(GadgetCategory::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gadget(arch: Architecture, kind: GadgetKind, address: u64) -> Gadget {
        Gadget::new(arch, kind, address).unwrap()
    }

    fn catalog() -> GadgetCatalog {
        let mut catalog = GadgetCatalog::new();
        catalog.add(gadget(Architecture::X64, GadgetKind::Pop, 0x7fff_1234).named("pop_rdi"));
        catalog.add(gadget(Architecture::X64, GadgetKind::Ret, 0x0040_1000));
        catalog.add(gadget(Architecture::X64, GadgetKind::Syscall, 0x7fff_5678));
        catalog.add(gadget(Architecture::X64, GadgetKind::Pop, 0x7fff_1234).named("pop_rdi"));
        catalog.add(gadget(Architecture::X86, GadgetKind::Int, 0x0804_8123));
        catalog
    }

    #[test]
    fn test_get_unknown_architecture_is_empty() {
        let catalog = catalog();
        assert!(catalog.get(Architecture::Arm).is_empty());
        assert_eq!(catalog.get(Architecture::X64).len(), 4);
        assert_eq!(catalog.len(), 5);
    }

    #[test]
    fn test_get_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.get_by_name("x64").len(), 4);
        assert_eq!(catalog.get_by_name("x86").len(), 1);
        assert!(catalog.get_by_name("mips").is_empty());
    }

    #[test]
    fn test_extend_skips_unsupported_architectures() {
        let mut catalog = GadgetCatalog::new();
        let records: Vec<GadgetRecord> = serde_json::from_str(
            r#"[
                {"architecture": "mips", "type": "jmp", "address": 4096},
                {"architecture": "x64", "name": "pop_rdi", "type": "pop", "address": 8192}
            ]"#,
        )
        .unwrap();
        catalog.extend(records).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(Architecture::X64)[0].name(), Some("pop_rdi"));
        assert!(catalog.get_by_name("mips").is_empty());
    }

    #[test]
    fn test_discover_without_filters_is_get() {
        let catalog = catalog();
        for arch in [Architecture::X64, Architecture::X86, Architecture::Arm64] {
            let found: Vec<Gadget> = catalog.discover(&[], &[], arch).into_iter().cloned().collect();
            assert_eq!(found, catalog.get(arch));
        }
    }

    #[test]
    fn test_discover_filters() {
        let catalog = catalog();
        let pops = catalog.discover(&[GadgetKind::Pop], &[], Architecture::X64);
        assert_eq!(pops.len(), 2);
        let clean = catalog.discover(&[], &[Constraint::NoNullBytes], Architecture::X64);
        assert_eq!(clean.len(), 3);
        assert!(clean.iter().all(|g| g.kind() != GadgetKind::Ret));
    }

    #[test]
    fn test_search_defaults() {
        let catalog = catalog();
        let found = catalog.search(&GadgetSearch::default());
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_extend_is_atomic() {
        let mut catalog = GadgetCatalog::new();
        let records: Vec<GadgetRecord> = serde_json::from_str(
            r#"[
                {"architecture": "x64", "type": "pop", "address": 4096},
                {"architecture": "x64", "type": "hlt", "address": 8192}
            ]"#,
        )
        .unwrap();
        assert!(catalog.extend(records).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_categorize() {
        let catalog = catalog();
        let categories = categorize(catalog.get(Architecture::X64));
        assert_eq!(categories.memory.len(), 2);
        assert_eq!(categories.control.len(), 1);
        assert_eq!(categories.syscall.len(), 1);
        assert!(categories.arithmetic.is_empty());
        assert!(categories.other.is_empty());
    }
}
