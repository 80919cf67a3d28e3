use crate::chain::{
    Chain, ChainBuilder, ChainError, ChainId, ChainRequest, ChainWord, ValidationReport, validate,
};
use crate::gadget::{Gadget, GadgetCatalog, GadgetCategories, GadgetSearch, categorize};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of [`ChainSession::auto_chain`].
#[derive(Clone, Debug, Serialize)]
pub struct ChainOutcome {
    /// Identifier under which the chain is stored
    pub id: ChainId,
    /// The chain's words
    #[serde(rename = "chain")]
    pub addresses: Vec<ChainWord>,
    /// Gadgets used by the chain
    pub gadgets: Vec<Gadget>,
    /// Validation of the chain
    pub validation: ValidationReport,
}

/// Result of [`ChainSession::discover_gadgets`].
#[derive(Clone, Debug, Serialize)]
pub struct Discovery {
    /// Number of gadgets found
    pub count: usize,
    /// The gadgets in catalog order
    pub gadgets: Vec<Gadget>,
    /// The same gadgets by category
    pub categories: GadgetCategories,
}

/// A gadget catalog together with the chains built from it.
#[derive(Debug, Default)]
pub struct ChainSession {
    catalog: GadgetCatalog,
    chains: BTreeMap<ChainId, Chain>,
    next_id: u64,
}

impl ChainSession {
    /// Creates a session over `catalog`.
    pub fn new(catalog: GadgetCatalog) -> Self {
        Self {
            catalog,
            chains: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// The session's catalog.
    pub fn catalog(&self) -> &GadgetCatalog {
        &self.catalog
    }

    /// Mutable access to the session's catalog, e.g. to add gadgets.
    pub fn catalog_mut(&mut self) -> &mut GadgetCatalog {
        &mut self.catalog
    }

    /// Builds and validates a chain, then stores it.
    ///
    /// # Errors
    ///
    /// Propagates [`ChainBuilder::build`] errors. Nothing is stored on error.
    pub fn auto_chain(&mut self, request: &ChainRequest) -> Result<ChainOutcome, ChainError> {
        let mut chain = ChainBuilder::new(&self.catalog).build(request)?;
        let validation = validate(&chain);
        chain.attach(validation.clone());
        let id = ChainId(self.next_id);
        self.next_id += 1;
        info!(
            "Stored {} chain {} ({} words, reliability {})",
            request.target,
            id,
            chain.len(),
            validation.reliability
        );
        let outcome = ChainOutcome {
            id,
            addresses: chain.words().to_vec(),
            gadgets: chain.gadgets().to_vec(),
            validation,
        };
        self.chains.insert(id, chain);
        Ok(outcome)
    }

    /// Searches the catalog and categorizes the result.
    pub fn discover_gadgets(&self, search: &GadgetSearch) -> Discovery {
        info!("Discovering {} gadgets", search.architecture);
        let found = self.catalog.search(search);
        Discovery {
            count: found.len(),
            categories: categorize(found.iter().copied()),
            gadgets: found.into_iter().cloned().collect(),
        }
    }

    /// Returns stored chain `id`, if any.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(&id)
    }

    /// Ids of all stored chains in creation order.
    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Target;
    use crate::gadget::{Architecture, GadgetKind};

    fn session() -> ChainSession {
        let mut catalog = GadgetCatalog::new();
        for (kind, address, name) in [
            (GadgetKind::Pop, 0x7f41_4141_4148, "pop_rdi"),
            (GadgetKind::Syscall, 0x7f41_4141_4150, "syscall"),
            (GadgetKind::Call, 0x7f41_4141_4158, "call_rax"),
            (GadgetKind::Xor, 0x7f41_4141_4160, "xor_rax_rax"),
        ] {
            catalog.add(Gadget::new(Architecture::X64, kind, address).unwrap().named(name));
        }
        ChainSession::new(catalog)
    }

    #[test]
    fn test_auto_chain_stores_validated_chain() {
        let mut session = session();
        let outcome = session.auto_chain(&ChainRequest::default()).unwrap();
        assert_eq!(outcome.addresses.len(), 3);
        let stored = session.chain(outcome.id).unwrap();
        assert_eq!(stored.validation(), Some(&outcome.validation));
        // the synthetic argument sits above the fixed address range
        assert!(outcome.validation.security.aslr.bypassed);

        let second = session
            .auto_chain(&ChainRequest {
                target: Target::MemoryWrite,
                ..Default::default()
            })
            .unwrap();
        assert_ne!(second.id, outcome.id);
        assert_eq!(session.chain_ids().count(), 2);
    }

    #[test]
    fn test_failed_chain_is_not_stored() {
        let mut session = ChainSession::default();
        assert!(session.auto_chain(&ChainRequest::default()).is_err());
        assert_eq!(session.chain_ids().count(), 0);
    }

    #[test]
    fn test_discover_defaults() {
        let session = session();
        let discovery = session.discover_gadgets(&GadgetSearch::default());
        assert_eq!(discovery.count, 2);
        assert_eq!(discovery.categories.memory.len(), 1);
        assert_eq!(discovery.categories.control.len(), 1);

        let everything = session.discover_gadgets(&GadgetSearch {
            types: vec![],
            ..Default::default()
        });
        assert_eq!(everything.count, 4);
        assert_eq!(everything.categories.arithmetic.len(), 1);
    }
}
