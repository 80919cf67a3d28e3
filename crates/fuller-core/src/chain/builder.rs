use crate::chain::{Chain, ChainError, ChainRequest, ChainWord, Target};
use crate::gadget::{Architecture, Gadget, GadgetCatalog, GadgetKind};
use crate::util::SYNTHETIC_ARGUMENT;
use log::{debug, info, warn};

/// Assembles chains from the gadgets of a catalog.
///
/// Every gadget of the requested architecture is eligible. The request's
/// constraints are recorded in the chain's metadata but do not restrict the
/// gadgets used; filter with [`GadgetCatalog::discover`] beforehand if needed.
pub struct ChainBuilder<'a> {
    catalog: &'a GadgetCatalog,
}

type Parts = (Vec<ChainWord>, Vec<Gadget>);

impl<'a> ChainBuilder<'a> {
    /// Creates a builder drawing gadgets from `catalog`.
    pub fn new(catalog: &'a GadgetCatalog) -> Self {
        Self { catalog }
    }

    /// Builds a chain for `request`.
    ///
    /// # Errors
    ///
    /// [`Target::SystemCall`] fails with [`ChainError::MissingGadget`] if the
    /// argument loader or a syscall gadget is unavailable. The other targets
    /// produce whatever subset of the chain the catalog allows.
    pub fn build(&self, request: &ChainRequest) -> Result<Chain, ChainError> {
        info!(
            "Building {} chain for {}",
            request.target, request.architecture
        );
        let gadgets: Vec<&Gadget> = self.catalog.get(request.architecture).iter().collect();
        debug!("{} usable gadgets", gadgets.len());
        let (words, used) = match request.target {
            Target::SystemCall => system_call(&gadgets, request)?,
            Target::FunctionCall => function_call(&gadgets, request),
            Target::MemoryWrite => memory_write(&gadgets),
        };
        Ok(Chain::new(words, used, request.clone()))
    }
}

fn find_named<'g>(gadgets: &[&'g Gadget], name: &str) -> Option<&'g Gadget> {
    gadgets.iter().copied().find(|g| g.name() == Some(name))
}

fn system_call(gadgets: &[&Gadget], request: &ChainRequest) -> Result<Parts, ChainError> {
    let arch = request.architecture;
    let loader = find_named(gadgets, arch.argument_loader())
        .ok_or_else(|| ChainError::MissingGadget(arch.argument_loader().to_string()))?;
    let trap = gadgets
        .iter()
        .copied()
        .find(|g| match g.kind() {
            GadgetKind::Syscall => true,
            GadgetKind::Int => arch == Architecture::X86,
            _ => false,
        })
        .ok_or_else(|| ChainError::MissingGadget("syscall".to_string()))?;
    let argument = request.args.first().copied().unwrap_or(SYNTHETIC_ARGUMENT);
    let words = vec![
        ChainWord::Value(loader.address()),
        ChainWord::Value(argument),
        ChainWord::Value(trap.address()),
    ];
    Ok((words, vec![loader.clone(), trap.clone()]))
}

fn function_call(gadgets: &[&Gadget], request: &ChainRequest) -> Parts {
    let arch = request.architecture;
    let mut words = vec![];
    let mut used = vec![];
    match (request.args.first(), find_named(gadgets, arch.argument_loader())) {
        (Some(&argument), Some(loader)) => {
            words.push(ChainWord::Value(loader.address()));
            words.push(ChainWord::Value(argument));
            used.push(loader.clone());
        }
        (Some(_), None) => warn!("No {} gadget, argument dropped", arch.argument_loader()),
        (None, _) => {}
    }
    match find_named(gadgets, arch.register_call()) {
        Some(call) => {
            words.push(ChainWord::Value(call.address()));
            used.push(call.clone());
        }
        None => warn!("No {} gadget, chain does not call", arch.register_call()),
    }
    (words, used)
}

fn memory_write(gadgets: &[&Gadget]) -> Parts {
    match gadgets.iter().find(|g| g.kind() == GadgetKind::Mov) {
        Some(mov) => (vec![ChainWord::Value(mov.address())], vec![(*mov).clone()]),
        None => {
            warn!("No mov gadget, memory write chain is empty");
            (vec![], vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gadget::Constraint;

    fn gadget(arch: Architecture, kind: GadgetKind, address: u64, name: &str) -> Gadget {
        Gadget::new(arch, kind, address).unwrap().named(name)
    }

    fn x64_catalog() -> GadgetCatalog {
        let mut catalog = GadgetCatalog::new();
        catalog.add(gadget(Architecture::X64, GadgetKind::Pop, 0x7f00_1000, "pop_rdi"));
        catalog.add(gadget(Architecture::X64, GadgetKind::Pop, 0x7fab_1230, "pop_rdi"));
        catalog.add(gadget(Architecture::X64, GadgetKind::Syscall, 0x7fab_2340, "syscall"));
        catalog.add(gadget(Architecture::X64, GadgetKind::Call, 0x7fab_3450, "call_rax"));
        catalog.add(gadget(Architecture::X64, GadgetKind::Mov, 0x7fab_4560, "mov_rdi_rax"));
        catalog
    }

    fn request(target: Target, args: Vec<u64>) -> ChainRequest {
        ChainRequest {
            target,
            args,
            ..Default::default()
        }
    }

    #[test]
    fn test_system_call_chain() {
        let catalog = x64_catalog();
        let chain = ChainBuilder::new(&catalog)
            .build(&request(Target::SystemCall, vec![]))
            .unwrap();
        assert_eq!(
            chain.words(),
            &[
                ChainWord::Value(0x7f00_1000),
                ChainWord::Value(SYNTHETIC_ARGUMENT),
                ChainWord::Value(0x7fab_2340)
            ]
        );
        assert_eq!(chain.gadgets().len(), 2);
    }

    #[test]
    fn test_constraints_are_metadata_only() {
        let mut catalog = GadgetCatalog::new();
        catalog.add(gadget(Architecture::X64, GadgetKind::Pop, 0x40_1000, "pop_rdi"));
        catalog.add(gadget(Architecture::X64, GadgetKind::Syscall, 0x7fab_2341, "syscall"));
        let req = ChainRequest {
            constraints: vec![Constraint::NoNullBytes],
            ..Default::default()
        };
        let chain = ChainBuilder::new(&catalog).build(&req).unwrap();
        assert_eq!(
            chain.words(),
            &[
                ChainWord::Value(0x40_1000),
                ChainWord::Value(SYNTHETIC_ARGUMENT),
                ChainWord::Value(0x7fab_2341)
            ]
        );
        assert_eq!(chain.metadata().constraints, vec![Constraint::NoNullBytes]);
    }

    #[test]
    fn test_system_call_needs_syscall_gadget() {
        let mut catalog = GadgetCatalog::new();
        catalog.add(gadget(Architecture::X64, GadgetKind::Pop, 0x7fab_1230, "pop_rdi"));
        let err = ChainBuilder::new(&catalog)
            .build(&request(Target::SystemCall, vec![]))
            .unwrap_err();
        assert!(matches!(err, ChainError::MissingGadget(ref name) if name == "syscall"));
    }

    #[test]
    fn test_system_call_needs_loader_first() {
        let catalog = GadgetCatalog::new();
        let err = ChainBuilder::new(&catalog)
            .build(&request(Target::SystemCall, vec![]))
            .unwrap_err();
        assert!(matches!(err, ChainError::MissingGadget(ref name) if name == "pop_rdi"));
    }

    #[test]
    fn test_x86_accepts_int() {
        let mut catalog = GadgetCatalog::new();
        catalog.add(gadget(Architecture::X86, GadgetKind::Pop, 0x0804_9123, "pop_ebx"));
        catalog.add(gadget(Architecture::X86, GadgetKind::Int, 0x0804_9456, "int_80"));
        let req = ChainRequest {
            architecture: Architecture::X86,
            args: vec![0xb],
            ..Default::default()
        };
        let chain = ChainBuilder::new(&catalog).build(&req).unwrap();
        assert_eq!(chain.words()[2], ChainWord::Value(0x0804_9456));
    }

    #[test]
    fn test_function_call_best_effort() {
        let catalog = x64_catalog();
        let builder = ChainBuilder::new(&catalog);
        let with_arg = builder
            .build(&request(Target::FunctionCall, vec![0xdead]))
            .unwrap();
        assert_eq!(with_arg.len(), 3);
        assert_eq!(with_arg.gadgets().len(), 2);
        let no_arg = builder.build(&request(Target::FunctionCall, vec![])).unwrap();
        assert_eq!(no_arg.words(), &[ChainWord::Value(0x7fab_3450)]);

        let empty = GadgetCatalog::new();
        let chain = ChainBuilder::new(&empty)
            .build(&request(Target::FunctionCall, vec![1]))
            .unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_memory_write() {
        let catalog = x64_catalog();
        let chain = ChainBuilder::new(&catalog)
            .build(&request(Target::MemoryWrite, vec![]))
            .unwrap();
        assert_eq!(chain.words(), &[ChainWord::Value(0x7fab_4560)]);
        let empty = GadgetCatalog::new();
        let chain = ChainBuilder::new(&empty)
            .build(&request(Target::MemoryWrite, vec![]))
            .unwrap();
        assert!(chain.is_empty());
        assert!(chain.gadgets().is_empty());
    }
}
