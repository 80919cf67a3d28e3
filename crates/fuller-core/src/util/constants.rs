/// Stamp of the first linearly groomed slot; slot `i` carries `LINEAR_FILL + i`
pub const LINEAR_FILL: u32 = 0x4141_4141;
/// Objects below this size are modelled as plain arrays rather than raw buffers
pub const SMALL_OBJECT_LIMIT: usize = 0x100;
/// Slot alignment used by aligned grooming (16 bytes)
pub const SLOT_ALIGNMENT: usize = 0x10;

/// Default spray slot size (4 KB)
pub const SPRAY_SLOT_SIZE: usize = 0x1000;
/// Default number of sprayed buffers
pub const SPRAY_COUNT: usize = 1000;
/// Scattered sprays leave every n-th slot empty
pub const SCATTER_INTERVAL: usize = 10;
/// Multiplier of the XOR spray encoding
pub const XOR_STRIDE: u32 = 0x1234_5678;

/// Default step increment of gradual hole punching
pub const GRADUAL_INTERVAL: usize = 10;

/// Number of reclamation attempts in aggressive mode
pub const AGGRESSIVE_ATTEMPTS: usize = 10;
/// Rounds of transient allocations in stress mode
pub const STRESS_ROUNDS: usize = 100;
/// Transient objects allocated per stress round
pub const STRESS_OBJECTS: usize = 1000;
/// Size of each transient stress object (1 KB)
pub const STRESS_OBJECT_SIZE: usize = 1024;

/// Objects claiming more bytes than this are considered corrupted (256 MB)
pub const CORRUPTION_SIZE_LIMIT: usize = 0x1000_0000;

/// Memory limit reported when the pressure reader has no better answer (2 GB)
pub const DEFAULT_MEMORY_LIMIT: u64 = 2 * (1 << 30);

/// Addresses below this value are treated as fixed (not randomized) mappings
pub const LOW_ADDRESS_THRESHOLD: u64 = 0x1000_0000;
/// Byte values that usually terminate or split an injected payload
pub const BAD_CHARS: [u8; 4] = [0x00, 0x0a, 0x0d, 0x20];
/// Required alignment of chain words
pub const CHAIN_ALIGNMENT: u64 = 8;
/// Chains with this many indirect branches or more are not CFI compliant
pub const CFI_INDIRECT_LIMIT: usize = 5;
/// Argument pushed by syscall chains when the caller supplies none
pub const SYNTHETIC_ARGUMENT: u64 = 0x7fff_ffff_1000;
