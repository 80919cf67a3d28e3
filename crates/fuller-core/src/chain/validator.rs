use crate::chain::{Chain, ChainWord};
use crate::util::{BAD_CHARS, CFI_INDIRECT_LIMIT, CHAIN_ALIGNMENT, LOW_ADDRESS_THRESHOLD};
use log::debug;
use serde::Serialize;

/// Penalty per hard issue
const ISSUE_PENALTY: i64 = 20;
/// Penalty per warning
const WARNING_PENALTY: i64 = 5;
/// Bonus per satisfied mitigation bypass
const BYPASS_BONUS: i64 = 10;
/// Estimated cycles per chain word
const CYCLES_PER_WORD: usize = 3;

/// Address space randomization assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AslrCheck {
    /// No word points into the low, typically unrandomized, address range
    pub bypassed: bool,
    /// Number of words below the threshold
    pub fixed_addresses: usize,
}

/// Non-executable memory assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DepCheck {
    /// The chain only reuses existing code
    pub rop_only: bool,
    /// The chain needs an executable stack
    pub executable_stack: bool,
}

/// Stack canary assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StackCookieCheck {
    /// The chain leaves canaries intact
    pub preserves_cookies: bool,
    /// The chain clobbers a canary
    pub overwrites_cookies: bool,
}

/// Control-flow integrity assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CfiCheck {
    /// Fewer indirect branches than the compliance limit
    pub cfi_compliant: bool,
    /// Number of `call`/`jmp` gadgets
    pub indirect_calls: usize,
}

/// All mitigation assessments of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SecurityChecks {
    /// Address randomization
    pub aslr: AslrCheck,
    /// Non-executable memory
    pub dep: DepCheck,
    /// Stack canaries
    pub stack_cookies: StackCookieCheck,
    /// Control-flow integrity
    pub cfi: CfiCheck,
}

/// Cost estimate of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Performance {
    /// Number of words
    pub length: usize,
    /// Three cycles per word
    pub estimated_cycles: usize,
    /// Shorter chains score higher, 0 to 100
    pub cache_efficiency: usize,
}

/// Result of [`validate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// No hard issue was found
    pub valid: bool,
    /// Problems that make the chain unusable
    pub issues: Vec<String>,
    /// Problems that may make the chain unreliable
    pub warnings: Vec<String>,
    /// Mitigation assessments
    pub security: SecurityChecks,
    /// Cost estimate
    pub performance: Performance,
    /// Heuristic score from 0 to 100
    pub reliability: u32,
}

/// Checks and scores a chain. Never fails.
///
/// Unresolved and absent words are hard issues, as is a zero address. Bad
/// characters in the low 32 bits and misaligned addresses are warnings.
pub fn validate(chain: &Chain) -> ValidationReport {
    let mut issues = vec![];
    let mut warnings = vec![];
    for (i, word) in chain.words().iter().enumerate() {
        let addr = match word {
            ChainWord::Unresolved(_) => {
                issues.push(format!("Invalid address type at index {}", i));
                continue;
            }
            ChainWord::Absent | ChainWord::Value(0) => {
                issues.push(format!("Null/zero address at index {}", i));
                continue;
            }
            ChainWord::Value(addr) => *addr,
        };
        if contains_bad_chars(addr) {
            warnings.push(format!("Bad characters in address at index {}", i));
        }
        if addr % CHAIN_ALIGNMENT != 0 {
            warnings.push(format!("Unaligned address at index {}", i));
        }
    }

    let security = security_checks(chain);
    let performance = performance(chain.len());
    let reliability = reliability(issues.len(), warnings.len(), &security);
    debug!(
        "Chain of {} words: {} issues, {} warnings, reliability {}",
        chain.len(),
        issues.len(),
        warnings.len(),
        reliability
    );
    ValidationReport {
        valid: issues.is_empty(),
        issues,
        warnings,
        security,
        performance,
        reliability,
    }
}

/// Checks the four bytes of the low 32 bits, most significant first.
fn contains_bad_chars(addr: u64) -> bool {
    (addr as u32)
        .to_be_bytes()
        .iter()
        .any(|b| BAD_CHARS.contains(b))
}

fn security_checks(chain: &Chain) -> SecurityChecks {
    let fixed_addresses = chain
        .words()
        .iter()
        .filter_map(ChainWord::value)
        .filter(|&addr| addr < LOW_ADDRESS_THRESHOLD)
        .count();
    let indirect_calls = chain
        .gadgets()
        .iter()
        .filter(|g| g.kind().is_indirect_branch())
        .count();
    SecurityChecks {
        aslr: AslrCheck {
            bypassed: fixed_addresses == 0,
            fixed_addresses,
        },
        dep: DepCheck {
            rop_only: true,
            executable_stack: false,
        },
        stack_cookies: StackCookieCheck {
            preserves_cookies: true,
            overwrites_cookies: false,
        },
        cfi: CfiCheck {
            cfi_compliant: indirect_calls < CFI_INDIRECT_LIMIT,
            indirect_calls,
        },
    }
}

fn performance(length: usize) -> Performance {
    Performance {
        length,
        estimated_cycles: length * CYCLES_PER_WORD,
        cache_efficiency: 100usize.saturating_sub(length.saturating_mul(2)),
    }
}

fn reliability(issues: usize, warnings: usize, security: &SecurityChecks) -> u32 {
    let mut score = 100 - ISSUE_PENALTY * issues as i64 - WARNING_PENALTY * warnings as i64;
    if security.aslr.bypassed {
        score += BYPASS_BONUS;
    }
    if security.dep.rop_only {
        score += BYPASS_BONUS;
    }
    score.clamp(0, 100) as u32
}
