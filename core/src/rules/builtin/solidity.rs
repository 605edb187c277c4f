use super::{expand, RuleTemplate};
use crate::rules::model::{Confidence, Rule, Severity};

const SOLIDITY: &[RuleTemplate] = &[
    RuleTemplate::line(
        "tx-origin-auth",
        r"tx\.origin\s*==|==\s*tx\.origin|require\s*\(\s*tx\.origin",
        Severity::High,
        "Authorization through tx.origin",
        "Use msg.sender for authorization checks",
    ),
    RuleTemplate::line(
        "delegatecall",
        r"\.delegatecall\s*\(",
        Severity::High,
        "delegatecall executes foreign code in this contract's storage context",
        "Only delegatecall into trusted, immutable targets",
    ),
    RuleTemplate::line(
        "selfdestruct",
        r"\bselfdestruct\s*\(|\bsuicide\s*\(",
        Severity::High,
        "Contract can be destroyed",
        "Remove selfdestruct or guard it behind strict access control",
    ),
    RuleTemplate::line(
        "low-level-call",
        r"\.call\{?[^;]*\}?\s*\(",
        Severity::Medium,
        "Low-level call detected",
        "Check the returned success flag and follow checks-effects-interactions",
    ),
    RuleTemplate::line(
        "unchecked-send",
        r"\.send\s*\(",
        Severity::Medium,
        "Return value of send may be ignored",
        "Use call with an explicit success check, or transfer",
    ),
    RuleTemplate::line(
        "block-timestamp",
        r"block\.timestamp|\bnow\b",
        Severity::Low,
        "Logic depends on block timestamp",
        "Avoid using block.timestamp for randomness or tight deadlines",
    ),
    RuleTemplate::line(
        "weak-randomness",
        r"keccak256\s*\(\s*abi\.encodePacked\s*\([^)]*block\.(?:timestamp|difficulty|number|prevrandao)",
        Severity::High,
        "Randomness derived from block attributes",
        "Use a verifiable randomness source such as a VRF oracle",
    ),
    RuleTemplate::line(
        "floating-pragma",
        r"pragma\s+solidity\s*\^",
        Severity::Info,
        "Floating compiler pragma",
        "Pin the compiler version used for deployment",
    ),
    RuleTemplate::line(
        "inline-assembly",
        r"\bassembly\s*\{",
        Severity::Medium,
        "Inline assembly bypasses compiler safety checks",
        "Keep assembly minimal and document its invariants",
    ),
];

pub fn solidity_rules() -> Vec<Rule> {
    expand(SOLIDITY, "solidity", "smart-contract", Confidence::Medium)
}
