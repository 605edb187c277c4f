use super::{expand, RuleTemplate};
use crate::rules::model::{Confidence, Rule, Severity};

const MOVE: &[RuleTemplate] = &[
    RuleTemplate::line(
        "unchecked-signer",
        r"public\s+(?:entry\s+)?fun\s+\w+\s*\([^)]*&signer",
        Severity::Medium,
        "Public function takes a signer - verify the signer is checked",
        "Assert the signer address against the expected authority",
    ),
    RuleTemplate::line(
        "global-borrow-mut",
        r"borrow_global_mut\s*<",
        Severity::Medium,
        "Mutable borrow of global storage",
        "Check access control before mutating global resources",
    ),
    RuleTemplate::line(
        "move-from",
        r"\bmove_from\s*<",
        Severity::High,
        "Resource removed from global storage",
        "Ensure only the owner can remove the resource",
    ),
    RuleTemplate::line(
        "abort-magic-number",
        r"\babort\s+\d+",
        Severity::Info,
        "Abort with a bare numeric code",
        "Use named error constants so aborts are traceable",
    ),
    RuleTemplate::line(
        "unchecked-arithmetic-cast",
        r"\(\s*\w+\s+as\s+u(?:8|16|32|64)\s*\)",
        Severity::Low,
        "Narrowing integer cast may abort on overflow",
        "Check bounds before casting to a smaller integer type",
    ),
    RuleTemplate::line(
        "missing-spec",
        r"pragma\s+verify\s*=\s*false",
        Severity::Info,
        "Formal verification disabled for this module",
        "Re-enable verification and add specs for critical functions",
    ),
];

pub fn move_rules() -> Vec<Rule> {
    expand(MOVE, "move", "formal-verification", Confidence::Low)
}
