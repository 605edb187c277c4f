use super::{expand, RuleTemplate};
use crate::rules::model::{Confidence, Rule, Severity};

const CPP: &[RuleTemplate] = &[
    RuleTemplate::line(
        "unbounded-copy",
        r"\b(?:strcpy|strcat|wcscpy|wcscat)\s*\(",
        Severity::High,
        "Unbounded string copy may overflow the destination buffer",
        "Use bounded variants such as strncpy/strlcpy or std::string",
    ),
    RuleTemplate::line(
        "gets",
        r"\bgets\s*\(",
        Severity::Critical,
        "gets() cannot limit input size",
        "Use fgets() with an explicit buffer size",
    ),
    RuleTemplate::line(
        "unbounded-format",
        r"\b(?:sprintf|vsprintf)\s*\(",
        Severity::High,
        "Unbounded formatted write",
        "Use snprintf/vsnprintf with the destination size",
    ),
    RuleTemplate::line(
        "format-string",
        r"\bprintf\s*\(\s*[A-Za-z_]\w*\s*\)",
        Severity::High,
        "Non-literal format string",
        "Pass user data as an argument, never as the format string",
    ),
    RuleTemplate::line(
        "shell-command",
        r"\b(?:system|popen)\s*\(",
        Severity::High,
        "Shell command execution",
        "Avoid invoking a shell; use exec-family calls with fixed arguments",
    ),
    RuleTemplate::line(
        "manual-allocation",
        r"\b(?:malloc|calloc|realloc)\s*\(",
        Severity::Low,
        "Manual memory allocation",
        "Prefer RAII containers and smart pointers",
    ),
    RuleTemplate::line(
        "raw-delete",
        r"\bdelete\s*(?:\[\s*\])?\s*\w",
        Severity::Medium,
        "Manual delete may lead to double free or use-after-free",
        "Use std::unique_ptr or std::shared_ptr to manage ownership",
    ),
    RuleTemplate::line(
        "weak-random",
        r"\b(?:rand|srand)\s*\(",
        Severity::Low,
        "rand() is not suitable for security-sensitive values",
        "Use a cryptographically secure random source",
    ),
];

pub fn cpp_rules() -> Vec<Rule> {
    expand(CPP, "cpp", "static-analysis", Confidence::Medium)
}
