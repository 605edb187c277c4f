use super::{expand, RuleTemplate};
use crate::rules::model::{Confidence, Rule, Severity};

const GO: &[RuleTemplate] = &[
    RuleTemplate::line(
        "goroutine-loop-capture",
        r"for\s+[^{]*range[^{]*\{\s*go\s+func\s*\(\s*\)",
        Severity::High,
        "Goroutine started inside a range loop without passing the loop variable",
        "Pass loop variables to the goroutine as arguments",
    ),
    RuleTemplate::line(
        "goroutine-launch",
        r"^\s*go\s+\w",
        Severity::Low,
        "Goroutine launched - verify synchronization and termination",
        "Make sure every goroutine has an owner that waits for it",
    ),
    RuleTemplate::line(
        "mutex-without-defer",
        r"\.Lock\(\)\s*$",
        Severity::Medium,
        "Mutex locked without a deferred unlock on the same line",
        "Pair Lock with defer Unlock to avoid leaked locks on early return",
    ),
    RuleTemplate::line(
        "unbuffered-channel",
        r"make\s*\(\s*chan\s+[^,)]+\)",
        Severity::Low,
        "Unbuffered channel may block forever if the receiver exits",
        "Check that every send has a guaranteed receiver or use select with a timeout",
    ),
    RuleTemplate::line(
        "unsafe-pointer",
        r"unsafe\.Pointer",
        Severity::High,
        "unsafe.Pointer bypasses Go's type safety",
        "Avoid unsafe unless strictly required and document the invariants",
    ),
    RuleTemplate::line(
        "command-injection",
        r"exec\.Command\s*\(\s*[^\x22`]",
        Severity::High,
        "Command executed with a non-literal program name",
        "Validate or whitelist commands passed to exec.Command",
    ),
    RuleTemplate::line(
        "weak-random",
        r#""math/rand""#,
        Severity::Low,
        "math/rand is not cryptographically secure",
        "Use crypto/rand for security-sensitive values",
    ),
    RuleTemplate::line(
        "insecure-tls",
        r"InsecureSkipVerify\s*:\s*true",
        Severity::Critical,
        "TLS certificate verification disabled",
        "Never disable certificate verification outside of tests",
    ),
];

pub fn go_rules() -> Vec<Rule> {
    expand(GO, "go", "concurrency-analysis", Confidence::Medium)
}
