//! Built-in checkers, in dispatch order.

use std::sync::Arc;

use super::external::{ExternalChecker, ToolInvocation};
use super::parsers::ToolOutput;
use super::pattern::PatternChecker;
use super::{AnalyzerKind, Checker, CheckerMeta};
use crate::rules::builtin::{cpp, go, move_lang, rust, solidity};
use crate::rules::matcher::{compile_rules, CompiledRule};
use crate::rules::model::{Rule, Severity};
use crate::walker::Language;

const LOCKBUD_ADVICE: &[(&str, &str)] = &[
    (
        "uaf",
        "Ensure memory is not accessed after being freed. Consider using safe abstractions like Box<T>, Rc<T>, or Arc<T>.",
    ),
    (
        "use-after-free",
        "Ensure memory is not accessed after being freed. Consider using safe abstractions like Box<T>, Rc<T>, or Arc<T>.",
    ),
    (
        "double_free",
        "Avoid freeing memory that has already been freed. Use RAII principles with smart pointers.",
    ),
    (
        "data_race",
        "Protect shared mutable state with a mutex or use message passing.",
    ),
    (
        "deadlock",
        "Avoid acquiring locks in different orders in different threads.",
    ),
    (
        "doublelock",
        "Avoid acquiring locks in different orders in different threads.",
    ),
];

const RUST_GENERIC_ADVICE: &[(&str, &str)] = &[(
    "panic",
    "Use proper error handling instead of code paths that can panic",
)];

const KANI_ADVICE: &[(&str, &str)] = &[
    ("overflow", "Use checked or wrapping arithmetic where overflow is possible"),
    ("dereference", "Validate pointers before dereferencing them"),
    ("assertion", "Strengthen preconditions so the assertion can never fail"),
];

const SLITHER_ADVICE: &[(&str, &str)] = &[
    ("reentrancy", "Apply the checks-effects-interactions pattern or a reentrancy guard"),
    ("tx-origin", "Use msg.sender for authorization"),
    ("arbitrary-send", "Restrict who can trigger outgoing transfers"),
];

fn pattern(meta: CheckerMeta, rules: Vec<Rule>) -> PatternChecker {
    PatternChecker::new(meta, compile_rules(rules))
}

fn rudra_meta() -> CheckerMeta {
    CheckerMeta::new("rudra", "Rudra", Language::Rust)
        .describe("Memory-safety bugs in unsafe Rust: panic safety, Send/Sync variance, transmutation")
        .category("memory-safety")
        .severity(Severity::High)
}

fn slither_meta() -> CheckerMeta {
    CheckerMeta::new("slither", "Slither", Language::Solidity)
        .describe("Solidity static analyzer for reentrancy, access control and unsafe calls")
        .category("smart-contract")
        .severity(Severity::High)
}

fn gcatch_meta() -> CheckerMeta {
    CheckerMeta::new("gcatch", "GCatch", Language::Go)
        .describe("Blocking and non-blocking concurrency bugs in Go")
        .category("concurrency-analysis")
        .severity(Severity::High)
}

fn cppcheck_meta() -> CheckerMeta {
    CheckerMeta::new("cppcheck", "Cppcheck", Language::Cpp)
        .describe("Static analysis of C and C++ sources")
        .category("static-analysis")
        .severity(Severity::Medium)
}

fn move_prover_meta() -> CheckerMeta {
    CheckerMeta::new("move-prover", "Move Prover", Language::Move)
        .describe("Formal verification of Move modules against their specifications")
        .category("formal-verification")
        .severity(Severity::High)
        .kind(AnalyzerKind::Verifier)
}

fn lockbud() -> ExternalChecker {
    ExternalChecker::new(
        CheckerMeta::new("lockbud", "Lockbud", Language::Rust)
            .describe("Deadlocks, use-after-free and double-free in Rust via MIR analysis")
            .category("memory-safety")
            .severity(Severity::Critical),
        ToolInvocation::new("cargo", &["lockbud", "-k", "all"], ToolOutput::RustcDiagnostics)
            .probe("cargo-lockbud")
            .install_hint("cargo install --git https://github.com/BurtonQin/lockbud"),
    )
    .with_advice(LOCKBUD_ADVICE)
}

fn rudra() -> ExternalChecker {
    ExternalChecker::new(
        rudra_meta(),
        ToolInvocation::new("cargo", &["rudra"], ToolOutput::RustcDiagnostics)
            .probe("cargo-rudra")
            .install_hint("cargo install --git https://github.com/sslab-gatech/Rudra"),
    )
    .with_fallback(pattern(rudra_meta(), rust::rudra_rules()))
    .with_advice(RUST_GENERIC_ADVICE)
}

fn mirai() -> ExternalChecker {
    ExternalChecker::new(
        CheckerMeta::new("mirai", "MIRAI", Language::Rust)
            .describe("Abstract interpretation of MIR for panics and unintended behaviour")
            .category("static-analysis")
            .severity(Severity::High),
        ToolInvocation::new("cargo", &["mirai"], ToolOutput::RustcDiagnostics)
            .probe("cargo-mirai")
            .install_hint("cargo install --git https://github.com/endorlabs/MIRAI mirai"),
    )
    .with_advice(RUST_GENERIC_ADVICE)
}

fn kani() -> ExternalChecker {
    ExternalChecker::new(
        CheckerMeta::new("kani", "Kani", Language::Rust)
            .describe("Bit-precise model checking of Rust proof harnesses")
            .category("formal-verification")
            .severity(Severity::High)
            .kind(AnalyzerKind::Verifier),
        ToolInvocation::new("cargo", &["kani"], ToolOutput::KaniReport)
            .probe("cargo-kani")
            .install_hint("cargo install --locked kani-verifier && cargo kani setup"),
    )
    .with_advice(KANI_ADVICE)
}

fn erasan() -> PatternChecker {
    pattern(
        CheckerMeta::new("erasan", "ERASan", Language::Rust)
            .describe("Data-race heuristics for static mutable state and raw pointers")
            .category("concurrency")
            .severity(Severity::High)
            .kind(AnalyzerKind::Dynamic),
        rust::erasan_rules(),
    )
}

fn shuttle() -> PatternChecker {
    let mut rules = compile_rules(rust::shuttle_rules());
    match rust::DetachedThreadDetector::new() {
        Some(detector) => rules.push(CompiledRule::with_detector(
            rust::detached_thread_rule(),
            Arc::new(detector),
        )),
        None => tracing::warn!("detached-thread detector failed to build, skipping it"),
    }
    PatternChecker::new(
        CheckerMeta::new("shuttle", "Shuttle", Language::Rust)
            .describe("Concurrency patterns worth exploring with randomized schedule testing")
            .category("concurrency-testing")
            .severity(Severity::Medium)
            .kind(AnalyzerKind::Dynamic),
        rules,
    )
}

fn slither() -> ExternalChecker {
    ExternalChecker::new(
        slither_meta(),
        ToolInvocation::new("slither", &[".", "--json", "-"], ToolOutput::SlitherJson)
            .install_hint("pip3 install slither-analyzer"),
    )
    .with_fallback(pattern(slither_meta(), solidity::solidity_rules()))
    .with_advice(SLITHER_ADVICE)
}

fn gcatch() -> ExternalChecker {
    ExternalChecker::new(
        gcatch_meta(),
        ToolInvocation::new("GCatch", &["-path", "{root}"], ToolOutput::GnuStyle)
            .install_hint("see https://github.com/system-pclub/GCatch for build instructions"),
    )
    .with_fallback(pattern(gcatch_meta(), go::go_rules()))
}

fn cppcheck() -> ExternalChecker {
    ExternalChecker::new(
        cppcheck_meta(),
        ToolInvocation::new(
            "cppcheck",
            &[
                "--enable=warning,style,performance,portability",
                "--quiet",
                "--template={file}:{line}:{column}: {severity}: {message} [{id}]",
                ".",
            ],
            ToolOutput::GnuStyle,
        )
        .install_hint("apt install cppcheck  (or: brew install cppcheck)"),
    )
    .with_fallback(pattern(cppcheck_meta(), cpp::cpp_rules()))
}

fn move_prover() -> ExternalChecker {
    ExternalChecker::new(
        move_prover_meta(),
        ToolInvocation::new("move", &["prove"], ToolOutput::Codespan)
            .install_hint("cargo install --git https://github.com/move-language/move move-cli"),
    )
    .with_fallback(pattern(move_prover_meta(), move_lang::move_rules()))
}

/// Every built-in checker in declaration order.
pub fn builtin_checkers() -> Vec<Arc<dyn Checker>> {
    vec![
        Arc::new(lockbud()),
        Arc::new(rudra()),
        Arc::new(mirai()),
        Arc::new(kani()),
        Arc::new(erasan()),
        Arc::new(shuttle()),
        Arc::new(slither()),
        Arc::new(gcatch()),
        Arc::new(cppcheck()),
        Arc::new(move_prover()),
    ]
}
