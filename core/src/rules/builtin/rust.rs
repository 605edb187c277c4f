use std::ops::Range;

use regex::Regex;

use super::{expand, RuleTemplate};
use crate::rules::matcher::Detector;
use crate::rules::model::{Confidence, Rule, Severity};

const RUDRA: &[RuleTemplate] = &[
    RuleTemplate::line(
        "panic-safety",
        r"unwrap\(\)|expect\([^)]*\)",
        Severity::Medium,
        "Potential panic condition detected",
        "Use proper error handling instead of unwrap/expect",
    ),
    RuleTemplate::line(
        "send-sync-variance",
        r"unsafe\s+impl\s+Send\s+for|unsafe\s+impl\s+Sync\s+for",
        Severity::High,
        "Unsafe Send/Sync implementation may violate memory safety",
        "Carefully review thread safety guarantees",
    ),
    RuleTemplate::line(
        "memory-transmutation",
        r"Box::from_raw|Box::into_raw|std::mem::transmute",
        Severity::Critical,
        "Unsafe memory transmutation detected",
        "Ensure lifetime and type safety guarantees",
    ),
    RuleTemplate::line(
        "static-mut-reference",
        r"&'static\s+mut|static\s+mut\s+\w+",
        Severity::High,
        "Static mutable reference may cause data races",
        "Use thread-safe alternatives or proper synchronization",
    ),
    RuleTemplate::line(
        "uninitialized-memory",
        r"std::mem::uninitialized|MaybeUninit::uninit\(\)\.assume_init",
        Severity::Critical,
        "Potentially uninitialized memory access",
        "Ensure memory is properly initialized before use",
    ),
    RuleTemplate::line(
        "manual-memory-management",
        r"std::mem::forget.*Box::|drop\(.*Box::",
        Severity::High,
        "Manual memory management may lead to double-free",
        "Let Rust handle memory management automatically",
    ),
];

const ERASAN: &[RuleTemplate] = &[
    RuleTemplate::line(
        "static-mut-data-race",
        r"static\s+mut\s+\w+",
        Severity::Critical,
        "Static mutable data may cause data races",
        "Use thread-safe alternatives like Mutex or atomic types",
    ),
    RuleTemplate::line(
        "unsynchronized-mutation",
        r"let\s+\w+\s*=\s*&mut\s+[^;]*;",
        Severity::High,
        "Mutable reference shared without synchronization",
        "Use proper synchronization primitives",
    ),
    RuleTemplate::line(
        "raw-pointer-cast",
        r"as\s+\*(?:mut|const)\s+\w+",
        Severity::High,
        "Raw pointer cast may alias memory across threads",
        "Wrap shared raw pointers in a synchronized abstraction",
    ),
];

const SHUTTLE: &[RuleTemplate] = &[
    RuleTemplate::line(
        "thread-spawn",
        r"std::thread::spawn\s*\(|thread::spawn\s*\(",
        Severity::Medium,
        "Thread spawn detected - potential concurrency issues",
        "Use Shuttle to test thread interactions and detect race conditions",
    ),
    RuleTemplate::line(
        "shared-mutex-state",
        r"Arc<Mutex<[^>]*>>",
        Severity::Medium,
        "Shared mutable state with Arc<Mutex> - test for deadlocks",
        "Test mutex usage patterns with Shuttle to detect deadlocks",
    ),
    RuleTemplate::line(
        "shared-rwlock-state",
        r"Arc<RwLock<[^>]*>>",
        Severity::Medium,
        "Shared state with RwLock - verify reader-writer correctness",
        "Test RwLock usage with Shuttle to ensure reader-writer safety",
    ),
    RuleTemplate::line(
        "channel-communication",
        r"channel\(\)|mpsc::",
        Severity::Medium,
        "Channel communication detected - test message ordering",
        "Use Shuttle to test channel communication patterns",
    ),
    RuleTemplate::line(
        "condition-variable",
        r"Condvar",
        Severity::High,
        "Condition variable usage - potential for lost wakeups",
        "Test condition variable patterns with Shuttle for correctness",
    ),
    RuleTemplate::line(
        "atomic-operations",
        r"atomic::|Atomic(?:Bool|I\d+|U\d+|Ptr|Usize|Isize)",
        Severity::Medium,
        "Atomic operations detected - verify memory ordering",
        "Test atomic operation ordering with Shuttle",
    ),
    RuleTemplate::line(
        "thread-join",
        r"\.join\(\)",
        Severity::Low,
        "Thread join operation - verify completion semantics",
        "Ensure proper thread joining patterns with Shuttle testing",
    ),
    RuleTemplate::block(
        "unsafe-send-sync",
        r"(?is)unsafe\s*\{[^}]*?(?:send|sync)[^}]*?\}",
        Severity::High,
        "Unsafe block touching Send/Sync - test thread safety",
        "Thoroughly test unsafe Send/Sync implementations with Shuttle",
    ),
    RuleTemplate::line(
        "once-initialization",
        r"std::sync::Once|once_cell",
        Severity::Medium,
        "One-time initialization detected - test initialization race conditions",
        "Test one-time initialization patterns for race conditions",
    ),
    RuleTemplate::line(
        "condvar-wait-notify",
        r"\.wait\(|\.notify_one\(\)|\.notify_all\(\)",
        Severity::High,
        "Condition variable wait/notify operations - test for missed signals",
        "Test wait/notify patterns with Shuttle to prevent missed signals",
    ),
];

pub fn rudra_rules() -> Vec<Rule> {
    expand(RUDRA, "rust", "memory-safety", Confidence::High)
}

pub fn erasan_rules() -> Vec<Rule> {
    expand(ERASAN, "rust", "concurrency", Confidence::High)
}

pub fn shuttle_rules() -> Vec<Rule> {
    expand(SHUTTLE, "rust", "concurrency-testing", Confidence::Medium)
}

pub fn detached_thread_rule() -> Rule {
    Rule {
        id: "detached-thread".to_string(),
        name: "Spawned thread is never joined".to_string(),
        description: "A thread handle is created but the file never joins any thread".to_string(),
        severity: Severity::Medium,
        language: "rust".to_string(),
        pattern: None,
        multiline: false,
        category: Some("concurrency-testing".to_string()),
        recommendation: Some(
            "Join spawned threads or use scoped threads so work is not silently dropped at exit"
                .to_string(),
        ),
        confidence: Some(Confidence::Low),
        cwe: None,
    }
}

/// Flags `thread::spawn` calls in files that contain no `.join()` at all.
pub struct DetachedThreadDetector {
    spawn: Regex,
    join: Regex,
}

impl DetachedThreadDetector {
    pub fn new() -> Option<Self> {
        Some(Self {
            spawn: Regex::new(r"thread::spawn\s*\(").ok()?,
            join: Regex::new(r"\.join\(\)").ok()?,
        })
    }
}

impl Detector for DetachedThreadDetector {
    fn detect(&self, text: &str) -> Vec<Range<usize>> {
        if self.join.is_match(text) {
            return Vec::new();
        }
        self.spawn.find_iter(text).map(|m| m.range()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_threads_only_flagged_without_join() {
        let detector = DetachedThreadDetector::new().unwrap();
        let detached = "let h = thread::spawn(move || work());\n";
        let joined = "let h = thread::spawn(move || work());\nh.join().unwrap();\n";
        assert_eq!(detector.detect(detached).len(), 1);
        assert!(detector.detect(joined).is_empty());
    }
}
