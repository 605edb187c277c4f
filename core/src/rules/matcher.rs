//! Rule evaluation over raw file text.
//!
//! Matching is textual. `Line` patterns run once per line so that every hit
//! carries a human-meaningful line/column. `Block` patterns and detectors see
//! the whole file; a hit that spans several lines is reported at the line
//! where it starts, which is an approximation and not a semantic guarantee.

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::rules::model::Rule;

/// A programmatic detector that can stand in for a regex.
pub trait Detector: Send + Sync {
    /// Byte ranges of every hit in `text`, in ascending order.
    fn detect(&self, text: &str) -> Vec<Range<usize>>;
}

pub enum Pattern {
    Line(Regex),
    Block(Regex),
    Detector(Arc<dyn Detector>),
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Line(re) => write!(f, "Line({})", re.as_str()),
            Pattern::Block(re) => write!(f, "Block({})", re.as_str()),
            Pattern::Detector(_) => f.write_str("Detector"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLocation {
    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,
    pub matched: String,
}

#[derive(Debug)]
pub struct CompiledRule {
    pub rule: Rule,
    pub pattern: Pattern,
}

impl CompiledRule {
    pub fn compile(rule: Rule) -> Result<Self> {
        let source = rule.pattern.as_deref().ok_or_else(|| CoreError::InvalidPattern {
            rule: rule.id.clone(),
            reason: "rule has no pattern".to_string(),
        })?;
        let regex = Regex::new(source).map_err(|e| CoreError::InvalidPattern {
            rule: rule.id.clone(),
            reason: e.to_string(),
        })?;
        let pattern = if rule.multiline {
            Pattern::Block(regex)
        } else {
            Pattern::Line(regex)
        };
        Ok(Self { rule, pattern })
    }

    pub fn with_detector(rule: Rule, detector: Arc<dyn Detector>) -> Self {
        Self {
            rule,
            pattern: Pattern::Detector(detector),
        }
    }

    pub fn id(&self) -> &str {
        &self.rule.id
    }

    /// Every match location of this rule in `text`, in text order.
    pub fn evaluate(&self, text: &str) -> Vec<MatchLocation> {
        match &self.pattern {
            Pattern::Line(regex) => evaluate_lines(regex, text),
            Pattern::Block(regex) => {
                let spans = regex.find_iter(text).map(|m| m.range()).collect();
                locate_spans(text, spans)
            }
            Pattern::Detector(detector) => locate_spans(text, detector.detect(text)),
        }
    }
}

fn evaluate_lines(regex: &Regex, text: &str) -> Vec<MatchLocation> {
    let mut locations = Vec::new();
    for (index, line) in text.lines().enumerate() {
        for m in regex.find_iter(line) {
            locations.push(MatchLocation {
                line: index + 1,
                column: line[..m.start()].chars().count() + 1,
                matched: m.as_str().to_string(),
            });
        }
    }
    locations
}

fn locate_spans(text: &str, spans: Vec<Range<usize>>) -> Vec<MatchLocation> {
    let index = LineIndex::new(text);
    let mut seen = HashSet::new();
    let mut locations = Vec::new();

    for span in spans {
        if span.start > text.len() || !text.is_char_boundary(span.start) {
            continue;
        }
        let (line, column) = index.position(text, span.start);
        if !seen.insert((line, column)) {
            continue;
        }
        let end = span.end.min(text.len());
        let matched = text.get(span.start..end).unwrap_or_default().to_string();
        locations.push(MatchLocation {
            line,
            column,
            matched,
        });
    }
    locations
}

/// Byte offset of the start of every line.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn position(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let column = text[self.starts[line]..offset].chars().count() + 1;
        (line + 1, column)
    }
}

/// Compile a batch of rules, dropping the ones whose pattern does not compile.
pub fn compile_rules(rules: Vec<Rule>) -> Vec<CompiledRule> {
    let mut compiled_rules = Vec::with_capacity(rules.len());
    for rule in rules {
        match CompiledRule::compile(rule) {
            Ok(compiled) => compiled_rules.push(compiled),
            Err(e) => tracing::warn!(error = %e, "skipping rule"),
        }
    }
    compiled_rules
}
