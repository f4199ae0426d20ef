//! Defect collection for analysis runs.
//!
//! This module provides the reporting side of the rule engine: the [`Defect`] a rule
//! raises when an analyzed entity violates a convention, and the [`Defects`] container
//! that collects them for the output layer.
//!
//! # Architecture
//!
//! Rules report through a [`crate::rules::RuleContext`], which stamps each defect with the
//! rule name and forwards it here. The [`Defects`] container uses `boxcar::Vec` for
//! lock-free append operations, so rules running on different worker threads report
//! without synchronizing with each other. Defects are never mutated once recorded.
//!
//! # Key Components
//!
//! - [`Defects`] - Thread-safe, append-only container for defects
//! - [`Defect`] - Individual finding with target, severity, confidence and message
//! - [`DefectTarget`] - The entity a defect is attributed to
//! - [`Severity`] - How bad the violation is
//! - [`Confidence`] - How sure the rule is about it
//!
//! # Duplicate Suppression
//!
//! A container created with [`Defects::deduplicating`] keeps only the first of several
//! identical defects (same rule, target, location and message). Rules that re-verify the
//! same entity from several call sites rely on this to report each finding once per run.
//!
//! # Usage Examples
//!
//! ```rust
//! use dotlint::defects::{Confidence, Defect, DefectTarget, Defects, Severity};
//! use dotlint::metadata::token::Token;
//!
//! let defects = Defects::deduplicating();
//! let target = DefectTarget::Type {
//!     token: Token::new(0x02000002),
//!     name: "Demo.Handler".to_string(),
//! };
//!
//! let defect = Defect::new(
//!     "DeclareEventHandlersCorrectly",
//!     target,
//!     Severity::Medium,
//!     Confidence::High,
//!     "The delegate should have 2 parameters",
//! );
//! assert!(defects.push(defect.clone()));
//! assert!(!defects.push(defect));
//! assert_eq!(defects.count(), 1);
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are [`Send`] and [`Sync`]. Multiple threads can safely add
//! defects simultaneously without coordination.

use std::fmt::{self, Write};

use dashmap::DashSet;
use strum::{Display, EnumIter, EnumString};

use crate::metadata::{event::Event, method::Method, token::Token, typesystem::CilType};

/// Severity of a defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter)]
pub enum Severity {
    /// Cosmetic or internal-only issue
    Low,
    /// Issue likely to cause trouble for users of the code
    Medium,
    /// Issue likely to cause failures
    High,
    /// Issue that certainly causes failures
    Critical,
}

/// How certain the rule is that a reported defect is real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter)]
pub enum Confidence {
    /// Heuristic match, expect false positives
    Low,
    /// Likely, but depends on context the rule cannot see
    Normal,
    /// The pattern is unambiguous once reached
    High,
    /// The defect is certain
    Total,
}

/// The entity a defect is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DefectTarget {
    /// A declared type
    Type {
        /// `TypeDef` token
        token: Token,
        /// Full name of the type
        name: String,
    },
    /// A method
    Method {
        /// `MethodDef` token
        token: Token,
        /// Full name of the method, `Type::Name`
        name: String,
    },
    /// An event
    Event {
        /// `Event` token
        token: Token,
        /// Full name of the event, `Type::Name`
        name: String,
    },
}

impl DefectTarget {
    /// Token of the target entity
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            DefectTarget::Type { token, .. }
            | DefectTarget::Method { token, .. }
            | DefectTarget::Event { token, .. } => *token,
        }
    }

    /// Full name of the target entity
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            DefectTarget::Type { name, .. }
            | DefectTarget::Method { name, .. }
            | DefectTarget::Event { name, .. } => name,
        }
    }
}

impl From<&CilType> for DefectTarget {
    fn from(ty: &CilType) -> Self {
        DefectTarget::Type {
            token: ty.token,
            name: ty.fullname(),
        }
    }
}

impl From<&Method> for DefectTarget {
    fn from(method: &Method) -> Self {
        DefectTarget::Method {
            token: method.token,
            name: method.fullname(),
        }
    }
}

impl From<&Event> for DefectTarget {
    fn from(event: &Event) -> Self {
        DefectTarget::Event {
            token: event.token,
            name: event.fullname(),
        }
    }
}

impl fmt::Display for DefectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefectTarget::Type { name, .. } => write!(f, "type {name}"),
            DefectTarget::Method { name, .. } => write!(f, "method {name}"),
            DefectTarget::Event { name, .. } => write!(f, "event {name}"),
        }
    }
}

/// A single finding raised by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Defect {
    /// Name of the rule that raised it
    pub rule: String,
    /// The entity responsible for the defect
    pub target: DefectTarget,
    /// How bad the violation is
    pub severity: Severity,
    /// How sure the rule is
    pub confidence: Confidence,
    /// Human-readable description
    pub message: String,
    /// Offset of the offending instruction, for defects found in a method body
    pub offset: Option<u64>,
}

impl Defect {
    /// Creates a new defect
    pub fn new(
        rule: impl Into<String>,
        target: DefectTarget,
        severity: Severity,
        confidence: Confidence,
        message: impl Into<String>,
    ) -> Self {
        Defect {
            rule: rule.into(),
            target,
            severity,
            confidence,
            message: message.into(),
            offset: None,
        }
    }

    /// Adds the offset of the offending instruction
    #[must_use]
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl fmt::Display for Defect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {}: {} ({})",
            self.severity, self.confidence, self.rule, self.message, self.target
        )?;

        if let Some(offset) = self.offset {
            write!(f, " at IL_{offset:04x}")?;
        }

        Ok(())
    }
}

/// Thread-safe, append-only container for the defects of one analysis run.
#[derive(Debug)]
pub struct Defects {
    entries: boxcar::Vec<Defect>,
    seen: Option<DashSet<Defect>>,
}

impl Default for Defects {
    fn default() -> Self {
        Self::new()
    }
}

impl Defects {
    /// Creates a container that keeps every reported defect
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
            seen: None,
        }
    }

    /// Creates a container that drops defects identical to one already recorded
    #[must_use]
    pub fn deduplicating() -> Self {
        Self {
            entries: boxcar::Vec::new(),
            seen: Some(DashSet::new()),
        }
    }

    /// Records a defect.
    ///
    /// Returns `false` if the defect was dropped as a duplicate.
    pub fn push(&self, defect: Defect) -> bool {
        if let Some(seen) = &self.seen {
            // insert is atomic per shard: of two racing identical reports, one wins
            if !seen.insert(defect.clone()) {
                return false;
            }
        }
        self.entries.push(defect);
        true
    }

    /// Returns true if no defect has been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.count() == 0
    }

    /// Returns the total number of defects
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns an iterator over all defects, in recording order
    pub fn iter(&self) -> impl Iterator<Item = &Defect> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns the defects raised by `rule`
    pub fn by_rule(&self, rule: &str) -> Vec<&Defect> {
        self.iter().filter(|d| d.rule == rule).collect()
    }

    /// Returns the defects of the given severity
    pub fn by_severity(&self, severity: Severity) -> Vec<&Defect> {
        self.iter().filter(|d| d.severity == severity).collect()
    }

    /// Returns the defects attributed to the entity with `token`
    pub fn by_target(&self, token: Token) -> Vec<&Defect> {
        self.iter().filter(|d| d.target.token() == token).collect()
    }

    /// Consumes the container and returns the defects in a stable order: by rule, target
    /// token, offset and message.
    ///
    /// Recording order depends on worker scheduling; this order does not.
    #[must_use]
    pub fn into_sorted(self) -> Vec<Defect> {
        let mut defects: Vec<Defect> = self.entries.into_iter().collect();
        defects.sort_by(|a, b| {
            (&a.rule, a.target.token(), a.offset, &a.message)
                .cmp(&(&b.rule, b.target.token(), b.offset, &b.message))
        });
        defects
    }

    /// Formats a summary of all defects for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "Defects: {}", self.count());
        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ] {
            let matching = self.by_severity(severity);
            if matching.is_empty() {
                continue;
            }

            let _ = writeln!(output, "\n{severity}:");
            for defect in matching {
                let _ = writeln!(output, "  {defect}");
            }
        }

        output
    }
}

impl fmt::Display for Defects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn target(row: u32) -> DefectTarget {
        DefectTarget::Method {
            token: Token::from_parts(Token::METHOD_DEF, row),
            name: format!("Demo.Repository::Method{row}"),
        }
    }

    fn defect(row: u32, message: &str) -> Defect {
        Defect::new(
            "PreferEmptyInstanceOverNull",
            target(row),
            Severity::Medium,
            Confidence::High,
            message,
        )
    }

    #[test]
    fn test_defect_creation() {
        let defect = defect(1, "Replace null with string.Empty.").with_offset(0x0c);

        assert_eq!(defect.rule, "PreferEmptyInstanceOverNull");
        assert_eq!(defect.target.token(), Token::new(0x06000001));
        assert_eq!(defect.offset, Some(0x0c));
        assert_eq!(
            defect.to_string(),
            "[Medium/High] PreferEmptyInstanceOverNull: Replace null with string.Empty. (method Demo.Repository::Method1) at IL_000c"
        );
    }

    #[test]
    fn test_keeps_duplicates_by_default() {
        let defects = Defects::new();
        assert!(defects.is_empty());

        assert!(defects.push(defect(1, "same")));
        assert!(defects.push(defect(1, "same")));
        assert_eq!(defects.count(), 2);
    }

    #[test]
    fn test_deduplicating_keeps_distinct_locations() {
        let defects = Defects::deduplicating();

        assert!(defects.push(defect(1, "same").with_offset(2)));
        assert!(defects.push(defect(1, "same").with_offset(8)));
        assert!(!defects.push(defect(1, "same").with_offset(2)));
        assert!(defects.push(defect(2, "same").with_offset(2)));

        assert_eq!(defects.count(), 3);
        assert_eq!(defects.by_target(Token::new(0x06000001)).len(), 2);
    }

    #[test]
    fn test_filters() {
        let defects = Defects::new();
        defects.push(defect(1, "a"));
        defects.push(Defect::new(
            "DeclareEventHandlersCorrectly",
            DefectTarget::Type {
                token: Token::new(0x02000004),
                name: "Demo.Handler".to_string(),
            },
            Severity::Low,
            Confidence::High,
            "The expected name is sender, not source",
        ));

        assert_eq!(defects.by_rule("DeclareEventHandlersCorrectly").len(), 1);
        assert_eq!(defects.by_severity(Severity::Medium).len(), 1);
        assert_eq!(defects.by_severity(Severity::Critical).len(), 0);

        let summary = defects.summary();
        assert!(summary.contains("Defects: 2"));
        assert!(summary.contains("Low:"));
        assert!(!summary.contains("High:"));
    }

    #[test]
    fn test_into_sorted_is_stable() {
        let defects = Defects::new();
        defects.push(defect(3, "c"));
        defects.push(defect(1, "b").with_offset(9));
        defects.push(defect(1, "a").with_offset(2));

        let sorted = defects.into_sorted();
        let order: Vec<(u32, Option<u64>)> = sorted
            .iter()
            .map(|d| (d.target.token().row(), d.offset))
            .collect();
        assert_eq!(order, vec![(1, Some(2)), (1, Some(9)), (3, None)]);
    }

    #[test]
    fn test_thread_safety() {
        let defects = Arc::new(Defects::deduplicating());
        let mut handles = vec![];

        for i in 0..10u32 {
            let defects_clone = Arc::clone(&defects);
            handles.push(thread::spawn(move || {
                for j in 0..50u32 {
                    defects_clone.push(defect(j, "shared"));
                    defects_clone.push(defect(1000 + i * 100 + j, "own"));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // 50 shared targets reported by every thread, plus 500 distinct ones
        assert_eq!(defects.count(), 550);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert!(Confidence::Normal < Confidence::Total);
        assert_eq!("Medium".parse::<Severity>().ok(), Some(Severity::Medium));
    }
}
