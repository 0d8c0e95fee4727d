// vim: tw=80
//! Faults raised by the resolution engine, and verification mismatches.

use thiserror::Error;

use crate::{Count, Member};

/// A configuration fault: the mock was asked something the test never set
/// up.  Always fatal to the current test.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Fault {
    #[error("{service}::{member}({arguments}): No stub configured{}",
            render_mismatches(.mismatches))]
    NoStub {
        service: &'static str,
        member: Member,
        arguments: String,
        /// One line per declared rule of the member explaining why it did
        /// not apply
        mismatches: Vec<String>,
    },
    #[error("{service}::{member}: registered rules have a different type than {expected}")]
    TypeMismatch {
        service: &'static str,
        member: Member,
        expected: &'static str,
    },
}

fn render_mismatches(mismatches: &[String]) -> String {
    if mismatches.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = mismatches.iter()
            .map(|m| format!("\n  {}", m))
            .collect();
        format!("; declared rules:{}", lines.concat())
    }
}

/// A failed cardinality check, as reported to a [`Reporter`].
///
/// [`Reporter`]: crate::Reporter
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{service}::{member}({matchers}): expected to be called {expected}, but was called {actual} times{}",
        render_calls(.calls))]
pub struct CountMismatch {
    pub service: &'static str,
    pub member: Member,
    pub matchers: String,
    pub expected: Count,
    pub actual: usize,
    /// Every recorded call of the member, matching or not
    pub calls: Vec<String>,
}

fn render_calls(calls: &[String]) -> String {
    if calls.is_empty() {
        String::new()
    } else {
        format!("; recorded calls: {}", calls.join(", "))
    }
}
