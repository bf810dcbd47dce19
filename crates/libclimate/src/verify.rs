//! Post-parse verification: unrecognised flags/options and value counts.

use crate::abort::emit;
use crate::climate::ValuesConstraint;
use crate::options::{CallOptions, ParseFlags};
use crate::parse::Parsed;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValuesViolation {
    TooMany,
    /// The first missing value, by declared name or `value-<index>`.
    Missing(String),
}

impl fmt::Display for ValuesViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooMany => f.write_str("too many values"),
            Self::Missing(name) => write!(f, "{name} not specified"),
        }
    }
}

fn missing(count: usize, value_names: &[String]) -> ValuesViolation {
    let name = value_names
        .get(count)
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| format!("value-{count}"));
    ValuesViolation::Missing(name)
}

fn check_count(count: usize, n: i64, value_names: &[String]) -> Option<ValuesViolation> {
    let actual = i64::try_from(count).unwrap_or(i64::MAX);
    if actual > n {
        Some(ValuesViolation::TooMany)
    } else if actual < n {
        Some(missing(count, value_names))
    } else {
        None
    }
}

/// Check `count` resolved values against `constraint`.
pub(crate) fn check_values(
    count: usize,
    constraint: ValuesConstraint,
    value_names: &[String],
) -> Option<ValuesViolation> {
    match constraint {
        ValuesConstraint::Unconstrained => None,
        ValuesConstraint::Count(n) => check_count(count, n, value_names),
        ValuesConstraint::Range(min, max) if min == max => check_count(count, min, value_names),
        ValuesConstraint::Range(min, max) => {
            let actual = i64::try_from(count).unwrap_or(i64::MAX);
            if max >= 0 && actual > max {
                Some(ValuesViolation::TooMany)
            } else if min > 0 && actual < min {
                Some(missing(count, value_names))
            } else {
                None
            }
        }
    }
}

impl Parsed {
    /// Check for unrecognised flags/options, then for the number of values.
    ///
    /// A failure writes one diagnostic line to the stream and calls `exit(1)`;
    /// nothing is returned. Stream, exit strategy and flags in `options` take
    /// precedence over those the parse used.
    pub fn verify(&self, options: &CallOptions) {
        let flags = self.parse_flags | options.parse_flags;
        let stream = options.stream.clone().unwrap_or_else(|| self.stream.clone());
        let exiter = options
            .exiter
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.exiter));

        if !flags.contains(ParseFlags::DONT_CHECK_UNUSED) {
            if let Some(unused) = self.unused_flags_and_options().first() {
                emit(
                    &stream,
                    &*exiter,
                    &format!(
                        "{}: unrecognised flag/option: {unused}\n",
                        self.program_name()
                    ),
                );
                return;
            }
        }

        if let Some(violation) =
            check_values(self.values().len(), self.values_constraint, &self.value_names)
        {
            emit(
                &stream,
                &*exiter,
                &format!("{}: {violation}\n", self.program_name()),
            );
        }
    }
}
