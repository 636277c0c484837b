pub use anyhow::Result;

use std::fmt;
use fnv::FnvHashMap as Map;

/// Dataset lookup failures.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    UnknownInstanceName(String),
    IndexOutOfRange { idx: usize, len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownInstanceName(name) => write!(f, "no instance named {:?}", name),
            Error::IndexOutOfRange { idx, len } =>
                write!(f, "instance index {} out of range, dataset has {} instances", idx, len),
        }
    }
}

impl std::error::Error for Error {}

/// Reasons an instance file can be rejected.  `line` is always the 1-based line in the source text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnknownNodeType { line: usize, code: String },
    UnknownFleetParam { line: usize, label: String },
    MalformedField { line: usize, field: &'static str, value: String },
    FieldCount { line: usize, found: usize },
    MissingFleetParam(&'static str),
    NonPositiveFleetParam { name: &'static str, value: f64 },
    DepotCount(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownNodeType { line, code } =>
                write!(f, "line {}: unknown node type `{}` (expected d, c or f)", line, code),
            ParseError::UnknownFleetParam { line, label } =>
                write!(f, "line {}: unknown fleet parameter `{}`", line, label),
            ParseError::MalformedField { line, field, value } =>
                write!(f, "line {}: malformed {} `{}`", line, field, value),
            ParseError::FieldCount { line, found } =>
                write!(f, "line {}: expected 8 fields, found {}", line, found),
            ParseError::MissingFleetParam(name) =>
                write!(f, "missing fleet parameter: {}", name),
            ParseError::NonPositiveFleetParam { name, value } =>
                write!(f, "fleet parameter {} must be positive, got {}", name, value),
            ParseError::DepotCount(n) =>
                write!(f, "expected exactly one depot, found {}", n),
        }
    }
}

impl std::error::Error for ParseError {}


pub mod dataset;
pub mod raw;

mod parsers;
pub use parsers::{ParseInstance, SchneiderFmt, parse_schneider};
