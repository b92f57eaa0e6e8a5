//! Taint configuration: a declarative JSON document naming sources, sinks
//! and transfers, resolved against the program at load time.
//!
//! Format:
//!
//! ```json
//! {
//!   "sources":   [ { "method": "Request.getSecret", "type": "String" } ],
//!   "sinks":     [ { "method": "Log.leak", "index": 0 } ],
//!   "transfers": [ { "method": "String.concat",
//!                    "from": 0, "to": "result", "type": "String" } ]
//! }
//! ```
//!
//! Methods are written `Class.name`; types are primitive names or class
//! names. Transfer ends are non-negative argument indices, `"base"` or
//! `"result"`; a sink index of `-1` denotes the receiver. Every name must
//! resolve, otherwise loading fails; configuration problems surface before
//! the solver starts.

use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    ir::{MethodId, PrimType, Type, TypeId},
    Error, Program, Result,
};

/// One endpoint of a taint transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEnd {
    /// The argument at the given position.
    Arg(usize),
    /// The receiver of the call.
    Base,
    /// The call result.
    Result,
}

/// A resolved taint transfer: taints at `from` reappear at `to`, re-tagged
/// with `ty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaintTransfer {
    /// Where taints are read from (`Base` or an argument).
    pub from: TransferEnd,
    /// Where taints are injected (`Base` or `Result`).
    pub to: TransferEnd,
    /// The type label of the re-tagged taints.
    pub ty: TypeId,
}

/// A resolved taint configuration.
#[derive(Debug, Default)]
pub struct TaintConfig {
    sources: FxHashMap<MethodId, TypeId>,
    sinks: FxHashSet<(MethodId, i32)>,
    transfers: FxHashMap<MethodId, Vec<TaintTransfer>>,
}

impl TaintConfig {
    /// Loads and resolves a configuration document from a file.
    ///
    /// # Errors
    ///
    /// I/O and JSON errors, plus resolution errors for unknown method or
    /// type names and malformed transfer ends.
    pub fn load(path: &Path, program: &mut Program) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text, program)
    }

    /// Parses and resolves a configuration document from a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`TaintConfig::load`], minus I/O.
    pub fn from_json_str(text: &str, program: &mut Program) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(text)?;
        let mut config = Self::default();

        for source in raw.sources {
            let method = resolve_method(program, &source.method)?;
            let ty = resolve_type(program, &source.ty)?;
            config.sources.insert(method, ty);
        }
        for sink in raw.sinks {
            let method = resolve_method(program, &sink.method)?;
            if sink.index < -1 {
                return Err(Error::Config(format!(
                    "sink index {} out of range for {}",
                    sink.index, sink.method
                )));
            }
            config.sinks.insert((method, sink.index));
        }
        for transfer in raw.transfers {
            let method = resolve_method(program, &transfer.method)?;
            let from = transfer.from.resolve(&transfer.method)?;
            let to = transfer.to.resolve(&transfer.method)?;
            if matches!(from, TransferEnd::Result) {
                return Err(Error::Config(format!(
                    "transfer source of {} cannot be the result",
                    transfer.method
                )));
            }
            if matches!(to, TransferEnd::Arg(_)) {
                return Err(Error::Config(format!(
                    "transfer target of {} must be base or result",
                    transfer.method
                )));
            }
            let ty = resolve_type(program, &transfer.ty)?;
            config
                .transfers
                .entry(method)
                .or_default()
                .push(TaintTransfer { from, to, ty });
        }
        Ok(config)
    }

    /// The taint type fabricated when `method` is called as a source.
    #[must_use]
    pub fn source_type_of(&self, method: MethodId) -> Option<TypeId> {
        self.sources.get(&method).copied()
    }

    /// Returns `true` if `(method, index)` is a sink position.
    #[must_use]
    pub fn is_sink(&self, method: MethodId, index: i32) -> bool {
        self.sinks.contains(&(method, index))
    }

    /// The transfers declared for a method.
    #[must_use]
    pub fn transfers_of(&self, method: MethodId) -> &[TaintTransfer] {
        match self.transfers.get(&method) {
            Some(transfers) => transfers,
            None => &[],
        }
    }

    /// Returns `true` if no sources are configured (the overlay then never
    /// fabricates anything).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.sinks.is_empty() && self.transfers.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: Vec<RawSource>,
    #[serde(default)]
    sinks: Vec<RawSink>,
    #[serde(default)]
    transfers: Vec<RawTransfer>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSource {
    method: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawSink {
    method: String,
    index: i32,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawTransfer {
    method: String,
    from: RawEnd,
    to: RawEnd,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum RawEnd {
    Index(i64),
    Name(String),
}

impl RawEnd {
    fn resolve(&self, method: &str) -> Result<TransferEnd> {
        match self {
            Self::Index(i) if *i >= 0 => Ok(TransferEnd::Arg(*i as usize)),
            Self::Index(i) => Err(Error::Config(format!(
                "negative transfer index {i} for {method}"
            ))),
            Self::Name(name) => match name.as_str() {
                "base" => Ok(TransferEnd::Base),
                "result" => Ok(TransferEnd::Result),
                other => Err(Error::Config(format!(
                    "unknown transfer end '{other}' for {method}"
                ))),
            },
        }
    }
}

fn resolve_method(program: &Program, name: &str) -> Result<MethodId> {
    let (class, method) = name
        .rsplit_once('.')
        .ok_or_else(|| Error::UnresolvedMethod(name.to_string()))?;
    program
        .find_method(class, method)
        .ok_or_else(|| Error::UnresolvedMethod(name.to_string()))
}

fn resolve_type(program: &mut Program, name: &str) -> Result<TypeId> {
    let prim = match name {
        "boolean" => Some(PrimType::Boolean),
        "byte" => Some(PrimType::Byte),
        "char" => Some(PrimType::Char),
        "short" => Some(PrimType::Short),
        "int" => Some(PrimType::Int),
        "long" => Some(PrimType::Long),
        _ => None,
    };
    if let Some(prim) = prim {
        return Ok(program.intern_type(Type::Primitive(prim)));
    }
    let class = program
        .class_by_name(name)
        .ok_or_else(|| Error::UnresolvedType(name.to_string()))?;
    Ok(program.intern_type(Type::Class(class)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{MethodFlags, ProgramBuilder};

    fn sample_program() -> (Program, MethodId) {
        let mut pb = ProgramBuilder::new();
        let string = pb.add_class("String", None);
        let string_ty = pb.class_type(string);
        let request = pb.add_class("Request", None);
        let source = pb.declare_method(
            request,
            "getSecret",
            &[],
            Some(string_ty),
            MethodFlags::STATIC,
        );
        let log = pb.add_class("Log", None);
        pb.declare_method(log, "leak", &[string_ty], None, MethodFlags::STATIC);
        (pb.finish(), source)
    }

    #[test]
    fn test_parse_and_resolve() {
        let (mut program, source) = sample_program();
        let config = TaintConfig::from_json_str(
            r#"{
                "sources":   [ { "method": "Request.getSecret", "type": "String" } ],
                "sinks":     [ { "method": "Log.leak", "index": 0 } ],
                "transfers": []
            }"#,
            &mut program,
        )
        .unwrap();

        assert!(config.source_type_of(source).is_some());
        let sink = program.find_method("Log", "leak").unwrap();
        assert!(config.is_sink(sink, 0));
        assert!(!config.is_sink(sink, 1));
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let (mut program, _) = sample_program();
        let result = TaintConfig::from_json_str(
            r#"{ "sources": [ { "method": "Nowhere.nothing", "type": "String" } ] }"#,
            &mut program,
        );
        assert!(matches!(result, Err(Error::UnresolvedMethod(_))));
    }

    #[test]
    fn test_bad_transfer_ends_are_rejected() {
        let (mut program, _) = sample_program();
        let result = TaintConfig::from_json_str(
            r#"{ "transfers": [ { "method": "Request.getSecret",
                                  "from": "result", "to": "result",
                                  "type": "String" } ] }"#,
            &mut program,
        );
        assert!(matches!(result, Err(Error::Config(_))));

        let result = TaintConfig::from_json_str(
            r#"{ "transfers": [ { "method": "Request.getSecret",
                                  "from": 0, "to": 1,
                                  "type": "String" } ] }"#,
            &mut program,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let (mut program, _) = sample_program();
        let result = TaintConfig::from_json_str("{ not json", &mut program);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
