//! Observability trait for inspecting component state.
//!
//! Components expose internal state for debugging and tests. Queries never
//! affect model state.

use std::fmt;

/// A dynamically-typed value for state queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean value (line levels, flags).
    Bool(bool),
    /// 8-bit unsigned integer (counters, addresses).
    U8(u8),
    /// 32-bit unsigned integer (shift registers, payloads).
    U32(u32),
    /// 64-bit unsigned integer (frequencies, tick counts).
    U64(u64),
    /// String value (state names).
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// Read-only, path-based access to component state.
pub trait Observable {
    /// Query a state value by dotted path (e.g. `"phy.state"`).
    fn query(&self, path: &str) -> Option<Value>;

    /// The paths this component answers, for discovery.
    fn query_paths(&self) -> &'static [&'static str];
}
