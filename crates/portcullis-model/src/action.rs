//! Canonical action names used in permission rules.
//!
//! Actions are stored as plain strings in the `v2` slot of `p` rules; these
//! constants keep callers consistent. [`ACT_ANY`] is the explicit `"*"`
//! sentinel: a rule whose action slot is exactly `"*"` matches any requested
//! action. No other wildcard syntax exists.

pub const ACT_LOGIN: &str = "login";
pub const ACT_SHELL: &str = "shell";
pub const ACT_EXEC: &str = "exec";
pub const ACT_PTY: &str = "pty";
pub const ACT_DIRECT_TCPIP: &str = "direct-tcpip";

/// Explicit any-action sentinel. Matching it must be an opt-in rule value,
/// never implicit matcher behavior.
pub const ACT_ANY: &str = "*";
