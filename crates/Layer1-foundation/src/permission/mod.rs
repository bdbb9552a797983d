//! Permission - command deny patterns

pub mod security;

pub use security::{
    builtin_deny_patterns, CompiledPattern, DenyCategory, DenyPattern, DenyPatternSet, Verdict,
};
