//! Routing-rule annotation parsing.
//!
//! The control plane attaches `abpolicy-*` annotations to a routing rule's
//! metadata; this module turns that string map into a validated
//! [`Policy`](crate::policy::Policy) or rejects the rule. Reads are lenient
//! on a per-key basis, validation is a single explicit pass at the end.

pub mod abpolicy;
pub mod parser;

pub use abpolicy::parse;
