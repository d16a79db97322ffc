//! warden core: policy model, parser, and ACL compiler.
//!
//! This crate holds everything needed to turn policy source text into an
//! effective permission decision. It carries no storage or runtime
//! dependencies, so the same types back the repository, the API layer and
//! offline tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Policy text is
//! operator input and persisted records may be corrupt; every failure surfaces
//! as `WardenError`/`Result` instead of bringing down the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod acl;
pub mod error;
pub mod policy;

pub use acl::Acl;
/// Shared result type.
pub use error::{Result, WardenError};
pub use policy::{Capability, CapabilitySet, PathRule, Policy, PolicyType};
