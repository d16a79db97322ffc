//! warden store library entry.
//!
//! Wires durable storage, the policy type registry and the compiled-policy
//! cache into `PolicyStore`, plus the startup reconciler and YAML config.
//! Consumed by the `warden` binary and by integration tests.

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod registry;
pub mod storage;
pub mod store;

pub use bootstrap::{apply_seed_policies, reconcile_builtin_policies, BootstrapReport};
pub use store::{PolicyLookup, PolicyStore};
