//! Top-level facade crate for warden.
//!
//! Re-exports the policy model and the store so users can depend on a single crate.

pub mod core {
    pub use warden_core::*;
}

pub mod store {
    pub use warden_store::*;
}
