//! Startup reconciliation: built-in policies and operator seed files.

use warden_core::error::{Result, WardenError};
use warden_core::policy::builtin::{
    DEFAULT_POLICY, DEFAULT_POLICY_NAME, RESPONSE_WRAPPING_POLICY, RESPONSE_WRAPPING_POLICY_NAME,
};
use warden_core::{Policy, PolicyType};

use crate::config::SeedPolicy;
use crate::store::{PolicyLookup, PolicyStore};

/// Which built-ins `reconcile_builtin_policies` had to write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub default_written: bool,
    pub response_wrapping_written: bool,
}

impl BootstrapReport {
    pub fn wrote_anything(&self) -> bool {
        self.default_written || self.response_wrapping_written
    }
}

/// Ensure the built-in policies exist.
///
/// `default` is only created when missing; operators may have edited it.
/// `response-wrapping` is rewritten whenever its source drifts from the
/// shipped text.
pub async fn reconcile_builtin_policies(store: &PolicyStore) -> Result<BootstrapReport> {
    let mut report = BootstrapReport::default();
    let acl = PolicyLookup::Exact(PolicyType::Acl);

    if store.get_policy(DEFAULT_POLICY_NAME, acl).await?.is_none() {
        let policy = Policy::parse(DEFAULT_POLICY)?.with_name(DEFAULT_POLICY_NAME);
        store.set_policy_internal(policy).await?;
        report.default_written = true;
        tracing::info!(name = DEFAULT_POLICY_NAME, "created built-in policy");
    }

    let current = store.get_policy(RESPONSE_WRAPPING_POLICY_NAME, acl).await?;
    if current.map_or(true, |p| p.raw() != RESPONSE_WRAPPING_POLICY) {
        let policy =
            Policy::parse(RESPONSE_WRAPPING_POLICY)?.with_name(RESPONSE_WRAPPING_POLICY_NAME);
        store.set_policy_internal(policy).await?;
        report.response_wrapping_written = true;
        tracing::info!(name = RESPONSE_WRAPPING_POLICY_NAME, "wrote built-in policy");
    }

    Ok(report)
}

/// Load operator policy files and store them. Returns how many were written.
pub async fn apply_seed_policies(store: &PolicyStore, seeds: &[SeedPolicy]) -> Result<usize> {
    let mut written = 0;
    for seed in seeds {
        let raw = tokio::fs::read_to_string(&seed.file).await.map_err(|e| {
            WardenError::Config(format!("seed {}: read {} failed: {e}", seed.name, seed.file))
        })?;
        let policy = Policy::parse(&raw)?.with_name(seed.name.as_str());
        store.set_policy(policy).await?;
        written += 1;
        tracing::info!(name = %seed.name, file = %seed.file, "seed policy loaded");
    }
    Ok(written)
}
