//! ACL compiler: merge a credential's policies into one path lookup.
//!
//! Merge rules:
//! - Rules sharing a pattern combine additively (union), across policies.
//! - Any `deny` at a pattern turns that whole pattern into a denial.
//! - A request path resolves against its most specific matching pattern only:
//!   an exact match beats every prefix, a longer prefix beats a shorter one.
//! - No matching pattern means no capabilities (implicit deny).
//! - The root policy short-circuits all of the above and grants everything.

use std::collections::HashMap;

use crate::policy::{Capability, CapabilitySet, Policy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Denied,
    Allowed(CapabilitySet),
}

impl Grant {
    fn from_caps(caps: CapabilitySet) -> Self {
        if caps.denies() {
            Grant::Denied
        } else {
            Grant::Allowed(caps)
        }
    }

    fn merge(self, caps: CapabilitySet) -> Self {
        match self {
            Grant::Denied => Grant::Denied,
            Grant::Allowed(_) if caps.denies() => Grant::Denied,
            Grant::Allowed(have) => Grant::Allowed(have.union(caps)),
        }
    }

    fn capabilities(self) -> CapabilitySet {
        match self {
            Grant::Denied => CapabilitySet::empty(),
            Grant::Allowed(caps) => caps,
        }
    }
}

/// Effective permissions of one set of policies. Request-scoped; rebuilt from
/// (cached) policies rather than cached itself.
#[derive(Debug, Clone, Default)]
pub struct Acl {
    root: bool,
    exact: HashMap<String, Grant>,
    /// Prefix stems (pattern minus `*`), longest first.
    prefixes: Vec<(String, Grant)>,
    policies: Vec<String>,
}

impl Acl {
    /// Compile policies into one ACL. `None` entries (names that did not
    /// resolve) contribute nothing.
    pub fn compile<'a, I>(policies: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a Policy>>,
    {
        let mut acl = Acl::default();
        let mut prefixes: HashMap<String, Grant> = HashMap::new();

        for policy in policies.into_iter().flatten() {
            acl.policies.push(policy.name().to_string());
            if policy.is_root() {
                acl.root = true;
                continue;
            }
            for rule in policy.rules() {
                let table = if rule.is_prefix() { &mut prefixes } else { &mut acl.exact };
                let key = rule.stem().to_string();
                let grant = match table.get(&key) {
                    Some(existing) => existing.merge(rule.capabilities),
                    None => Grant::from_caps(rule.capabilities),
                };
                table.insert(key, grant);
            }
        }

        acl.prefixes = prefixes.into_iter().collect();
        acl.prefixes
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        tracing::trace!(
            policies = acl.policies.len(),
            root = acl.root,
            exact = acl.exact.len(),
            prefixes = acl.prefixes.len(),
            "compiled acl"
        );
        acl
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Names of the policies that resolved and contributed.
    pub fn policy_names(&self) -> &[String] {
        &self.policies
    }

    /// Effective capabilities on `path`. Never contains `deny`.
    pub fn capabilities(&self, path: &str) -> CapabilitySet {
        if self.root {
            return CapabilitySet::full();
        }
        let path = path.strip_prefix('/').unwrap_or(path);

        if let Some(grant) = self.exact.get(path) {
            return grant.capabilities();
        }
        self.prefixes
            .iter()
            .find(|(stem, _)| path.starts_with(stem.as_str()))
            .map(|(_, grant)| grant.capabilities())
            .unwrap_or_default()
    }

    pub fn is_allowed(&self, path: &str, action: Capability) -> bool {
        action != Capability::Deny && self.capabilities(path).contains(action)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::parse_policy;

    fn policy(name: &str, src: &str) -> Policy {
        parse_policy(src).unwrap().with_name(name)
    }

    #[test]
    fn exact_deny_beats_prefix_grant() {
        let a = policy("a", r#"path "secret/*" { capabilities = ["read"] }"#);
        let b = policy("b", r#"path "secret/data" { capabilities = ["deny"] }"#);
        let acl = Acl::compile([Some(&a), Some(&b)]);

        assert!(!acl.is_allowed("secret/data", Capability::Read));
        assert!(acl.capabilities("secret/data").is_empty());
        assert!(acl.is_allowed("secret/other", Capability::Read));
        assert_eq!(acl.policy_names(), ["a", "b"]);
    }

    #[test]
    fn equal_patterns_union_across_policies() {
        let a = policy("a", r#"path "kv/*" { capabilities = ["read"] }"#);
        let b = policy("b", r#"path "kv/*" { capabilities = ["list", "update"] }"#);
        let acl = Acl::compile([Some(&a), Some(&b)]);
        assert_eq!(acl.capabilities("kv/x").names(), vec!["read", "update", "list"]);
    }

    #[test]
    fn deny_at_same_pattern_wins_regardless_of_order() {
        let grant = policy("g", r#"path "kv/*" { capabilities = ["read"] }"#);
        let deny = policy("d", r#"path "kv/*" { capabilities = ["deny", "read"] }"#);
        for acl in [Acl::compile([Some(&grant), Some(&deny)]), Acl::compile([Some(&deny), Some(&grant)])] {
            assert!(acl.capabilities("kv/x").is_empty());
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let p = policy(
            "p",
            r#"
path "kv/*" { capabilities = ["deny"] }
path "kv/team/*" { capabilities = ["read"] }
"#,
        );
        let acl = Acl::compile([Some(&p)]);
        assert!(acl.is_allowed("kv/team/a", Capability::Read));
        assert!(!acl.is_allowed("kv/other", Capability::Read));
    }

    #[test]
    fn more_specific_grant_does_not_inherit_broader_capabilities() {
        let p = policy(
            "p",
            r#"
path "kv/*" { capabilities = ["read", "list"] }
path "kv/a" { capabilities = ["update"] }
"#,
        );
        let acl = Acl::compile([Some(&p)]);
        assert_eq!(acl.capabilities("kv/a").names(), vec!["update"]);
    }

    #[test]
    fn root_and_unresolved() {
        let acl = Acl::compile([None, Some(&Policy::root())]);
        assert!(acl.is_root());
        assert_eq!(acl.capabilities("any/path"), CapabilitySet::full());
        assert!(!acl.is_allowed("any/path", Capability::Deny));

        let none = Acl::compile([None, None]);
        assert!(none.capabilities("cubbyhole/x").is_empty());
        assert!(none.policy_names().is_empty());
    }

    #[test]
    fn leading_slash_in_request_path() {
        let p = policy("p", r#"path "sys/renew" { capabilities = ["update"] }"#);
        let acl = Acl::compile([Some(&p)]);
        assert!(acl.is_allowed("/sys/renew", Capability::Update));
    }
}
