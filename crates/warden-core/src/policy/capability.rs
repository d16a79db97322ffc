//! Capability tokens and the compact set used on the request path.

use std::fmt;

/// An action token grantable on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Create,
    Read,
    Update,
    Delete,
    List,
    UpdateSudo,
    /// Overrides every other capability of the rule that carries it.
    Deny,
}

impl Capability {
    /// Every capability, in canonical order.
    pub const ALL: [Capability; 7] = [
        Capability::Create,
        Capability::Read,
        Capability::Update,
        Capability::Delete,
        Capability::List,
        Capability::UpdateSudo,
        Capability::Deny,
    ];

    /// Token as written in policy source.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Create => "create",
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Delete => "delete",
            Capability::List => "list",
            Capability::UpdateSudo => "update-sudo",
            Capability::Deny => "deny",
        }
    }

    /// Parse a capability token. `sudo` is accepted as an alias of
    /// `update-sudo`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "create" => Some(Capability::Create),
            "read" => Some(Capability::Read),
            "update" => Some(Capability::Update),
            "delete" => Some(Capability::Delete),
            "list" => Some(Capability::List),
            "update-sudo" | "sudo" => Some(Capability::UpdateSudo),
            "deny" => Some(Capability::Deny),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Capability::Create => 1 << 0,
            Capability::Read => 1 << 1,
            Capability::Update => 1 << 2,
            Capability::Delete => 1 << 3,
            Capability::List => 1 << 4,
            Capability::UpdateSudo => 1 << 5,
            Capability::Deny => 1 << 6,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities packed into a bitmask (checked on every request).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every grantable capability (no `deny`). What the root policy yields.
    pub fn full() -> Self {
        Capability::ALL
            .iter()
            .filter(|c| **c != Capability::Deny)
            .copied()
            .collect()
    }

    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    pub fn contains(&self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn union(self, other: CapabilitySet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True when the set carries `deny`, i.e. the rule is a pure denial.
    pub fn denies(&self) -> bool {
        self.contains(Capability::Deny)
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Capabilities in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Capability::as_str).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Capability::as_str)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sudo_alias() {
        assert_eq!(Capability::from_token("sudo"), Some(Capability::UpdateSudo));
        assert_eq!(Capability::from_token("update-sudo"), Some(Capability::UpdateSudo));
        assert_eq!(Capability::from_token("write"), None);
    }

    #[test]
    fn full_set_excludes_deny() {
        let full = CapabilitySet::full();
        assert_eq!(full.len(), 6);
        assert!(!full.denies());
        assert!(full.contains(Capability::UpdateSudo));
    }

    #[test]
    fn names_are_canonically_ordered() {
        let set: CapabilitySet = [Capability::List, Capability::Create, Capability::Read]
            .into_iter()
            .collect();
        assert_eq!(set.names(), vec!["create", "read", "list"]);
    }
}
