//! Policy model (path rules + capabilities) and its text formats.
//!
//! - `parse`: HCL-style and JSON-style policy source into rules.
//! - `render`: rules back into canonical HCL-style text.
//! - `builtin`: names and source of the policies every store carries.
//!
//! A `Policy` is immutable once built; updates replace it wholesale.

pub mod builtin;
pub mod capability;
pub mod parse;
pub mod render;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use capability::{Capability, CapabilitySet};
pub use parse::parse_policy;
pub use render::render_rules;

use crate::error::ParseError;

/// Policy dialect. Only `Acl` is interpreted; the others are recognized so a
/// stored record of that type is rejected explicitly instead of misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Acl,
    Rgp,
    Egp,
}

impl PolicyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyType::Acl => "acl",
            PolicyType::Rgp => "rgp",
            PolicyType::Egp => "egp",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `path "<pattern>" { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    /// Trailing `*` => prefix match, otherwise exact.
    pub pattern: String,
    pub capabilities: CapabilitySet,
}

impl PathRule {
    pub fn is_prefix(&self) -> bool {
        self.pattern.ends_with('*')
    }

    /// Pattern without the trailing `*` (the pattern itself for exact rules).
    pub fn stem(&self) -> &str {
        self.pattern.strip_suffix('*').unwrap_or(&self.pattern)
    }
}

/// A named document of path rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    name: String,
    policy_type: PolicyType,
    raw: String,
    rules: Vec<PathRule>,
}

impl Policy {
    /// Parse policy source. The result is unnamed; see [`Policy::with_name`].
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        parse_policy(raw)
    }

    /// The synthetic policy granting everything. Never persisted.
    pub fn root() -> Self {
        Self {
            name: builtin::ROOT_POLICY_NAME.to_string(),
            policy_type: PolicyType::Acl,
            raw: String::new(),
            rules: Vec::new(),
        }
    }

    pub(crate) fn from_parts(raw: String, rules: Vec<PathRule>) -> Self {
        Self {
            name: String::new(),
            policy_type: PolicyType::Acl,
            raw,
            rules,
        }
    }

    /// Assign the logical name the policy is stored under.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    /// Source text exactly as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    pub fn is_root(&self) -> bool {
        self.name == builtin::ROOT_POLICY_NAME
    }
}
