//! Canonical HCL-style rendering of path rules.
//!
//! Output is not byte-identical to the source it came from (comments and
//! layout are dropped), but parsing it yields the same rules.

use std::fmt::Write;

use super::PathRule;

/// Render rules as policy source, one `path` block per rule.
pub fn render_rules(rules: &[PathRule]) -> String {
    let mut out = String::new();
    for (i, rule) in rules.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let caps = rule
            .capabilities
            .iter()
            .map(|c| format!("\"{}\"", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "path \"{}\" {{", escape(&rule.pattern));
        let _ = writeln!(out, "    capabilities = [{caps}]");
        out.push_str("}\n");
    }
    out
}

fn escape(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Capability, CapabilitySet};

    #[test]
    fn renders_one_block_per_rule() {
        let rules = vec![PathRule {
            pattern: "kv/\"quoted\"".into(),
            capabilities: [Capability::Read, Capability::Deny].into_iter().collect::<CapabilitySet>(),
        }];
        assert_eq!(
            render_rules(&rules),
            "path \"kv/\\\"quoted\\\"\" {\n    capabilities = [\"read\", \"deny\"]\n}\n"
        );
    }
}
