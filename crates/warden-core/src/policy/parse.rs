//! Policy source parser (panic-free).
//!
//! Two source forms are accepted:
//! - HCL-style: `path "secret/*" { capabilities = ["read", "list"] }`
//! - JSON-style: `{"path": {"secret/*": {"capabilities": ["read"]}}}`
//!
//! A `name` embedded in the source is accepted and discarded; the store
//! assigns the name a policy lives under.

use std::iter::Peekable;
use std::str::Chars;

use indexmap::IndexMap;
use serde::Deserialize;

use super::{Capability, CapabilitySet, PathRule, Policy};
use crate::error::ParseError;

/// Parse policy source text into an unnamed ACL policy.
pub fn parse_policy(raw: &str) -> Result<Policy, ParseError> {
    let rules = if raw.trim_start().starts_with('{') {
        parse_json(raw)?
    } else {
        let tokens = tokenize(raw)?;
        Parser { tokens, pos: 0 }.document()?
    };
    Ok(Policy::from_parts(raw.to_string(), rules))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Equals,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("identifier `{s}`"),
            Token::Str(s) => format!("string {s:?}"),
            Token::LBrace => "`{`".into(),
            Token::RBrace => "`}`".into(),
            Token::LBracket => "`[`".into(),
            Token::RBracket => "`]`".into(),
            Token::Equals => "`=`".into(),
            Token::Comma => "`,`".into(),
        }
    }
}

type Spanned = (Token, usize);

fn skip_line(chars: &mut Peekable<Chars<'_>>) {
    while let Some(&c) = chars.peek() {
        if c == '\n' {
            break;
        }
        chars.next();
    }
}

fn tokenize(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut out = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' => skip_line(&mut chars),
            '/' => match chars.next() {
                Some('/') => skip_line(&mut chars),
                Some('*') => {
                    let start = line;
                    loop {
                        match chars.next() {
                            Some('*') if chars.peek() == Some(&'/') => {
                                chars.next();
                                break;
                            }
                            Some('\n') => line += 1,
                            Some(_) => {}
                            None => return Err(ParseError::new(start, "unterminated block comment")),
                        }
                    }
                }
                _ => return Err(ParseError::new(line, "unexpected `/`")),
            },
            '{' => out.push((Token::LBrace, line)),
            '}' => out.push((Token::RBrace, line)),
            '[' => out.push((Token::LBracket, line)),
            ']' => out.push((Token::RBracket, line)),
            '=' => out.push((Token::Equals, line)),
            ',' => out.push((Token::Comma, line)),
            '"' => {
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('"') => s.push('"'),
                            Some('\\') => s.push('\\'),
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(other) => {
                                return Err(ParseError::new(line, format!("invalid escape `\\{other}`")))
                            }
                            None => return Err(ParseError::new(line, "unterminated string")),
                        },
                        Some('\n') | None => return Err(ParseError::new(line, "unterminated string")),
                        Some(ch) => s.push(ch),
                    }
                }
                out.push((Token::Str(s), line));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut s = String::from(c);
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' || n == '-' {
                        s.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push((Token::Ident(s), line));
            }
            other => return Err(ParseError::new(line, format!("unexpected character `{other}`"))),
        }
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn last_line(&self) -> usize {
        self.tokens.last().map(|(_, l)| *l).unwrap_or(1)
    }

    fn expect(&mut self, want: Token, ctx: &str) -> Result<usize, ParseError> {
        match self.next() {
            Some((tok, line)) if tok == want => Ok(line),
            Some((tok, line)) => Err(ParseError::new(
                line,
                format!("expected {} {ctx}, found {}", want.describe(), tok.describe()),
            )),
            None => Err(ParseError::new(
                self.last_line(),
                format!("expected {} {ctx}, found end of input", want.describe()),
            )),
        }
    }

    fn expect_string(&mut self, ctx: &str) -> Result<(String, usize), ParseError> {
        match self.next() {
            Some((Token::Str(s), line)) => Ok((s, line)),
            Some((tok, line)) => {
                Err(ParseError::new(line, format!("expected string {ctx}, found {}", tok.describe())))
            }
            None => Err(ParseError::new(self.last_line(), format!("expected string {ctx}, found end of input"))),
        }
    }

    fn document(&mut self) -> Result<Vec<PathRule>, ParseError> {
        let mut rules = Vec::new();
        while let Some((tok, line)) = self.next() {
            match tok {
                Token::Ident(key) if key == "path" => rules.push(self.path_block()?),
                Token::Ident(key) if key == "name" => {
                    self.expect(Token::Equals, "after `name`")?;
                    self.expect_string("for policy name")?;
                }
                Token::Ident(key) => {
                    return Err(ParseError::new(line, format!("unsupported top-level key `{key}`")))
                }
                other => return Err(ParseError::new(line, format!("unexpected {}", other.describe()))),
            }
        }
        Ok(rules)
    }

    fn path_block(&mut self) -> Result<PathRule, ParseError> {
        let (pattern, line) = self.expect_string("after `path`")?;
        self.expect(Token::LBrace, "to open path block")?;

        let mut caps = CapabilitySet::empty();
        loop {
            match self.next() {
                Some((Token::RBrace, _)) => break,
                Some((Token::Ident(key), key_line)) => {
                    self.expect(Token::Equals, &format!("after `{key}`"))?;
                    match key.as_str() {
                        "capabilities" => {
                            let tokens = self.string_list()?;
                            caps = caps.union(capability_set(&tokens, key_line)?);
                        }
                        "policy" => {
                            let (value, value_line) = self.expect_string("for `policy`")?;
                            caps = caps.union(legacy_capabilities(&value, value_line)?);
                        }
                        _ => {
                            return Err(ParseError::new(
                                key_line,
                                format!("unsupported key `{key}` in path {pattern:?}"),
                            ))
                        }
                    }
                }
                Some((tok, l)) => {
                    return Err(ParseError::new(l, format!("unexpected {} in path block", tok.describe())))
                }
                None => return Err(ParseError::new(line, format!("unterminated path block {pattern:?}"))),
            }
        }

        build_rule(&pattern, caps, line)
    }

    fn string_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(Token::LBracket, "to open list")?;
        let mut items = Vec::new();
        loop {
            match self.next() {
                Some((Token::RBracket, _)) => return Ok(items),
                Some((Token::Str(s), _)) => {
                    items.push(s);
                    match self.next() {
                        Some((Token::Comma, _)) => {}
                        Some((Token::RBracket, _)) => return Ok(items),
                        Some((tok, l)) => {
                            return Err(ParseError::new(l, format!("expected `,` or `]`, found {}", tok.describe())))
                        }
                        None => return Err(ParseError::new(self.last_line(), "unterminated list")),
                    }
                }
                Some((tok, l)) => {
                    return Err(ParseError::new(l, format!("expected string in list, found {}", tok.describe())))
                }
                None => return Err(ParseError::new(self.last_line(), "unterminated list")),
            }
        }
    }
}

fn capability_set(tokens: &[String], line: usize) -> Result<CapabilitySet, ParseError> {
    tokens
        .iter()
        .map(|t| {
            Capability::from_token(t)
                .ok_or_else(|| ParseError::new(line, format!("unknown capability {t:?}")))
        })
        .collect()
}

/// Shorthand `policy = "..."` values predating capability lists.
fn legacy_capabilities(value: &str, line: usize) -> Result<CapabilitySet, ParseError> {
    let write = [
        Capability::Create,
        Capability::Read,
        Capability::Update,
        Capability::Delete,
        Capability::List,
    ];
    let set: CapabilitySet = match value {
        "deny" => [Capability::Deny].into_iter().collect(),
        "read" => [Capability::Read, Capability::List].into_iter().collect(),
        "write" => write.into_iter().collect(),
        "sudo" => write.into_iter().chain([Capability::UpdateSudo]).collect(),
        other => return Err(ParseError::new(line, format!("unknown policy shorthand {other:?}"))),
    };
    Ok(set)
}

fn build_rule(pattern: &str, capabilities: CapabilitySet, line: usize) -> Result<PathRule, ParseError> {
    let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
    if pattern.is_empty() {
        return Err(ParseError::new(line, "empty path pattern"));
    }
    if capabilities.is_empty() {
        return Err(ParseError::new(line, format!("path {pattern:?} has no capabilities")));
    }
    Ok(PathRule { pattern: pattern.to_string(), capabilities })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonDocument {
    #[serde(default, rename = "name")]
    _name: Option<String>,
    #[serde(default)]
    /// Source order is kept so rendered output matches the input.
    path: IndexMap<String, JsonPathBlock>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonPathBlock {
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    policy: Option<String>,
}

fn parse_json(raw: &str) -> Result<Vec<PathRule>, ParseError> {
    let doc: JsonDocument =
        serde_json::from_str(raw).map_err(|e| ParseError::new(e.line().max(1), e.to_string()))?;

    let mut rules = Vec::with_capacity(doc.path.len());
    for (pattern, block) in doc.path {
        let mut caps = capability_set(&block.capabilities, 1)?;
        if let Some(value) = &block.policy {
            caps = caps.union(legacy_capabilities(value, 1)?);
        }
        rules.push(build_rule(&pattern, caps, 1)?);
    }
    Ok(rules)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_blocks_and_discards_embedded_name() {
        let src = r#"
name = "ignored"
# comment
path "secret/*" {
    capabilities = ["read", "list",]
}
// another comment
/* block
   comment */
path "/secret/admin" { capabilities = ["deny"] }
"#;
        let p = parse_policy(src).unwrap();
        assert_eq!(p.name(), "");
        assert_eq!(p.raw(), src);
        assert_eq!(p.rules().len(), 2);
        assert_eq!(p.rules()[0].pattern, "secret/*");
        assert_eq!(p.rules()[0].capabilities.names(), vec!["read", "list"]);
        assert_eq!(p.rules()[1].pattern, "secret/admin");
        assert!(p.rules()[1].capabilities.denies());
    }

    #[test]
    fn empty_document_has_no_rules() {
        let p = parse_policy("  # nothing here\n").unwrap();
        assert!(p.rules().is_empty());
    }

    #[test]
    fn legacy_policy_shorthand() {
        let p = parse_policy(r#"path "a" { policy = "write" }"#).unwrap();
        assert_eq!(p.rules()[0].capabilities.names(), vec!["create", "read", "update", "delete", "list"]);
        let p = parse_policy(r#"path "a" { policy = "read" capabilities = ["update"] }"#).unwrap();
        assert_eq!(p.rules()[0].capabilities.names(), vec!["read", "update", "list"]);
    }

    #[test]
    fn rejects_unknown_capability_with_line() {
        let err = parse_policy("\npath \"a\" {\n  capabilities = [\"fly\"]\n}").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("fly"));
    }

    #[test]
    fn rejects_block_without_capabilities() {
        assert!(parse_policy(r#"path "a" { }"#).is_err());
        assert!(parse_policy(r#"path "a" { capabilities = [] }"#).is_err());
    }

    #[test]
    fn rejects_syntax_errors() {
        for src in [
            r#"path "a" { capabilities = ["read"]"#,
            r#"path "a" capabilities = ["read"] }"#,
            r#"path "a { capabilities = ["read"] }"#,
            r#"path "" { capabilities = ["read"] }"#,
            r#"path "a" { capabilities = ["read" "list"] }"#,
            r#"path "a" { min_wrapping_ttl = "1h" }"#,
            r#"paths "a" { capabilities = ["read"] }"#,
            "path \"a\" { capabilities = [\"read\"] } /* open",
            "@",
        ] {
            assert!(parse_policy(src).is_err(), "should fail: {src}");
        }
    }

    #[test]
    fn json_source() {
        let src = r#"{"name": "x", "path": {"secret/*": {"capabilities": ["read"]}, "sys/seal": {"policy": "deny"}}}"#;
        let p = parse_policy(src).unwrap();
        assert_eq!(p.rules().len(), 2);
        let seal = p.rules().iter().find(|r| r.pattern == "sys/seal").unwrap();
        assert!(seal.capabilities.denies());
        assert!(parse_policy(r#"{"paths": {}}"#).is_err());
        assert!(parse_policy(r#"{"path": {"a": {"capabilities": ["nope"]}}}"#).is_err());
    }

    #[test]
    fn json_rules_keep_source_order() {
        let src = r#"{"path": {"zeta/*": {"capabilities": ["read"]}, "alpha": {"capabilities": ["list"]}, "mid/x": {"policy": "write"}}}"#;
        let p = parse_policy(src).unwrap();
        let patterns: Vec<&str> = p.rules().iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["zeta/*", "alpha", "mid/x"]);
    }
}
