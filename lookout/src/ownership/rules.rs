//! Issue owner rule syntax and its stored schema form.
//!
//! One rule per line: `<matcher>:<pattern> <owner> [<owner>...]`, where a bare pattern is a
//! `path` matcher, `#slug` owners are teams and everything else is a user (by email).
//! Rules are stored as
//!
//! ```json
//! {"$version": 1, "rules": [{"matcher": {"type": "codeowners", "pattern": "src/*"},
//!                            "owners": [{"type": "team", "identifier": "backend"}]}]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherType {
    Path,
    Url,
    Module,
    Codeowners,
}

impl MatcherType {
    fn parse(prefix: &str) -> Option<Self> {
        match prefix {
            "path" => Some(MatcherType::Path),
            "url" => Some(MatcherType::Url),
            "module" => Some(MatcherType::Module),
            "codeowners" => Some(MatcherType::Codeowners),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    #[serde(rename = "type")]
    pub kind: MatcherType,
    pub pattern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    User,
    Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "type")]
    pub kind: OwnerType,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub matcher: Matcher,
    pub owners: Vec<Owner>,
}

/// Parse issue owner text into rules. Errors name the offending line (1-based).
pub fn parse_rules(text: &str) -> Result<Vec<Rule>, String> {
    let mut rules = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(matcher_token) = tokens.next() else {
            continue;
        };

        let matcher = match matcher_token.split_once(':') {
            Some((prefix, pattern)) => match MatcherType::parse(prefix) {
                Some(kind) => Matcher {
                    kind,
                    pattern: pattern.to_string(),
                },
                // e.g. "C:\path" or "app://foo", treat the whole token as a path
                None => Matcher {
                    kind: MatcherType::Path,
                    pattern: matcher_token.to_string(),
                },
            },
            None => Matcher {
                kind: MatcherType::Path,
                pattern: matcher_token.to_string(),
            },
        };
        if matcher.pattern.is_empty() {
            return Err(format!("Parse error: empty pattern on line {}", index + 1));
        }

        let owners: Vec<Owner> = tokens
            .map(|token| match token.strip_prefix('#') {
                Some(slug) => Owner {
                    kind: OwnerType::Team,
                    identifier: slug.to_string(),
                },
                None => Owner {
                    kind: OwnerType::User,
                    identifier: token.to_string(),
                },
            })
            .collect();
        if owners.is_empty() {
            return Err(format!("Parse error: rule on line {} has no owners", index + 1));
        }
        if let Some(owner) = owners.iter().find(|o| o.identifier.is_empty()) {
            return Err(format!("Parse error: invalid owner {:?} on line {}", owner, index + 1));
        }

        rules.push(Rule { matcher, owners });
    }

    Ok(rules)
}

/// Serialize rules into the stored schema
pub fn dump_schema(rules: &[Rule]) -> Value {
    json!({
        "$version": SCHEMA_VERSION,
        "rules": rules,
    })
}
