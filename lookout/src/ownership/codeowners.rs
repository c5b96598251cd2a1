//! CODEOWNERS parsing and conversion into issue owner rules.
//!
//! A CODEOWNERS file is a list of `<pattern> <owner>...` lines. Owners come in three shapes:
//!
//! - `@org/team`: a team handle (anything containing `/`)
//! - `someone@example.com`: an email address
//! - `@someone`: a username
//!
//! Handles are mapped onto platform identities by the caller (see
//! [`crate::ownership::serializer`]); [`convert_codeowners_syntax`] then rewrites each rule
//! into the `codeowners:<path> <owners>` issue owner syntax, translating repository paths
//! through the code mapping.

use std::collections::HashMap;

use crate::db::models::projects::CodeMappingDBResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    Team,
    Email,
    Username,
}

/// Classify a raw CODEOWNERS owner token
pub fn classify_owner(owner: &str) -> OwnerKind {
    if owner.contains('/') {
        OwnerKind::Team
    } else if looks_like_email(owner) {
        OwnerKind::Email
    } else {
        OwnerKind::Username
    }
}

// local@domain.tld with exactly one '@' and a dot somewhere inside the domain
fn looks_like_email(owner: &str) -> bool {
    let Some((local, domain)) = owner.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rfind('.') {
        Some(dot) => dot > 0 && dot < domain.len() - 1,
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOwnersRule {
    pub pattern: String,
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCodeOwners {
    pub rules: Vec<CodeOwnersRule>,
    pub teams: Vec<String>,
    pub usernames: Vec<String>,
    pub emails: Vec<String>,
}

impl ParsedCodeOwners {
    /// Usernames and team handles, the owners that need an external association
    pub fn external_names(&self) -> Vec<String> {
        self.usernames.iter().chain(self.teams.iter()).cloned().collect()
    }
}

/// Parse CODEOWNERS text. Comments, blank lines and patterns without owners produce no rules.
/// Owner lists are deduplicated in order of first appearance.
pub fn parse_code_owners(raw: &str) -> ParsedCodeOwners {
    let mut parsed = ParsedCodeOwners::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(pattern) = tokens.next() else {
            continue;
        };
        let owners: Vec<String> = tokens.take_while(|t| !t.starts_with('#')).map(str::to_string).collect();
        if owners.is_empty() {
            continue;
        }

        for owner in &owners {
            let bucket = match classify_owner(owner) {
                OwnerKind::Team => &mut parsed.teams,
                OwnerKind::Email => &mut parsed.emails,
                OwnerKind::Username => &mut parsed.usernames,
            };
            if !bucket.contains(owner) {
                bucket.push(owner.clone());
            }
        }

        parsed.rules.push(CodeOwnersRule {
            pattern: pattern.to_string(),
            owners,
        });
    }

    parsed
}

/// Rewrite CODEOWNERS rules into issue owner syntax.
///
/// `associations` maps raw owner tokens onto issue owner identities (`#team-slug` or a user
/// email). Owners without an association are dropped, and a rule left with no owners is
/// dropped entirely.
pub fn convert_codeowners_syntax(
    parsed: &ParsedCodeOwners,
    associations: &HashMap<String, String>,
    code_mapping: &CodeMappingDBResponse,
) -> String {
    let mut result = String::new();

    for rule in &parsed.rules {
        let mut assignees: Vec<&str> = Vec::new();
        for owner in &rule.owners {
            if let Some(identity) = associations.get(owner)
                && !assignees.contains(&identity.as_str())
            {
                assignees.push(identity);
            }
        }
        if assignees.is_empty() {
            continue;
        }

        let path = if is_anchored(&rule.pattern) {
            let translated = rule.pattern.replacen(&code_mapping.source_root, &code_mapping.stack_root, 1);
            collapse_slashes(&translated)
        } else {
            rule.pattern.clone()
        };

        result.push_str(&format!("codeowners:{} {}\n", path, assignees.join(" ")));
    }

    result
}

// A pattern with a '/' anywhere but the very end is relative to the repository root
// (`/foo`, `foo/bar`, `foo/bar/`), `foo/` matches at any depth.
fn is_anchored(pattern: &str) -> bool {
    let trimmed = pattern.strip_suffix('/').unwrap_or(pattern);
    trimmed.contains('/')
}

// Collapse runs of '/' unless they follow a scheme separator, e.g. "app://"
fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        if c != '/' {
            out.push(c);
            prev = Some(c);
            continue;
        }

        let mut run = 1;
        while chars.peek() == Some(&'/') {
            chars.next();
            run += 1;
        }
        if run > 1 && prev == Some(':') {
            out.extend(std::iter::repeat_n('/', run));
        } else {
            out.push('/');
        }
        prev = Some('/');
    }

    out
}
