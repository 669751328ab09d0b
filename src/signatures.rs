use std::collections::HashMap;

use crate::db;
use crate::error::{Error, Result};
use crate::parser_data::*;

// ---------------------------------------------------------------------------
// SignatureTable
// ---------------------------------------------------------------------------

/// Trigger token -> signature, plus a lower-cased index over robot rows.
pub(crate) struct SignatureTable {
    entries: HashMap<String, Signature>,
    /// Lower-cased trigger -> original trigger, robots only.
    robots: HashMap<String, String>,
}

impl SignatureTable {
    pub fn build(map: db::SignatureMap, aliases: &AliasTable) -> Result<Self> {
        let mut entries = HashMap::with_capacity(map.len());
        let mut robots = HashMap::new();

        for (key, entry) in map {
            let code = entry.code.unwrap_or_default();
            let needs_code = matches!(
                entry.category,
                Category::Browser | Category::Os | Category::Robot
            );
            if needs_code && aliases.get(&code).is_none() {
                return Err(Error::Table(format!(
                    "signature {key:?} has no resolvable code ({code:?})"
                )));
            }

            let rule = compile_rule(entry.version)?;
            for code in rule_codes(&rule) {
                if aliases.get(code).is_none() {
                    return Err(Error::Table(format!(
                        "signature {key:?} overrides to unknown code {code:?}"
                    )));
                }
            }

            if entry.category == Category::Robot {
                robots.insert(key.to_ascii_lowercase(), key.clone());
            }

            entries.insert(
                key,
                Signature {
                    category: entry.category,
                    weight: entry.weight,
                    code,
                    mobile: entry.mobile,
                    required: entry.required,
                    rule,
                    unless: entry.unless,
                    requires: entry.requires,
                    doubt: entry.doubt,
                    mobile_score: entry.mobile_score,
                    store_as: entry.store_as,
                },
            );
        }

        tracing::debug!(
            signatures = entries.len(),
            robots = robots.len(),
            "signature table built"
        );

        Ok(Self { entries, robots })
    }

    /// Exact trigger first, then the case-insensitive robot index.
    pub fn find(&self, key: &str) -> Option<&Signature> {
        self.entries.get(key).or_else(|| {
            self.robots
                .get(&key.to_ascii_lowercase())
                .and_then(|original| self.entries.get(original))
        })
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Signature)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn compile_rule(entry: Option<db::VersionRuleEntry>) -> Result<VersionRule> {
    Ok(match entry {
        None | Some(db::VersionRuleEntry::Literal) => VersionRule::Literal,
        Some(db::VersionRuleEntry::None) => VersionRule::Discard,
        Some(db::VersionRuleEntry::Regex {
            pattern,
            matched,
            otherwise,
        }) => VersionRule::Regex {
            pattern: fancy_regex::Regex::new(&pattern)?,
            matched,
            otherwise,
        },
        Some(db::VersionRuleEntry::Lookup { table, otherwise }) => VersionRule::Lookup {
            table: table
                .into_iter()
                .map(|(raw, value)| {
                    let bundle = match value {
                        db::LookupValue::Version(version) => Override {
                            version: Some(version),
                            ..Override::default()
                        },
                        db::LookupValue::Bundle(bundle) => bundle,
                    };
                    (raw, bundle)
                })
                .collect(),
            otherwise,
        },
        Some(db::VersionRuleEntry::Override(bundle)) => VersionRule::Override(bundle),
    })
}

/// Every code a rule may switch to.
fn rule_codes(rule: &VersionRule) -> Vec<&str> {
    let bundles: Vec<&Override> = match rule {
        VersionRule::Literal | VersionRule::Discard => Vec::new(),
        VersionRule::Regex {
            matched, otherwise, ..
        } => std::iter::once(matched).chain(otherwise).collect(),
        VersionRule::Lookup { table, otherwise } => table.values().chain(otherwise).collect(),
        VersionRule::Override(bundle) => vec![bundle],
    };
    bundles
        .into_iter()
        .filter_map(|b| b.code.as_deref())
        .collect()
}

// ---------------------------------------------------------------------------
// AliasTable / FixupTable
// ---------------------------------------------------------------------------

pub(crate) struct AliasTable {
    names: HashMap<String, String>,
}

impl AliasTable {
    pub fn build(map: db::AliasMap) -> Self {
        Self {
            names: map.into_iter().collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }
}

pub(crate) struct FixupTable {
    fixups: HashMap<String, Fixup>,
}

impl FixupTable {
    /// Keys are an OS code followed by a browser code, both three letters.
    pub fn build(map: db::FixupMap) -> Result<Self> {
        if let Some(key) = map
            .keys()
            .find(|key| key.len() != 6 || !key.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(Error::Table(format!("malformed fixup key {key:?}")));
        }
        Ok(Self {
            fixups: map.into_iter().collect(),
        })
    }

    pub fn get(&self, os_code: &str, browser_code: &str) -> Option<Fixup> {
        self.fixups
            .get(&format!("{os_code}{browser_code}"))
            .copied()
    }
}
