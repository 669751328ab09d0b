use indexmap::IndexMap;
use serde::Deserialize;

use crate::parser_data::{Category, Fixup, Override, Scoring};

// ---------------------------------------------------------------------------
// Signatures  (data/signatures.yml)
//
// Format: top-level mapping  trigger token -> SignatureEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SignatureEntry {
    pub category: Category,
    #[serde(default)]
    pub weight: i32,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub mobile: Option<bool>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub version: Option<VersionRuleEntry>,
    #[serde(default)]
    pub unless: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub doubt: f32,
    #[serde(default)]
    pub mobile_score: f32,
    #[serde(default)]
    pub store_as: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub(crate) enum VersionRuleEntry {
    Literal,
    None,
    Regex {
        pattern: String,
        #[serde(default)]
        matched: Override,
        #[serde(default)]
        otherwise: Option<Override>,
    },
    Lookup {
        table: IndexMap<String, LookupValue>,
        #[serde(default)]
        otherwise: Option<Override>,
    },
    Override(Override),
}

/// A lookup row is either a bare replacement version or a full bundle.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LookupValue {
    Version(String),
    Bundle(Override),
}

/// Uses IndexMap to preserve file order for diagnostics and stable iteration.
pub(crate) type SignatureMap = IndexMap<String, SignatureEntry>;

// ---------------------------------------------------------------------------
// Aliases  (data/aliases.yml)   code -> display name
// ---------------------------------------------------------------------------

pub(crate) type AliasMap = IndexMap<String, String>;

// ---------------------------------------------------------------------------
// Fixups  (data/fixups.yml)   os code ++ browser code -> handler
// ---------------------------------------------------------------------------

pub(crate) type FixupMap = IndexMap<String, Fixup>;

// ---------------------------------------------------------------------------
// Heuristics  (data/heuristics.yml)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct HeuristicsFile {
    #[serde(default)]
    pub scoring: Scoring,
    #[serde(default)]
    pub triggers: Vec<TriggerEntry>,
    #[serde(default)]
    pub contacts: Vec<ContactEntry>,
    #[serde(default)]
    pub noise: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TriggerEntry {
    pub keyword: String,
    pub score: f32,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub confirm: Option<String>,
    #[serde(default)]
    pub anchor: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContactEntry {
    pub guard: String,
    pub pattern: String,
    pub penalty: f32,
}
