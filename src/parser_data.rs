use serde::Deserialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Compiled signature data carried inside SignatureTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Category {
    Browser,
    Os,
    Robot,
    Marker,
    Ignore,
}

pub(crate) struct Signature {
    pub category: Category,
    pub weight: i32,
    /// Empty for markers and ignored tokens.
    pub code: String,
    pub mobile: Option<bool>,
    pub required: bool,
    pub rule: VersionRule,
    pub unless: Vec<String>,
    pub requires: Vec<String>,
    pub doubt: f32,
    pub mobile_score: f32,
    pub store_as: Option<String>,
}

pub(crate) enum VersionRule {
    /// The captured digits are the version.
    Literal,
    /// Never record a version.
    Discard,
    /// Groups of `pattern` joined with `.` replace the version.
    Regex {
        pattern: fancy_regex::Regex,
        matched: Override,
        otherwise: Option<Override>,
    },
    /// Exact raw version -> replacement bundle.
    Lookup {
        table: HashMap<String, Override>,
        otherwise: Option<Override>,
    },
    /// Literal version, then the bundle.
    Override(Override),
}

/// Replacement bundle applied after a version rule resolved.
///
/// Fields are applied in declaration order: the handler runs first and may
/// veto the candidate, then version, code, weight and mobile replace whatever
/// is present.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Override {
    #[serde(default)]
    pub handler: Option<Handler>,
    /// An empty string clears the version.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub weight: Option<i32>,
    #[serde(default)]
    pub mobile: Option<bool>,
}

/// Side-effect handlers that need to look at other captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Handler {
    WindowsLegacy,
    IosVersion,
    Blackberry,
    Kaios,
    OperaVariant,
    SafariVersion,
}

/// Post-scan corrections keyed by OS code ++ browser code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Fixup {
    AndroidWebview,
    AndroidBrowser,
    BlackberryBrowser,
    TizenWebApp,
    PuffinPlatform,
}

// ---------------------------------------------------------------------------
// Heuristic data
// ---------------------------------------------------------------------------

pub(crate) struct Trigger {
    pub keyword: String,
    pub score: f32,
    pub group: Option<String>,
    pub confirm: Option<fancy_regex::Regex>,
    /// Extracts a bot name around the keyword, for anchor triggers only.
    pub anchor: Option<fancy_regex::Regex>,
}

pub(crate) struct Contact {
    pub guard: String,
    pub pattern: fancy_regex::Regex,
    pub penalty: f32,
}

/// Calibration constants of the scoring model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scoring {
    pub threshold: f32,
    pub missing_os: f32,
    pub missing_browser: f32,
    pub version_penalty: f32,
    pub legacy_mozilla: f32,
    pub mobile_threshold: f32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            missing_os: 50.0,
            missing_browser: 50.0,
            version_penalty: 10.0,
            legacy_mozilla: 30.0,
            mobile_threshold: 100.0,
        }
    }
}
