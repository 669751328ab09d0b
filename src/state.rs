use indexmap::IndexMap;

use crate::parser_data::{Category, Scoring};
use crate::tokenizer::{trimmed_name, Token, TokenKind};

// ---------------------------------------------------------------------------
// Captures
// ---------------------------------------------------------------------------

/// Raw fragments keyed by the name that preceded them, in first-seen order.
///
/// A key keeps the first non-empty value written to it; keys introduced
/// without a value are registered empty so their presence can be tested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Captures {
    values: IndexMap<String, String>,
}

impl Captures {
    pub fn collect(tokens: &[Token<'_>]) -> Self {
        let mut captures = Self::default();
        let mut current: Option<String> = None;

        for token in tokens {
            let (next, value) = match (token.slashed, token.kind) {
                (true, TokenKind::Word(word)) => (Some(word.to_string()), word.to_string()),
                (true, TokenKind::Compound { name, digits }) => {
                    let joined = format!("{name}{digits}");
                    (Some(joined.clone()), joined)
                }
                (_, TokenKind::Version(version)) => (None, version.to_string()),
                (false, TokenKind::Word(word)) => {
                    current = None;
                    (Some(word.to_string()), String::new())
                }
                (false, TokenKind::Compound { name, digits }) => {
                    current = Some(trimmed_name(name).to_string());
                    (Some(format!("{name}{digits}")), digits.to_string())
                }
            };

            if let Some(key) = current.take() {
                captures.store(&key, &value);
            }
            current = next.filter(|key| !key.is_empty());
            if let Some(key) = &current {
                captures.register(key);
            }
        }

        captures
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// First listed key holding a non-empty value.
    pub fn non_empty(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    /// Write `value` unless the key already holds something.
    pub fn store(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        let slot = self.values.entry(key.to_string()).or_default();
        if slot.is_empty() {
            *slot = value.to_string();
        }
    }

    fn register(&mut self, key: &str) {
        self.values.entry(key.to_string()).or_default();
    }
}

// ---------------------------------------------------------------------------
// Candidates and category winners
// ---------------------------------------------------------------------------

/// A signature that survived its version rule, ready to compete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub weight: i32,
    pub code: String,
    pub version: Option<String>,
    pub mobile: Option<bool>,
}

/// Current winner of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Best {
    pub weight: i32,
    pub code: Option<String>,
    pub version: Option<String>,
    pub mobile: Option<bool>,
}

impl Default for Best {
    fn default() -> Self {
        Self {
            weight: -1,
            code: None,
            version: None,
            mobile: None,
        }
    }
}

impl Best {
    /// Offer a candidate.
    ///
    /// An equal or heavier candidate takes the category; if it names the same
    /// code but brings no version, the stored version is kept. A lighter
    /// candidate for the same code may still refine the version.
    pub fn offer(&mut self, candidate: Candidate) {
        let same_code = self.code.as_deref() == Some(candidate.code.as_str());

        if candidate.weight >= self.weight {
            let version = match candidate.version {
                None if same_code => self.version.take(),
                version => version,
            };
            *self = Best {
                weight: candidate.weight,
                code: Some(candidate.code),
                version,
                mobile: candidate.mobile,
            };
        } else if same_code && candidate.version.is_some() {
            self.version = candidate.version;
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

// ---------------------------------------------------------------------------
// ParseState
// ---------------------------------------------------------------------------

/// Everything one classification call accumulates. Created per call and
/// dropped when the result is built.
pub(crate) struct ParseState<'t> {
    /// The original, uncleaned user agent.
    pub ua: &'t str,
    pub scoring: &'t Scoring,
    pub doubt: f32,
    pub mobile_score: f32,
    pub os: Best,
    pub browser: Best,
    pub captures: Captures,
}

impl<'t> ParseState<'t> {
    pub fn new(ua: &'t str, scoring: &'t Scoring, doubt: f32, captures: Captures) -> Self {
        Self {
            ua,
            scoring,
            doubt,
            mobile_score: 0.0,
            os: Best::default(),
            browser: Best::default(),
            captures,
        }
    }

    pub fn doubtful(&self) -> bool {
        self.doubt >= self.scoring.threshold
    }

    pub fn best_mut(&mut self, category: Category) -> Option<&mut Best> {
        match category {
            Category::Os => Some(&mut self.os),
            Category::Browser => Some(&mut self.browser),
            _ => None,
        }
    }

    /// Browser opinion first, then the OS. A TV marker overturns a mobile
    /// claim; a handheld marker or the mobile score settles anything else.
    pub fn mobile(&self) -> Option<bool> {
        let stated = self.browser.mobile.or(self.os.mobile);
        let threshold = self.scoring.mobile_threshold;
        if stated == Some(true) {
            let tv = self.captures.contains("tv") || self.mobile_score <= -threshold;
            return Some(!tv);
        }
        if self.captures.contains("handheld") || self.mobile_score >= threshold {
            return Some(true);
        }
        stated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn captures(text: &str) -> Captures {
        let tokenizer = Tokenizer::new().unwrap();
        Captures::collect(&tokenizer.tokenize(text))
    }

    fn candidate(weight: i32, code: &str, version: Option<&str>) -> Candidate {
        Candidate {
            weight,
            code: code.to_string(),
            version: version.map(str::to_string),
            mobile: None,
        }
    }

    #[test]
    fn slash_values_attach_to_preceding_name() {
        let c = captures("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/91.0.4472.124");
        assert_eq!(c.get("Mozilla"), Some("5.0"));
        assert_eq!(c.get("Windows NT"), Some("10.0"));
        assert_eq!(c.get("Win"), Some("64"));
        assert_eq!(c.get("Win64"), Some(""));
        assert_eq!(c.get("x64"), Some(""));
        assert_eq!(c.get("Chrome"), Some("91.0.4472.124"));
    }

    #[test]
    fn compound_keeps_trailing_value_under_full_name() {
        let c = captures("BlackBerry9700/5.0.0.586");
        assert_eq!(c.get("BlackBerry"), Some("9700"));
        assert_eq!(c.get("BlackBerry9700"), Some("5.0.0.586"));
    }

    #[test]
    fn first_non_empty_value_wins() {
        let c = captures("BlackBerry; BlackBerry 9800; Version/6.0 Version/7.0");
        assert_eq!(c.get("BlackBerry"), Some("9800"));
        assert_eq!(c.get("Version"), Some("6.0"));
    }

    #[test]
    fn bare_word_resets_pending_key() {
        let c = captures("Windows Phone 8.0");
        assert_eq!(c.get("Windows"), Some(""));
        assert_eq!(c.get("Phone"), Some("8.0"));
    }

    #[test]
    fn non_empty_picks_first_filled_key() {
        let c = captures("CPU OS 14_6 Mobile/15E148");
        assert_eq!(c.non_empty(&["iPhone OS", "CPU OS"]), Some("14_6"));
        assert_eq!(c.non_empty(&["Nope"]), None);
    }

    #[test]
    fn tv_marker_overrules_mobile_claim() {
        let scoring = Scoring::default();
        let mut state = ParseState::new("", &scoring, 0.0, captures("Android 9; SMART-TV"));
        state.os.mobile = Some(true);
        state.captures.store("tv", "");
        state.captures.store("handheld", "537.36");
        state.mobile_score = 0.0;
        assert_eq!(state.mobile(), Some(false));
    }

    #[test]
    fn handheld_marker_claims_mobile() {
        let scoring = Scoring::default();
        let mut state = ParseState::new("", &scoring, 0.0, Captures::default());
        state.os.mobile = Some(false);
        state.captures.store("handheld", "");
        state.captures.store("tv", "");
        assert_eq!(state.mobile(), Some(true));
    }

    #[test]
    fn mobile_score_alone_decides_when_unstated() {
        let scoring = Scoring::default();
        let mut state = ParseState::new("", &scoring, 0.0, Captures::default());
        assert_eq!(state.mobile(), None);
        state.mobile_score = 100.0;
        assert_eq!(state.mobile(), Some(true));
    }

    #[test]
    fn heavier_offer_takes_category() {
        let mut best = Best::default();
        best.offer(candidate(10, "LIN", None));
        best.offer(candidate(20, "AND", Some("10")));
        assert_eq!(best.code(), Some("AND"));
        assert_eq!(best.version.as_deref(), Some("10"));
    }

    #[test]
    fn equal_weight_same_code_takes_newer_version() {
        let mut best = Best::default();
        best.offer(candidate(20, "AND", Some("4.4")));
        best.offer(candidate(20, "AND", Some("5.1")));
        assert_eq!(best.version.as_deref(), Some("5.1"));
    }

    #[test]
    fn equal_weight_same_code_without_version_keeps_stored() {
        let mut best = Best::default();
        best.offer(candidate(20, "AND", Some("5.1")));
        best.offer(candidate(20, "AND", None));
        assert_eq!(best.version.as_deref(), Some("5.1"));
    }

    #[test]
    fn lighter_offer_only_refines_version() {
        let mut best = Best::default();
        best.offer(candidate(20, "WIN", None));
        best.offer(candidate(5, "WIN", Some("98")));
        best.offer(candidate(5, "LIN", Some("1")));
        assert_eq!(best.code(), Some("WIN"));
        assert_eq!(best.weight, 20);
        assert_eq!(best.version.as_deref(), Some("98"));
    }
}
