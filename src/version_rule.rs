use crate::parser_data::{Handler, Override, Signature, VersionRule};
use crate::state::{Candidate, ParseState};

/// Run a signature's version rule against its raw capture.
///
/// Returns `None` when the signature loses its candidacy: a regex that does
/// not match and has no fallback (penalised), a lookup miss without fallback,
/// or a handler veto.
pub(crate) fn evaluate(
    sig: &Signature,
    raw: &str,
    state: &mut ParseState<'_>,
) -> Option<Candidate> {
    let mut candidate = Candidate {
        weight: sig.weight,
        code: sig.code.clone(),
        version: non_empty(raw),
        mobile: sig.mobile,
    };

    let bundle = match &sig.rule {
        VersionRule::Literal => None,
        VersionRule::Discard => {
            candidate.version = None;
            None
        }
        VersionRule::Regex {
            pattern,
            matched,
            otherwise,
        } => match pattern.captures(raw) {
            Ok(Some(caps)) => {
                if caps.len() > 1 {
                    let joined: Vec<&str> = caps
                        .iter()
                        .skip(1)
                        .flatten()
                        .map(|m| m.as_str())
                        .filter(|s| !s.is_empty())
                        .collect();
                    candidate.version = non_empty(&joined.join("."));
                }
                Some(matched)
            }
            _ => match otherwise {
                Some(fallback) => Some(fallback),
                None => {
                    state.doubt += state.scoring.version_penalty;
                    return None;
                }
            },
        },
        VersionRule::Lookup { table, otherwise } => {
            Some(table.get(raw).or(otherwise.as_ref())?)
        }
        VersionRule::Override(bundle) => Some(bundle),
    };

    if let Some(bundle) = bundle {
        apply(bundle, &mut candidate, raw, state)?;
    }
    Some(candidate)
}

fn apply(
    bundle: &Override,
    candidate: &mut Candidate,
    raw: &str,
    state: &ParseState<'_>,
) -> Option<()> {
    if let Some(handler) = bundle.handler {
        if !run_handler(handler, candidate, raw, state) {
            return None;
        }
    }
    if let Some(version) = &bundle.version {
        candidate.version = non_empty(version);
    }
    if let Some(code) = &bundle.code {
        candidate.code = code.clone();
    }
    if let Some(weight) = bundle.weight {
        candidate.weight = weight;
    }
    if let Some(mobile) = bundle.mobile {
        candidate.mobile = Some(mobile);
    }
    Some(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Returns `false` to drop the candidate.
fn run_handler(
    handler: Handler,
    candidate: &mut Candidate,
    raw: &str,
    state: &ParseState<'_>,
) -> bool {
    let captures = &state.captures;
    match handler {
        Handler::WindowsLegacy => {
            candidate.version = match raw {
                "98" if captures.get("9x") == Some("4.90") => Some("ME".to_string()),
                "95" | "98" => Some(raw.to_string()),
                _ => None,
            };
            true
        }
        Handler::IosVersion => {
            if let Some(version) = captures.non_empty(&["ios"]) {
                candidate.version = Some(version.replace('_', "."));
            }
            true
        }
        Handler::Blackberry => {
            let model = format!("BlackBerry{raw}");
            if let Some(version) = captures.non_empty(&[model.as_str()]) {
                candidate.version = Some(version.to_string());
            } else if leading_number(raw) > 999.0 {
                // A bare model number, not an OS version.
                candidate.version = None;
            }
            true
        }
        Handler::Kaios => match captures.non_empty(&["kaios"]) {
            Some(version) => {
                candidate.code = "KAI".to_string();
                candidate.version = Some(version.to_string());
                true
            }
            None => false,
        },
        Handler::OperaVariant => {
            if captures.contains("Mobi") {
                candidate.code = "OPM".to_string();
                candidate.version = captures.get("Mobi").and_then(non_empty);
            } else if captures.contains("Mini") {
                candidate.code = "OMN".to_string();
                candidate.version = captures.get("Mini").and_then(non_empty);
            } else if raw == "9.80" {
                if let Some(version) = captures.non_empty(&["Version"]) {
                    candidate.version = Some(version.to_string());
                }
            }
            true
        }
        Handler::SafariVersion => {
            if let Some(version) = captures.non_empty(&["Version"]) {
                candidate.code = "SAF".to_string();
                candidate.version = Some(version.to_string());
            }
            true
        }
    }
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Numeric value of the leading `digits[.digits]`, 0 when there is none.
fn leading_number(s: &str) -> f64 {
    let int_end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let mut end = int_end;
    if s[int_end..].starts_with('.') {
        let frac = &s[int_end + 1..];
        end += 1 + frac.find(|c: char| !c.is_ascii_digit()).unwrap_or(frac.len());
    }
    s[..end].trim_end_matches('.').parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser_data::{Category, Scoring};
    use crate::state::Captures;
    use crate::tokenizer::Tokenizer;
    use std::collections::HashMap;

    fn sig(rule: VersionRule) -> Signature {
        Signature {
            category: Category::Os,
            weight: 10,
            code: "WIN".to_string(),
            mobile: Some(false),
            required: false,
            rule,
            unless: Vec::new(),
            requires: Vec::new(),
            doubt: 0.0,
            mobile_score: 0.0,
            store_as: None,
        }
    }

    fn with_state<R>(text: &str, f: impl FnOnce(&mut ParseState<'_>) -> R) -> R {
        let scoring = Scoring::default();
        let tokenizer = Tokenizer::new().unwrap();
        let captures = Captures::collect(&tokenizer.tokenize(text));
        let mut state = ParseState::new(text, &scoring, 0.0, captures);
        f(&mut state)
    }

    fn regex(pattern: &str, otherwise: Option<Override>) -> VersionRule {
        VersionRule::Regex {
            pattern: fancy_regex::Regex::new(pattern).unwrap(),
            matched: Override::default(),
            otherwise,
        }
    }

    #[test]
    fn literal_keeps_raw_version() {
        let c = with_state("", |s| evaluate(&sig(VersionRule::Literal), "6.1", s)).unwrap();
        assert_eq!(c.version.as_deref(), Some("6.1"));
    }

    #[test]
    fn discard_drops_version() {
        let c = with_state("", |s| evaluate(&sig(VersionRule::Discard), "6.1", s)).unwrap();
        assert_eq!(c.version, None);
    }

    #[test]
    fn regex_joins_groups() {
        let rule = regex(r"^(\d+)[._](\d+)(?:[._](\d+))?", None);
        let c = with_state("", |s| evaluate(&sig(rule), "10_15_7", s)).unwrap();
        assert_eq!(c.version.as_deref(), Some("10.15.7"));
    }

    #[test]
    fn regex_miss_without_fallback_is_penalised() {
        let rule = regex(r"^MIDP-", None);
        let doubt = with_state("", |s| {
            assert!(evaluate(&sig(rule), "CLDC-1.1", s).is_none());
            s.doubt
        });
        assert_eq!(doubt, Scoring::default().version_penalty);
    }

    #[test]
    fn regex_miss_uses_wildcard() {
        let fallback = Override {
            version: Some(String::new()),
            ..Override::default()
        };
        let rule = regex(r"\.fc(\d+)", Some(fallback));
        let c = with_state("", |s| evaluate(&sig(rule), "1.0", s)).unwrap();
        assert_eq!(c.version, None);
    }

    #[test]
    fn lookup_maps_and_rejects() {
        let mut table = HashMap::new();
        table.insert(
            "6.1".to_string(),
            Override {
                version: Some("7".to_string()),
                ..Override::default()
            },
        );
        let s = sig(VersionRule::Lookup {
            table,
            otherwise: None,
        });
        with_state("", |state| {
            let c = evaluate(&s, "6.1", state).unwrap();
            assert_eq!(c.version.as_deref(), Some("7"));
            assert!(evaluate(&s, "5.9", state).is_none());
            assert_eq!(state.doubt, 0.0);
        });
    }

    #[test]
    fn bundle_replaces_code_and_weight() {
        let bundle = Override {
            code: Some("RHE".to_string()),
            weight: Some(99),
            mobile: Some(true),
            ..Override::default()
        };
        let c = with_state("", |s| evaluate(&sig(VersionRule::Override(bundle)), "5", s)).unwrap();
        assert_eq!(c.code, "RHE");
        assert_eq!(c.weight, 99);
        assert_eq!(c.mobile, Some(true));
        assert_eq!(c.version.as_deref(), Some("5"));
    }

    fn handler(h: Handler) -> VersionRule {
        VersionRule::Override(Override {
            handler: Some(h),
            ..Override::default()
        })
    }

    #[test]
    fn windows_me_from_9x_kernel() {
        let text = "Windows 98; Win 9x 4.90";
        let c = with_state(text, |s| evaluate(&sig(handler(Handler::WindowsLegacy)), "98", s)).unwrap();
        assert_eq!(c.version.as_deref(), Some("ME"));
        let c = with_state("", |s| evaluate(&sig(handler(Handler::WindowsLegacy)), "3.1", s)).unwrap();
        assert_eq!(c.version, None);
    }

    #[test]
    fn blackberry_model_cross_reference() {
        let text = "BlackBerry9700/5.0.0.586";
        let c = with_state(text, |s| evaluate(&sig(handler(Handler::Blackberry)), "9700", s)).unwrap();
        assert_eq!(c.version.as_deref(), Some("5.0.0.586"));
        let c = with_state("", |s| evaluate(&sig(handler(Handler::Blackberry)), "9800", s)).unwrap();
        assert_eq!(c.version, None);
    }

    #[test]
    fn opera_variants() {
        let text = "Opera/9.80 (J2ME/MIDP; Opera Mini/9.80) Version/10.54";
        let c = with_state(text, |s| evaluate(&sig(handler(Handler::OperaVariant)), "9.80", s)).unwrap();
        assert_eq!(c.code, "OMN");
        assert_eq!(c.version.as_deref(), Some("9.80"));

        let text = "Opera/9.80 (Windows NT 6.1) Presto/2.12.388 Version/12.16";
        let c = with_state(text, |s| evaluate(&sig(handler(Handler::OperaVariant)), "9.80", s)).unwrap();
        assert_eq!(c.code, "WIN");
        assert_eq!(c.version.as_deref(), Some("12.16"));
    }

    #[test]
    fn kaios_requires_capture() {
        assert!(with_state("", |s| evaluate(&sig(handler(Handler::Kaios)), "48.0", s)).is_none());
        let c = with_state("KAIOS/2.5", |s| {
            s.captures.store("kaios", "2.5");
            evaluate(&sig(handler(Handler::Kaios)), "48.0", s)
        })
        .unwrap();
        assert_eq!(c.code, "KAI");
        assert_eq!(c.version.as_deref(), Some("2.5"));
    }

    #[test]
    fn leading_number_parses_prefix() {
        assert_eq!(leading_number("9700"), 9700.0);
        assert_eq!(leading_number("6.0.0"), 6.0);
        assert_eq!(leading_number("9700abc"), 9700.0);
        assert_eq!(leading_number(""), 0.0);
    }
}
