use fancy_regex::Regex;

use crate::error::Result;
use crate::helpers::{find_str, replace_all};
use crate::parser_data::Trigger;
use crate::preclean::Cleaned;

const MOZILLA_PREAMBLE: &str = r"(?i)Mozilla.*?compatible[; ]*";
const DOCOMO_PREAMBLE: &str = r"(?i)DoCoMo.*?compatible[; ]*";

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 30;
const MAX_NAME_PARTS: usize = 4;

/// Guesses a bot's self-declared name once the doubt threshold is crossed
/// without a known robot signature.
pub(crate) struct BotNamer {
    noise: Vec<Regex>,
    mozilla: Regex,
    docomo: Regex,
}

impl BotNamer {
    pub fn build(noise: &[String]) -> Result<Self> {
        Ok(Self {
            noise: noise
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            mozilla: Regex::new(MOZILLA_PREAMBLE)?,
            docomo: Regex::new(DOCOMO_PREAMBLE)?,
        })
    }

    /// Returns `(name, version)`; the version is only looked for when a
    /// name was accepted.
    pub fn extract(
        &self,
        ua: &str,
        cleaned: &Cleaned,
        triggers: &[Trigger],
    ) -> (Option<String>, Option<String>) {
        let Some(name) = self.name(ua, cleaned, triggers) else {
            return (None, None);
        };
        let version = version_after(ua, &name);
        (Some(name), version)
    }

    fn name(&self, ua: &str, cleaned: &Cleaned, triggers: &[Trigger]) -> Option<String> {
        // Highest score first, earliest position among equals.
        let mut anchors: Vec<(&Trigger, usize)> = cleaned
            .fired
            .iter()
            .filter_map(|&(idx, pos)| triggers.get(idx).map(|t| (t, pos)))
            .filter(|(t, _)| t.anchor.is_some())
            .collect();
        anchors.sort_by(|a, b| b.0.score.total_cmp(&a.0.score).then(a.1.cmp(&b.1)));

        let anchored = anchors.iter().find_map(|(trigger, _)| {
            let found = find_str(trigger.anchor.as_ref()?, &cleaned.text)?;
            tracing::trace!(keyword = %trigger.keyword, found, "bot name anchored");
            Some(found)
        });

        let lower = ua.to_ascii_lowercase();
        let mut text = match anchored {
            Some(found) => found.to_string(),
            None if lower.contains("mozilla") => replace_all(&self.mozilla, &cleaned.text, " "),
            None if lower.contains("docomo") => replace_all(&self.docomo, &cleaned.text, " "),
            None => cleaned.text.clone(),
        };

        for re in &self.noise {
            text = replace_all(re, &text, " ");
        }
        let name = text.trim_matches([' ', '.', '_', '-']);

        let parts = name.split([' ', '.', '_', '-']).count();
        if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN || parts > MAX_NAME_PARTS {
            tracing::debug!(candidate = name, "bot name rejected");
            return None;
        }
        Some(name.to_string())
    }
}

/// Version trailing `name` in the original user agent.
fn version_after(ua: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r"(?i){}[v /.-]*(\d+(\.[x\d]+)*)",
        fancy_regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(ua).ok()??;
    caps.get(1).map(|m| m.as_str().to_string())
}
