use std::collections::HashSet;

use aho_corasick::AhoCorasick;
use fancy_regex::Regex;

use crate::db::{ContactEntry, TriggerEntry};
use crate::error::Result;
use crate::helpers::{replace_all, replace_counted};
use crate::parser_data::{Contact, Trigger};

/// `like Gecko`, `like Mac OS X` and any parenthesised tail that follows,
/// up to the next `;` so fields sharing the parenthesis survive.
const LIKE_CLAUSE: &str = r"(?i)\blike[^;()]*(?:\([^)]*\)[^;()]*)*";

/// Output of the heuristic pre-pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cleaned {
    pub text: String,
    /// Initial doubt.
    pub score: f32,
    /// `(trigger index, position)` of every trigger that fired.
    pub fired: Vec<(usize, usize)>,
}

pub(crate) struct Preclean {
    triggers: Vec<Trigger>,
    matcher: AhoCorasick,
    contacts: Vec<Contact>,
    like: Regex,
    legacy_mozilla: f32,
}

impl Preclean {
    pub fn build(
        triggers: Vec<TriggerEntry>,
        contacts: Vec<ContactEntry>,
        legacy_mozilla: f32,
    ) -> Result<Self> {
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(triggers.iter().map(|t| t.keyword.to_ascii_lowercase()))?;

        let triggers = triggers
            .into_iter()
            .map(|t| -> Result<Trigger> {
                let confirm = t.confirm.as_deref().map(Regex::new).transpose()?;
                let anchor = if t.anchor {
                    let pattern = format!(
                        r"(?i)[^;()]*{}[a-z\d.!_-]*",
                        fancy_regex::escape(&t.keyword)
                    );
                    Some(Regex::new(&pattern)?)
                } else {
                    None
                };
                Ok(Trigger {
                    keyword: t.keyword,
                    score: t.score,
                    group: t.group,
                    confirm,
                    anchor,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let contacts = contacts
            .into_iter()
            .map(|c| -> Result<Contact> {
                Ok(Contact {
                    guard: c.guard.to_ascii_lowercase(),
                    pattern: Regex::new(&c.pattern)?,
                    penalty: c.penalty,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            triggers,
            matcher,
            contacts,
            like: Regex::new(LIKE_CLAUSE)?,
            legacy_mozilla,
        })
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn run(&self, ua: &str) -> Cleaned {
        let lower = ua.to_ascii_lowercase();
        let mut score = 0.0;

        // First position of each keyword.
        let mut first: Vec<Option<usize>> = vec![None; self.triggers.len()];
        for m in self.matcher.find_overlapping_iter(&lower) {
            let slot = &mut first[m.pattern().as_usize()];
            if slot.is_none() {
                *slot = Some(m.start());
            }
        }

        let mut fired = Vec::new();
        let mut scored_groups = HashSet::new();
        for (idx, (trigger, pos)) in self.triggers.iter().zip(first).enumerate() {
            let Some(pos) = pos else { continue };
            let pos = match &trigger.confirm {
                Some(re) => match re.find(&lower) {
                    Ok(Some(m)) => m.start(),
                    _ => continue,
                },
                None => pos,
            };
            // A group scores once, whichever of its keywords fired first.
            let counts = match &trigger.group {
                Some(group) => scored_groups.insert(group.as_str()),
                None => true,
            };
            if counts {
                score += trigger.score;
            }
            fired.push((idx, pos));
        }

        let mut text = ua.to_string();
        for contact in &self.contacts {
            if !text.to_ascii_lowercase().contains(&contact.guard) {
                continue;
            }
            let (stripped, count) = replace_counted(&contact.pattern, &text, " ");
            score += contact.penalty * count as f32;
            text = stripped;
        }

        let legacy = lower.contains("mozilla")
            && !ua.contains("Gecko")
            && !(ua.contains("(compatible; MSIE ") && ua.contains("Windows"));
        if legacy {
            score += self.legacy_mozilla;
        }

        if lower.contains("like") {
            text = replace_all(&self.like, &text, "");
        }

        if !fired.is_empty() || score > 0.0 {
            tracing::trace!(score, fired = fired.len(), "bot heuristics");
        }

        Cleaned { text, score, fired }
    }
}
