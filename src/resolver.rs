use std::collections::HashSet;

use crate::parser_data::{Category, Signature};
use crate::signatures::{AliasTable, SignatureTable};
use crate::state::ParseState;
use crate::tokenizer::{trimmed_name, Token, TokenKind};
use crate::version_rule;

/// Browser or OS hit waiting for the scan to finish.
pub(crate) struct Pending<'s> {
    pub key: String,
    pub raw: String,
    pub signature: &'s Signature,
}

pub(crate) enum Scan<'s> {
    /// A robot signature matched; nothing else matters.
    Robot {
        name: &'s str,
        version: Option<String>,
    },
    Queued(Vec<Pending<'s>>),
}

pub(crate) struct Resolver<'s> {
    signatures: &'s SignatureTable,
    aliases: &'s AliasTable,
}

impl<'s> Resolver<'s> {
    pub fn new(signatures: &'s SignatureTable, aliases: &'s AliasTable) -> Self {
        Self {
            signatures,
            aliases,
        }
    }

    /// Walk the tokens once, resolving each against the signature table.
    pub fn scan(&self, tokens: &[Token<'_>], state: &mut ParseState<'_>) -> Scan<'s> {
        let mut queued = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut carry: Option<String> = None;

        for token in tokens {
            if token.after_stop {
                carry = None;
            }
            if token.slashed {
                continue;
            }
            let Some(primary) = primary_key(token) else {
                carry = None;
                continue;
            };

            let candidates = candidate_keys(token, carry.as_deref());
            let hit = candidates
                .into_iter()
                .filter(|key| !seen.contains(key))
                .find_map(|key| self.signatures.find(&key).map(|sig| (key, sig)));

            if let Some((key, signature)) = hit {
                let raw = state
                    .captures
                    .get(&key)
                    .or_else(|| state.captures.get(&primary))
                    .unwrap_or_default()
                    .to_string();
                tracing::trace!(
                    key = %key,
                    raw = %raw,
                    category = ?signature.category,
                    "token resolved"
                );

                state.doubt += signature.doubt;
                state.mobile_score += signature.mobile_score;
                if let Some(store_as) = &signature.store_as {
                    state.captures.store(store_as, &raw);
                }
                seen.insert(key.clone());

                match signature.category {
                    Category::Robot => {
                        let name = self.aliases.get(&signature.code).unwrap_or_default();
                        tracing::debug!(key = %key, bot = name, "robot signature matched");
                        return Scan::Robot {
                            name,
                            version: version_rule::non_empty(&raw),
                        };
                    }
                    Category::Browser | Category::Os => queued.push(Pending {
                        key,
                        raw,
                        signature,
                    }),
                    Category::Marker | Category::Ignore => {}
                }
            }

            let unslashed_word = matches!(token.kind, TokenKind::Word(_));
            let empty = state.captures.get(&primary).map_or(true, str::is_empty);
            carry = (unslashed_word && empty).then_some(primary);
        }

        Scan::Queued(queued)
    }

    /// Filter, version and offer every queued hit, in scan order.
    pub fn settle(&self, queued: Vec<Pending<'s>>, state: &mut ParseState<'_>) {
        for Pending {
            key,
            raw,
            signature,
        } in queued
        {
            if signature
                .unless
                .iter()
                .any(|other| state.captures.contains(other))
            {
                tracing::trace!(key = %key, "dropped by exclusion");
                continue;
            }
            if !signature
                .requires
                .iter()
                .all(|other| state.captures.non_empty(&[other.as_str()]).is_some())
            {
                tracing::trace!(key = %key, "dropped, companion missing");
                continue;
            }
            if signature.required && raw.is_empty() {
                state.doubt += state.scoring.version_penalty;
                tracing::trace!(key = %key, "dropped, version missing");
                continue;
            }

            let Some(candidate) = version_rule::evaluate(signature, &raw, state) else {
                continue;
            };
            if let Some(best) = state.best_mut(signature.category) {
                best.offer(candidate);
            }
        }
    }
}

fn primary_key(token: &Token<'_>) -> Option<String> {
    match token.kind {
        TokenKind::Word(word) => Some(word.to_string()),
        TokenKind::Compound { name, digits } => Some(format!("{name}{digits}")),
        TokenKind::Version(_) => None,
    }
}

/// Longest first: the carried prefix joined to the full token, then the
/// token alone, then progressively shorter forms of it.
fn candidate_keys(token: &Token<'_>, carry: Option<&str>) -> Vec<String> {
    let mut keys = Vec::new();
    match token.kind {
        TokenKind::Word(word) => {
            let mut rest = word;
            keys.push(rest.to_string());
            while let Some(idx) = rest.rfind(' ') {
                rest = &rest[..idx];
                keys.push(rest.to_string());
            }
        }
        TokenKind::Compound { name, digits } => {
            keys.push(format!("{name}{digits}"));
            let trimmed = trimmed_name(name);
            if !trimmed.is_empty() {
                keys.push(trimmed.to_string());
            }
        }
        TokenKind::Version(_) => {}
    }
    if let (Some(carry), Some(longest)) = (carry, keys.first()) {
        let joined = format!("{carry} {longest}");
        keys.insert(0, joined);
    }
    keys
}
