use fancy_regex::Regex;

use crate::error::Result;

/// One fragment shape per alternative: a bare (optionally `v`-prefixed)
/// version, a name glued to digits, or a word that may carry short
/// upper/lower-case suffix words (`Windows NT`, `Mac OS X`).
const TOKEN_PATTERN: &str = r"(?i)(/)?\b(?=[a-z\d])(?:(?:v\.?)?(\d+(?:[._][\w.-]+)?)|([a-z._-]{2,})(\d+(?:\.[\w.-]+)?)|([\w.-]+(?: [a-z]{1,2})*))(?![\w.-])";

/// Separators that end a multi-word trigger.
const STOP_CHARS: &[char] = &['/', ';', ')', ']', ','];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind<'a> {
    Version(&'a str),
    Compound { name: &'a str, digits: &'a str },
    Word(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    /// Introduced by `/`, i.e. the value half of a `name/value` pair.
    pub slashed: bool,
    /// A stop character separates this token from the previous one.
    pub after_stop: bool,
    pub kind: TokenKind<'a>,
}

/// Name of a compound with its trailing separators removed (`Win_64` -> `Win`).
pub(crate) fn trimmed_name(name: &str) -> &str {
    name.trim_end_matches(['-', '_', '.'])
}

pub(crate) struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    /// Scan `text` once, left to right.
    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        let mut last_end = 0;

        for caps in self.pattern.captures_iter(text) {
            // A backtrack-limit error ends the scan; what was found so far stands.
            let Ok(caps) = caps else { break };
            let Some(whole) = caps.get(0) else { continue };

            let slashed = caps.get(1).is_some();
            let gap = &text[last_end..whole.start()];
            let after_stop = slashed || gap.contains(STOP_CHARS);
            last_end = whole.end();

            let kind = if let Some(v) = caps.get(2) {
                TokenKind::Version(v.as_str())
            } else if let (Some(name), Some(digits)) = (caps.get(3), caps.get(4)) {
                TokenKind::Compound {
                    name: name.as_str(),
                    digits: digits.as_str(),
                }
            } else if let Some(word) = caps.get(5) {
                TokenKind::Word(word.as_str())
            } else {
                continue;
            };

            tokens.push(Token {
                slashed,
                after_stop,
                kind,
            });
        }

        tokens
    }
}
