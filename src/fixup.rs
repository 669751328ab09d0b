use fancy_regex::Regex;

use crate::error::{Error, Result};
use crate::parser_data::Fixup;
use crate::signatures::{AliasTable, FixupTable};
use crate::state::ParseState;
use crate::version_rule::non_empty;

/// Platform code trailing the Puffin build number (`Puffin/4.8.0.2965AP`).
const PUFFIN_PLATFORM: &str = r"\bPuffin[^A-KN-Z\s]+([AIW][PTD])";

const PUFFIN: &str = "PUF";

/// Codes a fixup may switch to.
const FIXUP_CODES: &[&str] = &["AWV", "ABR", "BBB", "TTV", "TMW", "IOS", "AND", "WPH", "WIN"];

/// Post-scan corrections for OS/browser pairings that mean something else
/// together.
pub(crate) struct Fixups {
    table: FixupTable,
    puffin: Regex,
}

impl Fixups {
    pub fn new(table: FixupTable, aliases: &AliasTable) -> Result<Self> {
        if let Some(code) = FIXUP_CODES.iter().find(|code| aliases.get(code).is_none()) {
            return Err(Error::Table(format!("fixup target {code:?} has no alias")));
        }
        Ok(Self {
            table,
            puffin: Regex::new(PUFFIN_PLATFORM)?,
        })
    }

    /// Look up the pairing of both winners and apply its correction, if any.
    pub fn run(&self, state: &mut ParseState<'_>) {
        // Puffin's platform code decides mobile on every OS.
        if state.browser.code() == Some(PUFFIN) {
            if let Some((_, mobile)) = self.puffin_platform(state.ua) {
                state.browser.mobile = Some(mobile);
            }
        }

        let (Some(os), Some(browser)) = (state.os.code(), state.browser.code()) else {
            return;
        };
        if let Some(fixup) = self.table.get(os, browser) {
            self.apply(fixup, state);
        }
    }

    fn apply(&self, fixup: Fixup, state: &mut ParseState<'_>) {
        let version = state.captures.non_empty(&["Version"]).and_then(non_empty);

        match fixup {
            Fixup::AndroidWebview => {
                if version.is_some() {
                    set_browser(state, "AWV", version);
                } else if state.captures.contains("wv") {
                    set_browser(state, "AWV", None);
                }
            }
            Fixup::AndroidBrowser => set_browser(state, "ABR", version),
            Fixup::BlackberryBrowser => set_browser(state, "BBB", version),
            Fixup::TizenWebApp => {
                if state.captures.contains("tv") {
                    set_browser(state, "TTV", version);
                    state.browser.mobile = Some(false);
                } else {
                    set_browser(state, "TMW", version);
                }
            }
            Fixup::PuffinPlatform => {
                let Some((os, _)) = self.puffin_platform(state.ua) else {
                    return;
                };
                state.os.code = Some(os.to_string());
                state.os.version = None;
            }
        }

        tracing::debug!(
            ?fixup,
            os = ?state.os.code,
            browser = ?state.browser.code,
            "fixup applied"
        );
    }

    /// OS code and mobile flag named by the Puffin build suffix.
    fn puffin_platform(&self, ua: &str) -> Option<(&'static str, bool)> {
        let caps = self.puffin.captures(ua).ok().flatten()?;
        match caps.get(1)?.as_str() {
            "IP" | "IT" => Some(("IOS", true)),
            "AP" | "AT" => Some(("AND", true)),
            "WP" => Some(("WPH", true)),
            "WD" => Some(("WIN", false)),
            _ => None,
        }
    }
}

fn set_browser(state: &mut ParseState<'_>, code: &str, version: Option<String>) {
    state.browser.code = Some(code.to_string());
    state.browser.version = version;
}
