use std::borrow::Cow;
use std::path::Path;
use std::sync::OnceLock;

use rayon::prelude::*;

use super::bot_name::BotNamer;
use super::db;
use super::error::{Error, Result};
use super::fixup::Fixups;
use super::parser_data::Scoring;
use super::preclean::Preclean;
use super::resolver::{Resolver, Scan};
use super::signatures::{AliasTable, FixupTable, SignatureTable};
use super::source::HeaderSource;
use super::state::{Captures, ParseState};
use super::tokenizer::Tokenizer;
use super::types::Classification;

const SIGNATURES_YML: &str = include_str!("../data/signatures.yml");
const ALIASES_YML: &str = include_str!("../data/aliases.yml");
const FIXUPS_YML: &str = include_str!("../data/fixups.yml");
const HEURISTICS_YML: &str = include_str!("../data/heuristics.yml");

/// User-Agent classifier.
///
/// Immutable once built; share one instance across threads.
pub struct UserAgentAnalyzer {
    scoring: Scoring,
    signatures: SignatureTable,
    aliases: AliasTable,
    fixups: Fixups,
    tokenizer: Tokenizer,
    preclean: Preclean,
    bot_namer: BotNamer,
}

impl UserAgentAnalyzer {
    /// Build from the tables compiled into the crate.
    pub fn new() -> Result<Self> {
        Self::build(
            serde_yaml::from_str(SIGNATURES_YML)?,
            serde_yaml::from_str(ALIASES_YML)?,
            serde_yaml::from_str(FIXUPS_YML)?,
            serde_yaml::from_str(HEURISTICS_YML)?,
        )
    }

    /// Load `signatures.yml`, `aliases.yml`, `fixups.yml` and
    /// `heuristics.yml` from `dir` and build the analyzer.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let (tables, extras) = rayon::join(
            || -> Result<(db::SignatureMap, db::AliasMap)> {
                Ok((
                    load_yaml(&dir.join("signatures.yml"))?,
                    load_yaml(&dir.join("aliases.yml"))?,
                ))
            },
            || -> Result<(db::FixupMap, db::HeuristicsFile)> {
                Ok((
                    load_yaml(&dir.join("fixups.yml"))?,
                    load_yaml(&dir.join("heuristics.yml"))?,
                ))
            },
        );
        let (signatures, aliases) = tables?;
        let (fixups, heuristics) = extras?;

        Self::build(signatures, aliases, fixups, heuristics)
    }

    /// Process-wide instance built from the embedded tables.
    ///
    /// # Panics
    ///
    /// If the embedded tables fail to load, which the crate's own tests rule
    /// out.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<UserAgentAnalyzer> = OnceLock::new();
        SHARED.get_or_init(|| Self::new().expect("embedded tables are valid"))
    }

    fn build(
        signatures: db::SignatureMap,
        aliases: db::AliasMap,
        fixups: db::FixupMap,
        heuristics: db::HeuristicsFile,
    ) -> Result<Self> {
        let aliases = AliasTable::build(aliases);
        let signatures = SignatureTable::build(signatures, &aliases)?;
        let fixups = Fixups::new(FixupTable::build(fixups)?, &aliases)?;

        let db::HeuristicsFile {
            scoring,
            triggers,
            contacts,
            noise,
        } = heuristics;
        let preclean = Preclean::build(triggers, contacts, scoring.legacy_mozilla)?;
        let bot_namer = BotNamer::build(&noise)?;

        Ok(Self {
            scoring,
            signatures,
            aliases,
            fixups,
            tokenizer: Tokenizer::new()?,
            preclean,
            bot_namer,
        })
    }

    pub fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// Classify `ua`. Never fails; unrecognisable input degrades into a
    /// robot verdict or empty fields.
    pub fn classify(&self, ua: &str) -> Classification<'_> {
        let cleaned = self.preclean.run(ua);
        let tokens = self.tokenizer.tokenize(&cleaned.text);
        let captures = Captures::collect(&tokens);
        let mut state = ParseState::new(ua, &self.scoring, cleaned.score, captures);

        // Past the threshold already: only a robot signature can still
        // change the outcome.
        let settle = !state.doubtful();

        let resolver = Resolver::new(&self.signatures, &self.aliases);
        match resolver.scan(&tokens, &mut state) {
            Scan::Robot { name, version } => {
                return Classification::robot(Some(Cow::Borrowed(name)), version);
            }
            Scan::Queued(queued) if settle => {
                resolver.settle(queued, &mut state);
                if state.os.code().is_none() {
                    state.doubt += self.scoring.missing_os;
                }
                if state.browser.code().is_none() && !state.doubtful() {
                    state.doubt += self.scoring.missing_browser;
                }
            }
            Scan::Queued(_) => {}
        }

        if state.doubtful() {
            tracing::debug!(doubt = state.doubt, "doubt threshold reached");
            let (name, version) = self
                .bot_namer
                .extract(ua, &cleaned, self.preclean.triggers());
            return Classification::robot(name.map(Cow::Owned), version);
        }

        self.fixups.run(&mut state);

        let name_of = |code: Option<&str>| {
            code.and_then(|c| self.aliases.get(c)).map(Cow::Borrowed)
        };
        Classification {
            is_mobile: state.mobile(),
            is_robot: false,
            bot_name: None,
            bot_version: None,
            browser_name: name_of(state.browser.code()),
            browser_version: state.browser.version.take(),
            os_name: name_of(state.os.code()),
            os_version: state.os.version.take(),
        }
    }

    /// Classify `ua`, or the user agent `source` provides when `ua` is
    /// `None`.
    pub fn analyse<S: HeaderSource + ?Sized>(
        &self,
        ua: Option<&str>,
        source: &S,
    ) -> Result<Classification<'_>> {
        match ua {
            Some(ua) => Ok(self.classify(ua)),
            None => {
                let ua = source.user_agent().ok_or(Error::InputMissing)?;
                Ok(self.classify(&ua))
            }
        }
    }

    /// Classify many user agents in parallel; output order matches input.
    pub fn classify_all<S: AsRef<str> + Sync>(&self, uas: &[S]) -> Vec<Classification<'_>> {
        uas.par_iter().map(|ua| self.classify(ua.as_ref())).collect()
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}
