mod analyzer;
mod bot_name;
mod db;
mod error;
mod fixup;
mod helpers;
mod parser_data;
mod preclean;
mod resolver;
mod signatures;
mod source;
mod state;
mod tokenizer;
mod types;
mod version_rule;

pub use analyzer::UserAgentAnalyzer;
pub use error::{Error, Result};
pub use parser_data::Scoring;
pub use source::{CgiEnvironment, HeaderSource};
pub use types::*;
