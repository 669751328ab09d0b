#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),
    #[error(transparent)]
    Regex(#[from] fancy_regex::Error),
    #[error(transparent)]
    AhoCorasick(#[from] aho_corasick::BuildError),
    /// No user agent was given and the header source had none either.
    #[error("user agent is missing")]
    InputMissing,
    /// A table file loaded but is internally inconsistent.
    #[error("invalid table: {0}")]
    Table(String),
}

pub type Result<T> = std::result::Result<T, Error>;
