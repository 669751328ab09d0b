use std::borrow::Cow;
use std::collections::HashMap;

/// Where a user agent comes from when the caller does not pass one.
pub trait HeaderSource {
    /// The request's `User-Agent` value, if there is one.
    fn user_agent(&self) -> Option<Cow<'_, str>>;
}

/// Reads `HTTP_USER_AGENT` from the process environment, as set for CGI
/// programs.
#[derive(Debug, Clone, Copy, Default)]
pub struct CgiEnvironment;

impl CgiEnvironment {
    pub const VARIABLE: &'static str = "HTTP_USER_AGENT";
}

impl HeaderSource for CgiEnvironment {
    fn user_agent(&self) -> Option<Cow<'_, str>> {
        std::env::var(Self::VARIABLE).ok().map(Cow::Owned)
    }
}

/// Header maps match the name case-insensitively.
impl HeaderSource for HashMap<String, String> {
    fn user_agent(&self) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| Cow::Borrowed(value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_name_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("USER-AGENT".to_string(), "Lynx/2.8.9".to_string());
        assert_eq!(headers.user_agent().as_deref(), Some("Lynx/2.8.9"));
    }

    #[test]
    fn empty_map_has_no_agent() {
        assert_eq!(HashMap::<String, String>::new().user_agent(), None);
    }
}
