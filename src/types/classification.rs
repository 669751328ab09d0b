use std::borrow::Cow;

use serde::Serialize;

/// Outcome of classifying one user agent.
///
/// Names borrow from the analyzer's alias table where they can; use
/// [`Classification::into_owned`] to keep a result past the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification<'a> {
    pub is_mobile: Option<bool>,
    pub is_robot: bool,
    pub bot_name: Option<Cow<'a, str>>,
    pub bot_version: Option<String>,
    pub browser_name: Option<Cow<'a, str>>,
    pub browser_version: Option<String>,
    pub os_name: Option<Cow<'a, str>>,
    pub os_version: Option<String>,
}

impl<'a> Classification<'a> {
    pub(crate) fn robot(name: Option<Cow<'a, str>>, version: Option<String>) -> Self {
        Self {
            is_robot: true,
            bot_name: name,
            bot_version: version,
            ..Self::default()
        }
    }

    pub fn is_robot(&self) -> bool {
        self.is_robot
    }
    pub fn is_mobile(&self) -> Option<bool> {
        self.is_mobile
    }
    pub fn bot_name(&self) -> Option<&str> {
        self.bot_name.as_deref()
    }
    pub fn bot_version(&self) -> Option<&str> {
        self.bot_version.as_deref()
    }
    pub fn browser_name(&self) -> Option<&str> {
        self.browser_name.as_deref()
    }
    pub fn browser_version(&self) -> Option<&str> {
        self.browser_version.as_deref()
    }
    pub fn os_name(&self) -> Option<&str> {
        self.os_name.as_deref()
    }
    pub fn os_version(&self) -> Option<&str> {
        self.os_version.as_deref()
    }

    pub fn into_owned(self) -> Classification<'static> {
        let own = |name: Option<Cow<'a, str>>| name.map(|n| Cow::Owned(n.into_owned()));
        Classification {
            is_mobile: self.is_mobile,
            is_robot: self.is_robot,
            bot_name: own(self.bot_name),
            bot_version: self.bot_version,
            browser_name: own(self.browser_name),
            browser_version: self.browser_version,
            os_name: own(self.os_name),
            os_version: self.os_version,
        }
    }
}
