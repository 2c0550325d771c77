use std::{fmt, str::FromStr};

use crate::error::Error;

const GROUP_PREFIX: &str = "group_";
const USER_PREFIX: &str = "user_";

/// A chat group or an individual user on the messaging platform.
///
/// Written in config as `group_<id>` or `user_<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Group(i64),
    User(i64),
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ctor, digits): (fn(i64) -> Self, &str) =
            if let Some(rest) = s.strip_prefix(GROUP_PREFIX) {
                (Self::Group, rest)
            } else if let Some(rest) = s.strip_prefix(USER_PREFIX) {
                (Self::User, rest)
            } else {
                return Err(Error::invalid_target(
                    s,
                    "expected a \"group_\" or \"user_\" prefix",
                ));
            };

        digits
            .parse::<i64>()
            .map(ctor)
            .map_err(|e| Error::invalid_target(s, e))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "{GROUP_PREFIX}{id}"),
            Self::User(id) => write!(f, "{USER_PREFIX}{id}"),
        }
    }
}
