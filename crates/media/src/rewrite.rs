use std::borrow::Cow;

/// Ordered URL prefix substitutions for attachment downloads.
///
/// Used to route downloads through a reachable mirror when the host that
/// ntfy reports is blocked or internal.
#[derive(Debug, Clone, Default)]
pub struct HostRewriter {
    rules: Vec<(String, String)>,
}

impl HostRewriter {
    pub fn new<I, F, T>(rules: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        Self {
            rules: rules
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }

    /// Rewrite `url` with the first rule whose prefix matches; unmatched URLs
    /// are returned unchanged.
    pub fn rewrite<'a>(&self, url: &'a str) -> Cow<'a, str> {
        self.rules
            .iter()
            .find_map(|(from, to)| {
                url.strip_prefix(from.as_str())
                    .map(|rest| Cow::Owned(format!("{to}{rest}")))
            })
            .unwrap_or(Cow::Borrowed(url))
    }
}
