//! URI matcher: (authority, single path segment) -> match code

use std::collections::HashMap;
use std::fmt;

use crate::uri::ContentUri;

/// Routing code produced by a successful match. "No match" is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchCode(pub u32);

impl fmt::Display for MatchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exact-match registry of routing entries.
///
/// Built once before dispatch starts and only read afterwards, so
/// [`UriMatcher::match_uri`] takes `&self` and needs no locking.
#[derive(Debug, Clone, Default)]
pub struct UriMatcher {
    // authority -> segment -> code
    entries: HashMap<String, HashMap<String, MatchCode>>,
}

impl UriMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one routing entry. Registering the same pair twice keeps the last code.
    pub fn register(&mut self, authority: &str, segment: &str, code: MatchCode) {
        let previous = self
            .entries
            .entry(authority.to_string())
            .or_default()
            .insert(segment.to_string(), code);
        if let Some(previous) = previous {
            if previous != code {
                tracing::warn!(
                    authority,
                    segment,
                    %previous,
                    %code,
                    "duplicate route registration, last one wins"
                );
            }
        }
    }

    /// Match on exact authority and a one-segment path.
    ///
    /// Row URIs such as `book/5` have no entry and do not match.
    pub fn match_uri(&self, uri: &ContentUri) -> Option<MatchCode> {
        let segment = uri.single_segment()?;
        self.entries.get(uri.authority())?.get(segment).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered entries as (authority, segment, code)
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, MatchCode)> {
        self.entries.iter().flat_map(|(authority, segments)| {
            segments
                .iter()
                .map(move |(segment, code)| (authority.as_str(), segment.as_str(), *code))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH: &str = "com.example.contentproviderdemo.provider";

    fn demo_matcher() -> UriMatcher {
        let mut matcher = UriMatcher::new();
        matcher.register(AUTH, "book", MatchCode(0));
        matcher.register(AUTH, "user", MatchCode(1));
        matcher
    }

    #[test]
    fn test_registered_pairs_match() {
        let matcher = demo_matcher();
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "book")), Some(MatchCode(0)));
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "user")), Some(MatchCode(1)));
        assert_eq!(matcher.len(), 2);
    }

    #[test]
    fn test_unregistered_pairs_do_not_match() {
        let matcher = demo_matcher();
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "unknown")), None);
        assert_eq!(matcher.match_uri(&ContentUri::new("other.authority", "book")), None);
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "")), None);
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "Book")), None);
    }

    #[test]
    fn test_deeper_paths_do_not_match() {
        let matcher = demo_matcher();
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "book/5")), None);
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "book").with_appended_id(3)), None);
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "shelf/book")), None);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut matcher = demo_matcher();
        matcher.register(AUTH, "book", MatchCode(7));
        assert_eq!(matcher.match_uri(&ContentUri::new(AUTH, "book")), Some(MatchCode(7)));
        assert_eq!(matcher.len(), 2);
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let mut reversed = UriMatcher::new();
        reversed.register(AUTH, "user", MatchCode(1));
        reversed.register(AUTH, "book", MatchCode(0));

        let forward = demo_matcher();
        for path in ["book", "user", "nothing"] {
            let uri = ContentUri::new(AUTH, path);
            assert_eq!(forward.match_uri(&uri), reversed.match_uri(&uri));
        }
    }
}
