//! Content URI - the identifier callers use to address a logical collection
//!
//! Format: `content://<authority>/<segment>[/<segment>...]`
//!
//! Examples:
//! - `content://com.example.contentproviderdemo.provider/book`
//! - `content://com.example.contentproviderdemo.provider/user/2`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scheme every content URI carries.
pub const SCHEME: &str = "content";

/// Immutable identifier of a logical collection (or a row inside one).
///
/// Only a collection URI (authority plus one path segment) routes to a table.
/// Row URIs with further segments are used for change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentUri {
    /// Authority naming the provider
    authority: String,
    /// Non-empty path segments
    segments: Vec<String>,
}

impl ContentUri {
    /// Create a new ContentUri from an authority and a `/`-separated path
    pub fn new(authority: impl Into<String>, path: &str) -> Self {
        Self {
            authority: authority.into(),
            segments: split_path(path),
        }
    }

    /// Parse a URI string into a ContentUri
    ///
    /// Expected format: `content://<authority>/<path>`
    pub fn parse(uri: &str) -> Result<Self> {
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| Error::InvalidUri(format!("missing scheme separator: {}", uri)))?;

        if scheme != SCHEME {
            return Err(Error::InvalidUri(format!(
                "URI must start with {}://, got {}://",
                SCHEME, scheme
            )));
        }

        if rest.contains(['?', '#']) {
            return Err(Error::InvalidUri(format!(
                "query strings and fragments are not supported: {}",
                uri
            )));
        }

        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        if authority.is_empty() {
            return Err(Error::InvalidUri(format!("URI has no authority: {}", uri)));
        }

        Ok(Self::new(authority, path))
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path segment when the path has exactly one, the shape the matcher routes on
    pub fn single_segment(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [segment] => Some(segment.as_str()),
            _ => None,
        }
    }

    /// Return a new URI with `id` appended as an extra path segment
    pub fn with_appended_id(&self, id: i64) -> Self {
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Self {
            authority: self.authority.clone(),
            segments,
        }
    }

    /// True when `other` lives strictly below `self` under the same authority
    pub fn is_ancestor_of(&self, other: &ContentUri) -> bool {
        self.authority == other.authority
            && self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }

    /// Convert to URI string
    pub fn to_uri_string(&self) -> String {
        if self.segments.is_empty() {
            format!("{}://{}", SCHEME, self.authority)
        } else {
            format!("{}://{}/{}", SCHEME, self.authority, self.segments.join("/"))
        }
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri_string())
    }
}

impl FromStr for ContentUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ContentUri {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_uri_string())
    }
}

impl<'de> Deserialize<'de> for ContentUri {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ContentUri::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTH: &str = "com.example.contentproviderdemo.provider";

    #[test]
    fn test_uri_parse() {
        let uri = ContentUri::parse("content://com.example.contentproviderdemo.provider/book").unwrap();
        assert_eq!(uri.authority(), AUTH);
        assert_eq!(uri.segments(), ["book".to_string()]);
        assert_eq!(uri.single_segment(), Some("book"));
    }

    #[test]
    fn test_uri_display_matches_input() {
        let text = "content://com.example.contentproviderdemo.provider/user/2";
        let uri: ContentUri = text.parse().unwrap();
        assert_eq!(uri.to_string(), text);
        assert_eq!(uri, ContentUri::new(AUTH, "user/2"));
        assert_eq!(uri.single_segment(), None);
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let uri = ContentUri::parse("content://auth//book/").unwrap();
        assert_eq!(uri.segments(), ["book".to_string()]);

        let bare = ContentUri::parse("content://auth").unwrap();
        assert!(bare.segments().is_empty());
        assert_eq!(bare.single_segment(), None);
        assert_eq!(bare.to_string(), "content://auth");
    }

    #[test]
    fn test_invalid_uri() {
        assert!(ContentUri::parse("book").is_err());
        assert!(ContentUri::parse("http://auth/book").is_err());
        assert!(ContentUri::parse("content:///book").is_err());
        assert!(ContentUri::parse("content://auth/book?id=1").is_err());
    }

    #[test]
    fn test_appended_id_and_ancestry() {
        let book = ContentUri::new(AUTH, "book");
        let row = book.with_appended_id(5);
        assert_eq!(row.to_string(), format!("content://{}/book/5", AUTH));
        assert!(book.is_ancestor_of(&row));
        assert!(!row.is_ancestor_of(&book));
        assert!(!book.is_ancestor_of(&book));
        assert!(!ContentUri::new("other", "book").is_ancestor_of(&row));
    }

    #[test]
    fn test_serde_as_string() {
        let uri = ContentUri::new(AUTH, "book");
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, format!("\"content://{}/book\"", AUTH));
        let back: ContentUri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
    }
}
