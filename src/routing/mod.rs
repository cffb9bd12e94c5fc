//! Routing - from a content URI to the table it addresses
//!
//! Two lookups, both frozen before any dispatch happens:
//! - [`UriMatcher`]: (authority, single segment) -> [`MatchCode`]
//! - [`TableResolver`]: [`MatchCode`] -> table name
//!
//! [`RoutingTable`] owns both and is handed to the provider at construction,
//! so there is no process-wide registry.

pub mod matcher;
pub mod resolver;

pub use matcher::{MatchCode, UriMatcher};
pub use resolver::TableResolver;

use serde::{Deserialize, Serialize};

use crate::uri::ContentUri;

/// Authority used by the bundled book/user routes.
pub const DEFAULT_AUTHORITY: &str = "com.example.contentproviderdemo.provider";

/// Match code of the `book` route.
pub const BOOK_CODE: MatchCode = MatchCode(0);
/// Match code of the `user` route.
pub const USER_CODE: MatchCode = MatchCode(1);

/// One registration tuple supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Authority; falls back to the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    /// The single path segment the route matches
    pub path: String,
    pub code: u32,
    pub table: String,
}

impl Route {
    pub fn new(authority: impl Into<String>, path: impl Into<String>, code: u32, table: impl Into<String>) -> Self {
        Self {
            authority: Some(authority.into()),
            path: path.into(),
            code,
            table: table.into(),
        }
    }
}

/// The book(0) / user(1) routes under `authority`.
pub fn demo_routes(authority: &str) -> Vec<Route> {
    vec![
        Route::new(authority, "book", BOOK_CODE.0, "book"),
        Route::new(authority, "user", USER_CODE.0, "user"),
    ]
}

/// Immutable routing object: matcher plus resolver.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    matcher: UriMatcher,
    resolver: TableResolver,
}

impl RoutingTable {
    pub fn builder() -> RoutingTableBuilder {
        RoutingTableBuilder::default()
    }

    /// Build from host-supplied routes; routes without an authority use `default_authority`.
    pub fn from_routes(routes: &[Route], default_authority: &str) -> Self {
        routes
            .iter()
            .fold(Self::builder(), |builder, route| {
                let authority = route.authority.as_deref().unwrap_or(default_authority);
                builder.route(authority, &route.path, MatchCode(route.code), &route.table)
            })
            .build()
    }

    pub fn demo(authority: &str) -> Self {
        Self::from_routes(&demo_routes(authority), authority)
    }

    pub fn match_uri(&self, uri: &ContentUri) -> Option<MatchCode> {
        self.matcher.match_uri(uri)
    }

    pub fn resolve(&self, code: Option<MatchCode>) -> Option<&str> {
        self.resolver.resolve(code)
    }

    /// Table addressed by `uri`, or `None` when it is not routable.
    pub fn table_for(&self, uri: &ContentUri) -> Option<&str> {
        self.resolve(self.match_uri(uri))
    }

    /// Registered routes, sorted by code then path. Unmapped codes get an empty table.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .matcher
            .entries()
            .map(|(authority, path, code)| {
                let table = self.resolve(Some(code)).unwrap_or_default();
                Route::new(authority, path, code.0, table)
            })
            .collect();
        routes.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.path.cmp(&b.path)));
        routes
    }
}

/// Collects registrations; [`RoutingTableBuilder::build`] freezes them.
#[derive(Debug, Default)]
pub struct RoutingTableBuilder {
    matcher: UriMatcher,
    resolver: TableResolver,
}

impl RoutingTableBuilder {
    /// Register a match entry and its table in one go
    pub fn route(self, authority: &str, segment: &str, code: MatchCode, table: &str) -> Self {
        self.register(authority, segment, code).map_table(code, table)
    }

    /// Register a match entry only
    pub fn register(mut self, authority: &str, segment: &str, code: MatchCode) -> Self {
        self.matcher.register(authority, segment, code);
        self
    }

    /// Map a code to a table only
    pub fn map_table(mut self, code: MatchCode, table: &str) -> Self {
        self.resolver.insert(code, table);
        self
    }

    pub fn build(self) -> RoutingTable {
        RoutingTable {
            matcher: self.matcher,
            resolver: self.resolver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_table_routes_book_and_user() {
        let routes = RoutingTable::demo(DEFAULT_AUTHORITY);
        let book = ContentUri::new(DEFAULT_AUTHORITY, "book");
        let user = ContentUri::new(DEFAULT_AUTHORITY, "user");

        assert_eq!(routes.match_uri(&book), Some(BOOK_CODE));
        assert_eq!(routes.table_for(&book), Some("book"));
        assert_eq!(routes.table_for(&user), Some("user"));
        assert_eq!(routes.table_for(&ContentUri::new(DEFAULT_AUTHORITY, "unknown")), None);
    }

    #[test]
    fn test_matched_but_unmapped_code_is_unknown() {
        let routes = RoutingTable::builder()
            .route("auth", "book", MatchCode(0), "book")
            .register("auth", "orphan", MatchCode(9))
            .build();

        let orphan = ContentUri::new("auth", "orphan");
        assert_eq!(routes.match_uri(&orphan), Some(MatchCode(9)));
        assert_eq!(routes.table_for(&orphan), None);
    }

    #[test]
    fn test_routes_without_authority_use_default() {
        let routes = vec![Route {
            authority: None,
            path: "note".to_string(),
            code: 4,
            table: "notes".to_string(),
        }];
        let table = RoutingTable::from_routes(&routes, "fallback");
        assert_eq!(table.table_for(&ContentUri::new("fallback", "note")), Some("notes"));
    }

    #[test]
    fn test_routes_listing_is_sorted() {
        let table = RoutingTable::demo("auth");
        let listed = table.routes();
        assert_eq!(listed, demo_routes("auth"));
    }
}
