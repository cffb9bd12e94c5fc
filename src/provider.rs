//! Content provider - URI-routed CRUD dispatch
//!
//! Every operation starts the same way: route the URI to a table through the
//! [`RoutingTable`]. A URI that routes nowhere is a quiet no-op (`None` or `0`),
//! not an error. Otherwise the call goes to the [`ConnectionHandle`] unchanged,
//! and a successful mutation is announced on the [`ChangeNotifier`]:
//! - insert: always
//! - update / delete: only when at least one row was affected
//! - query: never

use std::sync::Arc;

use crate::notify::ChangeNotifier;
use crate::routing::RoutingTable;
use crate::storage::{ConnectionHandle, RowSet, RowValues, Value};
use crate::uri::ContentUri;
use crate::Result;

/// Dispatches CRUD calls on content URIs to the shared store.
pub struct ContentProvider {
    routes: RoutingTable,
    handle: ConnectionHandle,
    notifier: Arc<ChangeNotifier>,
}

impl ContentProvider {
    pub fn new(routes: RoutingTable, handle: ConnectionHandle, notifier: Arc<ChangeNotifier>) -> Self {
        Self {
            routes,
            handle,
            notifier,
        }
    }

    /// Lifecycle hook: start opening the store in the background and return at once.
    ///
    /// Calls that arrive before the store is ready wait for it.
    pub fn on_create(&self) -> bool {
        self.handle.start();
        true
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Media type hint for `uri`. Not tracked, always `None`.
    pub fn get_type(&self, _uri: &ContentUri) -> Option<String> {
        None
    }

    fn table_for(&self, uri: &ContentUri, op: &'static str) -> Option<&str> {
        let table = self.routes.table_for(uri);
        if table.is_none() {
            tracing::debug!(%uri, op, "unrecognized uri, skipping");
        }
        table
    }

    pub fn query(
        &self,
        uri: &ContentUri,
        projection: Option<&[String]>,
        selection: Option<&str>,
        selection_args: &[Value],
        sort_order: Option<&str>,
    ) -> Result<Option<RowSet>> {
        let Some(table) = self.table_for(uri, "query") else {
            return Ok(None);
        };

        let rows = self
            .handle
            .with_store(|store| store.query(table, projection, selection, selection_args, sort_order))?;
        tracing::debug!(%uri, table, rows = rows.len(), "query");
        Ok(Some(rows))
    }

    /// Insert a row. Returns `uri` with the new row id appended.
    pub fn insert(&self, uri: &ContentUri, values: &RowValues) -> Result<Option<ContentUri>> {
        let Some(table) = self.table_for(uri, "insert") else {
            return Ok(None);
        };

        let row_id = self.handle.with_store(|store| store.insert(table, values))?;
        tracing::debug!(%uri, table, row_id, "insert");
        self.notifier.notify(uri);
        Ok(Some(uri.with_appended_id(row_id)))
    }

    pub fn update(
        &self,
        uri: &ContentUri,
        values: &RowValues,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> Result<usize> {
        let Some(table) = self.table_for(uri, "update") else {
            return Ok(0);
        };

        let count = self
            .handle
            .with_store(|store| store.update(table, values, selection, selection_args))?;
        tracing::debug!(%uri, table, count, "update");
        if count > 0 {
            self.notifier.notify(uri);
        }
        Ok(count)
    }

    pub fn delete(&self, uri: &ContentUri, selection: Option<&str>, selection_args: &[Value]) -> Result<usize> {
        let Some(table) = self.table_for(uri, "delete") else {
            return Ok(0);
        };

        let count = self
            .handle
            .with_store(|store| store.delete(table, selection, selection_args))?;
        tracing::debug!(%uri, table, count, "delete");
        if count > 0 {
            self.notifier.notify(uri);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::DEFAULT_AUTHORITY;
    use crate::storage::SeedPolicy;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn provider() -> (ContentProvider, Arc<AtomicUsize>) {
        let notifier = Arc::new(ChangeNotifier::new());
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        notifier.subscribe(
            ContentUri::new(DEFAULT_AUTHORITY, ""),
            true,
            Arc::new(move |_: &ContentUri| -> anyhow::Result<()> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        let provider = ContentProvider::new(
            RoutingTable::demo(DEFAULT_AUTHORITY),
            ConnectionHandle::open_in_memory(SeedPolicy::Reset),
            notifier,
        );
        assert!(provider.on_create());
        (provider, fired)
    }

    fn uri(path: &str) -> ContentUri {
        ContentUri::new(DEFAULT_AUTHORITY, path)
    }

    #[test]
    fn test_query_never_notifies() {
        let (provider, fired) = provider();
        let rows = provider.query(&uri("user"), None, None, &[], Some("id")).unwrap().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_insert_returns_row_uri_and_notifies() {
        let (provider, fired) = provider();
        let inserted = provider
            .insert(&uri("book"), &RowValues::new().with("id", 5).with("name", "Linux"))
            .unwrap();
        assert_eq!(inserted, Some(uri("book/5")));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_notifies_only_when_rows_change() {
        let (provider, fired) = provider();
        let values = RowValues::new().with("name", "iOS");

        assert_eq!(provider.update(&uri("book"), &values, Some("id = ?"), &[Value::from(99)]).unwrap(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert_eq!(provider.update(&uri("book"), &values, Some("id = ?"), &[Value::from(4)]).unwrap(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delete_notifies_only_when_rows_change() {
        let (provider, fired) = provider();
        assert_eq!(provider.delete(&uri("user"), Some("name = ?"), &[Value::from("Nobody")]).unwrap(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert_eq!(provider.delete(&uri("user"), None, &[]).unwrap(), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unrecognized_uri_is_a_noop() {
        let (provider, fired) = provider();
        let unknown = uri("unknown");

        assert_eq!(provider.query(&unknown, None, None, &[], None).unwrap(), None);
        assert_eq!(provider.insert(&unknown, &RowValues::new().with("id", 1)).unwrap(), None);
        assert_eq!(provider.update(&unknown, &RowValues::new().with("name", "x"), None, &[]).unwrap(), 0);
        assert_eq!(provider.delete(&unknown, None, &[]).unwrap(), 0);
        assert_eq!(provider.delete(&ContentUri::new("elsewhere", "book"), None, &[]).unwrap(), 0);

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        let count = provider.handle().with_store(|s| s.count("book")).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_row_uri_does_not_route() {
        let (provider, fired) = provider();
        let row = provider
            .insert(&uri("book"), &RowValues::new().with("id", 5).with("name", "Linux"))
            .unwrap()
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        assert_eq!(provider.delete(&row, None, &[]).unwrap(), 0);
        assert_eq!(provider.update(&row, &RowValues::new().with("name", "x"), None, &[]).unwrap(), 0);
        assert_eq!(provider.query(&row, None, None, &[], None).unwrap(), None);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let count = provider.handle().with_store(|s| s.count("book")).unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_malformed_values_propagate_without_notifying() {
        let (provider, fired) = provider();
        let err = provider
            .insert(&uri("book"), &RowValues::new().with("pages", 10))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRowValues(_)));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_store_unavailable_propagates() {
        let provider = ContentProvider::new(
            RoutingTable::demo(DEFAULT_AUTHORITY),
            ConnectionHandle::new(Box::new(|| -> Result<crate::storage::SqliteStore> {
                Err(Error::StoreUnavailable("not provisioned".to_string()))
            })),
            Arc::new(ChangeNotifier::new()),
        );

        let err = provider.query(&uri("book"), None, None, &[], None).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));

        // unrecognized URIs never touch the store
        assert_eq!(provider.delete(&uri("unknown"), None, &[]).unwrap(), 0);
    }

    #[test]
    fn test_get_type_is_unspecified() {
        let (provider, _) = provider();
        assert_eq!(provider.get_type(&uri("book")), None);
    }
}
