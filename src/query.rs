use crate::accessor::{ReadParams, RemoteCollection};
use crate::core::{Error, Result};
use crate::entity::{Entity, Record};
use crate::filter::Filter;
use crate::tracking::UnitOfWork;
use std::sync::Arc;
use std::time::Duration;

/// Fluent read builder over one collection.
///
/// Every method consumes the builder and returns the extended one, so a
/// partially built query can be cloned and specialised. Results are
/// registered with the unit of work the query was created from.
pub struct Query<R> {
    remote: Arc<RemoteCollection<R>>,
    tracker: UnitOfWork,
    filters: Vec<String>,
    fields: Vec<String>,
    headers: Vec<(String, String)>,
    limit: Option<usize>,
    timeout: Option<Duration>,
}

impl<R: Record> Query<R> {
    pub(crate) fn new(remote: Arc<RemoteCollection<R>>, tracker: UnitOfWork) -> Self {
        Self {
            remote,
            tracker,
            filters: Vec::new(),
            fields: Vec::new(),
            headers: Vec::new(),
            limit: None,
            timeout: None,
        }
    }

    /// Adds a comparison such as `price > 10`; compiled when the query runs.
    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filters.push(expression.into());
        self
    }

    /// Adds comma-separated field or relation selectors (`*,location.*`).
    pub fn include(mut self, selector: &str) -> Self {
        let compact: String = selector.chars().filter(|c| *c != ' ').collect();
        self.fields.extend(
            compact
                .split(',')
                .filter(|piece| !piece.is_empty())
                .map(str::to_string),
        );
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Caps the number of rows returned by [`Query::to_vec`].
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn selectors(&self) -> &[String] {
        &self.fields
    }

    pub fn expressions(&self) -> &[String] {
        &self.filters
    }

    /// Request parameters this query would send.
    pub fn params(&self) -> Result<ReadParams> {
        let filter = Filter::compile(&self.filters)?;
        Ok(ReadParams {
            filter: (!filter.is_empty()).then(|| filter.to_string()),
            fields: (!self.fields.is_empty()).then(|| self.fields.join(",")),
            limit: self.limit,
            headers: self.headers.clone(),
            timeout: self.timeout,
        })
    }

    /// All matches in remote order, each tracked. No match is not an error.
    pub async fn to_vec(self) -> Result<Vec<Entity<R>>> {
        let params = self.params()?;
        let entities = self.remote.fetch_many(&params).await?;
        self.tracker
            .register_all(entities.iter().map(Entity::as_tracked))
            .await?;
        Ok(entities)
    }

    /// First match, tracked; [`Error::EmptyResult`] when nothing matches.
    pub async fn first(self) -> Result<Entity<R>> {
        let mut params = self.params()?;
        params.limit = Some(1);
        let entity = self
            .remote
            .fetch_many(&params)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResult(R::COLLECTION.to_string()))?;
        self.tracker.register(&entity).await?;
        Ok(entity)
    }
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            remote: self.remote.clone(),
            tracker: self.tracker.clone(),
            filters: self.filters.clone(),
            fields: self.fields.clone(),
            headers: self.headers.clone(),
            limit: self.limit,
            timeout: self.timeout,
        }
    }
}

impl<R: Record> std::fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("collection", &R::COLLECTION)
            .field("filters", &self.filters)
            .field("fields", &self.fields)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::AccessorRegistry;
    use crate::models::Product;
    use crate::tracking::NoopObserver;
    use crate::transport::{Transport, TransportRequest, TransportResponse};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _request: TransportRequest) -> Result<TransportResponse> {
            Err(Error::Remote("offline".into()))
        }

        async fn ping(&self) -> Result<()> {
            Ok(())
        }
    }

    fn query() -> Query<Product> {
        let transport: Arc<dyn Transport> = Arc::new(Unreachable);
        let mut registry = AccessorRegistry::new();
        registry.register::<Product>(transport.clone());
        let registry = Arc::new(registry);
        let tracker = UnitOfWork::new(registry.clone(), Arc::new(NoopObserver));
        Query::new(registry.typed::<Product>().unwrap(), tracker)
    }

    #[test]
    fn test_include_normalises_selectors() {
        let query = query().include(" id , name,,location.* ").include("");
        assert_eq!(query.selectors(), ["id", "name", "location.*"]);
    }

    #[test]
    fn test_empty_query_omits_parameters() {
        let params = query().params().unwrap();
        assert_eq!(params.filter, None);
        assert_eq!(params.fields, None);
        assert_eq!(params.limit, None);
    }

    #[test]
    fn test_filters_merge_into_one_object() {
        let params = query()
            .filter("price > 10")
            .filter("location.code == 'de'")
            .params()
            .unwrap();
        let filter: serde_json::Value = serde_json::from_str(&params.filter.unwrap()).unwrap();
        assert_eq!(
            filter,
            serde_json::json!({"price": {"_gt": 10}, "location": {"code": {"_eq": "de"}}})
        );
    }

    #[test]
    fn test_builder_is_persistent() {
        let base = query().filter("price > 10");
        let narrowed = base.clone().filter("duration >= 30");
        assert_eq!(base.expressions().len(), 1);
        assert_eq!(narrowed.expressions().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_filter_fails_before_sending() {
        let err = query().filter("price ~ 10").to_vec().await.unwrap_err();
        assert!(matches!(err, Error::Compile { .. }));
    }
}
