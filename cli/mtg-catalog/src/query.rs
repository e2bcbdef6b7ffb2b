//! Filtered and paginated queries against catalog collections.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::marker::PhantomData;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::client::CatalogClient;
use crate::error::CatalogClientError;
use crate::link;
use crate::types::{Card, CardColumn, Set, SetColumn};

/// Page size used by [Query::page].
pub const DEFAULT_PAGE_SIZE: u32 = 500;

const TOTAL_COUNT_HEADER: &str = "total-count";

/// An entity type served by a catalog collection endpoint.
pub trait Resource: DeserializeOwned {
    /// Columns the collection can be filtered by.
    type Column: AsRef<str>;
    /// Path of the collection below the catalog base URL.
    const PATH: &'static str;
    /// Envelope field holding a single entity.
    const SINGULAR: &'static str;
    /// Envelope field holding a list of entities.
    const PLURAL: &'static str;
}

impl Resource for Card {
    type Column = CardColumn;

    const PATH: &'static str = "cards";
    const SINGULAR: &'static str = "card";
    const PLURAL: &'static str = "cards";
}

impl Resource for Set {
    type Column = SetColumn;

    const PATH: &'static str = "sets";
    const SINGULAR: &'static str = "set";
    const PLURAL: &'static str = "sets";
}

/// Generic paginated result container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPage<T> {
    pub results: Vec<T>,
    /// Total number of entities matching the query across all pages.
    ///
    /// If the catalog doesn't report a total,
    /// this is the number of entities on this page.
    pub count: u64,
}

/// Column filters of a query, keyed by column name.
///
/// Each column holds a single value, setting a column again replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(BTreeMap<String, String>);

impl Filters {
    /// Set `column` to `value`, replacing an earlier value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// The value `column` is filtered by, if any.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// Number of filtered columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(column, value)` pairs, ordered by column name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A query over a catalog collection.
///
/// Queries are built by chaining filters and run with
/// [Query::all], [Query::page] or [Query::page_sized].
/// Running a query doesn't change its filters, so it can be run repeatedly.
///
/// ```ignore
/// let page = client
///     .sets()
///     .filter(SetColumn::Block, "Ravnica")
///     .page(1)?;
/// println!("{} of {} sets", page.results.len(), page.count);
/// ```
pub struct Query<'c, R> {
    client: &'c CatalogClient,
    filters: Filters,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Query<'_, R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client,
            filters: self.filters.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> Debug for Query<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("resource", &std::any::type_name::<R>())
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl<'c, R: Resource> Query<'c, R> {
    pub(crate) fn new(client: &'c CatalogClient) -> Self {
        Self {
            client,
            filters: Filters::default(),
            _resource: PhantomData,
        }
    }

    /// Filter `column` by `value`, replacing an earlier filter on the same column.
    pub fn filter(self, column: R::Column, value: impl Into<String>) -> Self {
        self.filter_by(column.as_ref(), value)
    }

    /// Filter by a column given by name.
    ///
    /// The name is passed to the catalog as is,
    /// unknown columns are for the catalog to reject.
    pub fn filter_by(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.set(column, value);
        self
    }

    /// Create an independent copy of this query.
    ///
    /// Filters added to the copy don't affect this query and vice versa.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Fetch all entities matching the query, following `next` links
    /// until the last page.
    ///
    /// If any page fails, the error is returned and
    /// entities of earlier pages are dropped.
    #[instrument(skip_all, fields(resource = R::PATH, filters = ?self.filters))]
    pub fn all(&self) -> Result<Vec<R>, CatalogClientError> {
        let mut results = Vec::new();
        let mut next = Some(self.url(None)?);
        let mut n_pages = 0_usize;

        while let Some(url) = next {
            let page = self.client.fetch_page::<R>(&url)?;
            n_pages += 1;
            next = next_url(&url, &page.headers)?;
            debug!(
                page = n_pages,
                n_items = page.items.len(),
                next = ?next.as_ref().map(Url::as_str),
                "received page"
            );
            results.extend(page.items);
        }

        debug!(n_pages, n_items = results.len(), "collected all pages");
        Ok(results)
    }

    /// Fetch a single page of [DEFAULT_PAGE_SIZE] entities.
    pub fn page(&self, page_number: u32) -> Result<ResultsPage<R>, CatalogClientError> {
        self.page_sized(page_number, DEFAULT_PAGE_SIZE)
    }

    /// Fetch a single page of `page_size` entities.
    ///
    /// The returned count is the total reported by the catalog.
    /// Without a reported total it falls back to the number of entities
    /// on this page, which undercounts results that span several pages.
    #[instrument(skip(self), fields(resource = R::PATH, filters = ?self.filters))]
    pub fn page_sized(
        &self,
        page_number: u32,
        page_size: u32,
    ) -> Result<ResultsPage<R>, CatalogClientError> {
        let url = self.url(Some((page_number, page_size)))?;
        let page = self.client.fetch_page::<R>(&url)?;

        let count = match total_count(&page.headers)? {
            Some(count) => count,
            None => {
                debug!("no total count reported, using page length");
                page.items.len() as u64
            },
        };

        Ok(ResultsPage {
            results: page.items,
            count,
        })
    }

    /// Build the request URL from the filters and optional paging parameters.
    ///
    /// Paging parameters replace filters of the same name.
    fn url(&self, paging: Option<(u32, u32)>) -> Result<Url, CatalogClientError> {
        let mut params = self.filters.clone();
        if let Some((page_number, page_size)) = paging {
            params
                .set("page", page_number.to_string())
                .set("pageSize", page_size.to_string());
        }

        let mut url = self.client.endpoint_url(&[R::PATH])?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }
}

/// Resolve the `next` link of a response against the URL of the page it
/// was received for.
fn next_url(current: &Url, headers: &HeaderMap) -> Result<Option<Url>, CatalogClientError> {
    link::next_link(headers)
        .map(|next| current.join(&next))
        .transpose()
        .map_err(CatalogClientError::from)
}

/// Read the total number of results reported by the catalog.
fn total_count(headers: &HeaderMap) -> Result<Option<u64>, CatalogClientError> {
    let Some(value) = headers.get(TOTAL_COUNT_HEADER) else {
        return Ok(None);
    };

    let format_error = |reason: String| CatalogClientError::Format {
        field: TOTAL_COUNT_HEADER.to_string(),
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
        reason,
    };

    value
        .to_str()
        .map_err(|e| format_error(e.to_string()))?
        .trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| format_error(e.to_string()))
}
