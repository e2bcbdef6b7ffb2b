//! Blocking client for the card catalog.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::query::{Query, Resource};
use crate::types::{Card, Set};

/// A page of entities as returned by a single catalog request,
/// along with the response headers needed for depaging.
#[derive(Debug)]
pub(crate) struct FetchedPage<R> {
    pub(crate) items: Vec<R>,
    pub(crate) headers: HeaderMap,
}

/// A client for the card catalog.
///
/// Cloning is cheap, clones share a connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
    config: CatalogClientConfig,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.config.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let base_url = parse_base_url(&config.catalog_url)?;
        let client = build_http_client(&config)?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.config.catalog_url
    }

    pub fn config(&self) -> &CatalogClientConfig {
        &self.config
    }

    /// Start a query over all cards.
    pub fn cards(&self) -> Query<'_, Card> {
        Query::new(self)
    }

    /// Start a query over all sets.
    pub fn sets(&self) -> Query<'_, Set> {
        Query::new(self)
    }

    /// Fetch a single card by its id or multiverse id.
    #[instrument(skip(self))]
    pub fn card(&self, id: &str) -> Result<Card, CatalogClientError> {
        let url = self.endpoint_url(&[Card::PATH, id])?;
        let page = self.fetch_page::<Card>(&url)?;
        exactly_one("card", id, page.items)
    }

    /// Fetch a single set by its code.
    #[instrument(skip(self))]
    pub fn set(&self, code: &str) -> Result<Set, CatalogClientError> {
        let url = self.endpoint_url(&[Set::PATH, code])?;
        let page = self.fetch_page::<Set>(&url)?;
        exactly_one("set", code, page.items)
    }

    /// Generate the cards of a randomly opened booster of the given set.
    #[instrument(skip(self))]
    pub fn booster(&self, code: &str) -> Result<Vec<Card>, CatalogClientError> {
        let url = self.endpoint_url(&[Set::PATH, code, "booster"])?;
        let page = self.fetch_page::<Card>(&url)?;
        debug!(n_cards = page.items.len(), "received booster");
        Ok(page.items)
    }

    /// Build the URL of a catalog endpoint from path segments.
    ///
    /// Segments are percent encoded, so ids containing `/` or `?`
    /// can't escape their path segment.
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> Result<Url, CatalogClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogClientError::Other(format!("{} can't be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue a single GET request and decode the returned page envelope.
    #[instrument(skip_all, fields(%url))]
    pub(crate) fn fetch_page<R: Resource>(
        &self,
        url: &Url,
    ) -> Result<FetchedPage<R>, CatalogClientError> {
        let (headers, body) = self.get(url)?;
        let items = decode_envelope::<R>(&body)?;
        debug!(n_items = items.len(), "decoded page");
        Ok(FetchedPage { items, headers })
    }

    /// Fetch and decode an arbitrary JSON document.
    #[instrument(skip_all, fields(%url))]
    pub(crate) fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> Result<T, CatalogClientError> {
        let (_, body) = self.get(url)?;
        serde_json::from_slice(&body).map_err(CatalogClientError::Decode)
    }

    /// Issue a GET request and read the whole response body.
    ///
    /// The body is read to completion before anything is decoded,
    /// so the connection is released on all paths.
    /// Non-success responses are turned into [CatalogClientError::Server],
    /// any 2xx status is decoded as a page.
    fn get(&self, url: &Url) -> Result<(HeaderMap, Vec<u8>), CatalogClientError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(CatalogClientError::Transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .map_err(CatalogClientError::Transport)?
            .to_vec();
        debug!(%status, body_len = body.len(), "received response");

        if !status.is_success() {
            return Err(CatalogClientError::from_error_body(status, &body));
        }

        Ok((headers, body))
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Decode a page envelope.
///
/// Responses for single entities carry the entity in a singular field
/// (`card`), collections use a plural field (`cards`).
/// A non-null singular field takes precedence over the plural one.
pub(crate) fn decode_envelope<R: Resource>(body: &[u8]) -> Result<Vec<R>, CatalogClientError> {
    let mut envelope: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(body).map_err(CatalogClientError::Decode)?;

    match envelope.remove(R::SINGULAR) {
        Some(serde_json::Value::Null) | None => {},
        Some(single) => {
            let item = serde_json::from_value(single).map_err(CatalogClientError::Decode)?;
            return Ok(vec![item]);
        },
    }

    match envelope.remove(R::PLURAL) {
        Some(serde_json::Value::Null) | None => Ok(Vec::new()),
        Some(many) => serde_json::from_value(many).map_err(CatalogClientError::Decode),
    }
}

fn exactly_one<R>(
    resource: &'static str,
    key: &str,
    mut items: Vec<R>,
) -> Result<R, CatalogClientError> {
    if items.len() != 1 {
        return Err(CatalogClientError::NotFound {
            resource,
            key: key.to_string(),
            found: items.len(),
        });
    }
    Ok(items.remove(0))
}

/// Parse the configured base URL,
/// making sure that resource paths are joined below it.
fn parse_base_url(catalog_url: &str) -> Result<Url, CatalogClientError> {
    let mut base_url = Url::parse(catalog_url)?;
    if base_url.cannot_be_a_base() {
        return Err(CatalogClientError::Other(format!(
            "{catalog_url} can't be a base url"
        )));
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    Ok(base_url)
}

// ---------------------------------------------------------------------------
// HTTP client builder
// ---------------------------------------------------------------------------

/// Build HTTP client with the configured headers and deadlines.
fn build_http_client(config: &CatalogClientConfig) -> Result<Client, CatalogClientError> {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    for (key, value) in &config.extra_headers {
        headers.insert(
            header::HeaderName::from_str(key).map_err(
                |e: reqwest::header::InvalidHeaderName| CatalogClientError::Other(e.to_string()),
            )?,
            header::HeaderValue::from_str(value).map_err(
                |e: reqwest::header::InvalidHeaderValue| CatalogClientError::Other(e.to_string()),
            )?,
        );
    }

    debug!(
        catalog_url = %config.catalog_url,
        extra_headers = config.extra_headers.len(),
        connect_timeout = ?config.connect_timeout,
        timeout = ?config.timeout,
        "building catalog HTTP client"
    );

    let client_builder = Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout);

    let client_builder = if let Some(ref user_agent) = config.user_agent {
        client_builder.user_agent(user_agent)
    } else {
        client_builder
    };

    client_builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}

#[cfg(test)]
pub mod tests {
    use std::collections::BTreeMap;

    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;
    use crate::types::SetCode;

    pub(crate) fn client_config(url: &str) -> CatalogClientConfig {
        CatalogClientConfig {
            catalog_url: url.to_string(),
            standard_url: format!("{url}/standard.json"),
            ..Default::default()
        }
    }

    pub(crate) fn client(server: &MockServer) -> CatalogClient {
        CatalogClient::new(client_config(&server.base_url())).unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = CatalogClient::new(client_config("https://example.com/v1")).unwrap();
        let url = client.endpoint_url(&["cards", "abc"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1/cards/abc");

        let client = CatalogClient::new(client_config("https://example.com/v1/")).unwrap();
        let url = client.endpoint_url(&["sets", "KTK", "booster"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1/sets/KTK/booster");
    }

    #[test]
    fn path_segments_are_encoded() {
        let client = CatalogClient::new(client_config("https://example.com/v1/")).unwrap();
        let url = client.endpoint_url(&["cards", "a/b?c"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/v1/cards/a%2Fb%3Fc");
    }

    #[test]
    fn invalid_base_url() {
        let result = CatalogClient::new(client_config("not a url"));
        assert!(
            matches!(result, Err(CatalogClientError::InvalidUrl(_))),
            "expected InvalidUrl, found: {result:?}"
        );
    }

    #[test]
    fn invalid_extra_header() {
        let config = CatalogClientConfig {
            extra_headers: BTreeMap::from([("bad header".to_string(), "value".to_string())]),
            ..client_config("https://example.com/")
        };
        let result = CatalogClient::new(config);
        assert!(
            matches!(result, Err(CatalogClientError::Other(_))),
            "expected Other, found: {result:?}"
        );
    }

    #[test]
    fn singular_field_takes_precedence() {
        let body = json!({
            "card": {"id": "single", "name": "Single"},
            "cards": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
        });
        let cards = decode_envelope::<Card>(body.to_string().as_bytes()).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id, "single");
    }

    #[test]
    fn null_singular_falls_back_to_plural() {
        let body = json!({
            "card": null,
            "cards": [{"id": "a"}, {"id": "b"}],
        });
        let cards = decode_envelope::<Card>(body.to_string().as_bytes()).unwrap();
        let ids = cards.iter().map(|card| card.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn missing_fields_decode_to_empty() {
        let cards = decode_envelope::<Card>(b"{}").unwrap();
        assert!(cards.is_empty());
        let sets = decode_envelope::<Set>(br#"{"sets": null}"#).unwrap();
        assert!(sets.is_empty());
    }

    #[test]
    fn undecodable_envelope() {
        let bodies: [&[u8]; 3] = [b"[]", b"not json", br#"{"cards": {"id": "a"}}"#];
        for body in bodies {
            let result = decode_envelope::<Card>(body);
            assert!(
                matches!(result, Err(CatalogClientError::Decode(_))),
                "expected Decode, found: {result:?}"
            );
        }
    }

    #[test]
    fn fetch_card_by_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/cards/386616");
            then.status(200).json_body(json!({
                "card": {"id": "abc", "name": "Narset, Enlightened Master", "set": "KTK"}
            }));
        });

        let card = client(&server).card("386616").unwrap();
        assert_eq!(card.name, "Narset, Enlightened Master");
        assert_eq!(card.set, SetCode::from("KTK"));
        mock.assert();
    }

    #[test]
    fn fetch_card_not_found() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/cards/missing");
            then.status(200).json_body(json!({"cards": []}));
        });

        let result = client(&server).card("missing");
        assert!(
            matches!(&result, Err(CatalogClientError::NotFound { resource: "card", key, found: 0 }) if key == "missing"),
            "expected NotFound, found: {result:?}"
        );
        mock.assert();
    }

    #[test]
    fn fetch_set_ambiguous() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/sets/KTK");
            then.status(200).json_body(json!({
                "sets": [{"code": "KTK"}, {"code": "KTK"}]
            }));
        });

        let result = client(&server).set("KTK");
        assert!(
            matches!(result, Err(CatalogClientError::NotFound { found: 2, .. })),
            "expected NotFound, found: {result:?}"
        );
        mock.assert();
    }

    #[test]
    fn fetch_set_by_code() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/sets/KTK");
            then.status(200).json_body(json!({
                "set": {"code": "KTK", "name": "Khans of Tarkir", "booster": ["rare", "common"]}
            }));
        });

        let set = client(&server).set("KTK").unwrap();
        assert_eq!(set.to_string(), "Khans of Tarkir (KTK)");
        assert_eq!(set.booster.len(), 2);
        mock.assert();
    }

    #[test]
    fn generate_booster() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/sets/KTK/booster");
            then.status(200).json_body(json!({
                "cards": [{"name": "Mountain"}, {"name": "Abzan Guide"}, {"name": "Mountain"}]
            }));
        });

        let cards = client(&server).booster("KTK").unwrap();
        let names = cards.iter().map(|card| card.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Mountain", "Abzan Guide", "Mountain"]);
        mock.assert();
    }

    // region: Error response handling

    #[test]
    fn server_error_with_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|_, then| {
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({"status": "404", "error": "Not Found"}));
        });

        let result = client(&server).card("missing");
        match result {
            Err(CatalogClientError::Server { status, message }) => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(message, "Not Found");
            },
            other => panic!("expected Server error, found: {other:?}"),
        }
        mock.assert();
    }

    #[test]
    fn server_error_without_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|_, then| {
            then.status(404).body("<html>(╯°□°)╯︵ ┻━┻</html>");
        });

        let result = client(&server).card("missing");
        match result {
            Err(CatalogClientError::Server { message, .. }) => {
                assert_eq!(message, "404 Not Found");
            },
            other => panic!("expected Server error, found: {other:?}"),
        }
        mock.assert();
    }

    #[test]
    fn empty_success_is_a_decode_error() {
        let server = MockServer::start();
        let mock = server.mock(|_, then| {
            then.status(204);
        });

        let result = client(&server).cards().all();
        assert!(
            matches!(&result, Err(CatalogClientError::Decode(_))),
            "expected Decode error, found: {result:?}"
        );
        mock.assert();
    }

    #[test]
    fn transport_error() {
        // nothing listens on the discard port
        let client = CatalogClient::new(client_config("http://127.0.0.1:9/")).unwrap();
        let result = client.card("abc");
        assert!(
            matches!(result, Err(CatalogClientError::Transport(_))),
            "expected Transport, found: {result:?}"
        );
    }

    // endregion

    #[test]
    fn extra_headers_set_on_all_requests() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.header("mtg-test", "test-value")
                .header("mtg-test2", "test-value2");
            then.status(200).json_body(json!({"cards": []}));
        });

        let config = CatalogClientConfig {
            extra_headers: BTreeMap::from([
                ("mtg-test".to_string(), "test-value".to_string()),
                ("mtg-test2".to_string(), "test-value2".to_string()),
            ]),
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.booster("KTK");
        mock.assert();
    }

    #[test]
    fn user_agent_set_on_all_requests() {
        let expected_agent = "my-custom-user-agent";

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.header("user-agent", expected_agent);
            then.status(200).json_body(json!({"sets": []}));
        });

        let config = CatalogClientConfig {
            user_agent: Some(expected_agent.to_owned()),
            ..client_config(&server.base_url())
        };

        let client = CatalogClient::new(config).unwrap();
        let _ = client.sets().all();
        mock.assert();
    }
}
