//! Standard format helpers.
//!
//! Which sets are legal in standard changes with every release.
//! Card legalities come from the catalog itself,
//! the dates at which sets enter and leave standard are read from a
//! separate format-window service.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::client::CatalogClient;
use crate::error::CatalogClientError;
use crate::types::{Card, CardColumn, SetCode};

/// A set listed by the format-window service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardSet {
    pub name: String,
    pub block: Option<String>,
    pub code: Option<SetCode>,
    /// Date the set becomes legal, empty if not yet announced.
    pub enter_date: Option<String>,
    /// Date the set rotates out, empty if not yet announced.
    pub exit_date: Option<String>,
    /// Human readable estimate of the exit date, e.g. `Q4 2019`.
    pub rough_exit_date: Option<String>,
}

impl StandardSet {
    /// Whether the set is legal in standard at `now`.
    ///
    /// A set is legal once its enter date has passed,
    /// until its exit date passes.
    /// Sets without an enter date are not legal yet.
    pub fn is_legal_at(&self, now: DateTime<Utc>) -> Result<bool, CatalogClientError> {
        let Some(enter_date) = parse_date("enter_date", self.enter_date.as_deref())? else {
            return Ok(false);
        };
        if enter_date > now {
            return Ok(false);
        }

        match parse_date("exit_date", self.exit_date.as_deref())? {
            Some(exit_date) => Ok(exit_date > now),
            None => Ok(true),
        }
    }
}

impl fmt::Display for StandardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StandardSetsResponse {
    #[serde(default)]
    sets: Vec<StandardSet>,
}

impl CatalogClient {
    /// Fetch all cards that are legal in standard.
    #[instrument(skip_all)]
    pub fn standard_cards(&self) -> Result<Vec<Card>, CatalogClientError> {
        self.cards()
            .filter(CardColumn::GameFormat, "Standard")
            .filter(CardColumn::Legality, "Legal")
            .all()
    }

    /// Names of the sets with cards legal in standard, mapped to their set code.
    pub fn standard_set_names(&self) -> Result<BTreeMap<String, SetCode>, CatalogClientError> {
        let sets = self
            .standard_cards()?
            .into_iter()
            .filter_map(|card| Some((card.set_name?, card.set)))
            .collect::<BTreeMap<_, _>>();
        debug!(n_sets = sets.len(), "collected standard set names");
        Ok(sets)
    }

    /// Fetch the sets currently legal in standard from the format-window service.
    pub fn standard_sets(&self) -> Result<Vec<StandardSet>, CatalogClientError> {
        self.standard_sets_at(Utc::now())
    }

    /// Fetch the sets legal in standard at `now` from the format-window service.
    #[instrument(skip(self))]
    pub fn standard_sets_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<StandardSet>, CatalogClientError> {
        let url = Url::parse(&self.config().standard_url)?;
        let response: StandardSetsResponse = self.fetch_json(&url)?;
        let n_listed = response.sets.len();

        let mut legal = Vec::new();
        for set in response.sets {
            if set.is_legal_at(now)? {
                legal.push(set);
            }
        }

        debug!(n_listed, n_legal = legal.len(), "filtered standard sets");
        Ok(legal)
    }
}

/// Parse a date as sent by the format-window service.
///
/// Accepts RFC 3339 timestamps, timestamps without offset (taken as UTC)
/// and plain dates (midnight UTC).
/// Missing and blank values are `None`.
fn parse_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, CatalogClientError> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(date.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(date.and_utc()));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| Some(date.and_time(chrono::NaiveTime::MIN).and_utc()))
        .map_err(|e| CatalogClientError::Format {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use httpmock::MockServer;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::client::tests::client;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn set(enter_date: Option<&str>, exit_date: Option<&str>) -> StandardSet {
        StandardSet {
            name: "Test Set".to_string(),
            enter_date: enter_date.map(ToString::to_string),
            exit_date: exit_date.map(ToString::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2017, 9, 29, 0, 0, 0).unwrap();
        for value in [
            "2017-09-29T00:00:00.000",
            "2017-09-29T00:00:00",
            "2017-09-29T00:00:00Z",
            "2017-09-29T02:00:00+02:00",
            "2017-09-29",
        ] {
            assert_eq!(parse_date("date", Some(value)).unwrap(), Some(expected), "{value}");
        }
        assert_eq!(parse_date("date", None).unwrap(), None);
        assert_eq!(parse_date("date", Some("  ")).unwrap(), None);
    }

    #[test]
    fn parse_date_invalid() {
        let result = parse_date("exit_date", Some("Q4 2019"));
        assert!(
            matches!(&result, Err(CatalogClientError::Format { field, .. }) if field == "exit_date"),
            "expected Format error, found: {result:?}"
        );
    }

    #[test]
    fn legality_window() {
        let now = at(2018, 1, 1);

        // entered, no exit announced
        assert!(set(Some("2017-09-29"), None).is_legal_at(now).unwrap());
        // entered, exits later
        assert!(set(Some("2017-09-29"), Some("2019-10-04")).is_legal_at(now).unwrap());
        // rotated out
        assert!(!set(Some("2015-10-02"), Some("2017-09-29")).is_legal_at(now).unwrap());
        // not released yet
        assert!(!set(Some("2018-04-27"), None).is_legal_at(now).unwrap());
        // enter date unknown
        assert!(!set(None, None).is_legal_at(now).unwrap());
        assert!(!set(Some(""), Some("")).is_legal_at(now).unwrap());
    }

    #[test]
    fn standard_sets_filters_by_window() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/standard.json");
            then.status(200).json_body(json!({
                "deprecated": false,
                "sets": [
                    {"name": "Kaladesh", "code": "KLD", "enter_date": "2016-09-30T00:00:00.000", "exit_date": "2018-10-05T00:00:00.000"},
                    {"name": "Ixalan", "code": "XLN", "enter_date": "2017-09-29T00:00:00.000", "exit_date": null, "rough_exit_date": "Q4 2019"},
                    {"name": "Dominaria", "code": "DOM", "enter_date": null, "exit_date": null, "rough_exit_date": "Q4 2020"},
                    {"name": "Battle for Zendikar", "code": "BFZ", "enter_date": "2015-10-02T00:00:00.000", "exit_date": "2017-09-29T00:00:00.000"},
                ]
            }));
        });

        let sets = client(&server).standard_sets_at(at(2018, 1, 1)).unwrap();
        let names = sets.iter().map(|set| set.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Kaladesh", "Ixalan"]);
        assert_eq!(sets[1].code, Some(SetCode::from("XLN")));
        assert_eq!(sets[1].to_string(), "Ixalan (XLN)");
        mock.assert();
    }

    #[test]
    fn standard_sets_server_error() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/standard.json");
            then.status(503).body("unavailable");
        });

        let result = client(&server).standard_sets();
        assert!(
            matches!(&result, Err(CatalogClientError::Server { message, .. }) if message == "503 Service Unavailable"),
            "expected Server error, found: {result:?}"
        );
        mock.assert();
    }

    #[test]
    fn standard_cards_and_set_names() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.path("/cards")
                .query_param("gameFormat", "Standard")
                .query_param("legality", "Legal");
            then.status(200).json_body(json!({
                "cards": [
                    {"name": "Opt", "set": "XLN", "setName": "Ixalan"},
                    {"name": "Shock", "set": "DOM", "setName": "Dominaria"},
                    {"name": "Duress", "set": "XLN", "setName": "Ixalan"},
                    {"name": "Nameless", "set": "???"},
                ]
            }));
        });

        let names = client(&server).standard_set_names().unwrap();
        assert_eq!(
            names,
            BTreeMap::from([
                ("Dominaria".to_string(), SetCode::from("DOM")),
                ("Ixalan".to_string(), SetCode::from("XLN")),
            ])
        );
        mock.assert();
    }
}
