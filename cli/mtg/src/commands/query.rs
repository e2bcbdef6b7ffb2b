use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use mtg_catalog::{DEFAULT_PAGE_SIZE, Query, Resource};
use serde::Serialize;
use tracing::{debug, instrument};

use super::Output;
use crate::utils::message;

/// A `COLUMN=VALUE` filter given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub column: String,
    pub value: String,
}

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((column, value)) = s.split_once('=') else {
            return Err(format!("expected COLUMN=VALUE, got '{s}'"));
        };
        let column = column.trim();
        if column.is_empty() {
            return Err(format!("missing column name in '{s}'"));
        }
        Ok(FilterArg {
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Bpaf, Clone)]
pub struct QueryArgs {
    /// Filter by COLUMN=VALUE, e.g. 'set=KTK'. May be repeated.
    ///
    /// Columns are passed to the catalog as is,
    /// multiple values for a column can be separated by '|' (or) or ',' (and).
    #[bpaf(short('w'), long("where"), argument("COLUMN=VALUE"), many)]
    pub filters: Vec<FilterArg>,

    /// Fetch only page N instead of all results
    #[bpaf(long, argument("N"))]
    pub page: Option<u32>,

    /// Number of results per page, used with --page
    #[bpaf(long("page-size"), argument("N"))]
    pub page_size: Option<u32>,
}

impl QueryArgs {
    #[instrument(name = "query", skip_all, fields(resource = R::PATH))]
    pub fn handle<R>(self, query: Query<'_, R>, output: Output) -> Result<()>
    where
        R: Resource + Serialize + Display,
    {
        let query = self
            .filters
            .into_iter()
            .fold(query, |query, FilterArg { column, value }| {
                query.filter_by(column, value)
            });
        debug!(?query, "running query");

        let page_number = match (self.page, self.page_size) {
            (Some(page_number), _) => page_number,
            (None, Some(_)) => bail!("--page-size requires --page"),
            (None, None) => {
                let results = query.all()?;
                return output.list(&results);
            },
        };

        let page = query.page_sized(page_number, self.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
        output.list(&page.results)?;
        if !output.json {
            message::plain(format!(
                "page {page_number}: {} of {} results",
                page.results.len(),
                page.count
            ));
        }
        Ok(())
    }
}
