mod lookup;
mod query;
mod standard;

use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use mtg_catalog::CatalogClient;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;

const MTG_DESCRIPTION: &str = "Query the Magic: The Gathering card catalog";

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(MTG_DESCRIPTION))]
pub struct MtgCli(#[bpaf(external(mtg_args))] pub MtgArgs);

/// Main mtg args parser
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct MtgArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Read additional configuration from FILE
    #[bpaf(long, argument("FILE"))]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[bpaf(long)]
    pub json: bool,

    #[bpaf(external(commands))]
    command: Commands,
}

impl MtgArgs {
    pub fn handle(self) -> Result<()> {
        let config = Config::parse(self.config.as_deref())?;
        debug!(catalog_url = %config.catalog_url, "using catalog");

        let client = CatalogClient::new(config.client_config())
            .context("could not create catalog client")?;
        let output = Output { json: self.json };

        match self.command {
            Commands::Cards(args) => args.handle(client.cards(), output),
            Commands::Sets(args) => args.handle(client.sets(), output),
            Commands::Card(args) => args.handle(&client, output),
            Commands::Set(args) => args.handle(&client, output),
            Commands::Booster(args) => args.handle(&client, output),
            Commands::Standard(args) => args.handle(&client, output),
        }
    }
}

#[derive(Bpaf, Clone, Debug)]
enum Commands {
    /// List cards matching filters
    #[bpaf(command)]
    Cards(#[bpaf(external(query::query_args))] query::QueryArgs),

    /// List sets matching filters
    #[bpaf(command)]
    Sets(#[bpaf(external(query::query_args))] query::QueryArgs),

    /// Show a single card by id or multiverse id
    #[bpaf(command)]
    Card(#[bpaf(external(lookup::card))] lookup::Card),

    /// Show a single set by code
    #[bpaf(command)]
    Set(#[bpaf(external(lookup::set))] lookup::Set),

    /// Open a random booster of a set
    #[bpaf(command)]
    Booster(#[bpaf(external(lookup::booster))] lookup::Booster),

    /// Show what is legal in the standard format
    #[bpaf(command)]
    Standard(#[bpaf(external(standard::standard))] standard::Standard),
}

/// How results are written to stdout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Output {
    json: bool,
}

impl Output {
    /// Print a list of entities, one line each or as a JSON array.
    pub(crate) fn list<T: Serialize + Display>(&self, items: &[T]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(items)?);
        } else {
            for item in items {
                println!("{item}");
            }
        }
        Ok(())
    }

    /// Print a single entity.
    pub(crate) fn single<T: Serialize + Display>(&self, item: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(item)?);
        } else {
            println!("{item}");
        }
        Ok(())
    }
}
