use anyhow::Result;
use bpaf::Bpaf;
use mtg_catalog::CatalogClient;
use tracing::instrument;

use super::Output;

#[derive(Debug, Bpaf, Clone)]
pub struct Card {
    /// Catalog id or multiverse id of the card
    #[bpaf(positional("id"))]
    pub id: String,
}

impl Card {
    #[instrument(name = "card", skip_all, fields(id = %self.id))]
    pub fn handle(self, client: &CatalogClient, output: Output) -> Result<()> {
        let card = client.card(&self.id)?;
        output.single(&card)
    }
}

#[derive(Debug, Bpaf, Clone)]
pub struct Set {
    /// Set code, e.g. 'KTK'
    #[bpaf(positional("code"))]
    pub code: String,
}

impl Set {
    #[instrument(name = "set", skip_all, fields(code = %self.code))]
    pub fn handle(self, client: &CatalogClient, output: Output) -> Result<()> {
        let set = client.set(&self.code)?;
        output.single(&set)
    }
}

#[derive(Debug, Bpaf, Clone)]
pub struct Booster {
    /// Set code, e.g. 'KTK'
    #[bpaf(positional("code"))]
    pub code: String,
}

impl Booster {
    #[instrument(name = "booster", skip_all, fields(code = %self.code))]
    pub fn handle(self, client: &CatalogClient, output: Output) -> Result<()> {
        let cards = client.booster(&self.code)?;
        output.list(&cards)
    }
}
