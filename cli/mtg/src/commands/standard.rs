use anyhow::Result;
use bpaf::Bpaf;
use mtg_catalog::CatalogClient;
use tracing::{info_span, instrument};

use super::Output;
use crate::utils::message;

#[derive(Clone, Debug, Bpaf)]
pub enum Standard {
    /// List all cards legal in standard
    #[bpaf(command)]
    Cards,

    /// List the names of sets with cards legal in standard
    #[bpaf(command("set-names"))]
    SetNames,

    /// List the sets currently in the standard rotation
    #[bpaf(command)]
    Sets,
}

impl Standard {
    #[instrument(name = "standard", skip_all)]
    pub fn handle(self, client: &CatalogClient, output: Output) -> Result<()> {
        match self {
            Standard::Cards => {
                let _guard = info_span!("cards").entered();
                let cards = client.standard_cards()?;
                output.list(&cards)
            },
            Standard::SetNames => {
                let _guard = info_span!("set-names").entered();
                let names = client.standard_set_names()?;
                if output.json {
                    println!("{}", serde_json::to_string_pretty(&names)?);
                } else {
                    for (name, code) in &names {
                        println!("{name}: {code}");
                    }
                }
                Ok(())
            },
            Standard::Sets => {
                let _guard = info_span!("sets").entered();
                let sets = client.standard_sets()?;
                if sets.is_empty() && !output.json {
                    message::warning("No sets are currently legal in standard");
                    return Ok(());
                }
                output.list(&sets)
            },
        }
    }
}
