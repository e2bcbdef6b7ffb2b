//! Catalog entity types.
//!
//! These types mirror the JSON documents served by the catalog.
//! Every field is optional on the wire,
//! missing and `null` values decode to `None`, empty collections or `false`.

use std::fmt::Display;

use derive_more::{Deref, Display as DisplayDerive, From};
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};

/// Decode an explicit `null` as the default value of the field.
///
/// `#[serde(default)]` only covers missing fields,
/// the catalog also sends `null` for empty lists and unset numbers.
fn default_on_null<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Deserialize::deserialize(d).map(|x: Option<T>| x.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

/// Code identifying a set, e.g. `KTK`.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    DisplayDerive,
    From,
    Deref,
)]
#[serde(transparent)]
pub struct SetCode(String);

impl SetCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl AsRef<str> for SetCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SetCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// One slot of a booster pack.
///
/// The catalog sends either a single card kind (`"rare"`)
/// or a choice between kinds (`["rare", "mythic rare"]`).
/// Both are normalised to a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref)]
#[serde(from = "BoosterSlotRepr", into = "Vec<String>")]
pub struct BoosterSlot(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged, expecting = "a booster slot, either a string or a list of strings")]
enum BoosterSlotRepr {
    One(String),
    Many(Vec<String>),
}

impl From<BoosterSlotRepr> for BoosterSlot {
    fn from(repr: BoosterSlotRepr) -> Self {
        match repr {
            BoosterSlotRepr::One(kind) => BoosterSlot(vec![kind]),
            BoosterSlotRepr::Many(kinds) => BoosterSlot(kinds),
        }
    }
}

impl From<BoosterSlot> for Vec<String> {
    fn from(slot: BoosterSlot) -> Self {
        slot.0
    }
}

impl BoosterSlot {
    pub fn kinds(&self) -> &[String] {
        &self.0
    }
}

impl Display for BoosterSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join("|"))
    }
}

/// A printed set of cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Set {
    #[serde(deserialize_with = "default_on_null")]
    pub code: SetCode,
    #[serde(deserialize_with = "default_on_null")]
    pub name: String,
    pub block: Option<String>,
    /// Code used by Gatherer, only present if different from `code`.
    pub gatherer_code: Option<String>,
    /// Old style code used by some software,
    /// only present if different from `gatherer_code` and `code`.
    pub old_code: Option<String>,
    pub magic_cards_info_code: Option<String>,
    /// Release date (`YYYY-MM-DD`).
    /// For promo sets, the date the first card was released.
    pub release_date: Option<String>,
    /// `white`, `black` or `silver`.
    pub border: Option<String>,
    /// Kind of set: core, expansion, reprint, box, un, masters, ...
    #[serde(rename = "type", alias = "expansion")]
    pub expansion: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub online_only: bool,
    #[serde(deserialize_with = "default_on_null")]
    pub booster: Vec<BoosterSlot>,
}

impl Display for Set {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Columns that sets can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetColumn {
    Name,
    Block,
}

impl AsRef<str> for SetColumn {
    fn as_ref(&self) -> &str {
        match self {
            SetColumn::Name => "name",
            SetColumn::Block => "block",
        }
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// A ruling clarifying how a card works.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ruling {
    #[serde(deserialize_with = "default_on_null")]
    pub date: String,
    #[serde(deserialize_with = "default_on_null")]
    pub text: String,
}

/// The name of a card in another language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForeignCardName {
    #[serde(deserialize_with = "default_on_null")]
    pub name: String,
    #[serde(deserialize_with = "default_on_null")]
    pub language: String,
    pub multiverseid: Option<u64>,
}

/// Legality of a card in a format, e.g. `Legal` in `Modern`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Legality {
    #[serde(deserialize_with = "default_on_null")]
    pub format: String,
    #[serde(deserialize_with = "default_on_null")]
    pub legality: String,
}

/// A single card.
///
/// Split, flip and double-faced cards are served as one record per face,
/// `names` lists all faces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Card {
    /// Unique id of the card within the catalog.
    #[serde(deserialize_with = "default_on_null")]
    pub id: String,
    #[serde(deserialize_with = "default_on_null")]
    pub name: String,
    #[serde(deserialize_with = "default_on_null")]
    pub names: Vec<String>,
    pub mana_cost: Option<String>,
    /// Converted mana cost.
    #[serde(deserialize_with = "default_on_null")]
    pub cmc: f64,
    #[serde(deserialize_with = "default_on_null")]
    pub colors: Vec<String>,
    /// Color codes, e.g. `["R", "U"]`.
    #[serde(deserialize_with = "default_on_null")]
    pub color_identity: Vec<String>,
    /// Full type line.
    #[serde(rename = "type")]
    pub type_line: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub supertypes: Vec<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub types: Vec<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub subtypes: Vec<String>,
    pub rarity: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub set: SetCode,
    pub set_name: Option<String>,
    /// Oracle text.
    pub text: Option<String>,
    pub flavor: Option<String>,
    pub artist: Option<String>,
    /// Collector number, may contain letters.
    pub number: Option<String>,
    /// May be non-numeric, e.g. `*`.
    pub power: Option<String>,
    /// May be non-numeric, e.g. `1+*`.
    pub toughness: Option<String>,
    pub loyalty: Option<String>,
    pub layout: Option<String>,
    /// Gatherer id, missing for sets not on Gatherer.
    #[serde(rename = "multiverseid")]
    pub multiverse_id: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub variations: Vec<String>,
    pub image_url: Option<String>,
    pub watermark: Option<String>,
    pub border: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub timeshifted: bool,
    /// Vanguard only.
    pub hand: Option<i32>,
    /// Vanguard only.
    pub life: Option<i32>,
    #[serde(deserialize_with = "default_on_null")]
    pub reserved: bool,
    pub release_date: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub starter: bool,
    #[serde(deserialize_with = "default_on_null")]
    pub rulings: Vec<Ruling>,
    #[serde(deserialize_with = "default_on_null")]
    pub foreign_names: Vec<ForeignCardName>,
    #[serde(deserialize_with = "default_on_null")]
    pub printings: Vec<SetCode>,
    pub original_text: Option<String>,
    pub original_type: Option<String>,
    pub source: Option<String>,
    #[serde(deserialize_with = "default_on_null")]
    pub legalities: Vec<Legality>,
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.set)
    }
}

/// Columns that cards can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardColumn {
    Name,
    Layout,
    Cmc,
    Colors,
    ColorIdentity,
    Type,
    Supertypes,
    Types,
    Subtypes,
    Rarity,
    Set,
    SetName,
    Text,
    Flavor,
    Artist,
    Number,
    Power,
    Toughness,
    Loyalty,
    ForeignName,
    Language,
    GameFormat,
    Legality,
    MultiverseId,
    Contains,
    OrderBy,
    Random,
}

impl AsRef<str> for CardColumn {
    fn as_ref(&self) -> &str {
        match self {
            CardColumn::Name => "name",
            CardColumn::Layout => "layout",
            CardColumn::Cmc => "cmc",
            CardColumn::Colors => "colors",
            CardColumn::ColorIdentity => "colorIdentity",
            CardColumn::Type => "type",
            CardColumn::Supertypes => "supertypes",
            CardColumn::Types => "types",
            CardColumn::Subtypes => "subtypes",
            CardColumn::Rarity => "rarity",
            CardColumn::Set => "set",
            CardColumn::SetName => "setName",
            CardColumn::Text => "text",
            CardColumn::Flavor => "flavor",
            CardColumn::Artist => "artist",
            CardColumn::Number => "number",
            CardColumn::Power => "power",
            CardColumn::Toughness => "toughness",
            CardColumn::Loyalty => "loyalty",
            CardColumn::ForeignName => "foreignName",
            CardColumn::Language => "language",
            CardColumn::GameFormat => "gameFormat",
            CardColumn::Legality => "legality",
            CardColumn::MultiverseId => "multiverseid",
            CardColumn::Contains => "contains",
            CardColumn::OrderBy => "orderBy",
            CardColumn::Random => "random",
        }
    }
}
