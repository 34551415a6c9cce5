use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// Anything usable as an option identifier.
pub trait OptionId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Debug + Send + Sync + 'static> OptionId for T {}

/// One search result: an id plus the text shown and matched against.
///
/// Decodes from `label` or, as the REST API sends for venues, artists and
/// tags, `name`. When both are present `label` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RawOption<Id>",
    bound(deserialize = "Id: Deserialize<'de>")
)]
pub struct SelectOption<Id> {
    pub id: Id,
    pub label: String,
}

#[derive(Deserialize)]
struct RawOption<Id> {
    id: Id,
    label: Option<String>,
    name: Option<String>,
}

impl<Id> TryFrom<RawOption<Id>> for SelectOption<Id> {
    type Error = &'static str;

    fn try_from(raw: RawOption<Id>) -> Result<Self, Self::Error> {
        let label = raw.label.or(raw.name).ok_or("missing field `label`")?;
        Ok(Self { id: raw.id, label })
    }
}

impl<Id> SelectOption<Id> {
    pub fn new(id: Id, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}
