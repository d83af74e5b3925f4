use serde::Deserialize;
use std::collections::HashMap;

/// A retrieved page: id, optional icon, and its typed properties keyed by
/// display name. Only the property kinds the sync reads are modeled; every
/// other kind lands in `Property::Other` and is treated as absent.
#[derive(Deserialize, Debug, Clone)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub icon: Option<Icon>,
    #[serde(default)]
    pub properties: HashMap<String, Property>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { external: FileRef },
    File { file: FileRef },
    #[serde(other)]
    Other,
}

impl Icon {
    /// The displayable value of an icon: the emoji glyph, or the hosted
    /// file's URL for non-emoji icons. Unknown kinds carry no usable value.
    pub fn display_value(&self) -> Option<&str> {
        match self {
            Icon::Emoji { emoji } => Some(emoji),
            Icon::External { external } => Some(&external.url),
            Icon::File { file } => Some(&file.url),
            Icon::Other => None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct FileRef {
    #[serde(default)]
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    Status {
        #[serde(default)]
        status: Option<SelectOption>,
    },
    Date {
        #[serde(default)]
        date: Option<DateRange>,
    },
    Relation {
        #[serde(default)]
        relation: Vec<RelationRef>,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DateRange {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RelationRef {
    #[serde(default)]
    pub id: String,
}
