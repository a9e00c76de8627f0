// SPDX-License-Identifier: GPL-3.0-only

//! Inventory records as stored by the backend

use crate::constants;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A physical storage container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageBox {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
}

impl StorageBox {
    /// Display colour, falling back to the first palette entry
    pub fn color_or_default(&self) -> &str {
        self.color
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(constants::DEFAULT_BOX_COLOR)
    }

    /// Sum of item quantities
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| i.qty as u64).sum()
    }
}

/// One inventory entry inside a box
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub box_id: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub name: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default = "default_qty", deserialize_with = "qty_or_one")]
    pub qty: u32,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub photo_path: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_qty() -> u32 {
    1
}

/// Fields for a new box
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewBox {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewBox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Trim fields; `None` if the name is blank
    pub fn normalized(self) -> Option<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            location: non_blank(self.location),
            color: non_blank(self.color),
        })
    }
}

/// Partial update of a box; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoxUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl BoxUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.color.is_none()
    }

    pub fn apply_to(&self, target: &mut StorageBox) {
        if let Some(name) = &self.name {
            target.name = name.clone();
        }
        if let Some(location) = &self.location {
            target.location = Some(location.clone());
        }
        if let Some(color) = &self.color {
            target.color = Some(color.clone());
        }
    }
}

/// Fields for a new item, as entered by the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub note: Option<String>,
    pub qty: Option<u32>,
}

impl NewItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_qty(mut self, qty: u32) -> Self {
        self.qty = Some(qty);
        self
    }

    /// Parse a quantity field; anything that is not a positive integer is 1
    pub fn parse_qty(input: &str) -> u32 {
        input.trim().parse::<u32>().ok().filter(|q| *q >= 1).unwrap_or(1)
    }
}

/// Row written to the items table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRow {
    pub box_id: String,
    pub name: String,
    pub note: Option<String>,
    pub qty: u32,
    pub photo_url: Option<String>,
    pub photo_path: Option<String>,
}

impl ItemRow {
    /// Build a row with blank notes dropped and quantity at least 1
    pub fn new(box_id: &str, item: NewItem) -> Self {
        Self {
            box_id: box_id.to_string(),
            name: item.name.trim().to_string(),
            note: non_blank(item.note),
            qty: item.qty.filter(|q| *q >= 1).unwrap_or(1),
            photo_url: None,
            photo_path: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept both text ids (uuid) and integer ids (bigserial)
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}

/// Null text columns read as empty
fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Null, zero or negative quantities read as one
fn qty_or_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let qty = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
    Ok(u32::try_from(qty).ok().filter(|q| *q > 0).unwrap_or(1))
}
