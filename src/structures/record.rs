use serde::{Deserialize, Serialize};

use super::super::types::ProvinceId;

/// A population entry of a province
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopEntry {
    /// The pop category, like `citizen`
    pub category: String,
    /// Empty if the pop uses the province culture
    #[serde(default)]
    pub culture: String,
    /// Empty if the pop uses the province religion
    #[serde(default)]
    pub religion: String,
    #[serde(default)]
    pub amount: i64,
}

impl PopEntry {
    pub fn new<S: Into<String>>(category: S, amount: i64) -> Self {
        PopEntry {
            category: category.into(),
            culture: String::new(),
            religion: String::new(),
            amount,
        }
    }
}

/// A `<type>_building=<count>` line of a province
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: i64,
}

impl BuildingEntry {
    pub fn new<S: Into<String>>(kind: S, count: i64) -> Self {
        BuildingEntry {
            kind: kind.into(),
            count,
        }
    }
}

/// The full editable state of a single province.
///
/// The editing frontend mutates these in place, the core only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProvinceRecord {
    #[serde(default)]
    pub id: ProvinceId,
    #[serde(default)]
    pub terrain: String,
    #[serde(default)]
    pub culture: String,
    #[serde(default)]
    pub religion: String,
    #[serde(default)]
    pub trade_goods: String,
    #[serde(default)]
    pub civilization_value: i64,
    #[serde(default)]
    pub province_rank: String,
    #[serde(default)]
    pub pops: Vec<PopEntry>,
    /// Absent when the province holds no holy site
    #[serde(default)]
    pub holy_site: Option<String>,
    #[serde(default)]
    pub buildings: Vec<BuildingEntry>,
}

impl ProvinceRecord {
    /// Creates an empty record for the given province
    pub fn new(id: ProvinceId) -> Self {
        ProvinceRecord {
            id,
            ..Default::default()
        }
    }

    /// Sets the holy site, an empty name clears it
    pub fn set_holy_site<S: Into<String>>(&mut self, holy_site: S) {
        let holy_site = holy_site.into();
        self.holy_site = if holy_site.is_empty() {
            None
        } else {
            Some(holy_site)
        };
    }

    /// Returns the holy site name, if there is one
    pub fn get_holy_site(&self) -> Option<&str> {
        self.holy_site.as_deref().filter(|s| !s.is_empty())
    }
}
