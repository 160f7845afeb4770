use std::{
    error, fs, io,
    path::{Path, PathBuf},
};

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use super::{parser::ParserConfig, structures::ProvinceRecord};

fn default_definition_path() -> PathBuf {
    PathBuf::from("definition.csv")
}

fn default_localization_path() -> PathBuf {
    PathBuf::from("provincenames.yml")
}

fn default_province_map_path() -> PathBuf {
    PathBuf::from("provinces.png")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output")
}

fn default_localization_prefix() -> String {
    "PROV".to_owned()
}

fn default_language() -> String {
    "english".to_owned()
}

fn default_building_suffixes() -> Vec<String> {
    vec!["_building".to_owned()]
}

fn default_extra_keys() -> Vec<String> {
    vec!["holy_site".to_owned()]
}

fn default_scoped_key_threshold() -> usize {
    6
}

/// A value of a province that none of the configured vocabularies knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

/// Checks a value against a vocabulary. An empty vocabulary knows everything.
fn check(found: &mut Vec<UnknownValue>, field: &'static str, vocabulary: &[String], value: &str) {
    if value.is_empty() || vocabulary.is_empty() || vocabulary.iter().any(|v| v == value) {
        return;
    }
    found.push(UnknownValue {
        field,
        value: value.to_owned(),
    });
}

/// An error that occurred while reading the settings file
#[derive(Debug, From, Display)]
pub enum SettingsError {
    #[display("unable to read settings: {_0}")]
    Io(io::Error),
    #[display("settings file is malformed: {_0}")]
    Json(serde_json::Error),
}

impl error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Json(e) => Some(e),
        }
    }
}

/// The editor settings, usually read from `settings.json`.
///
/// Application keys belonging to the graphical frontend (theme, scaling and
/// the like) may be present in the file, they are simply ignored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The directory holding the province setup script files
    pub path_to_province_setup: PathBuf,
    /// Recognized population category names. Matching is done by prefix.
    #[serde(default)]
    pub pop_types: Vec<String>,
    #[serde(default)]
    pub terrain_types: Vec<String>,
    #[serde(default)]
    pub cultures: Vec<String>,
    #[serde(default)]
    pub religions: Vec<String>,
    #[serde(default)]
    pub province_ranks: Vec<String>,
    #[serde(default)]
    pub trade_goods: Vec<String>,
    #[serde(default)]
    pub buildings: Vec<String>,
    #[serde(default = "default_definition_path")]
    pub definition_path: PathBuf,
    #[serde(default = "default_localization_path")]
    pub localization_path: PathBuf,
    #[serde(default = "default_province_map_path")]
    pub province_map_path: PathBuf,
    /// Where regenerated files are written
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// The token every province localization key starts with
    #[serde(default = "default_localization_prefix")]
    pub localization_prefix: String,
    #[serde(default = "default_language")]
    pub language: String,
    /// Key suffixes identifying building lines
    #[serde(default = "default_building_suffixes")]
    pub building_suffixes: Vec<String>,
    /// Keys that, like buildings, trail the pop blocks of a province
    #[serde(default = "default_extra_keys")]
    pub extra_keys: Vec<String>,
    /// Line position after which `culture` and `religion` are considered pop scoped
    #[serde(default = "default_scoped_key_threshold")]
    pub scoped_key_threshold: usize,
}

impl Settings {
    /// Creates settings for the given setup directory, everything else defaulted
    pub fn new<P: Into<PathBuf>>(path_to_province_setup: P) -> Self {
        Settings {
            path_to_province_setup: path_to_province_setup.into(),
            pop_types: Vec::new(),
            terrain_types: Vec::new(),
            cultures: Vec::new(),
            religions: Vec::new(),
            province_ranks: Vec::new(),
            trade_goods: Vec::new(),
            buildings: Vec::new(),
            definition_path: default_definition_path(),
            localization_path: default_localization_path(),
            province_map_path: default_province_map_path(),
            output_path: default_output_path(),
            localization_prefix: default_localization_prefix(),
            language: default_language(),
            building_suffixes: default_building_suffixes(),
            extra_keys: default_extra_keys(),
            scoped_key_threshold: default_scoped_key_threshold(),
        }
    }

    /// Reads the settings from a json file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Builds the configuration the record parser is driven by
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            pop_prefixes: self.pop_types.clone(),
            building_suffixes: self.building_suffixes.clone(),
            extra_keys: self.extra_keys.clone(),
            scoped_key_threshold: self.scoped_key_threshold,
        }
    }

    /// Lists the values of the record missing from the vocabularies
    pub fn unknown_values(&self, record: &ProvinceRecord) -> Vec<UnknownValue> {
        let mut found = Vec::new();
        check(&mut found, "terrain", &self.terrain_types, &record.terrain);
        check(&mut found, "culture", &self.cultures, &record.culture);
        check(&mut found, "religion", &self.religions, &record.religion);
        check(&mut found, "trade_goods", &self.trade_goods, &record.trade_goods);
        check(&mut found, "province_rank", &self.province_ranks, &record.province_rank);
        for pop in record.pops.iter() {
            if !self.pop_types.iter().any(|p| pop.category.starts_with(p.as_str())) {
                check(&mut found, "pop", &self.pop_types, &pop.category);
            }
            check(&mut found, "pop culture", &self.cultures, &pop.culture);
            check(&mut found, "pop religion", &self.religions, &pop.religion);
        }
        for building in record.buildings.iter() {
            check(&mut found, "building", &self.buildings, &building.kind);
        }
        found
    }

    /// The file name of the regenerated localization file
    pub fn localization_output_name(&self) -> String {
        format!("provincenames_l_{}.yml", self.language)
    }
}
