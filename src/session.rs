use std::{
    collections::{BTreeMap, BTreeSet},
    error, fs, io,
    path::Path,
};

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use super::{
    game_data::{Localization, RecordSet},
    structures::ProvinceRecord,
    types::ProvinceId,
};

#[derive(Debug, From, Display)]
pub enum SessionError {
    #[display("unable to access the edit session file: {_0}")]
    Io(io::Error),
    #[display("the edit session is malformed: {_0}")]
    Json(serde_json::Error),
}

impl error::Error for SessionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            SessionError::Json(e) => Some(e),
        }
    }
}

/// The pending changes of an editing session.
///
/// Renames and record edits are tracked independently, a province may be
/// renamed without its record being touched. Only provinces with an edited
/// record make their file eligible for rewriting.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSession {
    #[serde(default)]
    names: BTreeMap<ProvinceId, String>,
    #[serde(default)]
    provinces: BTreeMap<ProvinceId, ProvinceRecord>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a session from a json file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let contents = fs::read_to_string(path)?;
        let mut session: EditSession = serde_json::from_str(&contents)?;
        for (id, record) in session.provinces.iter_mut() {
            record.id = *id;
        }
        Ok(session)
    }

    /// Writes the session to a json file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Renames a province
    pub fn set_name<S: Into<String>>(&mut self, id: ProvinceId, name: S) {
        self.names.insert(id, name.into());
    }

    /// Stores the new state of a province, replacing any earlier edit.
    /// The record is filed under `id` whatever id it carries.
    pub fn mark_edited(&mut self, id: ProvinceId, mut record: ProvinceRecord) {
        record.id = id;
        self.provinces.insert(id, record);
    }

    pub fn is_edited(&self, id: ProvinceId) -> bool {
        self.provinces.contains_key(&id)
    }

    /// The ids of the provinces with an edited record, ascending
    pub fn edited_ids(&self) -> BTreeSet<ProvinceId> {
        self.provinces.keys().copied().collect()
    }

    /// Gets the edited record of a province
    pub fn edited(&self, id: ProvinceId) -> Option<&ProvinceRecord> {
        self.provinces.get(&id)
    }

    /// Iterates over the edited records, ascending by id
    pub fn edits(&self) -> impl Iterator<Item = (ProvinceId, &ProvinceRecord)> {
        self.provinces.iter().map(|(id, record)| (*id, record))
    }

    /// Iterates over the renamed provinces and their new names
    pub fn renames(&self) -> impl Iterator<Item = (ProvinceId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// The current name of a province, the session's name taking precedence
    pub fn name_for(&self, id: ProvinceId, localization: &Localization) -> String {
        match self.names.get(&id) {
            Some(name) => name.clone(),
            None => localization.name_for(id),
        }
    }

    /// The current state of a province, the edited record if there is one
    pub fn record_for(&self, id: ProvinceId, records: &RecordSet) -> Option<ProvinceRecord> {
        match self.provinces.get(&id) {
            Some(record) => Some(ProvinceRecord {
                id,
                ..record.clone()
            }),
            None => records.record_for(id),
        }
    }

    /// Returns true if the session holds no changes at all
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.provinces.is_empty()
    }
}
