use std::collections::BTreeMap;

use tracing::warn;

use super::super::{
    parser::{parse_file, ParsedProvince, ParserConfig},
    structures::ProvinceRecord,
    types::{strip_bom, ProvinceId},
};

/// A setup file and the provinces it holds, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// The file name, output files reuse it
    pub name: String,
    pub provinces: Vec<ProvinceId>,
}

/// A parsed province along with the file it came from
struct Stored {
    parsed: ParsedProvince,
    file: usize,
}

/// Every province parsed from the setup directory, grouped by file.
pub struct RecordSet {
    config: ParserConfig,
    files: Vec<SourceFile>,
    provinces: BTreeMap<ProvinceId, Stored>,
}

impl RecordSet {
    pub fn new(config: ParserConfig) -> Self {
        RecordSet {
            config,
            files: Vec::new(),
            provinces: BTreeMap::new(),
        }
    }

    /// Parses the contents of a setup file and adds its provinces.
    /// A province id seen before moves to the new file, its old data dropped.
    pub fn add_file<S: Into<String>>(&mut self, name: S, contents: &str) {
        let name = name.into();
        let index = self.files.len();
        let mut provinces = Vec::new();
        for parsed in parse_file(strip_bom(contents), &self.config) {
            let id = parsed.id;
            if let Some(previous) = self.provinces.insert(id, Stored { parsed, file: index }) {
                if previous.file == index {
                    warn!("province {} is defined twice in {}", id, name);
                    provinces.retain(|p| *p != id);
                } else {
                    let previous_file = &mut self.files[previous.file];
                    warn!(
                        "province {} from {} is redefined in {}",
                        id, previous_file.name, name
                    );
                    previous_file.provinces.retain(|p| *p != id);
                }
            }
            provinces.push(id);
        }
        self.files.push(SourceFile { name, provinces });
    }

    /// Gets the original parse of a province
    pub fn parsed(&self, id: ProvinceId) -> Option<&ParsedProvince> {
        self.provinces.get(&id).map(|s| &s.parsed)
    }

    /// Derives the record of a province from its original parse
    pub fn record_for(&self, id: ProvinceId) -> Option<ProvinceRecord> {
        self.parsed(id).map(|p| p.to_record(&self.config))
    }

    /// The file the province was read from
    pub fn source_file(&self, id: ProvinceId) -> Option<&SourceFile> {
        self.provinces.get(&id).map(|s| &self.files[s.file])
    }

    /// The setup files, in the order they were added
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// All province ids, ascending
    pub fn ids(&self) -> impl Iterator<Item = ProvinceId> + '_ {
        self.provinces.keys().copied()
    }

    pub fn max_id(&self) -> Option<ProvinceId> {
        self.provinces.keys().next_back().copied()
    }

    /// Get the number of provinces.
    pub fn len(&self) -> usize {
        self.provinces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }
}
