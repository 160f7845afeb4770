use image::Rgb;

/// A submodule that reads the province color table.
mod definitions;
pub use definitions::{ColorDefinition, ColorIndex, DefinitionError};

mod map;
pub use map::{MapError, ProvinceMap};

mod localizer;
pub use localizer::{placeholder_name, Localization};

/// A submodule holding the parsed setup files.
mod records;
pub use records::{RecordSet, SourceFile};

mod loader;
pub use loader::{SetupError, SetupLoader};

use super::{structures::ProvinceRecord, types::ProvinceId};

/// Everything loaded from the game files, the base the edits are made against.
pub struct ProvinceSetup {
    records: RecordSet,
    colors: ColorIndex,
    localization: Localization,
    map: Option<ProvinceMap>,
}

impl ProvinceSetup {
    /// Gets the record of a province as it was loaded
    pub fn record_for(&self, id: ProvinceId) -> Option<ProvinceRecord> {
        self.records.record_for(id)
    }

    /// Looks up the province painted in the given color
    pub fn id_for_color(&self, rgb: Rgb<u8>) -> Option<ProvinceId> {
        self.colors.id_for_color(rgb)
    }

    /// Finds the province under a pixel of the province map.
    /// Returns [None] if the map wasn't loaded.
    pub fn province_at(&self, x: u32, y: u32) -> Option<ProvinceId> {
        self.map.as_ref()?.province_at(x, y, &self.colors)
    }

    /// Gets the loaded name of a province, or a placeholder
    pub fn name_for(&self, id: ProvinceId) -> String {
        self.localization.name_for(id)
    }

    pub fn get_records(&self) -> &RecordSet {
        &self.records
    }

    pub fn get_colors(&self) -> &ColorIndex {
        &self.colors
    }

    pub fn get_localization(&self) -> &Localization {
        &self.localization
    }

    pub fn get_map(&self) -> Option<&ProvinceMap> {
        self.map.as_ref()
    }
}
