use std::{
    error,
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use super::{
    super::settings::{Settings, SettingsError},
    definitions::DefinitionError,
    map::MapError,
    ColorIndex, Localization, ProvinceMap, ProvinceSetup, RecordSet,
};

/// An error that occurred while loading the province setup
#[derive(Debug)]
pub enum SetupError {
    /// The configured setup path is missing or not a directory
    NotADirectory(PathBuf),
    /// A file couldn't be read
    IOError(PathBuf, io::Error),
    DefinitionError(DefinitionError),
    MapError(MapError),
    SettingsError(SettingsError),
}

impl From<DefinitionError> for SetupError {
    fn from(e: DefinitionError) -> Self {
        SetupError::DefinitionError(e)
    }
}

impl From<MapError> for SetupError {
    fn from(e: MapError) -> Self {
        SetupError::MapError(e)
    }
}

impl From<SettingsError> for SetupError {
    fn from(e: SettingsError) -> Self {
        SetupError::SettingsError(e)
    }
}

impl Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::NotADirectory(path) => write!(
                f,
                "the province setup path {} is not a valid directory",
                path.display()
            ),
            SetupError::IOError(path, e) => {
                write!(f, "unable to read {}: {}", path.display(), e)
            }
            SetupError::DefinitionError(e) => Display::fmt(e, f),
            SetupError::MapError(e) => {
                write!(f, "error occurred while loading the province map: {}", e)
            }
            SetupError::SettingsError(e) => Display::fmt(e, f),
        }
    }
}

impl error::Error for SetupError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            SetupError::NotADirectory(_) => None,
            SetupError::IOError(_, e) => Some(e),
            SetupError::DefinitionError(e) => Some(e),
            SetupError::MapError(e) => Some(e),
            SetupError::SettingsError(e) => Some(e),
        }
    }
}

/// A loader for the province setup.
/// Script files can be fed one at a time, so that the caller may report progress.
pub struct SetupLoader<'a> {
    settings: &'a Settings,
    load_map: bool,
    records: RecordSet,
}

impl<'a> SetupLoader<'a> {
    /// Create a new loader. Fails right away if the setup directory is not
    /// a directory, before anything is parsed.
    pub fn new(settings: &'a Settings, load_map: bool) -> Result<Self, SetupError> {
        if !settings.path_to_province_setup.is_dir() {
            return Err(SetupError::NotADirectory(
                settings.path_to_province_setup.clone(),
            ));
        }
        Ok(SetupLoader {
            settings,
            load_map,
            records: RecordSet::new(settings.parser_config()),
        })
    }

    /// Lists the script files of the setup directory, sorted by name
    pub fn script_files(&self) -> Result<Vec<PathBuf>, SetupError> {
        let dir = &self.settings.path_to_province_setup;
        let entries = fs::read_dir(dir).map_err(|e| SetupError::IOError(dir.clone(), e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SetupError::IOError(dir.clone(), e))?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Reads and parses a single script file
    pub fn add_script_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SetupError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| SetupError::IOError(path.to_owned(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.records.add_file(name, &contents);
        Ok(())
    }

    /// Loads the color table, localization and optionally the map
    pub fn finalize(self) -> Result<ProvinceSetup, SetupError> {
        let settings = self.settings;
        let colors = ColorIndex::load(&settings.definition_path)?;
        if let Some(max) = self.records.max_id() {
            if colors.len() < max as usize {
                warn!(
                    "the color table has {} rows, but the highest province id is {}",
                    colors.len(),
                    max
                );
            }
        }
        let localization = Localization::load(
            &settings.localization_path,
            &settings.localization_prefix,
        )
        .map_err(|e| SetupError::IOError(settings.localization_path.clone(), e))?;
        let map = if self.load_map {
            Some(ProvinceMap::open(&settings.province_map_path)?)
        } else {
            None
        };
        info!(
            "loaded {} provinces from {} files",
            self.records.len(),
            self.records.files().len()
        );
        debug!("{} province names", localization.len());
        Ok(ProvinceSetup {
            records: self.records,
            colors,
            localization,
            map,
        })
    }
}

impl ProvinceSetup {
    /// Loads everything the settings point to in one go
    pub fn load(settings: &Settings, load_map: bool) -> Result<Self, SetupError> {
        let mut loader = SetupLoader::new(settings, load_map)?;
        for file in loader.script_files()? {
            loader.add_script_file(file)?;
        }
        loader.finalize()
    }
}
