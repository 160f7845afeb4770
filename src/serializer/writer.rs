use std::{
    error,
    fmt::{self, Display, Write as _},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile, PersistError};
use tracing::{debug, info};

use super::{
    super::{
        game_data::{ProvinceSetup, SourceFile},
        session::EditSession,
        settings::Settings,
    },
    ProvinceBlock,
};

/// An error that occurred while writing the output files.
/// Files written before the error stay in place.
#[derive(Debug)]
pub enum WriteError {
    CreateDir(PathBuf, io::Error),
    Write(PathBuf, io::Error),
    Persist(PersistError),
}

impl From<PersistError> for WriteError {
    fn from(e: PersistError) -> Self {
        WriteError::Persist(e)
    }
}

impl Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::CreateDir(path, e) => {
                write!(f, "unable to create the directory {}: {}", path.display(), e)
            }
            WriteError::Write(path, e) => write!(f, "unable to write {}: {}", path.display(), e),
            WriteError::Persist(e) => write!(f, "unable to move an output file in place: {}", e),
        }
    }
}

impl error::Error for WriteError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            WriteError::CreateDir(_, e) => Some(e),
            WriteError::Write(_, e) => Some(e),
            WriteError::Persist(e) => Some(e),
        }
    }
}

/// Creates a temporary file in `dir` with the permissions a plainly created
/// file would get, the umask still applies
fn temp_file(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Writes the whole file next to its destination and then moves it in place
fn write_atomic(dir: &Path, name: &str, contents: &[u8]) -> Result<PathBuf, WriteError> {
    let path = dir.join(name);
    let mut file = temp_file(dir).map_err(|e| WriteError::Write(path.clone(), e))?;
    file.write_all(contents)
        .and_then(|_| file.flush())
        .map_err(|e| WriteError::Write(path.clone(), e))?;
    file.persist(&path)?;
    Ok(path)
}

fn create_dir(dir: &Path) -> Result<(), WriteError> {
    fs::create_dir_all(dir).map_err(|e| WriteError::CreateDir(dir.to_owned(), e))
}

/// Renders every province of a setup file, in the order they were read.
/// Edited provinces come from the session, the rest are derived anew from
/// their original parse. All of them carry their current name.
pub fn render_file(setup: &ProvinceSetup, session: &EditSession, file: &SourceFile) -> String {
    let mut output = String::new();
    for id in file.provinces.iter().copied() {
        let record = match session.record_for(id, setup.get_records()) {
            Some(record) => record,
            None => continue,
        };
        let name = session.name_for(id, setup.get_localization());
        // writing into a String can't fail
        let _ = write!(output, "{}", ProvinceBlock::new(&record, &name));
    }
    output
}

/// Regenerates every setup file holding at least one edited province.
/// Other files are not written at all. Returns the paths written.
pub fn write_changed<P: AsRef<Path>>(
    setup: &ProvinceSetup,
    session: &EditSession,
    output_dir: P,
) -> Result<Vec<PathBuf>, WriteError> {
    let output_dir = output_dir.as_ref();
    let edited = session.edited_ids();
    let mut written = Vec::new();
    for file in setup.get_records().files() {
        if !file.provinces.iter().any(|id| edited.contains(id)) {
            debug!("{} has no edits, skipping", file.name);
            continue;
        }
        if written.is_empty() {
            create_dir(output_dir)?;
        }
        let contents = render_file(setup, session, file);
        written.push(write_atomic(output_dir, &file.name, contents.as_bytes())?);
        info!("wrote {}", file.name);
    }
    Ok(written)
}

/// Renders the localization file holding every known province name,
/// the session's renames applied, in ascending id order
pub fn render_localization(
    setup: &ProvinceSetup,
    session: &EditSession,
    settings: &Settings,
) -> String {
    let mut localization = setup.get_localization().clone();
    for (id, name) in session.renames() {
        localization.set_name(id, name);
    }
    let mut output = format!("\u{feff}l_{}:\n", settings.language);
    for id in localization.sorted_ids() {
        if let Some(name) = localization.get(id) {
            let _ = writeln!(
                output,
                " {}{}: \"{}\"",
                settings.localization_prefix, id, name
            );
        }
    }
    output
}

/// Writes the localization file into the output directory
pub fn write_localization<P: AsRef<Path>>(
    setup: &ProvinceSetup,
    session: &EditSession,
    settings: &Settings,
    output_dir: P,
) -> Result<PathBuf, WriteError> {
    let output_dir = output_dir.as_ref();
    create_dir(output_dir)?;
    let contents = render_localization(setup, session, settings);
    let path = write_atomic(
        output_dir,
        &settings.localization_output_name(),
        contents.as_bytes(),
    )?;
    info!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{super::super::game_data::Localization, *};

    fn setup(root: &Path) -> (Settings, ProvinceSetup) {
        let dir = root.join("setup");
        fs::create_dir(&dir).unwrap();
        fs::write(
            dir.join("a.txt"),
            "2={\n\tterrain=\"plains\"\n}\n1={\n\tterrain=\"hills\"\n\tcitizen={\n\t\tamount=\"2\"\n\t}\n}\n",
        )
        .unwrap();
        fs::write(dir.join("b.txt"), "3={\n\tterrain=\"desert\"\n}\n").unwrap();
        fs::write(root.join("definition.csv"), "h\nh\n1;1;0;0\n2;2;0;0\n3;3;0;0\n").unwrap();
        fs::write(
            root.join("names.yml"),
            "l_english:\n PROV1: \"Roma\"\n PROV2: \"Ostia\"\n PROV3: \"$PROV1$\"\n",
        )
        .unwrap();
        let mut settings = Settings::new(&dir);
        settings.pop_types = vec!["citizen".to_owned()];
        settings.definition_path = root.join("definition.csv");
        settings.localization_path = root.join("names.yml");
        let setup = ProvinceSetup::load(&settings, false).unwrap();
        (settings, setup)
    }

    #[test]
    fn test_render_file() {
        let dir = tempdir().unwrap();
        let (_, setup) = setup(dir.path());
        let mut session = EditSession::new();
        session.set_name(1, "Roma Aeterna");
        let mut record = setup.record_for(2).unwrap();
        record.terrain = "marsh".to_owned();
        session.mark_edited(2, record);
        let text = render_file(&setup, &session, &setup.get_records().files()[0]);
        // file order is kept
        assert!(text.starts_with("2={ # Ostia\n\tterrain=\"marsh\"\n"));
        // renamed but not edited
        assert!(text.contains("1={ # Roma Aeterna\n\tterrain=\"hills\"\n"));
        assert!(text.contains("\tcitizen={\n\t\tamount=\"2\"\n\t}\n"));
    }

    #[test]
    fn test_write_changed_only_touches_edited_files() {
        let dir = tempdir().unwrap();
        let (_, setup) = setup(dir.path());
        let out = dir.path().join("output");
        let mut session = EditSession::new();
        session.set_name(3, "Carthago");
        assert!(write_changed(&setup, &session, &out).unwrap().is_empty());
        assert!(!out.exists());

        let mut record = setup.record_for(3).unwrap();
        record.set_holy_site("Tanit");
        session.mark_edited(3, record);
        let written = write_changed(&setup, &session, &out).unwrap();
        assert_eq!(written, vec![out.join("b.txt")]);
        assert!(!out.join("a.txt").exists());
        let text = fs::read_to_string(out.join("b.txt")).unwrap();
        assert!(text.starts_with("3={ # Carthago\n"));
        assert!(text.contains("\tholy_site=\"Tanit\"\n"));
        // nothing but the output file is left behind
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_written_files_are_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let (settings, setup) = setup(dir.path());
        let out = dir.path().join("output");
        let mut session = EditSession::new();
        session.mark_edited(3, setup.record_for(3).unwrap());
        let written = write_changed(&setup, &session, &out).unwrap();
        let names = write_localization(&setup, &session, &settings, &out).unwrap();
        let plain = out.join("plain.txt");
        fs::write(&plain, "").unwrap();
        let mode = |path: &Path| fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&written[0]), mode(&plain));
        assert_eq!(mode(&names), mode(&plain));
    }

    #[test]
    fn test_output_dir_is_a_file() {
        let dir = tempdir().unwrap();
        let (_, setup) = setup(dir.path());
        let out = dir.path().join("blocked");
        fs::write(&out, "").unwrap();
        let mut session = EditSession::new();
        session.mark_edited(1, setup.record_for(1).unwrap());
        assert!(matches!(
            write_changed(&setup, &session, &out),
            Err(WriteError::CreateDir(..))
        ));
    }

    #[test]
    fn test_localization() {
        let dir = tempdir().unwrap();
        let (settings, setup) = setup(dir.path());
        let mut session = EditSession::new();
        session.set_name(2, "Portus");
        session.set_name(4, "Antium");
        let out = dir.path().join("output");
        let path = write_localization(&setup, &session, &settings, &out).unwrap();
        assert_eq!(path, out.join("provincenames_l_english.yml"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "\u{feff}l_english:\n PROV1: \"Roma\"\n PROV2: \"Portus\"\n PROV3: \"Roma\"\n PROV4: \"Antium\"\n"
        );
        // the written file loads back to the same names
        let loaded = Localization::parse(&text, "PROV");
        assert_eq!(loaded.get(2), Some("Portus"));
        assert_eq!(loaded.len(), 4);
    }
}
