use std::{error, fs, io, path::Path};

use csv::ReaderBuilder;
use derive_more::Display;
use image::Rgb;
use tracing::{debug, warn};

use super::super::types::{strip_bom, HashMap, ProvinceId};

/// The number of lines preceding the first province row.
/// The game's table carries a column header and a row for the null province.
const HEADER_LINES: usize = 2;

/// An error that occurred while loading the color definition table.
/// Any such error aborts the load, no partial table is ever built.
#[derive(Debug, Display)]
pub enum DefinitionError {
    #[display("unable to read the definition table: {_0}")]
    Io(io::Error),
    #[display("the definition table is not valid csv: {_0}")]
    Csv(csv::Error),
    #[display("row on line {line} of the definition table is malformed: {reason}")]
    MalformedRow { line: u64, reason: String },
}

impl From<io::Error> for DefinitionError {
    fn from(e: io::Error) -> Self {
        DefinitionError::Io(e)
    }
}

impl From<csv::Error> for DefinitionError {
    fn from(e: csv::Error) -> Self {
        DefinitionError::Csv(e)
    }
}

impl error::Error for DefinitionError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DefinitionError::Io(e) => Some(e),
            DefinitionError::Csv(e) => Some(e),
            DefinitionError::MalformedRow { .. } => None,
        }
    }
}

/// A single row of the color definition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDefinition {
    pub id: ProvinceId,
    pub rgb: Rgb<u8>,
}

/// Parses the `id;r;g;b` prefix of a row, trailing columns are ignored
fn parse_row<'a, I: Iterator<Item = &'a str>>(
    mut fields: I,
    line: u64,
) -> Result<ColorDefinition, DefinitionError> {
    let mut next = |name: &'static str| {
        fields
            .next()
            .map(str::trim)
            .ok_or_else(|| DefinitionError::MalformedRow {
                line,
                reason: format!("missing the {} column", name),
            })
    };
    let id = next("id")?;
    let r = next("red")?;
    let g = next("green")?;
    let b = next("blue")?;
    let malformed = |value: &str| DefinitionError::MalformedRow {
        line,
        reason: format!("{:?} is not a valid number", value),
    };
    Ok(ColorDefinition {
        id: id.parse().map_err(|_| malformed(id))?,
        rgb: Rgb([
            r.parse().map_err(|_| malformed(r))?,
            g.parse().map_err(|_| malformed(g))?,
            b.parse().map_err(|_| malformed(b))?,
        ]),
    })
}

/// The province color table, together with the reverse color lookup.
/// Immutable once loaded.
pub struct ColorIndex {
    entries: Vec<ColorDefinition>,
    by_color: HashMap<Rgb<u8>, ProvinceId>,
}

impl ColorIndex {
    /// Loads the table from a `definition.csv` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parses the contents of a `definition.csv` file.
    ///
    /// The first province row is read by hand before the csv reader takes
    /// over the body, as the reader consumes that very row as its header.
    pub fn parse(contents: &str) -> Result<Self, DefinitionError> {
        let mut body = strip_bom(contents);
        for _ in 0..HEADER_LINES {
            body = body.split_once('\n').map_or("", |(_, rest)| rest);
        }
        let mut entries = Vec::new();
        let first = body
            .lines()
            .enumerate()
            .find(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));
        if let Some((offset, first)) = first {
            let line = (HEADER_LINES + offset + 1) as u64;
            entries.push(parse_row(first.split(';'), line)?);
            let mut rdr = ReaderBuilder::new()
                .comment(Some(b'#'))
                .flexible(true)
                .has_headers(true)
                .delimiter(b';')
                .from_reader(body.as_bytes());
            for record in rdr.records() {
                let record = record?;
                let line = record
                    .position()
                    .map_or(0, |p| p.line() + HEADER_LINES as u64);
                entries.push(parse_row(record.iter(), line)?);
            }
        }
        let mut by_color = HashMap::default();
        for entry in entries.iter() {
            if let Some(existing) = by_color.get(&entry.rgb) {
                warn!(
                    "province {} shares its color with province {}, lookups resolve to {}",
                    entry.id, existing, existing
                );
                continue;
            }
            by_color.insert(entry.rgb, entry.id);
        }
        debug!("loaded {} province colors", entries.len());
        Ok(ColorIndex { entries, by_color })
    }

    /// Looks up the province with the given color
    pub fn id_for_color(&self, rgb: Rgb<u8>) -> Option<ProvinceId> {
        self.by_color.get(&rgb).copied()
    }

    /// Gets the color of the given province.
    /// Province `n` is expected at position `n - 1` of the table, when it is
    /// not the table is searched instead.
    pub fn color_for_id(&self, id: ProvinceId) -> Option<Rgb<u8>> {
        let index = (id as usize).checked_sub(1)?;
        match self.entries.get(index) {
            Some(entry) if entry.id == id => Some(entry.rgb),
            _ => self.entries.iter().find(|e| e.id == id).map(|e| e.rgb),
        }
    }

    /// Get the number of rows in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the rows, in table order
    pub fn iter(&self) -> impl Iterator<Item = &ColorDefinition> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const TABLE: &str = "province;red;green;blue;x;x\n0;0;0;0;x;x\n1;42;3;128;Roma;x\n2;84;6;1;Latium;x\n3;126;9;129;x;x\n";

    #[test]
    fn test_table() {
        let index = ColorIndex::parse(TABLE).unwrap();
        assert_eq!(index.len(), 3);
        for entry in index.iter() {
            assert_eq!(index.id_for_color(entry.rgb), Some(entry.id));
            assert_eq!(index.color_for_id(entry.id), Some(entry.rgb));
        }
        // the null province is part of the header
        assert_eq!(index.id_for_color(Rgb([0, 0, 0])), None);
        assert_eq!(index.color_for_id(0), None);
        assert_eq!(index.color_for_id(4), None);
    }

    #[test]
    fn test_first_row_is_kept() {
        let index = ColorIndex::parse(TABLE).unwrap();
        assert_eq!(index.iter().next().unwrap().id, 1);
        assert_eq!(index.id_for_color(Rgb([42, 3, 128])), Some(1));
    }

    #[test]
    fn test_scenario_row() {
        let mut table = String::from("province;red;green;blue\n0;0;0;0\n");
        for i in 1..12 {
            table.push_str(&format!("{};{};0;0\n", i, i));
        }
        table.push_str("12;200;40;40\n");
        let index = ColorIndex::parse(&table).unwrap();
        assert_eq!(index.id_for_color(Rgb([200, 40, 40])), Some(12));
        assert_eq!(index.color_for_id(12), Some(Rgb([200, 40, 40])));
    }

    #[test]
    fn test_out_of_order_table() {
        let index = ColorIndex::parse("h\nh\n5;1;2;3\n2;4;5;6\n").unwrap();
        assert_eq!(index.color_for_id(2), Some(Rgb([4, 5, 6])));
        assert_eq!(index.color_for_id(5), Some(Rgb([1, 2, 3])));
    }

    #[test]
    fn test_malformed_row() {
        let result = ColorIndex::parse("h\nh\n1;1;2;3\n2;x;5;6\n");
        assert!(matches!(
            result,
            Err(DefinitionError::MalformedRow { line: 4, .. })
        ));
        let result = ColorIndex::parse("h\nh\n1;1;2;300\n");
        assert!(matches!(
            result,
            Err(DefinitionError::MalformedRow { line: 3, .. })
        ));
        let result = ColorIndex::parse("h\nh\n1;1;2;3\n2;1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty() {
        let index = ColorIndex::parse("province;red;green;blue\n").unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_duplicate_color() {
        let index = ColorIndex::parse("h\nh\n1;1;1;1\n2;1;1;1\n").unwrap();
        assert_eq!(index.id_for_color(Rgb([1, 1, 1])), Some(1));
        assert_eq!(index.color_for_id(2), Some(Rgb([1, 1, 1])));
    }

    #[test]
    fn test_load() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();
        let index = ColorIndex::load(file.path()).unwrap();
        assert_eq!(index.len(), 3);
        assert!(matches!(
            ColorIndex::load("/nonexistent/definition.csv"),
            Err(DefinitionError::Io(_))
        ));
    }
}
