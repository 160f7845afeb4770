use std::{fs, io, path::Path};

use tracing::{debug, warn};

use super::super::types::{strip_bom, HashMap, ProvinceId};

/* The province name files are a tiny subset of the game's localization
'yaml'. Every line we care about looks like ` PROV12: "Roma"`, optionally
with the version digit the game likes to put after the colon. A name may also
link to another key with ` PROV13: "$PROV12$"`, those are resolved once, and
only against names that are not links themselves.
*/

/// Builds the name used when a link can't be resolved
pub fn placeholder_name(key: ProvinceId) -> String {
    format!("EMPTY LOC - {}", key)
}

/// Extracts the value from the part of a line past the colon.
/// Anything outside the outermost quotes (version digit, comment) is dropped.
fn extract_value(raw: &str) -> &str {
    let raw = raw.trim();
    match (raw.find('"'), raw.rfind('"')) {
        (Some(start), Some(end)) if start < end => &raw[start + 1..end],
        _ => raw.trim_matches('"').trim(),
    }
}

/// A line split into key and raw value, the prefix already removed
fn split_key(line: &str) -> Option<(ProvinceId, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim().parse().ok()?, value))
}

/// The province display names
#[derive(Debug, Default, Clone)]
pub struct Localization {
    names: HashMap<ProvinceId, String>,
}

impl Localization {
    /// Reads the localization file at the given path
    pub fn load<P: AsRef<Path>>(path: P, prefix: &str) -> Result<Self, io::Error> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents, prefix))
    }

    /// Parses the contents of a localization file.
    /// Lines not starting with the prefix are ignored, as are keys that
    /// aren't followed by a numeric id.
    pub fn parse(contents: &str, prefix: &str) -> Self {
        let mut names = HashMap::default();
        let mut links = Vec::new();
        for line in strip_bom(contents).lines() {
            let line = match line.trim_start().strip_prefix(prefix) {
                Some(line) => line,
                None => continue,
            };
            // links are deferred until every direct name is known
            if line.contains('$') {
                links.push(line);
                continue;
            }
            match split_key(line) {
                Some((id, value)) => {
                    names.insert(id, extract_value(value).to_owned());
                }
                None => debug!("ignoring localization line {}{}", prefix, line),
            }
        }
        let mut resolved = Vec::with_capacity(links.len());
        for line in links {
            let (id, value) = match split_key(line) {
                Some(parsed) => parsed,
                None => {
                    debug!("ignoring localization line {}{}", prefix, line);
                    continue;
                }
            };
            let target = extract_value(value)
                .trim_matches('$')
                .trim()
                .strip_prefix(prefix)
                .and_then(|k| k.trim().parse::<ProvinceId>().ok());
            let name = match target.and_then(|t| names.get(&t)) {
                Some(name) => name.clone(),
                None => {
                    warn!("province {} links to an unknown name {}", id, value.trim());
                    placeholder_name(id)
                }
            };
            resolved.push((id, name));
        }
        names.extend(resolved);
        Localization { names }
    }

    /// Gets the name of a province, if there is one
    pub fn get(&self, id: ProvinceId) -> Option<&str> {
        self.names.get(&id).map(|s| s.as_str())
    }

    /// Gets the name of a province, or a placeholder if it has none
    pub fn name_for(&self, id: ProvinceId) -> String {
        self.get(id)
            .map_or_else(|| placeholder_name(id), ToOwned::to_owned)
    }

    /// Sets the name of a province
    pub fn set_name<S: Into<String>>(&mut self, id: ProvinceId, name: S) {
        self.names.insert(id, name.into());
    }

    /// Get the number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the province ids that have a name, in ascending order
    pub fn sorted_ids(&self) -> Vec<ProvinceId> {
        let mut ids: Vec<_> = self.names.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
