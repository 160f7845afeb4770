use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{
    super::{
        structures::{BuildingEntry, PopEntry, ProvinceRecord},
        types::ProvinceId,
    },
    blocks::block_id,
    tokens::{statements, Line, Statement},
};

/// The open vocabulary the record parser recognizes.
/// Nothing here is hardcoded, mods add pop types and buildings all the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// A key starting with any of these opens a pop block
    pub pop_prefixes: Vec<String>,
    /// A key ending with any of these is a building
    pub building_suffixes: Vec<String>,
    /// Keys that trail the pop blocks alongside buildings
    pub extra_keys: Vec<String>,
    /// `culture` and `religion` past this line position are pop scoped
    pub scoped_key_threshold: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            pop_prefixes: Vec::new(),
            building_suffixes: vec!["_building".to_owned()],
            extra_keys: vec!["holy_site".to_owned()],
            scoped_key_threshold: 6,
        }
    }
}

impl ParserConfig {
    /// Creates the default config with the given pop categories
    pub fn with_pop_types<I: IntoIterator<Item = S>, S: Into<String>>(pop_types: I) -> Self {
        ParserConfig {
            pop_prefixes: pop_types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    fn opens_pop(&self, key: &str) -> bool {
        self.pop_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    fn is_pop_category(&self, key: &str) -> bool {
        self.pop_prefixes.iter().any(|p| p == key)
    }

    fn is_building(&self, key: &str) -> bool {
        self.building_suffixes
            .iter()
            .any(|s| key.ends_with(s.as_str()))
    }

    fn is_extra(&self, key: &str) -> bool {
        self.extra_keys.iter().any(|k| k == key) || self.is_building(key)
    }
}

/// The value of a parsed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryValue {
    Scalar(String),
    /// The key value pairs inside a pop block
    Pop(Vec<(String, String)>),
}

/// A single key of a province block, in the order the parser produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: EntryValue,
}

impl Entry {
    fn scalar(key: &str, value: &str) -> Self {
        Entry {
            key: key.to_owned(),
            value: EntryValue::Scalar(value.to_owned()),
        }
    }
}

/// Which of the two orderings the partition pass settled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ordering {
    /// A pop category was found at the given entry. Everything after it was
    /// rebuilt as pops followed by holy site and building entries, other
    /// scalars trailing the last pop are not kept.
    Reordered { last_pop: usize },
    /// No pop category was found, the entries are in source order
    Unordered,
}

/// The result of parsing a single province block.
/// This is the "original parse" of a province, from which a
/// [ProvinceRecord] can be derived any number of times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedProvince {
    pub id: ProvinceId,
    pub entries: Vec<Entry>,
    pub ordering: Ordering,
}

/// Collects the key value pairs of the pop block opened at `open`
fn collect_pop(lines: &[Line], open: usize) -> Vec<(String, String)> {
    let mut depth = 1usize;
    let mut data = Vec::new();
    for line in &lines[open + 1..] {
        match &line.statement {
            Statement::Open(_) => depth += 1,
            Statement::Close => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            Statement::Pair(key, value) => {
                if depth == 1 {
                    data.push((key.clone(), value.clone()));
                }
            }
            Statement::Other(_) => {}
        }
    }
    data
}

/// Parses the text of a single province block.
/// Returns [None] if the block does not start with a province id, or if
/// the game's reader can't tokenize it, like with an unterminated quote.
///
/// The scalar pass visits every statement of the block, including those
/// already consumed into a pop block. The `amount` rule and the line position
/// threshold for `culture` and `religion` are what keep pop internals out of
/// the province scalars.
pub fn parse_block(block: &str, config: &ParserConfig) -> Option<ParsedProvince> {
    let id = block_id(block)?;
    let id_str = id.to_string();
    let lines = match statements(block) {
        Ok(lines) => lines,
        Err(e) => {
            warn!("province {} can't be tokenized, skipping it: {}", id, e);
            return None;
        }
    };
    let mut entries = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        match &line.statement {
            Statement::Open(key) if config.opens_pop(key) => {
                entries.push(Entry {
                    key: key.clone(),
                    value: EntryValue::Pop(collect_pop(&lines, i)),
                });
            }
            Statement::Pair(key, value) => {
                let key = key.as_str();
                if key.starts_with(id_str.as_str()) || key == "amount" {
                    continue;
                }
                if (key == "culture" || key == "religion")
                    && line.position > config.scoped_key_threshold
                {
                    continue;
                }
                entries.push(Entry::scalar(key, value));
            }
            _ => {}
        }
    }
    Some(partition(id, entries, config))
}

/// Moves pops, holy sites and buildings after the last pop to the end
fn partition(id: ProvinceId, entries: Vec<Entry>, config: &ParserConfig) -> ParsedProvince {
    let last_pop = entries
        .iter()
        .rposition(|e| config.is_pop_category(&e.key));
    match last_pop {
        Some(last_pop) => {
            let mut reordered: Vec<Entry> = entries[..last_pop].to_vec();
            let tail = &entries[last_pop..];
            reordered.extend(
                tail.iter()
                    .filter(|e| config.is_pop_category(&e.key))
                    .cloned(),
            );
            reordered.extend(tail.iter().filter(|e| config.is_extra(&e.key)).cloned());
            ParsedProvince {
                id,
                entries: reordered,
                ordering: Ordering::Reordered { last_pop },
            }
        }
        None => ParsedProvince {
            id,
            entries,
            ordering: Ordering::Unordered,
        },
    }
}

/// Parses a count, falling back to zero on garbage
fn parse_count(id: ProvinceId, key: &str, value: &str) -> i64 {
    if value.is_empty() {
        return 0;
    }
    match value.parse() {
        Ok(count) => count,
        Err(_) => {
            warn!("province {}: {} has a non numeric value {:?}", id, key, value);
            0
        }
    }
}

impl ParsedProvince {
    /// Derives the structured record from the parsed entries.
    /// Later occurrences of a scalar key override earlier ones.
    pub fn to_record(&self, config: &ParserConfig) -> ProvinceRecord {
        let mut record = ProvinceRecord::new(self.id);
        for entry in self.entries.iter() {
            match &entry.value {
                EntryValue::Pop(data) => {
                    let field = |name: &str| {
                        data.iter()
                            .find(|(k, _)| k == name)
                            .map(|(_, v)| v.as_str())
                            .unwrap_or_default()
                    };
                    record.pops.push(PopEntry {
                        category: entry.key.clone(),
                        culture: field("culture").to_owned(),
                        religion: field("religion").to_owned(),
                        amount: parse_count(self.id, "amount", field("amount")),
                    });
                }
                EntryValue::Scalar(value) => {
                    if config.is_building(&entry.key) {
                        record.buildings.push(BuildingEntry {
                            kind: entry.key.clone(),
                            count: parse_count(self.id, &entry.key, value),
                        });
                        continue;
                    }
                    match entry.key.as_str() {
                        "terrain" => record.terrain = value.clone(),
                        "culture" => record.culture = value.clone(),
                        "religion" => record.religion = value.clone(),
                        "trade_goods" => record.trade_goods = value.clone(),
                        "province_rank" => record.province_rank = value.clone(),
                        "civilization_value" => {
                            record.civilization_value =
                                parse_count(self.id, "civilization_value", value)
                        }
                        "holy_site" => record.set_holy_site(value.as_str()),
                        _ => {}
                    }
                }
            }
        }
        record
    }

    /// Returns the keys of the entries, in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ParserConfig {
        ParserConfig::with_pop_types(["nobles", "citizen", "freemen", "slaves"])
    }

    const ROMA: &str = "1={ # Roma
\tterrain=\"plains\"
\tculture=\"roman\"
\treligion=\"roman_pantheon\"
\ttrade_goods=\"grain\"
\tcivilization_value=45
\tbarbarian_power=0
\tprovince_rank=\"city_metropolis\"
\tcitizen={
\t\tamount=\"10\"
\t}
\tslaves={
\t\tculture=\"greek\"
\t\treligion=\"hellenic\"
\t\tamount=\"4\"
\t}
\tholy_site=\"Capitolium\"
\tport_building=2
\ttown_hall_building=1
}";

    #[test]
    fn test_full_province() {
        let parsed = parse_block(ROMA, &config()).unwrap();
        assert_eq!(parsed.id, 1);
        assert!(matches!(parsed.ordering, Ordering::Reordered { .. }));
        let record = parsed.to_record(&config());
        assert_eq!(record.terrain, "plains");
        assert_eq!(record.culture, "roman");
        assert_eq!(record.religion, "roman_pantheon");
        assert_eq!(record.trade_goods, "grain");
        assert_eq!(record.civilization_value, 45);
        assert_eq!(record.province_rank, "city_metropolis");
        assert_eq!(record.get_holy_site(), Some("Capitolium"));
        assert_eq!(
            record.pops,
            vec![
                PopEntry::new("citizen", 10),
                PopEntry {
                    category: "slaves".to_owned(),
                    culture: "greek".to_owned(),
                    religion: "hellenic".to_owned(),
                    amount: 4,
                }
            ]
        );
        assert_eq!(
            record.buildings,
            vec![
                BuildingEntry::new("port_building", 2),
                BuildingEntry::new("town_hall_building", 1)
            ]
        );
    }

    #[test]
    fn test_compact_scenario() {
        let block =
            "5={ terrain=\"plains\" culture=\"roman\" citizen={ amount=\"10\" } port_building=2 }";
        let record = parse_block(block, &config()).unwrap().to_record(&config());
        assert_eq!(record.id, 5);
        assert_eq!(record.terrain, "plains");
        assert_eq!(record.culture, "roman");
        assert_eq!(record.pops, vec![PopEntry::new("citizen", 10)]);
        assert_eq!(record.buildings, vec![BuildingEntry::new("port_building", 2)]);
        assert!(record.holy_site.is_none());
    }

    #[test]
    fn test_pop_internals_do_not_leak() {
        let parsed = parse_block(ROMA, &config()).unwrap();
        // only the header culture and religion survive
        assert_eq!(parsed.keys().filter(|k| *k == "culture").count(), 1);
        assert_eq!(parsed.keys().filter(|k| *k == "religion").count(), 1);
        assert!(parsed.keys().all(|k| k != "amount"));
    }

    const EARLY_POP: &str = "2={
\tculture=\"roman\"
\tslaves={
\t\tculture=\"greek\"
\t\tamount=1
\t}
\tcitizen={
\t\tamount=2
\t}
}";

    #[test]
    fn test_early_pop_culture_leaks() {
        // a pop this close to the header is within the threshold, its culture
        // overrides the province culture
        let parsed = parse_block(EARLY_POP, &config()).unwrap();
        assert_eq!(parsed.ordering, Ordering::Reordered { last_pop: 3 });
        let record = parsed.to_record(&config());
        assert_eq!(record.culture, "greek");
        assert_eq!(record.pops[0].culture, "greek");
        assert_eq!(record.pops[1], PopEntry::new("citizen", 2));
    }

    #[test]
    fn test_leak_after_last_pop_is_dropped() {
        let block = "2={\n\tculture=\"roman\"\n\tslaves={\n\t\tculture=\"greek\"\n\t\tamount=1\n\t}\n}";
        let record = parse_block(block, &config()).unwrap().to_record(&config());
        assert_eq!(record.culture, "roman");
    }

    #[test]
    fn test_threshold_is_configurable() {
        let block = EARLY_POP;
        let mut config = config();
        config.scoped_key_threshold = 2;
        let record = parse_block(block, &config).unwrap().to_record(&config);
        assert_eq!(record.culture, "roman");
    }

    #[test]
    fn test_late_header_culture_is_discarded() {
        let block = "3={\n\tterrain=\"plains\"\n\ta=1\n\tb=2\n\tc=3\n\td=4\n\te=5\n\tculture=\"roman\"\n}";
        let record = parse_block(block, &config()).unwrap().to_record(&config());
        assert_eq!(record.culture, "");
        assert_eq!(record.terrain, "plains");
    }

    #[test]
    fn test_partition_order() {
        let block = "7={\n\tholy_site=\"Delphi\"\n\tcitizen={\n\t\tamount=\"3\"\n\t}\n\tlibrary_building=2\n}";
        let parsed = parse_block(block, &config()).unwrap();
        let keys: Vec<_> = parsed.keys().collect();
        assert_eq!(keys, vec!["holy_site", "citizen", "library_building"]);
        let record = parsed.to_record(&config());
        assert_eq!(record.get_holy_site(), Some("Delphi"));
        assert_eq!(record.buildings, vec![BuildingEntry::new("library_building", 2)]);
    }

    #[test]
    fn test_scalars_after_last_pop_are_dropped() {
        let block = "8={\n\tterrain=\"hills\"\n\tcitizen={\n\t\tamount=\"3\"\n\t}\n\tport_building=1\n\tprovince_rank=\"city\"\n\tholy_site=\"Olympus\"\n}";
        let parsed = parse_block(block, &config()).unwrap();
        assert_eq!(parsed.ordering, Ordering::Reordered { last_pop: 1 });
        let keys: Vec<_> = parsed.keys().collect();
        assert_eq!(
            keys,
            vec!["terrain", "citizen", "port_building", "holy_site"]
        );
        let record = parsed.to_record(&config());
        assert_eq!(record.province_rank, "");
    }

    #[test]
    fn test_without_pops_order_is_kept() {
        let block = "9={\n\tport_building=1\n\tholy_site=\"Olympus\"\n\tterrain=\"mountain\"\n\tprovince_rank=\"settlement\"\n}";
        let parsed = parse_block(block, &config()).unwrap();
        assert_eq!(parsed.ordering, Ordering::Unordered);
        let keys: Vec<_> = parsed.keys().collect();
        assert_eq!(
            keys,
            vec!["port_building", "holy_site", "terrain", "province_rank"]
        );
        let record = parsed.to_record(&config());
        assert_eq!(record.province_rank, "settlement");
        assert_eq!(record.buildings.len(), 1);
    }

    #[test]
    fn test_prefix_pop_is_not_a_category() {
        // opens a pop by prefix, but only exact categories anchor the partition
        let block = "10={\n\tterrain=\"plains\"\n\tcitizen_migrants={\n\t\tamount=\"3\"\n\t}\n\tprovince_rank=\"city\"\n}";
        let parsed = parse_block(block, &config()).unwrap();
        assert_eq!(parsed.ordering, Ordering::Unordered);
        let record = parsed.to_record(&config());
        assert_eq!(record.pops[0].category, "citizen_migrants");
        assert_eq!(record.province_rank, "city");
    }

    #[test]
    fn test_bad_amount() {
        let block = "11={\n\tcitizen={\n\t\tamount=\"lots\"\n\t}\n\tport_building=x\n}";
        let record = parse_block(block, &config()).unwrap().to_record(&config());
        assert_eq!(record.pops[0].amount, 0);
        assert_eq!(record.buildings[0].count, 0);
    }

    #[test]
    fn test_no_id() {
        assert!(parse_block("abc={ }", &config()).is_none());
    }

    #[test]
    fn test_untokenizable_block() {
        assert!(parse_block("13={ terrain=\"plains }", &config()).is_none());
    }

    #[test]
    fn test_empty_holy_site() {
        let block = "12={\n\tholy_site=\"\"\n}";
        let record = parse_block(block, &config()).unwrap().to_record(&config());
        assert!(record.holy_site.is_none());
    }
}
