use std::fmt::{self, Display};

use super::super::structures::ProvinceRecord;

/// A province rendered in canonical script form.
///
/// Keys are always written in the same order: terrain, culture, religion,
/// trade goods, civilization value, rank, pops, holy site and buildings.
/// Pops and buildings with a count below one are left out.
pub struct ProvinceBlock<'a> {
    record: &'a ProvinceRecord,
    name: &'a str,
}

impl<'a> ProvinceBlock<'a> {
    /// Creates a renderer for the record, `name` going in the header comment
    pub fn new(record: &'a ProvinceRecord, name: &'a str) -> Self {
        ProvinceBlock { record, name }
    }
}

impl Display for ProvinceBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;
        // a comment can't span lines
        let name = self.name.lines().next().unwrap_or_default().trim();
        if name.is_empty() {
            writeln!(f, "{}={{", record.id)?;
        } else {
            writeln!(f, "{}={{ # {}", record.id, name)?;
        }
        writeln!(f, "\tterrain=\"{}\"", record.terrain)?;
        writeln!(f, "\tculture=\"{}\"", record.culture)?;
        writeln!(f, "\treligion=\"{}\"", record.religion)?;
        writeln!(f, "\ttrade_goods=\"{}\"", record.trade_goods)?;
        writeln!(f, "\tcivilization_value={}", record.civilization_value)?;
        writeln!(f, "\tbarbarian_power=0")?;
        writeln!(f, "\tprovince_rank=\"{}\"", record.province_rank)?;
        for pop in record.pops.iter().filter(|p| p.amount > 0) {
            writeln!(f, "\t{}={{", pop.category)?;
            if !pop.culture.is_empty() {
                writeln!(f, "\t\tculture=\"{}\"", pop.culture)?;
            }
            if !pop.religion.is_empty() {
                writeln!(f, "\t\treligion=\"{}\"", pop.religion)?;
            }
            writeln!(f, "\t\tamount=\"{}\"", pop.amount)?;
            writeln!(f, "\t}}")?;
        }
        if let Some(holy_site) = record.get_holy_site() {
            writeln!(f, "\tholy_site=\"{}\"", holy_site)?;
        }
        for building in record.buildings.iter().filter(|b| b.count > 0) {
            writeln!(f, "\t{}={}", building.kind, building.count)?;
        }
        writeln!(f, "}}")
    }
}

/// Checks that the text is accepted by the game's text format reader
pub fn verify_render(text: &str) -> Result<(), jomini::Error> {
    jomini::TextTape::from_slice(text.as_bytes())?;
    Ok(())
}
