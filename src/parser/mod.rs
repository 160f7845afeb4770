/// A submodule that splits province blocks into statements.
mod tokens;

/// A submodule that provides the [BlockReader], which finds the province
/// blocks within a setup file.
mod blocks;
pub use blocks::{block_id, BlockReader};

/// A submodule that turns the text of a single block into a [ParsedProvince].
mod province;
pub use province::{parse_block, Entry, EntryValue, Ordering, ParsedProvince, ParserConfig};

/// Parses every province block of a setup file.
/// Blocks without a leading province id are skipped.
pub fn parse_file(contents: &str, config: &ParserConfig) -> Vec<ParsedProvince> {
    BlockReader::new(contents)
        .filter_map(|block| parse_block(block, config))
        .collect()
}
