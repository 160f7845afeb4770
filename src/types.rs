/// The identifier of a province.
/// Unique across the whole setup directory, and also the 1-based position of
/// the province in the color definition table.
pub type ProvinceId = u32;

/// The hash map used throughout the crate.
/// Aliased so that the hasher can be swapped in one place.
pub type HashMap<K, V> = std::collections::HashMap<K, V>;

/// Strips a single leading UTF-8 byte order marker, which the game's own
/// files tend to carry.
pub fn strip_bom(contents: &str) -> &str {
    contents.strip_prefix('\u{feff}').unwrap_or(contents)
}
