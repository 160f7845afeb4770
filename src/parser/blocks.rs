use tracing::warn;

use super::super::types::ProvinceId;

/// Whether the byte may be a part of an identifier, like `port2`
fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Finds the position of the brace closing the one at `open`.
/// Returns [None] if the braces never balance.
fn match_brace(text: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in text[open..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// A reader for province blocks in a setup file.
/// This reader will iterate over the text and yield the exact text of every
/// top level `<digits>={ ... }` block, braces included.
///
/// Blocks whose braces never balance are skipped, the search for the next
/// block then continues right after the opening `{` of the broken one.
pub struct BlockReader<'a> {
    /// The whole file
    text: &'a str,
    /// The position the search for the next header starts at
    offset: usize,
    /// The end of the last yielded block, headers before it are nested
    covered: usize,
    /// The number of blocks that were skipped for being unterminated
    unterminated: usize,
}

impl<'a> BlockReader<'a> {
    /// Create a new block reader over the contents of a file.
    pub fn new(text: &'a str) -> Self {
        BlockReader {
            text,
            offset: 0,
            covered: 0,
            unterminated: 0,
        }
    }

    /// Get the number of blocks skipped so far due to unbalanced braces.
    pub fn unterminated(&self) -> usize {
        self.unterminated
    }

    /// Finds the next `<digits>={` header, returning its start and the
    /// position of the opening brace
    fn next_header(&mut self) -> Option<(usize, usize)> {
        let bytes = self.text.as_bytes();
        let mut i = self.offset;
        while i < bytes.len() {
            if !bytes[i].is_ascii_digit() || (i > 0 && is_identifier_byte(bytes[i - 1])) {
                i += 1;
                continue;
            }
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if bytes[i..].starts_with(b"={") {
                let open = i + 1;
                self.offset = open + 1;
                return Some((start, open));
            }
        }
        self.offset = bytes.len();
        None
    }
}

impl<'a> Iterator for BlockReader<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some((start, open)) = self.next_header() {
            if start < self.covered {
                // a header nested inside the previous block
                continue;
            }
            match match_brace(self.text.as_bytes(), open) {
                Some(end) => {
                    self.covered = end + 1;
                    return Some(&self.text[start..=end]);
                }
                None => {
                    self.unterminated += 1;
                    warn!(
                        "skipping unterminated block starting with {}",
                        &self.text[start..=open]
                    );
                }
            }
        }
        None
    }
}

/// Reads the province id from the leading digits of a block
pub fn block_id(block: &str) -> Option<ProvinceId> {
    let digits = block
        .trim_start()
        .split(|c: char| !c.is_ascii_digit())
        .next()?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let mut reader = BlockReader::new("");
        assert!(reader.next().is_none());
        let mut reader = BlockReader::new("# just a comment\n");
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_single_block() {
        let mut reader = BlockReader::new("1={\n\tterrain=\"plains\"\n}\n");
        assert_eq!(reader.next(), Some("1={\n\tterrain=\"plains\"\n}"));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_multiple_blocks() {
        let text = "1={ a=b }\n22={ c={ d=e } }\n\t333={}";
        let blocks: Vec<_> = BlockReader::new(text).collect();
        assert_eq!(blocks, vec!["1={ a=b }", "22={ c={ d=e } }", "333={}"]);
    }

    #[test]
    fn test_nested_header_not_yielded() {
        let text = "1={ values={ 2={ a=b } } }\n3={ }";
        let blocks: Vec<_> = BlockReader::new(text).collect();
        assert_eq!(blocks, vec!["1={ values={ 2={ a=b } } }", "3={ }"]);
    }

    #[test]
    fn test_identifier_suffix_is_not_header() {
        let text = "1={ port2={ a=b } }";
        let blocks: Vec<_> = BlockReader::new(text).collect();
        assert_eq!(blocks, vec!["1={ port2={ a=b } }"]);
        let blocks: Vec<_> = BlockReader::new("modifier2={ } 4={ }").collect();
        assert_eq!(blocks, vec!["4={ }"]);
    }

    #[test]
    fn test_spaced_header_is_not_header() {
        let blocks: Vec<_> = BlockReader::new("1 = { }").collect();
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_unterminated() {
        let mut reader = BlockReader::new("1={ a=b\n2={ c=d }");
        // the first block never closes, the one inside is still found
        assert_eq!(reader.next(), Some("2={ c=d }"));
        assert!(reader.next().is_none());
        assert_eq!(reader.unterminated(), 1);
    }

    #[test]
    fn test_unterminated_last() {
        let mut reader = BlockReader::new("1={ a=b }\n2={ c=d");
        assert_eq!(reader.next(), Some("1={ a=b }"));
        assert!(reader.next().is_none());
        assert_eq!(reader.unterminated(), 1);
    }

    #[test]
    fn test_block_id() {
        assert_eq!(block_id("5={ }"), Some(5));
        assert_eq!(block_id("1234={\n}"), Some(1234));
        assert_eq!(block_id("={ }"), None);
    }
}
