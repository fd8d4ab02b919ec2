//! Conversions between byte offsets / `ByteSpan`s and the LSP wire
//! position types (§4.2 Position Mapper, §6 "positions are 0-based
//! UTF-16 code units").

use sg_position_tracking::{ByteSpan, LineStartsCache};

/// Byte offset → LSP `Position`, using a precomputed line-start index.
/// Out-of-range offsets clamp to end-of-file (§4.2).
pub fn offset_to_position(source: &str, cache: &LineStartsCache, offset: usize) -> lsp_types::Position {
    let (line, character) = cache.offset_to_position(source, offset);
    lsp_types::Position { line, character }
}

/// LSP `Position` → byte offset, clamping out-of-range line/column per
/// §4.2 ("line beyond end → end-of-file; column beyond line end →
/// end-of-line").
pub fn position_to_offset(source: &str, cache: &LineStartsCache, position: lsp_types::Position) -> usize {
    cache.position_to_offset(source, position.line, position.character)
}

/// `ByteSpan` → LSP `Range`.
pub fn span_to_range(source: &str, cache: &LineStartsCache, span: ByteSpan) -> lsp_types::Range {
    lsp_types::Range {
        start: offset_to_position(source, cache, span.start),
        end: offset_to_position(source, cache, span.end),
    }
}

/// LSP `Range` → `ByteSpan`.
pub fn range_to_span(source: &str, cache: &LineStartsCache, range: lsp_types::Range) -> ByteSpan {
    let start = position_to_offset(source, cache, range.start);
    let end = position_to_offset(source, cache, range.end);
    if start <= end {
        ByteSpan::new(start, end)
    } else {
        ByteSpan::new(end, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_position_roundtrip() {
        let source = "hello\nworld";
        let cache = LineStartsCache::new(source);
        let pos = offset_to_position(source, &cache, 7);
        assert_eq!(pos, lsp_types::Position { line: 1, character: 1 });
        let back = position_to_offset(source, &cache, pos);
        assert_eq!(back, 7);
    }

    #[test]
    fn out_of_range_line_clamps_to_end_of_file() {
        let source = "abc";
        let cache = LineStartsCache::new(source);
        let offset = position_to_offset(source, &cache, lsp_types::Position { line: 50, character: 0 });
        assert_eq!(offset, source.len());
    }

    #[test]
    fn surrogate_pair_counts_as_two_utf16_units() {
        // U+1F600 is 4 bytes in UTF-8 and 2 code units in UTF-16.
        let source = "hi \u{1F600}\nworld";
        let cache = LineStartsCache::new(source);
        let after_emoji = 3 + "\u{1F600}".len(); // byte offset right after the emoji
        let pos = offset_to_position(source, &cache, after_emoji);
        assert_eq!(pos, lsp_types::Position { line: 0, character: 5 }); // "hi " (3) + 2 UTF-16 units
    }

    #[test]
    fn span_range_roundtrip() {
        let source = "let x = 1;";
        let cache = LineStartsCache::new(source);
        let span = ByteSpan::new(4, 5);
        let range = span_to_range(source, &cache, span);
        let back = range_to_span(source, &cache, range);
        assert_eq!(back, span);
    }
}
