//! String chunk expressions: `char`, `word`, `line` and `item` ranges.
//!
//! Chunks are located as byte spans into the original string, so extraction
//! returns the original text between the first and last chunk and mutation
//! splices into it. Positions are 1-based and inclusive at this API.

use lingo_common::ChunkKind;

/// Where `put` places a value relative to a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    Into,
    After,
    Before,
}

impl PutMode {
    /// Decode the PUT opcode's put-type nibble.
    pub fn from_code(code: i32) -> Option<PutMode> {
        match code {
            1 => Some(PutMode::Into),
            2 => Some(PutMode::After),
            3 => Some(PutMode::Before),
            _ => None,
        }
    }
}

/// The line terminator a string uses: CRLF if present, then LF, then CR.
pub fn line_delimiter(s: &str) -> &'static str {
    if s.contains("\r\n") {
        "\r\n"
    } else if s.contains('\n') {
        "\n"
    } else {
        "\r"
    }
}

/// Byte spans of every chunk of `kind` in `s`.
pub fn chunk_spans(s: &str, kind: ChunkKind, item_delimiter: char) -> Vec<(usize, usize)> {
    if s.is_empty() {
        return Vec::new();
    }
    match kind {
        ChunkKind::Char => s.char_indices().map(|(i, c)| (i, i + c.len_utf8())).collect(),
        ChunkKind::Word => {
            let mut spans = Vec::new();
            let mut start = None;
            for (i, c) in s.char_indices() {
                match (c.is_whitespace(), start) {
                    (true, Some(from)) => {
                        spans.push((from, i));
                        start = None;
                    }
                    (false, None) => start = Some(i),
                    _ => {}
                }
            }
            if let Some(from) = start {
                spans.push((from, s.len()));
            }
            spans
        }
        ChunkKind::Line => {
            let mut spans = split_spans(s, line_delimiter(s));
            // A trailing terminator does not open another line.
            if spans.last().is_some_and(|(a, b)| a == b) {
                spans.pop();
            }
            spans
        }
        ChunkKind::Item => {
            let mut buf = [0u8; 4];
            split_spans(s, item_delimiter.encode_utf8(&mut buf))
        }
    }
}

fn split_spans(s: &str, delimiter: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, _) in s.match_indices(delimiter) {
        spans.push((start, i));
        start = i + delimiter.len();
    }
    spans.push((start, s.len()));
    spans
}

pub fn count(s: &str, kind: ChunkKind, item_delimiter: char) -> usize {
    chunk_spans(s, kind, item_delimiter).len()
}

/// Resolve a 1-based `first..=last` request against `count` chunks into
/// 0-based inclusive indices.
///
/// `first` below 1 is treated as 1. `last` of 0 means "just `first`"; -1 or
/// anything past the end means "through the last chunk". Returns `None` when
/// nothing is selected.
pub fn chunk_range(count: usize, first: i32, last: i32) -> Option<(usize, usize)> {
    let first = first.max(1) as usize;
    if first > count {
        return None;
    }
    let last = match last {
        0 => first,
        l if l < 0 => count,
        l => (l as usize).min(count),
    };
    if last < first {
        return None;
    }
    Some((first - 1, last - 1))
}

/// Text from the start of chunk `first` to the end of chunk `last`.
pub fn get_range(s: &str, kind: ChunkKind, first: i32, last: i32, item_delimiter: char) -> String {
    let spans = chunk_spans(s, kind, item_delimiter);
    match chunk_range(spans.len(), first, last) {
        Some((a, b)) => s[spans[a].0..spans[b].1].to_string(),
        None => String::new(),
    }
}

pub fn get_chunk(s: &str, kind: ChunkKind, index: i32, item_delimiter: char) -> String {
    if index < 1 {
        return String::new();
    }
    get_range(s, kind, index, index, item_delimiter)
}

pub fn last_chunk(s: &str, kind: ChunkKind, item_delimiter: char) -> String {
    chunk_spans(s, kind, item_delimiter)
        .last()
        .map(|(a, b)| s[*a..*b].to_string())
        .unwrap_or_default()
}

/// Put `value` into, before or after a chunk range, returning the new string.
///
/// Putting into an item or line past the end pads with delimiters first, so
/// `put "x" into item 3 of "a"` yields `"a,,x"`.
pub fn put_chunk(
    s: &str,
    kind: ChunkKind,
    first: i32,
    last: i32,
    mode: PutMode,
    value: &str,
    item_delimiter: char,
) -> String {
    let spans = chunk_spans(s, kind, item_delimiter);
    let Some((a, b)) = chunk_range(spans.len(), first, last) else {
        return append_past_end(s, kind, spans.len(), first, value, item_delimiter);
    };
    let (start, end) = (spans[a].0, spans[b].1);
    let mut out = String::with_capacity(s.len() + value.len());
    match mode {
        PutMode::Into => {
            out.push_str(&s[..start]);
            out.push_str(value);
            out.push_str(&s[end..]);
        }
        PutMode::Before => {
            out.push_str(&s[..start]);
            out.push_str(value);
            out.push_str(&s[start..]);
        }
        PutMode::After => {
            out.push_str(&s[..end]);
            out.push_str(value);
            out.push_str(&s[end..]);
        }
    }
    out
}

fn append_past_end(
    s: &str,
    kind: ChunkKind,
    count: usize,
    first: i32,
    value: &str,
    item_delimiter: char,
) -> String {
    let mut out = s.to_string();
    match kind {
        ChunkKind::Item | ChunkKind::Line => {
            let delimiter = match kind {
                ChunkKind::Item => item_delimiter.to_string(),
                _ => line_delimiter(s).to_string(),
            };
            // An empty string already holds one empty item or line.
            let existing = count.max(1);
            let target = first.max(1) as usize;
            for _ in existing..target {
                out.push_str(&delimiter);
            }
        }
        ChunkKind::Word if !s.is_empty() && !s.ends_with(char::is_whitespace) => out.push(' '),
        _ => {}
    }
    out.push_str(value);
    out
}

/// Remove a chunk range together with one adjoining separator.
pub fn delete_chunk(s: &str, kind: ChunkKind, first: i32, last: i32, item_delimiter: char) -> String {
    let spans = chunk_spans(s, kind, item_delimiter);
    let Some((a, b)) = chunk_range(spans.len(), first, last) else {
        return s.to_string();
    };
    let (mut start, mut end) = (spans[a].0, spans[b].1);
    if kind != ChunkKind::Char {
        if let Some(next) = spans.get(b + 1) {
            end = next.0;
        } else if a > 0 {
            start = spans[a - 1].1;
        } else {
            end = s.len();
        }
    }
    format!("{}{}", &s[..start], &s[end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_items_are_preserved() {
        assert_eq!(count("a,b,,d", ChunkKind::Item, ','), 4);
        assert_eq!(get_chunk("a,b,,d", ChunkKind::Item, 3, ','), "");
        assert_eq!(get_chunk("a,b,,d", ChunkKind::Item, 4, ','), "d");
        assert_eq!(count("a,", ChunkKind::Item, ','), 2);
        assert_eq!(count("", ChunkKind::Item, ','), 0);
    }

    #[test]
    fn custom_item_delimiter() {
        assert_eq!(get_chunk("x;y;z", ChunkKind::Item, 2, ';'), "y");
        assert_eq!(count("x;y;z", ChunkKind::Item, ','), 1);
    }

    #[test]
    fn words_split_on_any_whitespace() {
        let s = "  the quick\tbrown\nfox ";
        assert_eq!(count(s, ChunkKind::Word, ','), 4);
        assert_eq!(get_chunk(s, ChunkKind::Word, 3, ','), "brown");
        assert_eq!(get_range(s, ChunkKind::Word, 2, 3, ','), "quick\tbrown");
        assert_eq!(last_chunk(s, ChunkKind::Word, ','), "fox");
    }

    #[test]
    fn line_delimiter_detection() {
        assert_eq!(line_delimiter("a\r\nb\nc"), "\r\n");
        assert_eq!(line_delimiter("a\nb\rc"), "\n");
        assert_eq!(line_delimiter("a\rb"), "\r");

        // Only the detected terminator splits.
        assert_eq!(count("a\r\nb\nc", ChunkKind::Line, ','), 2);
        assert_eq!(get_chunk("a\r\nb\nc", ChunkKind::Line, 2, ','), "b\nc");
        assert_eq!(count("one\rtwo\r", ChunkKind::Line, ','), 2);
        assert_eq!(count("one\r\rthree", ChunkKind::Line, ','), 3);
    }

    #[test]
    fn range_resolution() {
        assert_eq!(chunk_range(5, 2, 0), Some((1, 1)));
        assert_eq!(chunk_range(5, 2, -1), Some((1, 4)));
        assert_eq!(chunk_range(5, 2, 99), Some((1, 4)));
        assert_eq!(chunk_range(5, 0, 2), Some((0, 1)));
        assert_eq!(chunk_range(5, 6, 0), None);
        assert_eq!(chunk_range(5, 4, 2), None);
        assert_eq!(chunk_range(0, 1, 0), None);
    }

    #[test]
    fn chars_are_unicode_scalars() {
        assert_eq!(count("héllo", ChunkKind::Char, ','), 5);
        assert_eq!(get_chunk("héllo", ChunkKind::Char, 2, ','), "é");
        assert_eq!(get_range("héllo", ChunkKind::Char, 2, 4, ','), "éll");
        assert_eq!(get_chunk("abc", ChunkKind::Char, 0, ','), "");
    }

    #[test]
    fn put_modes() {
        let s = "red,green,blue";
        assert_eq!(put_chunk(s, ChunkKind::Item, 2, 0, PutMode::Into, "teal", ','), "red,teal,blue");
        assert_eq!(put_chunk(s, ChunkKind::Item, 2, 0, PutMode::Before, "dark", ','), "red,darkgreen,blue");
        assert_eq!(put_chunk(s, ChunkKind::Item, 3, 0, PutMode::After, "!", ','), "red,green,blue!");
        assert_eq!(put_chunk("hello", ChunkKind::Char, 1, 0, PutMode::Into, "J", ','), "Jello");
    }

    #[test]
    fn put_past_end_pads() {
        assert_eq!(put_chunk("a", ChunkKind::Item, 3, 0, PutMode::Into, "x", ','), "a,,x");
        assert_eq!(put_chunk("", ChunkKind::Item, 2, 0, PutMode::Into, "x", ','), ",x");
        assert_eq!(put_chunk("a\nb", ChunkKind::Line, 4, 0, PutMode::Into, "d", ','), "a\nb\n\nd");
        assert_eq!(put_chunk("one", ChunkKind::Word, 3, 0, PutMode::Into, "two", ','), "one two");
    }

    #[test]
    fn delete_takes_a_separator() {
        assert_eq!(delete_chunk("a,b,c", ChunkKind::Item, 2, 0, ','), "a,c");
        assert_eq!(delete_chunk("a,b,c", ChunkKind::Item, 3, 0, ','), "a,b");
        assert_eq!(delete_chunk("a,b,c", ChunkKind::Item, 1, 2, ','), "c");
        assert_eq!(delete_chunk("only", ChunkKind::Item, 1, 0, ','), "");
        assert_eq!(delete_chunk("abc", ChunkKind::Char, 2, 0, ','), "ac");
        assert_eq!(delete_chunk("one two three", ChunkKind::Word, 2, 0, ','), "one three");
        assert_eq!(delete_chunk("abc", ChunkKind::Char, 9, 0, ','), "abc");
    }
}
