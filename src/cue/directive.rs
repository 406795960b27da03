use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{FILE_COMMAND, FILE_PREFIX, FileDirective};
use std::ops::Range;

pub fn is_file_directive(line: &[u8]) -> bool {
    line.starts_with(FILE_PREFIX.as_bytes())
}

/// Byte ranges of every line in `bytes`, terminators included.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. Only valid on text whose
/// encoding keeps ASCII bytes unambiguous.
pub fn line_ranges(bytes: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;

    for (i, byte) in bytes.iter().enumerate() {
        let ends_line = match byte {
            b'\n' => true,
            b'\r' => bytes.get(i + 1) != Some(&b'\n'),
            _ => false,
        };
        if ends_line {
            ranges.push(start..i + 1);
            start = i + 1;
        }
    }

    if start < bytes.len() {
        ranges.push(start..bytes.len());
    }

    ranges
}

fn split_line_ending(line: &str) -> (&str, &str) {
    for ending in ["\r\n", "\n", "\r"] {
        if let Some(content) = line.strip_suffix(ending) {
            return (content, ending);
        }
    }
    (line, "")
}

/// Reads a double-quoted field whose opening quote was already consumed.
/// A doubled quote stands for a literal one.
fn parse_quoted(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '"' {
            value.push(c);
            continue;
        }
        if let Some((_, '"')) = chars.peek() {
            chars.next();
            value.push('"');
            continue;
        }
        return Some((value, &input[i + 1..]));
    }

    None
}

pub fn parse_file_directive(line: &str) -> CueResult<FileDirective> {
    let malformed = || CueError::MalformedFileDirective(line.trim_end().to_string());

    let (content, line_ending) = split_line_ending(line);
    let rest = content.strip_prefix(FILE_PREFIX).ok_or_else(malformed)?;

    let (filename, quoted, rest) = match rest.strip_prefix('"') {
        Some(quoted_rest) => {
            let (filename, rest) = parse_quoted(quoted_rest).ok_or_else(malformed)?;
            (filename, true, rest)
        }
        None => {
            let end = rest.find(' ').ok_or_else(malformed)?;
            (rest[..end].to_string(), false, &rest[end..])
        }
    };

    let file_type = rest.strip_prefix(' ').ok_or_else(malformed)?;
    if filename.is_empty() || file_type.is_empty() {
        return Err(malformed());
    }

    Ok(FileDirective {
        filename,
        file_type: file_type.to_string(),
        quoted,
        line_ending: line_ending.to_string(),
    })
}

/// Rebuilds the directive line, quoting the filename when it was quoted before
/// or when it could not be read back unquoted.
pub fn serialize_file_directive(directive: &FileDirective) -> String {
    let filename = &directive.filename;
    let needs_quotes = directive.quoted || filename.contains([' ', '"']);

    let field = if needs_quotes {
        format!("\"{}\"", filename.replace('"', "\"\""))
    } else {
        filename.clone()
    };

    format!(
        "{FILE_COMMAND} {field} {}{}",
        directive.file_type, directive.line_ending
    )
}
