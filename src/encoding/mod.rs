use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use std::borrow::Cow;

/// Encoding guessed for a cue sheet, together with the length of its byte order mark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    pub bom_len: usize,
}

impl DetectedEncoding {
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Whether line terminators and the `FILE ` prefix can be located on raw bytes.
    pub fn is_ascii_compatible(&self) -> bool {
        self.encoding.is_ascii_compatible()
    }

    pub fn bom<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[..self.bom_len]
    }

    pub fn body<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.bom_len..]
    }
}

/// Statistical text encoding detector.
///
/// One instance is meant to be reused for a whole run; every call to
/// [`EncodingDetector::detect`] starts from a fresh state.
pub struct EncodingDetector {
    inner: chardetng::EncodingDetector,
}

impl EncodingDetector {
    pub fn new() -> Self {
        Self {
            inner: chardetng::EncodingDetector::new(),
        }
    }

    pub fn reset(&mut self) {
        self.inner = chardetng::EncodingDetector::new();
    }

    pub fn detect(&mut self, bytes: &[u8]) -> DetectedEncoding {
        self.reset();

        if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
            return DetectedEncoding { encoding, bom_len };
        }

        for line in bytes.split_inclusive(|b| *b == b'\n') {
            self.inner.feed(line, false);
        }
        self.inner.feed(&[], true);

        DetectedEncoding {
            encoding: self.inner.guess(None, true),
            bom_len: 0,
        }
    }
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes `bytes` (without BOM) strictly, `None` if any sequence is malformed.
pub fn decode<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
    encoding.decode_without_bom_handling_and_without_replacement(bytes)
}

/// Encodes `text` back into `encoding`, `None` if a character has no mapping.
pub fn encode(encoding: &'static Encoding, text: &str) -> Option<Vec<u8>> {
    // encoding_rs only ever outputs UTF-8 for the UTF-16 family
    if encoding == UTF_16LE {
        return Some(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Some(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }

    let (bytes, used, had_errors) = encoding.encode(text);
    if had_errors || used != encoding {
        return None;
    }

    Some(bytes.into_owned())
}
