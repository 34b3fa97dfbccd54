use std::fmt;
use std::ops::Range;

/// Byte range `[start, end)` of a `<< ... >>` dictionary inside the scanned buffer.
///
/// `start` points at the opening `<<`, `end - 2` at its matching `>>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DictionarySpan {
    pub start: usize,
    pub end: usize,
}

impl DictionarySpan {
    pub fn new(start: usize, end: usize) -> DictionarySpan {
        DictionarySpan { start, end }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Slice of `buffer` covered by this span.
    pub fn bytes<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.range()]
    }

    /// Whether `other` lies completely inside this span.
    pub fn contains(&self, other: &DictionarySpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for DictionarySpan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A stream recovered from the buffer, borrowing its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamObject<'a> {
    /// Offset of the `stream` keyword.
    pub offset: usize,
    pub dictionary: DictionarySpan,
    pub declared_length: usize,
    /// Exactly `declared_length` bytes between the stream markers.
    pub payload: &'a [u8],
    /// From the `stream` keyword through the end of `endstream`.
    pub whole: Range<usize>,
    dictionary_bytes: &'a [u8],
}

impl<'a> StreamObject<'a> {
    pub(crate) fn new(
        buffer: &'a [u8], offset: usize, dictionary: DictionarySpan, payload: &'a [u8], whole: Range<usize>,
    ) -> StreamObject<'a> {
        StreamObject {
            offset,
            dictionary,
            declared_length: payload.len(),
            payload,
            whole,
            dictionary_bytes: dictionary.bytes(buffer),
        }
    }

    /// Raw `<< ... >>` bytes describing the stream.
    pub fn dictionary_bytes(&self) -> &'a [u8] {
        self.dictionary_bytes
    }

    /// Up to `len` leading payload bytes.
    pub fn preview(&self, len: usize) -> &'a [u8] {
        &self.payload[..len.min(self.payload.len())]
    }
}
