use std::fmt;

use crate::{Error, StreamObject};

/// Bytes of diagnostic context shown for a failed object.
pub const EXCERPT_LEN: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFailure<'a> {
    /// Offset of the `stream` keyword that could not be recovered.
    pub offset: usize,
    /// Text of the dictionary, when it was located before things went wrong.
    pub dictionary: Option<&'a [u8]>,
    pub error: Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEntry<'a> {
    Recovered(StreamObject<'a>),
    Failed(ObjectFailure<'a>),
}

impl ScanEntry<'_> {
    pub fn offset(&self) -> usize {
        match self {
            ScanEntry::Recovered(object) => object.offset,
            ScanEntry::Failed(failure) => failure.offset,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScanEntry::Failed(_))
    }
}

/// Everything one scan found, in buffer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport<'a> {
    pub entries: Vec<ScanEntry<'a>>,
    pub preview_len: usize,
}

impl<'a> ScanReport<'a> {
    pub fn objects(&self) -> impl Iterator<Item = &StreamObject<'a>> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Recovered(object) => Some(object),
            ScanEntry::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &ObjectFailure<'a>> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Failed(failure) => Some(failure),
            ScanEntry::Recovered(_) => None,
        })
    }

    pub fn recovered_count(&self) -> usize {
        self.objects().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// One printable line per entry, numbered by position in the scan.
    pub fn lines(&self) -> impl Iterator<Item = EntryLine<'_, 'a>> {
        self.entries.iter().enumerate().map(|(index, entry)| EntryLine {
            index,
            entry,
            preview_len: self.preview_len,
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "{} streams: {} recovered, {} failed",
            self.entries.len(),
            self.recovered_count(),
            self.failed_count()
        )
    }

    /// Report restricted to failures, keeping their sequence numbers.
    pub fn failures_only(&self) -> FailuresOnly<'_, 'a> {
        FailuresOnly(self)
    }
}

impl fmt::Display for ScanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", self.summary())
    }
}

pub struct FailuresOnly<'r, 'a>(&'r ScanReport<'a>);

impl fmt::Display for FailuresOnly<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.0.lines().filter(|line| line.entry.is_failure()) {
            writeln!(f, "{}", line)?;
        }
        write!(f, "{}", self.0.summary())
    }
}

pub struct EntryLine<'r, 'a> {
    pub index: usize,
    pub entry: &'r ScanEntry<'a>,
    preview_len: usize,
}

impl fmt::Display for EntryLine<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:3}: {:6}: ", self.index, self.entry.offset())?;
        match self.entry {
            ScanEntry::Recovered(object) => write!(
                f,
                "length={}={} params={} contents=\"{}\"",
                object.declared_length,
                object.payload.len(),
                object.dictionary_bytes().escape_ascii(),
                object.preview(self.preview_len).escape_ascii()
            ),
            ScanEntry::Failed(failure) => {
                write!(f, "{}: {}", failure.error.kind(), failure.error)?;
                if let Some(dictionary) = failure.dictionary {
                    write!(f, " params={}", dictionary.escape_ascii())?;
                } else if let Some(excerpt) = excerpt(&failure.error) {
                    write!(f, " excerpt=\"{}\"", excerpt.escape_ascii())?;
                }
                Ok(())
            }
        }
    }
}

/// The part of a failure's raw bytes closest to where things went wrong.
fn excerpt(error: &Error) -> Option<&[u8]> {
    let bytes = error.excerpt()?;
    let len = bytes.len().min(EXCERPT_LEN);
    match error {
        Error::MalformedDictionary { .. } => Some(&bytes[bytes.len() - len..]),
        _ => Some(&bytes[..len]),
    }
}
