use log::{debug, info, warn};

use crate::parser;
use crate::report::{ObjectFailure, ScanEntry, ScanReport};
use crate::{Error, Result, ScanOptions, StreamObject};

/// Walks a buffer stream by stream.
///
/// The reader owns nothing but its options and a borrowed view of the buffer,
/// so independent buffers can be scanned concurrently.
pub struct Reader<'a> {
    pub buffer: &'a [u8],
    pub options: ScanOptions,
}

impl<'a> Reader<'a> {
    pub fn new(buffer: &'a [u8], options: ScanOptions) -> Reader<'a> {
        Reader { buffer, options }
    }

    /// Scan the whole buffer.
    ///
    /// A failed object is recorded and scanning resumes one byte past its
    /// marker; the scan itself never fails.
    pub fn read(&self) -> ScanReport<'a> {
        let mut entries = Vec::new();
        let mut cursor = 0;
        // End of the last recovered object; dictionaries are never looked for before it.
        let mut consumed = 0;

        while let Some(marker) = parser::find_marker(self.buffer, cursor) {
            let floor = marker.saturating_sub(self.options.lookback).max(consumed);
            match self.read_object_above(marker, floor) {
                Ok(object) => {
                    debug!(
                        "Stream at offset {} with {} byte payload, resuming at {}.",
                        marker, object.declared_length, object.whole.end
                    );
                    cursor = object.whole.end;
                    consumed = object.whole.end;
                    entries.push(ScanEntry::Recovered(object));
                }
                Err(failure) => {
                    warn!("Skipping stream at offset {}: {}", marker, failure.error);
                    cursor = marker + 1;
                    entries.push(ScanEntry::Failed(failure));
                }
            }
        }

        let report = ScanReport {
            entries,
            preview_len: self.options.preview_len,
        };
        info!(
            "Scanned {} bytes: {} streams recovered, {} failed.",
            self.buffer.len(),
            report.recovered_count(),
            report.failed_count()
        );
        report
    }

    /// Recover the stream whose `stream` keyword sits at `marker`.
    pub fn read_object(&self, marker: usize) -> Result<StreamObject<'a>> {
        self.read_object_above(marker, marker.saturating_sub(self.options.lookback))
            .map_err(|failure| failure.error)
    }

    fn read_object_above(
        &self, marker: usize, floor: usize,
    ) -> std::result::Result<StreamObject<'a>, ObjectFailure<'a>> {
        let failure = |dictionary: Option<&'a [u8]>, error: Error| ObjectFailure {
            offset: marker,
            dictionary,
            error,
        };
        let dictionary =
            parser::locate_dictionary_above(self.buffer, marker, floor).map_err(|error| failure(None, error))?;
        let text = dictionary.bytes(self.buffer);
        let declared = parser::extract_length(text).map_err(|error| failure(Some(text), error))?;
        let (whole, payload) = parser::extract_payload(self.buffer, marker, declared, &self.options)
            .map_err(|error| failure(Some(text), error))?;
        Ok(StreamObject::new(self.buffer, marker, dictionary, payload, whole))
    }
}

/// Scan `buffer` for stream objects.
pub fn scan<'a>(buffer: &'a [u8], options: &ScanOptions) -> ScanReport<'a> {
    Reader::new(buffer, options.clone()).read()
}
