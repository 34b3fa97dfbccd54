//! Locate and slice raw stream payloads in PDF files without parsing them.
//!
//! The scanner looks for `stream` keywords, walks backward to the `<< ... >>`
//! dictionary describing each one, reads its `/Length` and cuts the payload
//! out from between `stream` and `endstream`. Broken objects are reported and
//! skipped; nothing is decoded.
//!
//! ```
//! use rawstream::{ScanOptions, scan};
//!
//! let buffer = b"<</Length 5>>\nstream\nHELLO\nendstream\n";
//! let report = scan(buffer, &ScanOptions::default());
//! let object = report.objects().next().unwrap();
//! assert_eq!(object.declared_length, 5);
//! assert_eq!(object.payload, b"HELLO");
//! ```

mod error;
pub use error::{DictionaryProblem, Error, LengthProblem, Result};

mod object;
pub use object::{DictionarySpan, StreamObject};

pub mod parser;
pub use parser::{extract_length, extract_payload, find_marker, locate_dictionary, locate_dictionary_above};

mod reader;
pub use reader::{Reader, scan};

mod report;
pub use report::{EntryLine, FailuresOnly, ObjectFailure, ScanEntry, ScanReport, EXCERPT_LEN};

mod scan_options;
pub use scan_options::{
    DEFAULT_LOOKAHEAD_FACTOR, DEFAULT_LOOKAHEAD_SLACK, DEFAULT_LOOKBACK, DEFAULT_PREVIEW_LEN, MAX_LOOKBACK,
    ScanOptions, ScanOptionsBuilder,
};
