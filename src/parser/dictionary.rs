use log::{debug, trace};

use crate::error::DictionaryProblem;
use crate::{DictionarySpan, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Open,
    Close,
}

#[inline]
fn token_at(buffer: &[u8], position: usize) -> Option<Token> {
    match buffer.get(position..position + 2)? {
        b"<<" => Some(Token::Open),
        b">>" => Some(Token::Close),
        _ => None,
    }
}

/// Find the dictionary that describes the stream whose keyword sits at `marker`.
///
/// The search walks backward at most `lookback` bytes. Failures carry the
/// searched range and its raw bytes.
pub fn locate_dictionary(buffer: &[u8], marker: usize, lookback: usize) -> Result<DictionarySpan> {
    locate_dictionary_above(buffer, marker, marker.saturating_sub(lookback))
}

/// Like [`locate_dictionary`] with an explicit lower bound for the search.
pub fn locate_dictionary_above(buffer: &[u8], marker: usize, floor: usize) -> Result<DictionarySpan> {
    let marker = marker.min(buffer.len());
    let floor = floor.min(marker);
    match_dictionary(buffer, marker, floor).map_err(|problem| {
        debug!("No dictionary before offset {}: {}.", marker, problem);
        Error::MalformedDictionary {
            marker,
            problem,
            searched: floor..marker,
            window: buffer[floor..marker].to_vec(),
        }
    })
}

/// Match one `<< ... >>` level backward from `position`, never looking below `floor`.
///
/// The first `>>` seen marks the end of the dictionary; any later `>>` opens a
/// nested dictionary which is skipped as a whole. The first `<<` outside every
/// nested dictionary closes it. Tokens never overlap, so `>>>>` is two closing
/// tokens and the `>` ending a hex string cannot pair with a later one.
///
/// Nesting is tracked with a counter, not by recursion.
pub fn match_dictionary(
    buffer: &[u8], position: usize, floor: usize,
) -> std::result::Result<DictionarySpan, DictionaryProblem> {
    trace!("Matching dictionary backward from {} down to {}.", position, floor);
    let mut end = None;
    // Nested dictionaries entered but not yet closed.
    let mut depth = 0usize;
    let mut cursor = Some(position);

    while let Some(i) = cursor.filter(|&i| i >= floor) {
        cursor = match (token_at(buffer, i), end) {
            (Some(Token::Open), _) if depth > 0 => {
                depth -= 1;
                i.checked_sub(2)
            }
            (Some(Token::Open), Some(end)) => return Ok(DictionarySpan::new(i, end)),
            (Some(Token::Open), None) => return Err(DictionaryProblem::OpenBeforeClose { at: i }),
            (Some(Token::Close), None) => {
                end = Some(i + 2);
                i.checked_sub(2)
            }
            (Some(Token::Close), Some(_)) => {
                depth += 1;
                trace!("Nested dictionary ends at {}, depth {}.", i + 2, depth);
                i.checked_sub(2)
            }
            (None, _) => i.checked_sub(1),
        };
    }

    Err(DictionaryProblem::WindowExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_LOOKBACK;
    use crate::parser::find_marker;

    fn marker_of(buffer: &[u8]) -> usize {
        find_marker(buffer, 0).unwrap()
    }

    fn locate(buffer: &[u8]) -> Result<DictionarySpan> {
        locate_dictionary(buffer, marker_of(buffer), 1000)
    }

    #[test]
    fn flat_dictionary() {
        let buffer = b"1 0 obj\n<</Length 5>>\nstream\nHELLO\nendstream";
        let span = locate(buffer).unwrap();
        assert_eq!(span.bytes(buffer), b"<</Length 5>>");
    }

    #[test]
    fn nested_dictionary_value() {
        let buffer = b"<</BitsPerComponent 1/DecodeParms <</Columns 35/K -1>>\n/Filter /CCITTFaxDecode/Length 51>>\nstream";
        let span = locate(buffer).unwrap();
        assert_eq!(span.start, 0);
        assert_eq!(span.end, marker_of(buffer) - 1);
    }

    #[test]
    fn nested_dictionary_at_end() {
        let buffer = b"<</A <</B 1>>>>stream";
        let span = locate(buffer).unwrap();
        assert_eq!(span, DictionarySpan::new(0, 15));
    }

    #[test]
    fn sibling_nested_dictionaries() {
        let buffer = b"<</A <</X 1>>/B <</Y <</Z 2>>>>/Length 3>>\nstream";
        let span = locate(buffer).unwrap();
        assert_eq!(span.bytes(buffer), &buffer[..buffer.len() - 7]);
    }

    #[test]
    fn hex_string_before_close() {
        let buffer = b"<</ID <ab>>>stream";
        let span = locate(buffer).unwrap();
        assert_eq!(span, DictionarySpan::new(0, 12));
    }

    #[test]
    fn no_dictionary() {
        let buffer = b"nothing to see here stream";
        match locate(buffer) {
            Err(Error::MalformedDictionary { problem, searched, window, .. }) => {
                assert_eq!(problem, DictionaryProblem::WindowExhausted);
                assert_eq!(searched, 0..20);
                assert_eq!(window, b"nothing to see here ".to_vec());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn open_before_close() {
        let buffer = b"<</Length 5 stream";
        assert!(matches!(
            locate(buffer),
            Err(Error::MalformedDictionary {
                problem: DictionaryProblem::OpenBeforeClose { at: 0 },
                ..
            })
        ));
    }

    #[test]
    fn dictionary_longer_than_window() {
        let buffer = b"<</Filter/FlateDecode/Length 5>>\nstream";
        let marker = marker_of(buffer);
        assert!(locate_dictionary(buffer, marker, 10).is_err());
        assert_eq!(locate_dictionary(buffer, marker, 40), Ok(DictionarySpan::new(0, 32)));
    }

    #[test]
    fn nesting_deeper_than_window() {
        let nested = |depth: usize| {
            let mut buffer = "<</A ".repeat(depth).into_bytes();
            buffer.extend_from_slice(b"1");
            buffer.extend_from_slice(">>".repeat(depth).as_bytes());
            buffer.extend_from_slice(b"\nstream");
            buffer
        };

        let shallow = nested(100);
        let span = locate(&shallow).unwrap();
        assert_eq!(span, DictionarySpan::new(0, shallow.len() - 7));

        let deep = nested(300);
        assert!(matches!(
            locate(&deep),
            Err(Error::MalformedDictionary {
                problem: DictionaryProblem::WindowExhausted,
                ..
            })
        ));
    }

    #[test]
    fn nesting_as_deep_as_max_window() {
        let mut closes = vec![b'>'; MAX_LOOKBACK];
        closes.extend_from_slice(b"\nstream\nZ\nendstream\n");
        assert!(matches!(
            locate_dictionary(&closes, marker_of(&closes), MAX_LOOKBACK),
            Err(Error::MalformedDictionary {
                problem: DictionaryProblem::WindowExhausted,
                ..
            })
        ));

        let depth = 4000;
        let mut balanced = "<<".repeat(depth).into_bytes();
        balanced.extend_from_slice(">>".repeat(depth).as_bytes());
        balanced.extend_from_slice(b"\nstream");
        assert_eq!(
            locate_dictionary(&balanced, marker_of(&balanced), MAX_LOOKBACK),
            Ok(DictionarySpan::new(0, 4 * depth))
        );
    }
}
