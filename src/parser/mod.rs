use std::ops::Range;
use std::str::{self, FromStr};

use log::trace;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::digit1;
use nom::combinator::{map, map_res, not, opt, success};
use nom::sequence::{preceded, terminated};
use nom::{IResult, Parser};

use crate::error::LengthProblem;
use crate::{Error, Result, ScanOptions};

mod dictionary;
pub use dictionary::{locate_dictionary, locate_dictionary_above, match_dictionary};

// Change this to something else that implements ParseError to get a
// different error type out of nom.
pub(crate) type NomError<'a> = nom::error::Error<&'a [u8]>;

pub(crate) type NomResult<'a, O, E = NomError<'a>> = IResult<&'a [u8], O, E>;

pub const STREAM: &[u8] = b"stream";
pub const ENDSTREAM: &[u8] = b"endstream";
const LENGTH_KEY: &[u8] = b"/Length";

#[inline]
fn strip_nom<O>(r: NomResult<O>) -> Option<O> {
    r.ok().map(|(_, o)| o)
}

#[inline]
pub(crate) fn is_whitespace(c: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&c)
}

#[inline]
fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

#[inline]
fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

/// Offsets of every occurrence of `needle` in `haystack`, overlapping ones included.
fn find_all<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(move |(_, window)| *window == needle)
        .map(|(position, _)| position)
}

/// Whether `buffer[offset..offset + len]` is delimited on both sides by non-regular bytes.
fn is_token(buffer: &[u8], offset: usize, len: usize) -> bool {
    let before = offset.checked_sub(1).and_then(|p| buffer.get(p));
    let after = buffer.get(offset + len);
    before.is_none_or(|&c| !is_regular(c)) && after.is_none_or(|&c| !is_regular(c))
}

/// Find the next `stream` keyword at or after `from`.
///
/// Only whole tokens count, so `endstream` and names like `/Upstream` are skipped.
pub fn find_marker(buffer: &[u8], from: usize) -> Option<usize> {
    let haystack = buffer.get(from..)?;
    find_all(haystack, STREAM)
        .map(|position| from + position)
        .find(|&offset| is_token(buffer, offset, STREAM.len()))
}

pub(crate) fn eol(input: &[u8]) -> NomResult<'_, &[u8]> {
    alt((tag(&b"\r\n"[..]), tag(&b"\n"[..]), tag(&b"\r"[..]))).parse(input)
}

fn white_space1(input: &[u8]) -> NomResult<'_, ()> {
    map(take_while1(is_whitespace), |_| ()).parse(input)
}

fn unsigned_int<I: FromStr>(input: &[u8]) -> NomResult<'_, I> {
    map_res(digit1, |digits: &[u8]| {
        str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|digits| I::from_str(digits).map_err(|_| ()))
    })
    .parse(input)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LengthValue {
    Direct(usize),
    Indirect(u32, u16),
    Invalid,
}

fn indirect_length(input: &[u8]) -> NomResult<'_, LengthValue> {
    map(
        (unsigned_int, white_space1, unsigned_int, white_space1, tag(&b"R"[..])),
        |(id, _, generation, _, _)| LengthValue::Indirect(id, generation),
    )
    .parse(input)
}

fn direct_length(input: &[u8]) -> NomResult<'_, LengthValue> {
    map(terminated(unsigned_int, not(tag(&b"."[..]))), LengthValue::Direct).parse(input)
}

/// `/Length` followed by whitespace and its value. `/Length1` and friends do not match.
fn length_entry(input: &[u8]) -> NomResult<'_, LengthValue> {
    preceded(
        (tag(LENGTH_KEY), white_space1),
        alt((indirect_length, direct_length, success(LengthValue::Invalid))),
    )
    .parse(input)
}

/// Read the declared payload length out of a dictionary.
///
/// Exactly one `/Length` entry holding a literal non-negative integer is accepted.
/// Indirect references are reported, not resolved.
pub fn extract_length(dictionary: &[u8]) -> Result<usize> {
    let values: Vec<LengthValue> = find_all(dictionary, LENGTH_KEY)
        .filter_map(|position| strip_nom(length_entry(&dictionary[position..])))
        .collect();
    trace!("Found {} /Length entries in {} byte dictionary.", values.len(), dictionary.len());

    let problem = match values.as_slice() {
        [LengthValue::Direct(length)] => return Ok(*length),
        [] => LengthProblem::Absent,
        [LengthValue::Indirect(id, generation)] => LengthProblem::Indirect(*id, *generation),
        [LengthValue::Invalid] => LengthProblem::NotANumber,
        _ => LengthProblem::Ambiguous(values.len()),
    };
    Err(Error::MissingLength {
        problem,
        dictionary: dictionary.to_vec(),
    })
}

/// `stream`, trailing spaces and at most one end-of-line.
fn stream_start(input: &[u8]) -> NomResult<'_, ()> {
    map(
        (tag(STREAM), take_while(|c: u8| c == b' ' || c == b'\t'), opt(eol)),
        |_| (),
    )
    .parse(input)
}

/// Slice the payload of the stream whose keyword sits at `marker`.
///
/// Returns the range from `stream` through `endstream` together with the payload.
/// `endstream` occurrences are tried in order within a bounded forward window; one
/// is accepted only when nothing but whitespace separates it from the end of the
/// declared length, so binary content that happens to contain the keyword is skipped.
pub fn extract_payload<'a>(
    buffer: &'a [u8], marker: usize, declared: usize, options: &ScanOptions,
) -> Result<(Range<usize>, &'a [u8])> {
    let input = buffer.get(marker..).unwrap_or_default();
    let (rest, _) = stream_start(input).map_err(|_| Error::MissingStreamMarker {
        searched: marker..marker,
    })?;

    let payload_start = buffer.len() - rest.len();
    let payload_end = payload_start.saturating_add(declared);
    let window_end = options.lookahead_end(payload_start, declared).min(buffer.len());
    let window = &buffer[payload_start..window_end];

    let mut first_actual = None;
    for end in find_all(window, ENDSTREAM).map(|position| payload_start + position) {
        if end >= payload_end && buffer[payload_end..end].iter().all(|&c| is_whitespace(c)) {
            return Ok((marker..end + ENDSTREAM.len(), &buffer[payload_start..payload_end]));
        }
        first_actual.get_or_insert_with(|| trim_end(&buffer[payload_start..end]).len());
    }

    match first_actual {
        Some(actual) => Err(Error::LengthMismatch { declared, actual }),
        None => Err(Error::MissingStreamMarker {
            searched: payload_start..window_end,
        }),
    }
}

fn trim_end(bytes: &[u8]) -> &[u8] {
    let len = bytes.iter().rposition(|&c| !is_whitespace(c)).map_or(0, |p| p + 1);
    &bytes[..len]
}
