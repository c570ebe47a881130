//! Log format parser using nom
//!
//! File format:
//! ```text
//! LEXSTORE1\n
//! [version: u32]
//! ...records...
//! ```
//!
//! Record format:
//! ```text
//! S <key-len> <value-len>\n<key><value>\n
//! D <key-len>\n<key>\n
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take},
    character::complete::{char, digit1},
    combinator::map_res,
    sequence::{delimited, separated_pair, terminated},
    IResult,
};

use crate::error::{Error, Result};

/// Magic header for log files
pub const LEX_MAGIC: &[u8] = b"LEXSTORE1\n";

/// Current log format version
pub const LEX_VERSION: u32 = 1;

/// Total header length in bytes
pub const HEADER_LEN: usize = LEX_MAGIC.len() + 4;

/// A single log record borrowed from the mapped file
#[derive(Debug, Clone, PartialEq)]
pub enum Record<'a> {
    /// Key was written with a value
    Set {
        /// Raw key bytes
        key: &'a [u8],
        /// Raw value bytes
        value: &'a [u8],
    },
    /// Key was removed
    Delete {
        /// Raw key bytes
        key: &'a [u8],
    },
}

/// Parse the log file header and return its version
pub fn parse_header(input: &[u8]) -> Result<u32> {
    if input.len() < HEADER_LEN {
        return Err(Error::Parse("Input too short for header".to_string()));
    }

    if &input[..LEX_MAGIC.len()] != LEX_MAGIC {
        return Err(Error::Parse("Invalid log magic header".to_string()));
    }

    let version_bytes = &input[LEX_MAGIC.len()..HEADER_LEN];
    Ok(u32::from_le_bytes([
        version_bytes[0],
        version_bytes[1],
        version_bytes[2],
        version_bytes[3],
    ]))
}

/// Create a log file header
pub fn create_header(version: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(LEX_MAGIC);
    header.extend_from_slice(&version.to_le_bytes());
    header
}

fn decimal(input: &[u8]) -> IResult<&[u8], usize> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse::<usize>().map_err(|_| ()))
    })(input)
}

fn set_record(input: &[u8]) -> IResult<&[u8], Record<'_>> {
    let (input, (key_len, value_len)) =
        delimited(tag("S "), separated_pair(decimal, char(' '), decimal), char('\n'))(input)?;
    let (input, key) = take(key_len)(input)?;
    let (input, value) = terminated(take(value_len), char('\n'))(input)?;
    Ok((input, Record::Set { key, value }))
}

fn delete_record(input: &[u8]) -> IResult<&[u8], Record<'_>> {
    let (input, key_len) = delimited(tag("D "), decimal, char('\n'))(input)?;
    let (input, key) = terminated(take(key_len), char('\n'))(input)?;
    Ok((input, Record::Delete { key }))
}

/// Parse one record, returning the remaining input
pub fn parse_record(input: &[u8]) -> IResult<&[u8], Record<'_>> {
    alt((set_record, delete_record))(input)
}

/// Encode a set record
pub fn encode_set(key: &str, value: &str) -> Vec<u8> {
    let prefix = format!("S {} {}\n", key.len(), value.len());
    let mut out = Vec::with_capacity(prefix.len() + key.len() + value.len() + 1);
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(value.as_bytes());
    out.push(b'\n');
    out
}

/// Encode a delete record
pub fn encode_delete(key: &str) -> Vec<u8> {
    let mut out = format!("D {}\n", key.len()).into_bytes();
    out.extend_from_slice(key.as_bytes());
    out.push(b'\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let header = create_header(LEX_VERSION);
        assert_eq!(parse_header(&header).unwrap(), LEX_VERSION);
    }

    #[test]
    fn test_parse_header_invalid_magic() {
        let mut header = create_header(1);
        header[0] = b'X';

        assert!(parse_header(&header).is_err());
    }

    #[test]
    fn test_parse_header_too_short() {
        assert!(parse_header(LEX_MAGIC).is_err());
    }

    #[test]
    fn test_parse_set_record() {
        let mut input = encode_set("@dictionary:history", "[{\"word\":\"a\"}]");
        input.extend_from_slice(b"tail");

        let (rest, record) = parse_record(&input).unwrap();
        assert_eq!(
            record,
            Record::Set {
                key: b"@dictionary:history",
                value: b"[{\"word\":\"a\"}]",
            }
        );
        assert_eq!(rest, b"tail");
    }

    #[test]
    fn test_value_may_contain_newlines() {
        let input = encode_set("k", "line 1\nline 2");
        let (rest, record) = parse_record(&input).unwrap();

        assert_eq!(record, Record::Set { key: b"k", value: b"line 1\nline 2" });
        assert!(rest.is_empty());
    }

    #[test]
    fn test_parse_delete_record() {
        let input = encode_delete("hello");
        let (rest, record) = parse_record(&input).unwrap();

        assert_eq!(record, Record::Delete { key: b"hello" });
        assert!(rest.is_empty());
    }

    #[test]
    fn test_truncated_record_fails() {
        let input = encode_set("hello", "world");
        assert!(parse_record(&input[..input.len() - 3]).is_err());
    }
}
