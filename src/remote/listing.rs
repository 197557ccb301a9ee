// src/remote/listing.rs

//! Parsing of raw FTP `LIST` output.
//!
//! Two dialects are understood:
//!
//! - Windows/IIS: `01-02-23  03:04PM       <DIR>          subdir`
//! - POSIX `ls -l`: `-rw-r--r-- 1 user group 1234 Jan 01 12:00 shoe.jpg`

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::ListingDialect;
use crate::utils::ListingError;

lazy_static! {
    static ref WINDOWS_LINE: Regex = Regex::new(
        r"([0-9]{2})-([0-9]{2})-([0-9]{2}) +([0-9]{2}):([0-9]{2})(AM|PM) +(<DIR>)? +([0-9]+|) +(.+)"
    )
    .expect("windows listing pattern is valid");
}

/// Number of whitespace-separated fields before the POSIX filename.
const POSIX_NAME_FIELD: usize = 8;

/// One parsed listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
    /// Zero for directories
    pub size_bytes: u64,
}

/// Parses every line of a listing, dropping lines that do not match.
///
/// Fails only when nothing could be parsed.
pub fn parse_listing<S: AsRef<str>>(
    lines: &[S],
    dialect: ListingDialect,
) -> Result<Vec<RemoteEntry>, ListingError> {
    let entries: Vec<RemoteEntry> = lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            match dialect {
                ListingDialect::Windows => parse_windows_line(line),
                ListingDialect::Posix => parse_posix_line(line),
            }
        })
        .collect();

    if entries.is_empty() {
        Err(ListingError::NoEntries)
    } else {
        Ok(entries)
    }
}

pub fn parse_windows_line(line: &str) -> Option<RemoteEntry> {
    let captures = WINDOWS_LINE.captures(line)?;
    let is_directory = captures.get(7).is_some();
    let size_bytes = captures
        .get(8)
        .and_then(|size| size.as_str().parse().ok())
        .unwrap_or(0);
    let name = captures.get(9)?.as_str().to_string();

    Some(RemoteEntry {
        name,
        is_directory,
        size_bytes,
    })
}

pub fn parse_posix_line(line: &str) -> Option<RemoteEntry> {
    let mut fields = Vec::with_capacity(POSIX_NAME_FIELD);
    let mut rest = line.trim_start();

    while fields.len() < POSIX_NAME_FIELD {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();

        // summary line, e.g. "total 12"
        if fields.len() == 1 && fields[0] == "total" {
            return None;
        }
    }

    if rest.is_empty() {
        return None;
    }

    Some(RemoteEntry {
        name: rest.to_string(),
        is_directory: fields[0].starts_with('d'),
        size_bytes: fields[4].parse().unwrap_or(0),
    })
}
