//! Status catalog: the ordered set of recognized codes and the dense
//! slot index derived from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CounterError, Result};

/// One recognized status code and the label its counter renders under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub code: u16,
    pub label: String,
}

/// Ordered catalog of recognized status codes plus a trailing unknown bucket.
///
/// Slot `i` counts `entries()[i]` for `i < recognized()`; the final slot
/// (`unknown_slot()`) absorbs every code the catalog does not list. The
/// code-to-slot mapping is a prebuilt hash lookup, so classification never
/// scans the catalog.
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    entries: Vec<StatusEntry>,
    index: HashMap<u16, usize>,
}

impl StatusCatalog {
    /// Build a catalog from caller-supplied entries.
    ///
    /// Entries must be non-empty, strictly ascending by code, within the
    /// HTTP status range, and carry non-empty labels.
    pub fn new(entries: Vec<StatusEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(CounterError::InvalidCatalog(
                "must list at least one status code".to_string(),
            ));
        }
        let mut prev: Option<u16> = None;
        for entry in &entries {
            if !(100..=599).contains(&entry.code) {
                return Err(CounterError::InvalidCatalog(format!(
                    "code {} out of range (expected 100..=599)",
                    entry.code
                )));
            }
            if let Some(p) = prev {
                if entry.code <= p {
                    return Err(CounterError::InvalidCatalog(format!(
                        "codes must be strictly ascending (saw {} after {})",
                        entry.code, p
                    )));
                }
            }
            if entry.label.is_empty() {
                return Err(CounterError::InvalidCatalog(format!(
                    "empty label for code {}",
                    entry.code
                )));
            }
            prev = Some(entry.code);
        }
        Ok(Self::build(entries))
    }

    /// The stock httpd response catalog.
    pub fn httpd() -> Self {
        Self::build(
            HTTPD_STATUS_LINES
                .iter()
                .map(|&(code, label)| StatusEntry {
                    code,
                    label: label.to_string(),
                })
                .collect(),
        )
    }

    fn build(entries: Vec<StatusEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(slot, entry)| (entry.code, slot))
            .collect();
        Self { entries, index }
    }

    /// Number of recognized codes (excludes the unknown bucket).
    pub fn recognized(&self) -> usize {
        self.entries.len()
    }

    /// Total slot count a table for this catalog needs, unknown bucket included.
    pub fn slots(&self) -> usize {
        self.entries.len() + 1
    }

    /// Slot index of the unknown bucket (always the last slot).
    pub fn unknown_slot(&self) -> usize {
        self.entries.len()
    }

    /// Map a status code to its slot. Codes the catalog does not list land
    /// in the unknown bucket; this is classification, not an error.
    pub fn slot_of(&self, code: u16) -> usize {
        self.index
            .get(&code)
            .copied()
            .unwrap_or_else(|| self.unknown_slot())
    }

    /// Catalog entry backing a recognized slot, `None` for the unknown bucket
    /// or anything past it.
    pub fn entry(&self, slot: usize) -> Option<&StatusEntry> {
        self.entries.get(slot)
    }

    /// All recognized entries in slot order.
    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }
}

/// Response lines recognized by the stock catalog, in ascending code order.
const HTTPD_STATUS_LINES: &[(u16, &str)] = &[
    (100, "100 Continue"),
    (101, "101 Switching Protocols"),
    (102, "102 Processing"),
    (200, "200 OK"),
    (201, "201 Created"),
    (202, "202 Accepted"),
    (203, "203 Non-Authoritative Information"),
    (204, "204 No Content"),
    (205, "205 Reset Content"),
    (206, "206 Partial Content"),
    (207, "207 Multi-Status"),
    (208, "208 Already Reported"),
    (226, "226 IM Used"),
    (300, "300 Multiple Choices"),
    (301, "301 Moved Permanently"),
    (302, "302 Found"),
    (303, "303 See Other"),
    (304, "304 Not Modified"),
    (305, "305 Use Proxy"),
    (307, "307 Temporary Redirect"),
    (308, "308 Permanent Redirect"),
    (400, "400 Bad Request"),
    (401, "401 Unauthorized"),
    (402, "402 Payment Required"),
    (403, "403 Forbidden"),
    (404, "404 Not Found"),
    (405, "405 Method Not Allowed"),
    (406, "406 Not Acceptable"),
    (407, "407 Proxy Authentication Required"),
    (408, "408 Request Timeout"),
    (409, "409 Conflict"),
    (410, "410 Gone"),
    (411, "411 Length Required"),
    (412, "412 Precondition Failed"),
    (413, "413 Request Entity Too Large"),
    (414, "414 Request-URI Too Long"),
    (415, "415 Unsupported Media Type"),
    (416, "416 Requested Range Not Satisfiable"),
    (417, "417 Expectation Failed"),
    (422, "422 Unprocessable Entity"),
    (423, "423 Locked"),
    (424, "424 Failed Dependency"),
    (426, "426 Upgrade Required"),
    (428, "428 Precondition Required"),
    (429, "429 Too Many Requests"),
    (431, "431 Request Header Fields Too Large"),
    (500, "500 Internal Server Error"),
    (501, "501 Not Implemented"),
    (502, "502 Bad Gateway"),
    (503, "503 Service Unavailable"),
    (504, "504 Gateway Timeout"),
    (505, "505 HTTP Version Not Supported"),
    (506, "506 Variant Also Negotiates"),
    (507, "507 Insufficient Storage"),
    (508, "508 Loop Detected"),
    (510, "510 Not Extended"),
    (511, "511 Network Authentication Required"),
];
