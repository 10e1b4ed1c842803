use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Baud code (`AT+BAUD<code>`) to line rate, as printed after `OK`.
pub const BAUD_CODES: [(&str, &str); 12] = [
    ("1", "1200"),
    ("2", "2400"),
    ("3", "4800"),
    ("4", "9600"),
    ("5", "19200"),
    ("6", "38400"),
    ("7", "57600"),
    ("8", "115200"),
    ("9", "230400"),
    ("A", "460800"),
    ("B", "921600"),
    ("C", "1382400"),
];

pub const PARITY_CODES: [(&str, &str); 3] = [("PO", "ODD"), ("PE", "EVEN"), ("PN", "NONE")];

pub const ROLE_CODES: [(&str, &str); 2] = [("S", "SLAVE"), ("M", "MASTER")];

static BAUD_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| BAUD_CODES.into_iter().collect());

static PARITY_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PARITY_CODES.into_iter().collect());

static ROLE_TABLE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ROLE_CODES.into_iter().collect());

pub fn baud_rate(code: &str) -> Option<&'static str> {
    BAUD_TABLE.get(code).copied()
}

pub fn parity_name(code: &str) -> Option<&'static str> {
    PARITY_TABLE.get(code).copied()
}

pub fn role_name(code: &str) -> Option<&'static str> {
    ROLE_TABLE.get(code).copied()
}

/// Reverse lookup used by the host client: `9600` -> `4`.
pub fn baud_code_for_rate(rate: u32) -> Option<&'static str> {
    let rate = rate.to_string();
    BAUD_CODES
        .iter()
        .find(|(_, r)| *r == rate)
        .map(|(code, _)| *code)
}

/// Reverse lookup, case-insensitive: `even` -> `PE`.
pub fn parity_code_for_name(name: &str) -> Option<&'static str> {
    PARITY_CODES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

/// Reverse lookup, case-insensitive: `master` -> `M`.
pub fn role_code_for_name(name: &str) -> Option<&'static str> {
    ROLE_CODES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}
