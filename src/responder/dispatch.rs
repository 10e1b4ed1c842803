use std::fmt;

use super::profile::{BaudHandling, ModuleProfile, ParityHandling};
use super::tables;

/// Reply to one accumulated command token.
///
/// Diagnostics are ordinary protocol replies, sent over the same line as
/// acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok(String),
    Echo(String),
    UnknownBaud(String),
    BadRole(String),
    UnknownData(String),
    UnknownCommand(String),
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_) | Reply::Echo(_))
    }

    /// Bytes written to the line for this reply.
    ///
    /// Input is read one byte per `char`, so every char maps back to the
    /// byte it came from.
    pub fn to_wire(&self) -> Vec<u8> {
        self.to_string()
            .chars()
            .map(|c| u8::try_from(c).unwrap_or(b'?'))
            .collect()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok(text) => f.write_str(text),
            // The echo debugger prints whole lines.
            Reply::Echo(line) => writeln!(f, "RX: {}", line),
            Reply::UnknownBaud(code) => write!(f, "ERROR: unknown baud {}", code),
            Reply::BadRole(code) => write!(f, "ERROR: bad role {}", code),
            Reply::UnknownData(data) => write!(f, "ERROR: unknown data {}", data),
            Reply::UnknownCommand(token) => write!(f, "ERROR: unknown command {}", token),
        }
    }
}

/// Replies owed for one accumulated token.
///
/// AT modules answer every token exactly once. The echo debugger is line
/// based: one reply per non-blank line, nothing for blank ones.
pub fn respond(profile: &ModuleProfile, token: &str) -> Vec<Reply> {
    if profile.echo {
        echo_lines(token)
    } else {
        vec![dispatch(profile, token)]
    }
}

/// Classify a complete token against the profile's AT command set.
pub fn dispatch(profile: &ModuleProfile, token: &str) -> Reply {
    if token == "AT" {
        return Reply::Ok("OK".to_string());
    }

    match token.strip_prefix("AT+") {
        Some(data) => dispatch_data(profile, data),
        None => Reply::UnknownCommand(token.to_string()),
    }
}

fn echo_lines(token: &str) -> Vec<Reply> {
    token
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Reply::Echo(line.to_string()))
        .collect()
}

fn dispatch_data(profile: &ModuleProfile, data: &str) -> Reply {
    if data == "VERSION" {
        if let Some(version) = profile.version {
            return Reply::Ok(version.to_string());
        }
    }

    if let Some(code) = data.strip_prefix("BAUD") {
        match profile.baud {
            BaudHandling::Lookup => {
                return match tables::baud_rate(code) {
                    Some(rate) => Reply::Ok(format!("OK{}", rate)),
                    None => Reply::UnknownBaud(code.to_string()),
                };
            }
            BaudHandling::Fixed(rate) => return Reply::Ok(format!("OK{}", rate)),
            BaudHandling::Unsupported => {}
        }
    }

    if profile.name_and_pin {
        if data.starts_with("NAME") {
            return Reply::Ok("OKname".to_string());
        }
        if data.starts_with("PIN") {
            return Reply::Ok("OKsetpin".to_string());
        }
    }

    if profile.role {
        if let Some(code) = data.strip_prefix("ROLE=") {
            return match tables::role_name(code) {
                Some(role) => Reply::Ok(format!("OK+ROLE:{}", role)),
                None => Reply::BadRole(code.to_string()),
            };
        }
    }

    if let Some(parity) = tables::parity_name(data) {
        match profile.parity {
            ParityHandling::Lookup => return Reply::Ok(format!("OK {}", parity)),
            ParityHandling::Fixed(name) => return Reply::Ok(format!("OK {}", name)),
            ParityHandling::Unsupported => {}
        }
    }

    Reply::UnknownData(data.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::Variant;

    fn reply(variant: Variant, token: &str) -> String {
        dispatch(&variant.profile(), token).to_string()
    }

    #[test]
    fn test_bare_at() {
        for variant in [Variant::Hc06, Variant::Linvor, Variant::Minimal] {
            assert_eq!(reply(variant, "AT"), "OK");
        }
    }

    #[test]
    fn test_version_per_module() {
        assert_eq!(reply(Variant::Hc06, "AT+VERSION"), "HC06SimV1.0");
        assert_eq!(reply(Variant::Linvor, "AT+VERSION"), "LinvorV1.8");
        assert_eq!(reply(Variant::Minimal, "AT+VERSION"), "ERROR: unknown data VERSION");
        // VERSION is an exact match, not a prefix.
        assert_eq!(reply(Variant::Hc06, "AT+VERSIONX"), "ERROR: unknown data VERSIONX");
    }

    #[test]
    fn test_every_baud_code() {
        for (code, rate) in tables::BAUD_CODES {
            assert_eq!(reply(Variant::Hc06, &format!("AT+BAUD{}", code)), format!("OK{}", rate));
        }
        assert_eq!(reply(Variant::Hc06, "AT+BAUDZ"), "ERROR: unknown baud Z");
        assert_eq!(reply(Variant::Hc06, "AT+BAUD"), "ERROR: unknown baud ");
        assert_eq!(reply(Variant::Hc06, "AT+BAUD44"), "ERROR: unknown baud 44");
    }

    #[test]
    fn test_minimal_baud_ignores_code() {
        assert_eq!(reply(Variant::Minimal, "AT+BAUD8"), "OK1200");
        assert_eq!(reply(Variant::Minimal, "AT+BAUDZ"), "OK1200");
    }

    #[test]
    fn test_name_and_pin_discard_value() {
        assert_eq!(reply(Variant::Hc06, "AT+NAMEfoo"), "OKname");
        assert_eq!(reply(Variant::Hc06, "AT+NAME"), "OKname");
        assert_eq!(reply(Variant::Linvor, "AT+PIN1234"), "OKsetpin");
        assert_eq!(reply(Variant::Minimal, "AT+PIN"), "OKsetpin");
    }

    #[test]
    fn test_roles() {
        assert_eq!(reply(Variant::Hc06, "AT+ROLE=S"), "OK+ROLE:SLAVE");
        assert_eq!(reply(Variant::Hc06, "AT+ROLE=M"), "OK+ROLE:MASTER");
        assert_eq!(reply(Variant::Hc06, "AT+ROLE=X"), "ERROR: bad role X");
        assert_eq!(reply(Variant::Hc06, "AT+ROLE="), "ERROR: bad role ");
        assert_eq!(reply(Variant::Hc06, "AT+ROLE"), "ERROR: unknown data ROLE");
        assert_eq!(reply(Variant::Linvor, "AT+ROLE=S"), "ERROR: unknown data ROLE=S");
    }

    #[test]
    fn test_parity() {
        assert_eq!(reply(Variant::Hc06, "AT+PO"), "OK ODD");
        assert_eq!(reply(Variant::Hc06, "AT+PE"), "OK EVEN");
        assert_eq!(reply(Variant::Linvor, "AT+PN"), "OK NONE");
        assert_eq!(reply(Variant::Hc06, "AT+PNX"), "ERROR: unknown data PNX");
    }

    #[test]
    fn test_minimal_parity_always_odd() {
        assert_eq!(reply(Variant::Minimal, "AT+PO"), "OK ODD");
        assert_eq!(reply(Variant::Minimal, "AT+PE"), "OK ODD");
        assert_eq!(reply(Variant::Minimal, "AT+PN"), "OK ODD");
    }

    #[test]
    fn test_unknown_inputs() {
        assert_eq!(reply(Variant::Hc06, "XYZ"), "ERROR: unknown command XYZ");
        assert_eq!(reply(Variant::Hc06, "ATX"), "ERROR: unknown command ATX");
        assert_eq!(reply(Variant::Hc06, "at"), "ERROR: unknown command at");
        assert_eq!(reply(Variant::Hc06, "AT\r\n"), "ERROR: unknown command AT\r\n");
        assert_eq!(reply(Variant::Hc06, "AT+"), "ERROR: unknown data ");
        assert_eq!(reply(Variant::Hc06, "AT+RESET"), "ERROR: unknown data RESET");
    }

    #[test]
    fn test_echo_variant() {
        let profile = Variant::Echo.profile();
        assert_eq!(respond(&profile, "  hello\r\n"), vec![Reply::Echo("hello".into())]);
        assert_eq!(respond(&profile, "AT")[0].to_string(), "RX: AT\n");
        assert!(respond(&profile, "\r\n").is_empty());
    }

    #[test]
    fn test_echo_replies_once_per_line() {
        let profile = Variant::Echo.profile();
        let replies = respond(&profile, "hello\r\n\r\n  world \nlast");
        let text: String = replies.iter().map(Reply::to_string).collect();
        assert_eq!(text, "RX: hello\nRX: world\nRX: last\n");
    }

    #[test]
    fn test_at_modules_reply_once_per_token() {
        let profile = Variant::Hc06.profile();
        assert_eq!(respond(&profile, "AT\r\nAT"), vec![Reply::UnknownCommand("AT\r\nAT".into())]);
    }

    #[test]
    fn test_wire_bytes_match_received_bytes() {
        let token: String = [b'X', 0xFF].iter().map(|&b| b as char).collect();
        let reply = dispatch(&Variant::Hc06.profile(), &token);
        let wire = reply.to_wire();
        assert!(wire.ends_with(&[b'X', 0xFF]));
        assert_eq!(wire.len(), "ERROR: unknown command ".len() + 2);
    }

    #[test]
    fn test_reply_kinds() {
        let profile = Variant::Hc06.profile();
        assert!(dispatch(&profile, "AT").is_ok());
        assert!(!dispatch(&profile, "XYZ").is_ok());
        assert_eq!(dispatch(&profile, "AT+BAUD4").to_wire(), b"OK9600".to_vec());
    }
}
