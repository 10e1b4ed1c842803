use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which real-world firmware the emulator imitates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Full HC-06 command set.
    #[default]
    Hc06,
    /// Legacy Linvor firmware, no role switching.
    Linvor,
    /// Reduced stub with hard-wired baud and parity replies.
    Minimal,
    /// Debug echo, answers every line with `RX: <line>`.
    Echo,
}

impl Variant {
    pub const ALL: [Variant; 4] = [Variant::Hc06, Variant::Linvor, Variant::Minimal, Variant::Echo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Hc06 => "hc06",
            Variant::Linvor => "linvor",
            Variant::Minimal => "minimal",
            Variant::Echo => "echo",
        }
    }

    pub fn profile(&self) -> ModuleProfile {
        match self {
            Variant::Hc06 => ModuleProfile {
                variant: *self,
                version: Some("HC06SimV1.0"),
                baud: BaudHandling::Lookup,
                parity: ParityHandling::Lookup,
                name_and_pin: true,
                role: true,
                echo: false,
            },
            Variant::Linvor => ModuleProfile {
                variant: *self,
                version: Some("LinvorV1.8"),
                baud: BaudHandling::Lookup,
                parity: ParityHandling::Lookup,
                name_and_pin: true,
                role: false,
                echo: false,
            },
            Variant::Minimal => ModuleProfile {
                variant: *self,
                version: None,
                baud: BaudHandling::Fixed("1200"),
                parity: ParityHandling::Fixed("ODD"),
                name_and_pin: true,
                role: false,
                echo: false,
            },
            Variant::Echo => ModuleProfile {
                variant: *self,
                version: None,
                baud: BaudHandling::Unsupported,
                parity: ParityHandling::Unsupported,
                name_and_pin: false,
                role: false,
                echo: true,
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown module variant: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "rate", rename_all = "lowercase")]
pub enum BaudHandling {
    Unsupported,
    Lookup,
    /// Ignore the code and always acknowledge this rate.
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "name", rename_all = "lowercase")]
pub enum ParityHandling {
    Unsupported,
    Lookup,
    /// Acknowledge any known parity code with this name. The stub firmware
    /// answers `OK ODD` even for `PE`/`PN`.
    Fixed(&'static str),
}

/// Command subset and canned replies of one simulated module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleProfile {
    pub variant: Variant,
    pub version: Option<&'static str>,
    pub baud: BaudHandling,
    pub parity: ParityHandling,
    pub name_and_pin: bool,
    pub role: bool,
    pub echo: bool,
}

impl ModuleProfile {
    /// Line printed once when the emulator starts, if any.
    pub fn banner(&self) -> Option<&'static str> {
        self.echo.then_some("listening...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_round_trips_through_str() {
        for variant in Variant::ALL {
            assert_eq!(variant.as_str().parse::<Variant>().unwrap(), variant);
        }
        assert_eq!("HC06".parse::<Variant>().unwrap(), Variant::Hc06);
        assert!("hc05".parse::<Variant>().is_err());
    }

    #[test]
    fn test_profiles_differ_in_version() {
        assert_eq!(Variant::Hc06.profile().version, Some("HC06SimV1.0"));
        assert_eq!(Variant::Linvor.profile().version, Some("LinvorV1.8"));
        assert_eq!(Variant::Minimal.profile().version, None);
    }

    #[test]
    fn test_only_echo_has_banner() {
        assert_eq!(Variant::Echo.profile().banner(), Some("listening..."));
        assert_eq!(Variant::Hc06.profile().banner(), None);
    }
}
