use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::interface::LineSettings;
use super::{Result, SerialError, SerialInterface};
use crate::responder::tables;

pub const MAX_NAME_LEN: usize = 20;
pub const PIN_LEN: usize = 4;
// Modules drop commands that arrive while they are still busy with the last one
pub const DEFAULT_COMMAND_INTERVAL_MS: u64 = 1000;

/// AT configuration client for HC-06 style modules.
///
/// Talks to a module over a [`SerialInterface`]: every command is `AT` or
/// `AT+<payload>` with no terminator, and the reply is whatever text the
/// module sends back before the line goes quiet.
pub struct AtClient {
    interface: SerialInterface,
    command_interval: Duration,
}

/// Settings a module should carry, as written by [`AtClient::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Line rate in bps. Must be one of the rates the module knows.
    pub baud_rate: u32,
    /// `none`, `even` or `odd`.
    pub parity: String,
    /// Bluetooth name, at most 20 characters.
    pub name: String,
    /// Four character pairing PIN.
    pub pin: String,
    /// `slave` or `master`. Left alone by firmware without a role command.
    pub role: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            parity: "none".to_string(),
            name: "HC-06".to_string(),
            pin: "1234".to_string(),
            role: "slave".to_string(),
        }
    }
}

impl DeviceSettings {
    pub fn baud_code(&self) -> Result<&'static str> {
        tables::baud_code_for_rate(self.baud_rate)
            .ok_or_else(|| SerialError::InvalidArgument(format!("Unsupported baud rate: {}", self.baud_rate)))
    }

    pub fn parity_code(&self) -> Result<&'static str> {
        tables::parity_code_for_name(&self.parity)
            .ok_or_else(|| SerialError::InvalidArgument(format!("Unknown parity: {}", self.parity)))
    }

    pub fn role_code(&self) -> Result<&'static str> {
        tables::role_code_for_name(&self.role)
            .ok_or_else(|| SerialError::InvalidArgument(format!("Unknown role: {}", self.role)))
    }

    /// Check every field before anything is sent to the module.
    pub fn validate(&self) -> Result<()> {
        self.baud_code()?;
        self.parity_code()?;
        self.role_code()?;
        validate_name(&self.name)?;
        validate_pin(&self.pin)?;
        Ok(())
    }

    /// Port settings matching what the module is configured for.
    pub fn line_settings(&self) -> Result<LineSettings> {
        let parity = match self.parity_code()? {
            "PO" => serialport::Parity::Odd,
            "PE" => serialport::Parity::Even,
            _ => serialport::Parity::None,
        };
        Ok(LineSettings {
            baud_rate: self.baud_rate,
            parity,
        })
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(SerialError::InvalidArgument(format!(
            "Name too long: {} chars max",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_pin(pin: &str) -> Result<()> {
    if pin.chars().count() != PIN_LEN {
        return Err(SerialError::InvalidArgument(format!(
            "PIN length must be {} characters",
            PIN_LEN
        )));
    }
    Ok(())
}

impl AtClient {
    pub fn new(interface: SerialInterface) -> Self {
        Self {
            interface,
            command_interval: Duration::from_millis(DEFAULT_COMMAND_INTERVAL_MS),
        }
    }

    /// Pause between the commands of [`AtClient::apply`]. Zero for
    /// in-process modules.
    pub fn with_command_interval(mut self, interval: Duration) -> Self {
        self.command_interval = interval;
        self
    }

    /// Send `AT` (empty payload) or `AT+<payload>` and return the reply.
    pub async fn send_at(&mut self, payload: &str) -> Result<String> {
        if !self.interface.is_connected() {
            return Err(SerialError::ConnectionFailed("Port not opened".to_string()));
        }

        let message = if payload.is_empty() {
            "AT".to_string()
        } else {
            format!("AT+{}", payload)
        };
        self.interface.send_command(&message).await
    }

    async fn send_expecting_ok(&mut self, payload: &str, what: &str) -> Result<String> {
        let response = self.send_at(payload).await?;
        if response.starts_with("OK") {
            Ok(response)
        } else {
            Err(SerialError::ProtocolError(format!("Unable to set {}: \"{}\"", what, response)))
        }
    }

    /// Check the module answers at all.
    pub async fn ping(&mut self) -> Result<bool> {
        let response = self.send_at("").await?;
        Ok(response == "OK")
    }

    /// Firmware version string.
    pub async fn version(&mut self) -> Result<String> {
        let response = self.send_at("VERSION").await?;
        // Some modules prefix the version with OK, others do not
        Ok(response
            .strip_prefix("OK")
            .unwrap_or(&response)
            .to_string())
    }

    pub async fn set_baud(&mut self, code: &str) -> Result<String> {
        self.send_expecting_ok(&format!("BAUD{}", code), "baud").await
    }

    /// `code` is one of `PN`, `PO` or `PE`.
    pub async fn set_parity(&mut self, code: &str) -> Result<String> {
        self.send_expecting_ok(code, "parity").await
    }

    /// `code` is `M` or `S`.
    pub async fn set_role(&mut self, code: &str) -> Result<String> {
        self.send_expecting_ok(&format!("ROLE={}", code), "role").await
    }

    pub async fn set_name(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        let response = self.send_at(&format!("NAME{}", name)).await?;
        if response != "OKsetname" && response != "OKname" {
            return Err(SerialError::ProtocolError(format!("Unable to set name: \"{}\"", response)));
        }
        Ok(())
    }

    pub async fn set_pin(&mut self, pin: &str) -> Result<()> {
        validate_pin(pin)?;
        let response = self.send_at(&format!("PIN{}", pin)).await?;
        if !response.eq_ignore_ascii_case("oksetpin") {
            return Err(SerialError::ProtocolError(format!("Unable to set PIN: \"{}\"", response)));
        }
        Ok(())
    }

    /// Write every setting to the module.
    ///
    /// Role goes first so firmware without a role command is found out
    /// before anything else is written; such a module keeps its role and a
    /// warning is logged. After parity and after baud the port is reopened
    /// with the new line settings and the module pinged again. Baud goes
    /// last since the module switches rate right after answering.
    pub async fn apply(&mut self, settings: &DeviceSettings) -> Result<()> {
        settings.validate()?;
        let target = settings.line_settings()?;

        let role = self.send_at(&format!("ROLE={}", settings.role_code()?)).await?;
        if !role.starts_with("OK") {
            log::warn!("Module has no role command, role left unchanged: \"{}\"", role);
        }

        self.pause().await;
        self.set_name(&settings.name).await?;
        self.pause().await;
        self.set_pin(&settings.pin).await?;

        self.pause().await;
        self.set_parity(settings.parity_code()?).await?;
        let current_baud = self
            .interface
            .line_settings()
            .map_or(target.baud_rate, |line| line.baud_rate);
        self.reconnect(LineSettings {
            baud_rate: current_baud,
            parity: target.parity,
        })
        .await?;

        self.pause().await;
        self.set_baud(settings.baud_code()?).await?;
        self.reconnect(target).await?;

        log::info!("Module settings written");
        Ok(())
    }

    async fn pause(&self) {
        if !self.command_interval.is_zero() {
            tokio::time::sleep(self.command_interval).await;
        }
    }

    /// Reopen the port with `line` and check the module still answers.
    async fn reconnect(&mut self, line: LineSettings) -> Result<()> {
        if !self.interface.reopen(line)? {
            return Ok(());
        }

        self.pause().await;
        if !self.ping().await? {
            return Err(SerialError::ProtocolError(format!(
                "Module not answering at {} baud, parity {:?}",
                line.baud_rate, line.parity
            )));
        }
        Ok(())
    }

    pub fn interface_mut(&mut self) -> &mut SerialInterface {
        &mut self.interface
    }
}
