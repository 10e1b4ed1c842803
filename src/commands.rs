use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::config::{EmulatorConfig, SimConfig};
use crate::responder::{Responder, Variant};
use crate::serial::interface::LineSettings;
use crate::serial::{AtClient, DeviceSettings, SerialInterface, VirtualModule};

/// Where the host-side commands send their AT traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Port(String),
    Virtual(Variant),
}

impl Target {
    pub fn resolve(port: Option<String>, virtual_variant: Option<Variant>, config: &EmulatorConfig) -> Result<Self> {
        match (port, virtual_variant) {
            (Some(_), Some(_)) => bail!("--port and --virtual are mutually exclusive"),
            (Some(port), None) => Ok(Target::Port(port)),
            (None, Some(variant)) => Ok(Target::Virtual(variant)),
            (None, None) => match &config.port {
                Some(port) => Ok(Target::Port(port.clone())),
                None => bail!("No port given; pass --port, --virtual or set emulator.port in the config file"),
            },
        }
    }
}

/// Command line values that take precedence over `[emulator]`.
#[derive(Debug, Clone, Default)]
pub struct EmulateOverrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub variant: Option<Variant>,
    pub idle_sleep_us: Option<u64>,
}

impl EmulateOverrides {
    pub fn apply_to(self, config: &mut EmulatorConfig) {
        if self.port.is_some() {
            config.port = self.port;
        }
        if let Some(baud) = self.baud {
            config.baud_rate = baud;
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(idle_sleep_us) = self.idle_sleep_us {
            config.idle_sleep_us = idle_sleep_us;
        }
    }
}

/// Open an AT client against `target`.
pub fn open_client(target: &Target, config: &SimConfig) -> Result<AtClient> {
    let (interface, command_interval) = match target {
        Target::Port(port) => {
            let mut settings = config
                .device
                .line_settings()
                .context("Invalid device settings")?;
            settings.baud_rate = config.emulator.baud_rate;
            let mut interface = SerialInterface::new();
            interface
                .connect(port, settings)
                .with_context(|| format!("Failed to open {}", port))?;
            (interface, Duration::from_millis(config.emulator.command_interval_ms))
        }
        Target::Virtual(variant) => {
            log::info!("Using virtual {} module", variant);
            let interface = SerialInterface::from_link(Box::new(VirtualModule::new(*variant)));
            (interface, Duration::ZERO)
        }
    };

    let interface = interface.with_timing(config.emulator.response_timeout_ms, config.emulator.quiet_period_ms);
    Ok(AtClient::new(interface).with_command_interval(command_interval))
}

/// Run the emulator on a physical port until the link fails.
pub fn emulate(config: &EmulatorConfig) -> Result<()> {
    let port_name = config
        .port
        .as_deref()
        .context("No port given; pass --port or set emulator.port in the config file")?;

    let settings = LineSettings {
        baud_rate: config.baud_rate,
        ..LineSettings::default()
    };
    let port = SerialInterface::open_port(port_name, settings)
        .with_context(|| format!("Failed to open {}", port_name))?;
    log::info!("Listening on {} at {} baud", port_name, config.baud_rate);

    let mut responder = Responder::new(port, config.variant.profile())
        .with_idle_sleep(Duration::from_micros(config.idle_sleep_us));
    responder.run().context("Serial link failed")
}

pub fn list_ports(json: bool) -> Result<()> {
    let ports = SerialInterface::discover_ports().context("Failed to enumerate serial ports")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{}  {:04X}:{:04X}  {}",
                port.port_name,
                vid,
                pid,
                port.product.as_deref().unwrap_or("")
            ),
            _ => println!("{}", port.port_name),
        }
    }
    Ok(())
}

pub fn list_profiles(json: bool) -> Result<()> {
    let profiles: Vec<_> = Variant::ALL.iter().map(Variant::profile).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    for profile in profiles {
        println!(
            "{:<8} version={:<12} role={} name/pin={}",
            profile.variant,
            profile.version.unwrap_or("-"),
            profile.role,
            profile.name_and_pin
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub responding: bool,
    pub version: Option<String>,
}

/// Ping the module and ask for its firmware version.
pub async fn probe(client: &mut AtClient) -> Result<ProbeReport> {
    let responding = client.ping().await.context("Module did not answer AT")?;
    if !responding {
        log::warn!("Module answered AT with something other than OK");
    }
    let version = match client.version().await {
        Ok(version) if version.starts_with("ERROR") => {
            log::warn!("Module has no version command: {}", version);
            None
        }
        Ok(version) => Some(version),
        Err(e) => {
            log::warn!("Version query failed: {}", e);
            None
        }
    };
    Ok(ProbeReport { responding, version })
}

/// Send one raw command. A leading `AT` is kept as is, anything else is
/// treated as the payload after `AT+`.
pub async fn send(client: &mut AtClient, command: &str) -> Result<String> {
    let response = if command.starts_with("AT") {
        client.interface_mut().send_command(command).await?
    } else {
        client.send_at(command).await?
    };
    Ok(response)
}

pub async fn configure(client: &mut AtClient, settings: &DeviceSettings) -> Result<()> {
    client
        .apply(settings)
        .await
        .context("Failed to write module settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_resolution() {
        let mut config = EmulatorConfig::default();
        assert_eq!(
            Target::resolve(Some("COM3".into()), None, &config).unwrap(),
            Target::Port("COM3".into())
        );
        assert_eq!(
            Target::resolve(None, Some(Variant::Linvor), &config).unwrap(),
            Target::Virtual(Variant::Linvor)
        );
        assert!(Target::resolve(None, None, &config).is_err());
        assert!(Target::resolve(Some("COM3".into()), Some(Variant::Hc06), &config).is_err());

        config.port = Some("/dev/rfcomm0".into());
        assert_eq!(
            Target::resolve(None, None, &config).unwrap(),
            Target::Port("/dev/rfcomm0".into())
        );
    }

    #[test]
    fn test_emulate_requires_port() {
        let err = emulate(&EmulatorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No port given"));
    }

    #[test]
    fn test_command_line_overrides_config() {
        let mut config = EmulatorConfig {
            port: Some("/dev/ttyS0".into()),
            variant: Variant::Linvor,
            idle_sleep_us: 500,
            ..Default::default()
        };

        EmulateOverrides {
            baud: Some(38400),
            variant: Some(Variant::Echo),
            ..Default::default()
        }
        .apply_to(&mut config);

        assert_eq!(config.port.as_deref(), Some("/dev/ttyS0"));
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.variant, Variant::Echo);
        assert_eq!(config.idle_sleep_us, 500);

        EmulateOverrides {
            port: Some("/dev/ttyUSB1".into()),
            idle_sleep_us: Some(0),
            ..Default::default()
        }
        .apply_to(&mut config);

        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.idle_sleep_us, 0);
        assert_eq!(config.baud_rate, 38400);
    }

    fn virtual_client(variant: Variant) -> AtClient {
        let mut config = SimConfig::default();
        config.emulator.quiet_period_ms = 20;
        open_client(&Target::Virtual(variant), &config).unwrap()
    }

    #[tokio::test]
    async fn test_status_reports_version() {
        let report = probe(&mut virtual_client(Variant::Linvor)).await.unwrap();
        assert!(report.responding);
        assert_eq!(report.version.as_deref(), Some("LinvorV1.8"));
    }

    #[tokio::test]
    async fn test_status_without_version_command() {
        let report = probe(&mut virtual_client(Variant::Minimal)).await.unwrap();
        assert!(report.responding);
        assert_eq!(report.version, None);
    }

    #[tokio::test]
    async fn test_send_raw_and_payload_commands() {
        let mut client = virtual_client(Variant::Hc06);
        assert_eq!(send(&mut client, "AT+VERSION").await.unwrap(), "HC06SimV1.0");
        assert_eq!(send(&mut client, "VERSION").await.unwrap(), "HC06SimV1.0");
        assert_eq!(send(&mut client, "AT").await.unwrap(), "OK");
        // Raw commands go out untouched, so no `AT+` is prepended.
        assert_eq!(send(&mut client, "ATX").await.unwrap(), "ERROR: unknown command ATX");
        assert_eq!(send(&mut client, "BAUD8").await.unwrap(), "OK115200");
    }

    #[tokio::test]
    async fn test_configure_virtual_linvor() {
        let mut client = virtual_client(Variant::Linvor);
        configure(&mut client, &DeviceSettings::default()).await.unwrap();
    }
}
