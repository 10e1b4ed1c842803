use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hc06_sim_lib::commands::{self, EmulateOverrides, Target};
use hc06_sim_lib::config::SimConfig;
use hc06_sim_lib::responder::Variant;

#[derive(Parser, Debug)]
#[command(name = "hc06-sim", version, about = "HC-06 / Linvor Bluetooth serial module emulator")]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer AT commands on a serial port like a real module
    Emulate {
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short, long)]
        baud: Option<u32>,
        #[arg(short, long, value_enum)]
        variant: Option<Variant>,
        /// Sleep between polls of an idle line, in microseconds
        #[arg(long)]
        idle_sleep_us: Option<u64>,
    },
    /// List serial ports
    Ports {
        #[arg(long)]
        json: bool,
    },
    /// Show the command set of each emulated module
    Profiles {
        #[arg(long)]
        json: bool,
    },
    /// Check a module answers and print its version
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Send a single AT command and print the reply
    Send {
        #[command(flatten)]
        target: TargetArgs,
        /// e.g. `AT+VERSION`, or just `VERSION`
        command: String,
    },
    /// Write the [device] settings from the config file to a module
    Configure {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(clap::Args, Debug)]
struct TargetArgs {
    /// Serial port the module is attached to
    #[arg(short, long)]
    port: Option<String>,
    /// Talk to an in-process emulated module instead of a port
    #[arg(long = "virtual", value_enum)]
    virtual_variant: Option<Variant>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = SimConfig::load_or_default(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Emulate {
            port,
            baud,
            variant,
            idle_sleep_us,
        } => {
            EmulateOverrides {
                port,
                baud,
                variant,
                idle_sleep_us,
            }
            .apply_to(&mut config.emulator);
            commands::emulate(&config.emulator)
        }
        Command::Ports { json } => commands::list_ports(json),
        Command::Profiles { json } => commands::list_profiles(json),
        Command::Probe { target } => run_client(&config, target, |mut client| async move {
            let report = commands::probe(&mut client).await?;
            println!("responding: {}", report.responding);
            println!("version:    {}", report.version.as_deref().unwrap_or("unknown"));
            Ok(())
        }),
        Command::Send { target, command } => run_client(&config, target, |mut client| async move {
            let response = commands::send(&mut client, &command).await?;
            println!("{}", response);
            Ok(())
        }),
        Command::Configure { target } => {
            let settings = config.device.clone();
            run_client(&config, target, |mut client| async move {
                commands::configure(&mut client, &settings).await?;
                println!("Module configured");
                Ok(())
            })
        }
    }
}

fn run_client<F, Fut>(config: &SimConfig, target: TargetArgs, f: F) -> Result<()>
where
    F: FnOnce(hc06_sim_lib::serial::AtClient) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let target = Target::resolve(target.port, target.virtual_variant, &config.emulator)?;
    let client = commands::open_client(&target, config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(f(client))
}
