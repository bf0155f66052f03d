//! rigcat - send vendor-neutral CAT commands to a transceiver

mod settings;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use rigcat::{CodecOptions, CommandScript, Rig};
use rigcat_port::{PortScanner, SerialTransport};
use rigcat_protocol::icom::{self, parse_address};
use rigcat_protocol::{Command, PttMethod, Response, RigDatabase};
use settings::Settings;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rigcat", version, about = "Send CAT commands to a transceiver")]
struct Cli {
    /// Settings file (default: ~/.config/rigcat/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rig model, e.g. FT-817, FT-991, IC-7300
    #[arg(long, global = true)]
    rig: Option<String>,

    /// Serial port, e.g. /dev/ttyUSB0 or COM3
    #[arg(long, global = true)]
    port: Option<String>,

    /// Baud rate
    #[arg(long, global = true)]
    baud: Option<u32>,

    /// Whether the radio echoes its commands (CI-V)
    #[arg(long, global = true, action = ArgAction::Set)]
    echo: Option<bool>,

    /// PTT method: NONE, CAT, DTR or RTS
    #[arg(long, global = true)]
    ptt: Option<PttMethod>,

    /// CI-V address in hex, e.g. 94 or 0x94
    #[arg(long, global = true, value_parser = parse_address)]
    civ_address: Option<u8>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one command and print the response
    Exec {
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run every command in a file
    Run { file: PathBuf },
    /// List serial ports
    Ports,
    /// List supported rig models
    Rigs,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "rigcat=debug,rigcat_cli=debug,rigcat_protocol=debug,rigcat_port=debug"
    } else {
        "rigcat=info,rigcat_protocol=info,rigcat_port=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Exec { name, args } => {
            let mut rig = open_rig(&cli)?;
            println!("{}", rig.dispatch(name, args.as_slice()));
        }
        Commands::Run { file } => {
            let source = File::open(file)
                .with_context(|| format!("opening command file {}", file.display()))?;
            let mut rig = open_rig(&cli)?;
            run_script(&mut rig, CommandScript::new(BufReader::new(source)))
                .with_context(|| format!("reading command file {}", file.display()))?;
        }
        Commands::Ports => list_ports()?,
        Commands::Rigs => list_rigs(),
    }
    Ok(())
}

/// Settings file with the command line flags applied on top
fn effective_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(rig) = &cli.rig {
        settings.rig = rig.clone();
    }
    if let Some(port) = &cli.port {
        settings.port.port = port.clone();
    }
    if let Some(baud) = cli.baud {
        settings.port.baud_rate = baud;
    }
    if let Some(echo) = cli.echo {
        settings.port.echo = Some(echo);
    }
    if let Some(ptt) = cli.ptt {
        settings.ptt_method = Some(ptt);
    }
    if let Some(address) = cli.civ_address {
        settings.civ_address = Some(address);
    }
    Ok(settings)
}

fn open_rig(cli: &Cli) -> anyhow::Result<Rig> {
    let settings = effective_settings(cli)?;
    if settings.port.port.is_empty() {
        bail!("no serial port configured; pass --port or set it in the settings file");
    }

    let transport = SerialTransport::open(&settings.port)
        .with_context(|| format!("opening {}", settings.port.port))?;
    let options = CodecOptions {
        echo: settings.port.echo,
        civ_address: settings.civ_address,
    };
    let mut rig = Rig::open(&settings.rig, Box::new(transport), &options)?;

    if let Some(method) = settings.ptt_method {
        apply_ptt_method(&mut rig, method);
    }
    Ok(rig)
}

/// Select the configured PTT method, warning when the rig refuses it
fn apply_ptt_method(rig: &mut Rig, method: PttMethod) -> Response {
    let response = rig.dispatch("PTT-METHOD", &[method.as_str()]);
    if response.is_success() {
        debug!("PTT method {}", method);
    } else {
        warn!("PTT method {} not applied: {}", method, response);
    }
    response
}

/// Run every command in `script`, returning how many ran and how many failed
fn run_script<R: std::io::BufRead>(
    rig: &mut Rig,
    script: CommandScript<R>,
) -> anyhow::Result<(usize, usize)> {
    let (mut count, mut failed) = (0usize, 0usize);
    for line in script {
        let Some(cmd) = Command::parse(&line?) else {
            continue;
        };
        let response = rig.execute(&cmd);
        println!("{cmd} => {response}");
        count += 1;
        if !response.is_success() {
            failed += 1;
        }
    }
    info!("ran {} command(s), {} failed", count, failed);
    Ok((count, failed))
}

fn list_ports() -> anyhow::Result<()> {
    let ports = PortScanner::new()
        .enumerate_ports()
        .context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        println!("{:<20} {}", port.port, port.description());
    }
    Ok(())
}

fn list_rigs() {
    for model in RigDatabase::models() {
        let address = model
            .civ_address
            .map(|a| format!(" address 0x{a:02X}"))
            .unwrap_or_default();
        println!("{:<12} {}{}", model.name, model.protocol.name(), address);
    }
    println!();
    println!("Icom radios (generic CI-V codec):");
    for (name, address) in icom::ADDRESS_TABLE {
        println!("{name:<12} 0x{address:02X}");
    }
}
