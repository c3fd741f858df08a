//! `iotblocks` command-line tool.
//!
//! ```text
//!   iotblocks generate --target micropython program.json   → source on stdout
//!   iotblocks describe                                     → descriptor JSON
//!   iotblocks encode publish /hello helloworld             → one WF line
//! ```

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};

use iotblocks::codegen::{self, Program, Target};
use iotblocks::config::IotConfig;
use iotblocks::extension;
use iotblocks::protocol::{Command, Credentials};

/// IoT block code generator and protocol helper
#[derive(Parser, Debug)]
#[command(name = "iotblocks")]
#[command(version)]
#[command(about = "Generate board code from IoT block programs")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// JSON configuration file (defaults apply to missing fields)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Translate a block program to target source
    Generate {
        /// Output target: arduino, micropython
        #[arg(short, long, default_value = "arduino")]
        target: Target,

        /// Program JSON file, `-` for stdin
        program: PathBuf,

        /// Write source here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail if any block produced a diagnostic
        #[arg(long)]
        strict: bool,
    },
    /// Print the extension descriptor as JSON
    Describe,
    /// Print one protocol line
    Encode {
        #[command(subcommand)]
        command: EncodeCommand,
    },
}

#[derive(Subcommand, Debug)]
enum EncodeCommand {
    /// Init command sent after the wake sequence
    Init,
    /// Join an access point
    Ap { ssid: String, password: String },
    /// Connect to a broker
    Broker {
        server: String,
        client_id: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        pass: Option<String>,
    },
    /// Publish a payload
    Publish { topic: String, data: String },
    /// Subscribe to a topic
    Subscribe { topic: String },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<IotConfig> {
    let Some(path) = path else {
        return Ok(IotConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = IotConfig::from_json(&text).with_context(|| format!("loading {}", path.display()))?;
    info!("config loaded from {}", path.display());
    Ok(config)
}

fn read_program(path: &PathBuf) -> anyhow::Result<Program> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading program from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    Program::from_json(&text).context("parsing program JSON")
}

fn generate(
    config: &IotConfig,
    target: Target,
    program: &PathBuf,
    output: Option<&PathBuf>,
    strict: bool,
) -> anyhow::Result<()> {
    let program = read_program(program)?;
    let out = codegen::generate(&program, target, &config.codegen)?;

    for d in &out.diagnostics {
        warn!("{}: {}", d.opcode, d.error);
    }
    if strict && !out.diagnostics.is_empty() {
        bail!("{} block(s) could not be translated", out.diagnostics.len());
    }

    match output {
        Some(path) => {
            fs::write(path, &out.source).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} ({} bytes)", path.display(), out.source.len());
        }
        None => io::stdout().write_all(out.source.as_bytes())?,
    }
    Ok(())
}

fn encode(command: &EncodeCommand) -> String {
    let cmd = match command {
        EncodeCommand::Init => Command::Init,
        EncodeCommand::Ap { ssid, password } => Command::ConnectAp { ssid, password },
        EncodeCommand::Broker {
            server,
            client_id,
            user,
            pass,
        } => Command::ConnectBroker {
            server,
            client_id,
            credentials: user.as_deref().filter(|u| !u.is_empty()).map(|username| Credentials {
                username,
                password: pass.as_deref().unwrap_or_default(),
            }),
        },
        EncodeCommand::Publish { topic, data } => Command::Publish { topic, data },
        EncodeCommand::Subscribe { topic } => Command::Subscribe { topic },
    };
    cmd.encode()
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    match &args.mode {
        Mode::Generate {
            target,
            program,
            output,
            strict,
        } => generate(&config, *target, program, output.as_ref(), *strict),
        Mode::Describe => {
            let descriptor = extension::descriptor(&config.extension);
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
            Ok(())
        }
        Mode::Encode { command } => {
            print!("{}", encode(command));
            Ok(())
        }
    }
}
