// BusWrap - Bus Wrapper Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use buswrap_codegen::Artifact;
use buswrap_config::{IpDescriptor, LayoutConfig};
use buswrap_ir::{BusType, CompileOptions};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::info;

const EXIT_OK: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;

fn parse_addr(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex address '{}': {}", s, e))
    } else {
        u64::from_str(trimmed).map_err(|e| format!("Invalid address '{}': {}", s, e))
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bus_wrap",
    author,
    version,
    about = "BusWrap - bus wrapper generator for register-mapped IPs",
    long_about = None
)]
#[command(group(ArgGroup::new("target").required(true).args(["apb", "ahbl", "wb"])))]
#[command(group(ArgGroup::new("artifact").args(["tb", "ch", "md"])))]
struct Cli {
    /// Path to the IP description (YAML or JSON)
    spec: PathBuf,

    /// Generate for APB
    #[arg(long)]
    apb: bool,

    /// Generate for AHB-Lite
    #[arg(long)]
    ahbl: bool,

    /// Generate for Wishbone
    #[arg(long)]
    wb: bool,

    /// Emit a testbench skeleton instead of the wrapper
    #[arg(long)]
    tb: bool,

    /// Emit the C header
    #[arg(long)]
    ch: bool,

    /// Emit markdown documentation
    #[arg(long)]
    md: bool,

    /// Write the artifact to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Number of address bits decoded by the wrapper
    #[arg(long, default_value_t = buswrap_config::DEFAULT_BUS_ADDRESS_WIDTH)]
    bus_aw: u32,

    /// Offset of the interrupt registers (IM, MIS, RIS, IC)
    #[arg(long, value_parser = parse_addr, default_value = "0xFF00")]
    irq_base: u64,

    /// Offset of the first FIFO register group
    #[arg(long, value_parser = parse_addr, default_value = "0xFE00")]
    fifo_base: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn target(&self) -> BusType {
        if self.ahbl {
            BusType::Ahbl
        } else if self.wb {
            BusType::Wb
        } else {
            BusType::Apb
        }
    }

    fn artifact(&self) -> Artifact {
        if self.tb {
            Artifact::Testbench
        } else if self.ch {
            Artifact::Header
        } else if self.md {
            Artifact::Docs
        } else {
            Artifact::Wrapper
        }
    }

    fn layout(&self) -> LayoutConfig {
        LayoutConfig {
            bus_address_width: self.bus_aw,
            interrupt_base: self.irq_base,
            fifo_base: self.fifo_base,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ip = IpDescriptor::from_file(&cli.spec)?;

    let mut options = CompileOptions::new(cli.target());
    options.layout = cli.layout();
    let ir = buswrap_ir::compile(&ip, &options)
        .with_context(|| format!("Invalid IP description {:?}", cli.spec))?;

    let text = buswrap_codegen::generate(&ir, cli.artifact())?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write output file {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
