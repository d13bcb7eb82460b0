// BusWrap - Bus Wrapper Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Serializable description of a wrapped IP block.
//!
//! An [`IpDescriptor`] is what the user authors (YAML or JSON): the IP's
//! parameters and ports, the registers exposed on the bus, the interrupt
//! flags and the FIFOs. Nothing here is validated beyond what serde enforces;
//! the compiler in `buswrap-ir` checks the descriptor as a whole.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Width of the bus data path in bits. Every register slot is one word.
pub const BUS_DATA_WIDTH: u32 = 32;

/// Byte distance between two FIFO register groups in the FIFO bank.
pub const FIFO_STRIDE: u64 = 0x10;

/// Bytes occupied by the four interrupt registers.
pub const INTERRUPT_BANK_SIZE: u64 = 0x10;

pub const DEFAULT_BUS_ADDRESS_WIDTH: u32 = 16;
pub const DEFAULT_INTERRUPT_BASE: u64 = 0xFF00;
pub const DEFAULT_FIFO_BASE: u64 = 0xFE00;

fn default_true() -> bool {
    true
}

/// A width that is either a literal bit count or the name of a parameter
/// whose default supplies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Width {
    Bits(u32),
    Param(String),
}

impl Width {
    pub fn as_param(&self) -> Option<&str> {
        match self {
            Width::Bits(_) => None,
            Width::Param(name) => Some(name),
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Bits(bits) => write!(f, "{}", bits),
            Width::Param(name) => f.write_str(name),
        }
    }
}

/// A parameter default or register reset value.
///
/// Strings are passed through verbatim, so Verilog literals such as
/// `'h3F08` survive into the generated source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(u64),
    Text(String),
}

impl Literal {
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Literal::Int(v) => Some(*v),
            Literal::Text(_) => None,
        }
    }
}

impl Default for Literal {
    fn default() -> Self {
        Literal::Int(0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
    Inout,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Input => "input",
            Direction::Output => "output",
            Direction::Inout => "inout",
        })
    }
}

/// Software access mode of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterMode {
    #[serde(rename = "r", alias = "R")]
    Read,
    #[serde(rename = "w", alias = "W")]
    Write,
    #[serde(rename = "rw", alias = "RW")]
    ReadWrite,
}

impl RegisterMode {
    pub fn is_readable(self) -> bool {
        matches!(self, RegisterMode::Read | RegisterMode::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, RegisterMode::Write | RegisterMode::ReadWrite)
    }
}

impl fmt::Display for RegisterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RegisterMode::Read => "r",
            RegisterMode::Write => "w",
            RegisterMode::ReadWrite => "rw",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub license: String,
    /// Free-form date string, conventionally `M-D-YYYY`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub default: Literal,
    #[serde(default)]
    pub description: String,
}

/// A port of the wrapped IP instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub name: String,
    pub width: Width,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub description: String,
}

/// A signal passed straight through the wrapper boundary to an IP port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInterfaceDescriptor {
    pub name: String,
    pub port: String,
    pub direction: Direction,
    pub width: Width,
    #[serde(default)]
    pub sync: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockDescriptor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetDescriptor {
    pub name: String,
    /// Asserted level: 0 for active-low, 1 for active-high.
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub bit_offset: u32,
    pub bit_width: Width,
    #[serde(default)]
    pub read_port: Option<String>,
    #[serde(default)]
    pub write_port: Option<String>,
    #[serde(default)]
    pub auto_clear: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDescriptor {
    pub name: String,
    pub size: Width,
    pub mode: RegisterMode,
    pub offset: u64,
    #[serde(default)]
    pub fifo: bool,
    #[serde(default)]
    pub init: Option<Literal>,
    #[serde(default)]
    pub byte_access: bool,
    #[serde(default)]
    pub read_port: Option<String>,
    #[serde(default)]
    pub write_port: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDescriptor {
    pub name: String,
    pub port: String,
    #[serde(default)]
    pub description: String,
}

/// Direction of a FIFO as seen from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FifoKind {
    /// The bus pops data out of the IP (receive FIFO).
    Read,
    /// The bus pushes data into the IP (transmit FIFO).
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FifoKind,
    #[serde(default)]
    pub width: Option<Width>,
    #[serde(default)]
    pub depth: Option<u32>,
    /// The `fifo: true` register through which data moves.
    pub register: String,
    pub data_port: String,
    pub control_port: String,
    pub address_width: u32,
    pub level_port: String,
    pub threshold_port: String,
    pub flush_port: String,
    #[serde(default = "default_true")]
    pub flush_enable: bool,
}

/// The complete, user-authored description of an IP and its register map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpDescriptor {
    pub info: IpInfo,
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub ports: Vec<PortDescriptor>,
    #[serde(default)]
    pub external_interface: Vec<ExternalInterfaceDescriptor>,
    pub clock: ClockDescriptor,
    pub reset: ResetDescriptor,
    #[serde(default)]
    pub registers: Vec<RegisterDescriptor>,
    #[serde(default)]
    pub flags: Vec<FlagDescriptor>,
    #[serde(default)]
    pub fifos: Vec<FifoDescriptor>,
}

impl IpDescriptor {
    /// Loads a descriptor, choosing the format from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read IP description {:?}", path))?;

        let descriptor = match ext.as_deref() {
            Some("json") => Self::from_json(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => anyhow::bail!(
                "IP description {:?} must be a YAML (.yaml/.yml) or JSON (.json) file",
                path
            ),
        }
        .with_context(|| format!("Failed to load {:?}", path))?;

        tracing::debug!(
            "Loaded IP '{}' ({} registers, {} flags, {} fifos)",
            descriptor.info.name,
            descriptor.registers.len(),
            descriptor.flags.len(),
            descriptor.fifos.len()
        );
        Ok(descriptor)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse IP description YAML")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse IP description JSON")
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn port(&self, name: &str) -> Option<&PortDescriptor> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn register(&self, name: &str) -> Option<&RegisterDescriptor> {
        self.registers.iter().find(|r| r.name == name)
    }
}

/// Placement of the fixed register banks within the peripheral's address window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Number of address bits decoded by the wrapper.
    pub bus_address_width: u32,
    /// Offset of IM; MIS, RIS and IC follow at +4, +8 and +0xC.
    pub interrupt_base: u64,
    /// Offset of the first FIFO's LEVEL register.
    pub fifo_base: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bus_address_width: DEFAULT_BUS_ADDRESS_WIDTH,
            interrupt_base: DEFAULT_INTERRUPT_BASE,
            fifo_base: DEFAULT_FIFO_BASE,
        }
    }
}

impl LayoutConfig {
    /// First offset past the decoded address window.
    pub fn address_limit(&self) -> u64 {
        1u64.checked_shl(self.bus_address_width).unwrap_or(u64::MAX)
    }

    /// Base offset of the register group of the FIFO at `index`.
    pub fn fifo_slot(&self, index: usize) -> u64 {
        self.fifo_base + index as u64 * FIFO_STRIDE
    }

    pub fn interrupt_end(&self) -> u64 {
        self.interrupt_base.saturating_add(INTERRUPT_BANK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMER_YAML: &str = r#"
info:
  name: EF_TMR
  description: A simple timer
  license: MIT
  cell_count: 1200
parameters:
  - name: W
    default: 24
ports:
  - name: period
    width: W
  - name: to_flag
    width: 1
clock:
  name: clk
reset:
  name: rst_n
  level: 0
registers:
  - name: PERIOD
    size: W
    mode: w
    offset: 0x04
    write_port: period
  - name: CTRL
    size: 2
    mode: w
    offset: 0x08
    init: "'h1"
    fields:
      - name: en
        bit_offset: 0
        bit_width: 1
        write_port: en
      - name: restart
        bit_offset: 1
        bit_width: 1
        write_port: restart
        auto_clear: true
flags:
  - name: TO
    port: to_flag
"#;

    #[test]
    fn test_descriptor_parsing() {
        let ip = IpDescriptor::from_yaml(TIMER_YAML).unwrap();
        assert_eq!(ip.info.name, "EF_TMR");
        assert_eq!(ip.info.license, "MIT");
        assert_eq!(ip.registers.len(), 2);
        assert_eq!(ip.registers[0].size, Width::Param("W".to_string()));
        assert_eq!(ip.registers[0].offset, 4);
        assert!(!ip.registers[0].fifo);
        assert_eq!(ip.registers[1].mode, RegisterMode::Write);
        assert_eq!(ip.registers[1].init, Some(Literal::Text("'h1".to_string())));
        assert!(ip.registers[1].fields[1].auto_clear);
        assert!(ip.fifos.is_empty());
        assert_eq!(ip.parameter("W").unwrap().default, Literal::Int(24));
        assert_eq!(ip.port("period").unwrap().width.as_param(), Some("W"));
        assert!(ip.register("STATUS").is_none());
    }

    #[test]
    fn test_fifo_defaults() {
        let yaml = r#"
info: { name: X }
clock: { name: clk }
reset: { name: rst, level: 1 }
fifos:
  - name: RX_FIFO
    type: read
    register: RXDATA
    data_port: rdata
    control_port: rd
    address_width: 4
    level_port: rx_level
    threshold_port: rx_th
    flush_port: rx_flush
"#;
        let ip = IpDescriptor::from_yaml(yaml).unwrap();
        assert_eq!(ip.fifos[0].kind, FifoKind::Read);
        assert!(ip.fifos[0].flush_enable);
        assert_eq!(ip.fifos[0].depth, None);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let yaml = r#"
info: { name: X }
clock: { name: clk }
reset: { name: rst, level: 1 }
registers:
  - { name: A, size: 8, mode: x, offset: 0 }
"#;
        assert!(IpDescriptor::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip.json");
        std::fs::write(
            &path,
            r#"{"info": {"name": "J"}, "clock": {"name": "c"}, "reset": {"name": "r", "level": 0},
                "registers": [{"name": "D", "size": 8, "mode": "rw", "offset": 0,
                               "read_port": "a", "write_port": "b"}]}"#,
        )
        .unwrap();
        let ip = IpDescriptor::from_file(&path).unwrap();
        assert_eq!(ip.registers[0].mode, RegisterMode::ReadWrite);
    }

    #[test]
    fn test_from_file_rejects_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ip.txt");
        std::fs::write(&path, "info: {name: X}").unwrap();
        let err = IpDescriptor::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("YAML"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = IpDescriptor::from_yaml("info: [unterminated").unwrap_err();
        assert!(err.to_string().contains("Failed to parse IP description YAML"));
    }

    #[test]
    fn test_layout_defaults() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.fifo_slot(2), 0xFE20);
        assert_eq!(layout.interrupt_end(), 0xFF10);
        assert_eq!(layout.address_limit(), 0x1_0000);
    }

    #[test]
    fn test_layout_limits_do_not_overflow() {
        let layout = LayoutConfig {
            bus_address_width: 64,
            interrupt_base: u64::MAX,
            fifo_base: 0,
        };
        assert_eq!(layout.address_limit(), u64::MAX);
        assert_eq!(layout.interrupt_end(), u64::MAX);
    }
}
