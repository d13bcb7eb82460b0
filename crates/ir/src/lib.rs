//! BusWrap Intermediate Representation (IR)
//!
//! This crate compiles an [`IpDescriptor`] into a [`WrapperIr`]: the single,
//! fully resolved register map that every output artifact is rendered from.
//! Compilation runs as a fixed pipeline of stages:
//!
//! 1. **FIFO synthesis** appends LEVEL/THRESHOLD/FLUSH registers per FIFO.
//! 2. **Offset ordering** validates addresses and sorts registers ascending.
//! 3. **Field packing** resolves widths and decides each register's write logic.
//! 4. **Interrupt bank** packs the flags into the IM/MIS/RIS/IC registers.
//! 5. **Synchronizers** are planned for `sync: true` inputs.
//! 6. **Header layout** pads the register list into a C struct.
//!
//! The whole descriptor is validated before anything is returned, so a
//! caller never sees a partial register map.

#![warn(missing_docs)]

use buswrap_config::{
    Direction, ExternalInterfaceDescriptor, FifoKind, IpDescriptor, IpInfo, LayoutConfig, Literal,
    ParameterDescriptor, RegisterMode, ResetDescriptor, Width,
};
use serde::Serialize;

mod error;
pub mod fields;
pub mod fifo;
pub mod interrupts;
pub mod layout;
pub mod model;
pub mod offsets;
pub mod params;
pub mod sync;

#[cfg(test)]
mod testutil;

pub use error::{CompileError, Result};
pub use layout::{HeaderLayout, HeaderSlot};
pub use params::ParamTable;

/// Value driven on the read data bus when no register matches the address.
pub const READ_SENTINEL: u32 = 0xDEAD_BEEF;

/// The on-chip bus a wrapper is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BusType {
    /// AMBA APB.
    Apb,
    /// AMBA AHB-Lite.
    Ahbl,
    /// Wishbone classic.
    Wb,
}

impl BusType {
    /// Upper-case name used in macro and module names.
    pub fn name(self) -> &'static str {
        match self {
            BusType::Apb => "APB",
            BusType::Ahbl => "AHBL",
            BusType::Wb => "WB",
        }
    }

    /// Whether the bus carries per-byte write information for 32-bit registers.
    pub fn is_byte_addressable(self) -> bool {
        matches!(self, BusType::Ahbl)
    }
}

/// Everything compilation needs besides the descriptor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Bus the wrapper targets.
    pub target: BusType,
    /// Address map configuration.
    pub layout: LayoutConfig,
}

impl CompileOptions {
    /// Options for `target` with the default address map.
    pub fn new(target: BusType) -> Self {
        Self {
            target,
            layout: LayoutConfig::default(),
        }
    }
}

/// How a writable register is updated from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteStyle {
    /// The whole register is loaded on a write.
    Plain,
    /// Bits outside `keep_mask` fall back to zero the cycle after a write.
    AutoClear {
        /// Bits of the non-auto-clear fields.
        keep_mask: u32,
    },
    /// Each byte lane is written independently.
    Byte,
}

/// What backs a register in the generated wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegisterKind {
    /// A wire sampled from IP ports.
    ReadOnly,
    /// A bus-written flop driving IP ports.
    Write {
        /// Update rule.
        style: WriteStyle,
        /// Reset value.
        init: Literal,
    },
    /// A flop driving `write_port` whose read-back comes from `read_port`.
    ReadWrite {
        /// Reset value.
        init: Literal,
    },
    /// The data window of a FIFO.
    FifoData(FifoKind),
}

/// A field with its bit range resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackedField {
    /// Field name.
    pub name: String,
    /// Least significant bit.
    pub lsb: u32,
    /// Resolved width in bits.
    pub width: u32,
    /// Width as authored, kept so generated HDL stays parameterized.
    pub width_expr: Width,
    /// IP port bound to the field.
    pub port: String,
    /// Whether the field self-clears after a write.
    pub auto_clear: bool,
    /// Free-form description.
    pub description: String,
}

impl PackedField {
    /// Most significant bit.
    pub fn msb(&self) -> u32 {
        self.lsb + self.width - 1
    }

    /// `(2^width - 1) << lsb`
    pub fn mask(&self) -> u32 {
        bit_mask(self.lsb, self.width)
    }
}

/// One register of the final map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrRegister {
    /// Register name.
    pub name: String,
    /// Byte offset within the peripheral.
    pub offset: u64,
    /// Size as authored.
    pub size: Width,
    /// Resolved size in bits.
    pub bits: u32,
    /// Software access mode.
    pub mode: RegisterMode,
    /// Backing logic.
    pub kind: RegisterKind,
    /// Packed fields, in declaration order.
    pub fields: Vec<PackedField>,
    /// Whole-register read binding.
    pub read_port: Option<String>,
    /// Whole-register write binding.
    pub write_port: Option<String>,
    /// Free-form description.
    pub description: String,
}

impl IrRegister {
    /// Whether reads return the register's read wire rather than its flop.
    pub fn reads_wire(&self) -> bool {
        self.mode.is_readable() || matches!(self.kind, RegisterKind::FifoData(_))
    }
}

/// An interrupt source and its bits in the interrupt registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrFlag {
    /// Flag name.
    pub name: String,
    /// IP port raising the flag.
    pub port: String,
    /// First bit in IM/RIS/MIS/IC.
    pub lsb: u32,
    /// Resolved width of the port.
    pub width: u32,
    /// Width of the port as authored.
    pub width_expr: Width,
    /// Free-form description.
    pub description: String,
}

impl IrFlag {
    /// Mask of the flag's bits.
    pub fn mask(&self) -> u32 {
        bit_mask(self.lsb, self.width)
    }

    /// Whether the flag needs its own wire because it aliases a differently named port.
    pub fn is_alias(&self) -> bool {
        self.name != self.port
    }
}

/// The IM/MIS/RIS/IC register group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterruptBank {
    /// Flags in bit order.
    pub flags: Vec<IrFlag>,
    /// Total bits used.
    pub width: u32,
    /// Interrupt mask offset.
    pub im_offset: u64,
    /// Masked interrupt status offset.
    pub mis_offset: u64,
    /// Raw interrupt status offset.
    pub ris_offset: u64,
    /// Interrupt clear offset.
    pub ic_offset: u64,
}

impl InterruptBank {
    /// Mask covering every flag bit.
    pub fn mask(&self) -> u32 {
        bit_mask(0, self.width)
    }

    /// The four registers in read-mux order with their offsets.
    pub fn registers(&self) -> [(&'static str, u64); 4] {
        [
            ("IM", self.im_offset),
            ("MIS", self.mis_offset),
            ("RIS", self.ris_offset),
            ("IC", self.ic_offset),
        ]
    }
}

/// A metastability synchronizer in front of an external input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Synchronizer {
    /// External interface name (the raw wrapper input).
    pub interface: String,
    /// IP port receiving the synchronized value.
    pub port: String,
    /// Signal width.
    pub width: Width,
    /// Number of flops in the chain.
    pub stages: u32,
}

/// Data and strobe wiring between a FIFO and its data register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FifoLink {
    /// FIFO name.
    pub name: String,
    /// Read (bus pops) or write (bus pushes).
    pub kind: FifoKind,
    /// Data register name.
    pub register: String,
    /// Data register offset.
    pub register_offset: u64,
    /// IP data port.
    pub data_port: String,
    /// IP push/pop strobe.
    pub control_port: String,
}

/// An IP port with its width resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrPort {
    /// Port name.
    pub name: String,
    /// Width as authored.
    pub width: Width,
    /// Resolved width.
    pub bits: u32,
    /// Declared direction, if any.
    pub direction: Option<Direction>,
    /// Free-form description.
    pub description: String,
}

/// The compiled register map of one IP for one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperIr {
    /// Bus the map was compiled for.
    pub target: BusType,
    /// Address map configuration.
    pub layout: LayoutConfig,
    /// IP metadata.
    pub info: IpInfo,
    /// Module parameters.
    pub parameters: Vec<ParameterDescriptor>,
    /// IP ports.
    pub ports: Vec<IrPort>,
    /// Pass-through signals.
    pub external_interfaces: Vec<ExternalInterfaceDescriptor>,
    /// IP clock port.
    pub clock: String,
    /// IP reset port and polarity.
    pub reset: ResetDescriptor,
    /// Every register, ascending by offset.
    pub registers: Vec<IrRegister>,
    /// Interrupt registers, absent when the IP has no flags.
    pub interrupts: Option<InterruptBank>,
    /// Input synchronizers.
    pub synchronizers: Vec<Synchronizer>,
    /// FIFO wiring.
    pub fifos: Vec<FifoLink>,
    /// C struct layout.
    pub header: HeaderLayout,
}

impl WrapperIr {
    /// Looks up a register by name.
    pub fn register(&self, name: &str) -> Option<&IrRegister> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Looks up a register by offset.
    pub fn register_at(&self, offset: u64) -> Option<&IrRegister> {
        self.registers.iter().find(|r| r.offset == offset)
    }

    /// Resolved width of an IP port.
    pub fn port_bits(&self, name: &str) -> Option<u32> {
        self.ports.iter().find(|p| p.name == name).map(|p| p.bits)
    }
}

/// Compiles `ip` for `options.target`.
///
/// The descriptor is borrowed; synthesis and sorting work on a private copy,
/// so concurrent compilations of different descriptors share nothing.
pub fn compile(ip: &IpDescriptor, options: &CompileOptions) -> Result<WrapperIr> {
    let layout = &options.layout;
    tracing::debug!(
        "Compiling {} for {}",
        ip.info.name,
        options.target.name()
    );

    if ip.reset.level > 1 {
        return Err(CompileError::InvalidResetLevel(ip.reset.level));
    }

    offsets::check_layout(layout, ip.fifos.len())?;

    let params = ParamTable::new(ip);
    let ports = ip
        .ports
        .iter()
        .map(|p| {
            Ok(IrPort {
                name: p.name.clone(),
                width: p.width.clone(),
                bits: nonzero_width(&params, &p.width, format!("port {}", p.name))?,
                direction: p.direction,
                description: p.description.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    for ifc in &ip.external_interface {
        nonzero_width(&params, &ifc.width, format!("interface {}", ifc.name))?;
    }

    offsets::check_regions(&ip.registers, ip.fifos.len(), layout)?;
    let spec = fifo::synthesize(ip.clone(), layout)?;
    let spec = offsets::sort(spec, layout)?;

    let registers = spec
        .registers
        .iter()
        .map(|r| fields::pack(r, &spec, &params, options.target))
        .collect::<Result<Vec<_>>>()?;
    let interrupts = interrupts::build(&spec, &params, layout)?;
    let synchronizers = sync::plan(&spec)?;
    let fifos = fifo::links(&spec, &registers)?;
    let header = HeaderLayout::build(&registers, layout);

    tracing::info!(
        "Compiled {}: {} registers, {} interrupt bits",
        spec.info.name,
        registers.len(),
        interrupts.as_ref().map_or(0, |b| b.width)
    );

    Ok(WrapperIr {
        target: options.target,
        layout: *layout,
        info: spec.info,
        parameters: spec.parameters,
        ports,
        external_interfaces: spec.external_interface,
        clock: spec.clock.name,
        reset: spec.reset,
        registers,
        interrupts,
        synchronizers,
        fifos,
        header,
    })
}

fn nonzero_width(params: &ParamTable, width: &Width, entity: String) -> Result<u32> {
    match params.resolve(width, &entity)? {
        0 => Err(CompileError::ZeroWidthPort { entity }),
        bits => Ok(bits),
    }
}

fn bit_mask(lsb: u32, width: u32) -> u32 {
    (((1u64 << width) - 1) << lsb) as u32
}
