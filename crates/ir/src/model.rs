//! Cycle model of a generated register block.
//!
//! `RegisterBlockModel` runs the semantics every emitted wrapper encodes,
//! one clock edge at a time: the read multiplexer, the three write styles
//! and the interrupt bank. Bus writes are latched with [`write`] and take
//! effect on the next [`tick`], the same way the HDL samples them on the
//! rising edge.
//!
//! [`write`]: RegisterBlockModel::write
//! [`tick`]: RegisterBlockModel::tick

use crate::{FifoLink, InterruptBank, IrRegister, RegisterKind, WrapperIr, WriteStyle, READ_SENTINEL};
use buswrap_config::{FifoKind, Literal};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
struct PendingWrite {
    offset: u64,
    data: u32,
    lanes: u8,
}

/// Register state of one wrapper instance.
#[derive(Debug)]
pub struct RegisterBlockModel {
    registers: Vec<IrRegister>,
    values: Vec<u32>,
    interrupts: Option<InterruptBank>,
    fifos: Vec<FifoLink>,
    im: u32,
    ris: u32,
    ic: u32,
    inputs: BTreeMap<String, u32>,
    pending: Option<PendingWrite>,
}

impl RegisterBlockModel {
    /// Builds the block in its reset state.
    pub fn new(ir: &WrapperIr) -> Self {
        let values = ir.registers.iter().map(reset_value).collect();
        Self {
            registers: ir.registers.clone(),
            values,
            interrupts: ir.interrupts.clone(),
            fifos: ir.fifos.clone(),
            im: 0,
            ris: 0,
            ic: 0,
            inputs: BTreeMap::new(),
            pending: None,
        }
    }

    /// Drives an IP output port (a read source or a flag) to `value`.
    pub fn set_input(&mut self, port: &str, value: u32) {
        self.inputs.insert(port.to_string(), value);
    }

    /// Latches a full-word bus write for the next clock edge.
    pub fn write(&mut self, offset: u64, data: u32) {
        self.write_bytes(offset, data, 0xF);
    }

    /// Latches a bus write that only enables the byte lanes set in `lanes`.
    ///
    /// Lane masks only matter for byte-access registers; every other
    /// register takes the whole word.
    pub fn write_bytes(&mut self, offset: u64, data: u32, lanes: u8) {
        self.pending = Some(PendingWrite {
            offset,
            data,
            lanes,
        });
    }

    /// Advances one rising clock edge.
    pub fn tick(&mut self) {
        let pending = self.pending.take();
        let hit = |offset: u64| pending.filter(|w| w.offset == offset);

        for (reg, value) in self.registers.iter().zip(self.values.iter_mut()) {
            let mask = width_mask(reg.bits);
            let write = hit(reg.offset);
            match &reg.kind {
                RegisterKind::Write { style, .. } => match (style, write) {
                    (WriteStyle::Byte, Some(w)) => {
                        let lanes = lane_mask(w.lanes);
                        *value = (*value & !lanes) | (w.data & lanes);
                    }
                    (_, Some(w)) => *value = w.data & mask,
                    (WriteStyle::AutoClear { keep_mask }, None) => *value &= keep_mask,
                    _ => {}
                },
                RegisterKind::ReadWrite { .. } => {
                    if let Some(w) = write {
                        *value = w.data & mask;
                    }
                }
                RegisterKind::ReadOnly | RegisterKind::FifoData(_) => {}
            }
        }

        if let Some(bank) = &self.interrupts {
            let mask = bank.mask();
            let raised = self.flag_inputs(bank);
            // Clear uses the IC value latched on the previous edge.
            self.ris = ((self.ris | raised) & !self.ic) & mask;
            if let Some(w) = hit(bank.im_offset) {
                self.im = w.data & mask;
            }
            self.ic = hit(bank.ic_offset).map_or(0, |w| w.data & mask);
        }
    }

    /// The value the read multiplexer returns for `offset`.
    pub fn read(&self, offset: u64) -> u32 {
        for (reg, value) in self.registers.iter().zip(&self.values) {
            if reg.offset == offset {
                return if reg.reads_wire() {
                    self.read_wire(reg)
                } else {
                    *value
                };
            }
        }
        if let Some(bank) = &self.interrupts {
            if offset == bank.im_offset {
                return self.im;
            } else if offset == bank.mis_offset {
                return self.mis();
            } else if offset == bank.ris_offset {
                return self.ris;
            } else if offset == bank.ic_offset {
                return self.ic;
            }
        }
        READ_SENTINEL
    }

    /// The value the block drives on one of the IP's input ports.
    pub fn output(&self, port: &str) -> Option<u32> {
        for (reg, value) in self.registers.iter().zip(&self.values) {
            if reg.write_port.as_deref() == Some(port) {
                return Some(*value);
            }
            if matches!(reg.kind, RegisterKind::Write { .. }) {
                if let Some(f) = reg.fields.iter().find(|f| f.port == port) {
                    return Some((value & f.mask()) >> f.lsb);
                }
            }
        }
        None
    }

    /// FIFO push/pop strobe asserted by an access to `offset`.
    pub fn fifo_strobe(&self, offset: u64, is_write: bool) -> Option<&str> {
        self.fifos
            .iter()
            .find(|f| {
                f.register_offset == offset && (f.kind == FifoKind::Write) == is_write
            })
            .map(|f| f.control_port.as_str())
    }

    /// Masked interrupt status, `RIS & IM`.
    pub fn mis(&self) -> u32 {
        self.ris & self.im
    }

    /// The aggregate interrupt line.
    pub fn irq(&self) -> bool {
        self.mis() != 0
    }

    fn input(&self, port: &str) -> u32 {
        self.inputs.get(port).copied().unwrap_or(0)
    }

    fn read_wire(&self, reg: &IrRegister) -> u32 {
        let mask = width_mask(reg.bits);
        match &reg.kind {
            RegisterKind::FifoData(FifoKind::Read) => self
                .fifos
                .iter()
                .find(|f| f.register == reg.name)
                .map_or(0, |f| self.input(&f.data_port) & mask),
            // Pushed straight from the write data bus; nothing drives the read side.
            RegisterKind::FifoData(FifoKind::Write) => 0,
            _ => match &reg.read_port {
                Some(port) => self.input(port) & mask,
                None => reg.fields.iter().fold(0, |acc, f| {
                    acc | ((self.input(&f.port) << f.lsb) & f.mask())
                }),
            },
        }
    }

    fn flag_inputs(&self, bank: &InterruptBank) -> u32 {
        bank.flags.iter().fold(0, |acc, f| {
            acc | ((self.input(&f.port) << f.lsb) & f.mask())
        })
    }
}

/// Two-state Wishbone acknowledge generator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WbAck {
    ack: bool,
}

impl WbAck {
    pub fn ack(&self) -> bool {
        self.ack
    }

    /// Clocks the state machine with the current `cyc & stb` and returns the new ack.
    pub fn step(&mut self, valid: bool) -> bool {
        self.ack = valid && !self.ack;
        self.ack
    }

    pub fn reset(&mut self) {
        self.ack = false;
    }
}

fn reset_value(reg: &IrRegister) -> u32 {
    let init = match &reg.kind {
        RegisterKind::Write { init, .. } | RegisterKind::ReadWrite { init } => init,
        _ => return 0,
    };
    let value = match init {
        Literal::Int(v) => Some(*v),
        Literal::Text(text) => parse_verilog_number(text),
    };
    match value {
        Some(v) => (v as u32) & width_mask(reg.bits),
        None => {
            tracing::warn!("Cannot evaluate init value {} of {}; using 0", init, reg.name);
            0
        }
    }
}

/// Parses `123`, `'h3F`, `8'b1010_0000` and similar Verilog integer literals.
pub fn parse_verilog_number(text: &str) -> Option<u64> {
    let text = text.trim().replace('_', "");
    let Some((_, based)) = text.split_once('\'') else {
        return text.parse().ok();
    };
    let based = based.strip_prefix(['s', 'S']).unwrap_or(based);
    let mut chars = based.chars();
    let radix = match chars.next()?.to_ascii_lowercase() {
        'h' => 16,
        'd' => 10,
        'o' => 8,
        'b' => 2,
        _ => return None,
    };
    u64::from_str_radix(chars.as_str(), radix).ok()
}

fn width_mask(bits: u32) -> u32 {
    ((1u64 << bits) - 1) as u32
}

fn lane_mask(lanes: u8) -> u32 {
    (0..4)
        .filter(|i| lanes & (1 << i) != 0)
        .fold(0, |acc, i| acc | (0xFF << (i * 8)))
}
