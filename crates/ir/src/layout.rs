//! Word-by-word layout of the register block as a C struct.

use crate::IrRegister;
use buswrap_config::{LayoutConfig, RegisterMode};
use serde::Serialize;

/// The interrupt registers in struct order, with their software access.
pub const INTERRUPT_SLOTS: [(&str, RegisterMode); 4] = [
    ("IM", RegisterMode::ReadWrite),
    ("MIS", RegisterMode::Read),
    ("RIS", RegisterMode::Read),
    ("IC", RegisterMode::Write),
];

/// One member of the generated C struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HeaderSlot {
    /// A user or FIFO register.
    Register {
        name: String,
        mode: RegisterMode,
        offset: u64,
    },
    /// `words` unused 32-bit words starting at `offset`.
    Reserved { offset: u64, words: u64 },
    /// One of IM, MIS, RIS and IC.
    Interrupt {
        name: &'static str,
        mode: RegisterMode,
        offset: u64,
    },
}

impl HeaderSlot {
    pub fn offset(&self) -> u64 {
        match self {
            HeaderSlot::Register { offset, .. }
            | HeaderSlot::Reserved { offset, .. }
            | HeaderSlot::Interrupt { offset, .. } => *offset,
        }
    }

    pub fn bytes(&self) -> u64 {
        match self {
            HeaderSlot::Reserved { words, .. } => words * 4,
            _ => 4,
        }
    }
}

/// The register block as a padded struct ending with the interrupt registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderLayout {
    pub slots: Vec<HeaderSlot>,
}

impl HeaderLayout {
    /// Lays out `registers`, which must already be sorted ascending by offset
    /// and lie below the interrupt bank.
    pub fn build(registers: &[IrRegister], layout: &LayoutConfig) -> Self {
        let mut slots = Vec::with_capacity(registers.len() * 2 + 5);
        let mut cursor = 0u64;

        for reg in registers {
            if reg.offset > cursor {
                slots.push(HeaderSlot::Reserved {
                    offset: cursor,
                    words: (reg.offset - cursor) / 4,
                });
            }
            slots.push(HeaderSlot::Register {
                name: reg.name.clone(),
                mode: reg.mode,
                offset: reg.offset,
            });
            cursor = reg.offset + 4;
        }

        if layout.interrupt_base > cursor {
            slots.push(HeaderSlot::Reserved {
                offset: cursor,
                words: (layout.interrupt_base - cursor) / 4,
            });
        }

        for (i, (name, mode)) in INTERRUPT_SLOTS.iter().enumerate() {
            slots.push(HeaderSlot::Interrupt {
                name,
                mode: *mode,
                offset: layout.interrupt_base + i as u64 * 4,
            });
        }

        Self { slots }
    }

    pub fn register_bytes(&self) -> u64 {
        self.slots
            .iter()
            .filter(|s| matches!(s, HeaderSlot::Register { .. }))
            .map(HeaderSlot::bytes)
            .sum()
    }

    pub fn reserved_bytes(&self) -> u64 {
        self.slots
            .iter()
            .filter(|s| matches!(s, HeaderSlot::Reserved { .. }))
            .map(HeaderSlot::bytes)
            .sum()
    }

    /// Total size of the struct in bytes.
    pub fn size(&self) -> u64 {
        self.slots.iter().map(HeaderSlot::bytes).sum()
    }
}
