//! FIFO register synthesis.
//!
//! Each declared FIFO contributes a LEVEL, THRESHOLD and FLUSH register to
//! the FIFO bank. The FIFO at index `i` owns the 16-byte slot starting at
//! `fifo_base + i * 0x10`.

use crate::error::{CompileError, Result};
use crate::{FifoLink, IrRegister};
use buswrap_config::{
    FieldDescriptor, FifoDescriptor, IpDescriptor, LayoutConfig, RegisterDescriptor, RegisterMode,
    Width,
};

pub const LEVEL_OFFSET: u64 = 0x00;
pub const THRESHOLD_OFFSET: u64 = 0x04;
pub const FLUSH_OFFSET: u64 = 0x08;

/// Appends the synthesized FIFO registers to the descriptor's register list.
///
/// Declaration order of the FIFOs fixes their slots; user registers are left
/// untouched.
pub fn synthesize(mut ip: IpDescriptor, layout: &LayoutConfig) -> Result<IpDescriptor> {
    let mut synthesized = Vec::with_capacity(ip.fifos.len() * 3);

    for (index, fifo) in ip.fifos.iter().enumerate() {
        check_parent(&ip, fifo)?;
        if fifo.address_width == 0 || fifo.address_width > 32 {
            return Err(CompileError::InvalidFifoAddressWidth {
                fifo: fifo.name.clone(),
                width: fifo.address_width,
            });
        }

        let base = layout.fifo_slot(index);
        tracing::debug!(
            "Synthesizing registers for FIFO {} at {:#06x}",
            fifo.name,
            base
        );
        synthesized.extend(fifo_registers(fifo, base));
    }

    ip.registers.extend(synthesized);
    Ok(ip)
}

fn fifo_registers(fifo: &FifoDescriptor, base: u64) -> Vec<RegisterDescriptor> {
    let width = Width::Bits(fifo.address_width);
    let mut regs = vec![
        RegisterDescriptor {
            name: format!("{}_LEVEL", fifo.name),
            size: width.clone(),
            mode: RegisterMode::Read,
            offset: base + LEVEL_OFFSET,
            fifo: false,
            init: None,
            byte_access: false,
            read_port: Some(fifo.level_port.clone()),
            write_port: None,
            description: format!("{} level register.", fifo.name),
            fields: Vec::new(),
        },
        RegisterDescriptor {
            name: format!("{}_THRESHOLD", fifo.name),
            size: width,
            mode: RegisterMode::Write,
            offset: base + THRESHOLD_OFFSET,
            fifo: false,
            init: None,
            byte_access: false,
            read_port: None,
            write_port: Some(fifo.threshold_port.clone()),
            description: format!("{} level threshold register.", fifo.name),
            fields: Vec::new(),
        },
    ];

    if fifo.flush_enable {
        regs.push(RegisterDescriptor {
            name: format!("{}_FLUSH", fifo.name),
            size: Width::Bits(1),
            mode: RegisterMode::Write,
            offset: base + FLUSH_OFFSET,
            fifo: false,
            init: None,
            byte_access: false,
            read_port: None,
            write_port: None,
            description: format!("{} flush register.", fifo.name),
            fields: vec![FieldDescriptor {
                name: "FLUSH".to_string(),
                bit_offset: 0,
                bit_width: Width::Bits(1),
                read_port: None,
                write_port: Some(fifo.flush_port.clone()),
                auto_clear: true,
                description: format!("Flushes {}.", fifo.name),
            }],
        });
    }
    regs
}

fn check_parent(ip: &IpDescriptor, fifo: &FifoDescriptor) -> Result<()> {
    let parent = ip
        .register(&fifo.register)
        .ok_or_else(|| CompileError::UnknownFifoRegister {
            fifo: fifo.name.clone(),
            register: fifo.register.clone(),
        })?;
    if !parent.fifo {
        return Err(CompileError::NotFifoRegister {
            fifo: fifo.name.clone(),
            register: fifo.register.clone(),
        });
    }
    for port in [&fifo.data_port, &fifo.control_port] {
        if ip.port(port).is_none() {
            return Err(CompileError::MissingPort {
                entity: format!("FIFO {}", fifo.name),
                port: port.clone(),
            });
        }
    }
    Ok(())
}

/// Binds every FIFO to the final offset of its data register.
pub fn links(ip: &IpDescriptor, registers: &[IrRegister]) -> Result<Vec<FifoLink>> {
    ip.fifos
        .iter()
        .map(|fifo| {
            let register = registers
                .iter()
                .find(|r| r.name == fifo.register)
                .ok_or_else(|| CompileError::UnknownFifoRegister {
                    fifo: fifo.name.clone(),
                    register: fifo.register.clone(),
                })?;
            Ok(FifoLink {
                name: fifo.name.clone(),
                kind: fifo.kind,
                register: register.name.clone(),
                register_offset: register.offset,
                data_port: fifo.data_port.clone(),
                control_port: fifo.control_port.clone(),
            })
        })
        .collect()
}
