//! Interrupt bank (IM/MIS/RIS/IC) construction.

use crate::error::{CompileError, Result};
use crate::params::ParamTable;
use crate::{InterruptBank, IrFlag};
use buswrap_config::{IpDescriptor, LayoutConfig, Width, BUS_DATA_WIDTH};

pub const IM_OFFSET: u64 = 0x00;
pub const MIS_OFFSET: u64 = 0x04;
pub const RIS_OFFSET: u64 = 0x08;
pub const IC_OFFSET: u64 = 0x0C;

/// Packs the flags into contiguous bit ranges in declaration order.
///
/// Returns `None` when the IP declares no flags; the wrapper then has no
/// interrupt logic at all.
pub fn build(
    ip: &IpDescriptor,
    params: &ParamTable,
    layout: &LayoutConfig,
) -> Result<Option<InterruptBank>> {
    if ip.flags.is_empty() {
        return Ok(None);
    }

    let mut flags = Vec::with_capacity(ip.flags.len());
    let mut lsb = 0u32;
    for flag in &ip.flags {
        let entity = format!("flag {}", flag.name);
        let width = params.port_width(ip, &flag.port, &entity)?;
        // `port_width` already proved the port exists.
        let width_expr = ip
            .port(&flag.port)
            .map(|p| p.width.clone())
            .unwrap_or(Width::Bits(width));
        flags.push(IrFlag {
            name: flag.name.clone(),
            port: flag.port.clone(),
            lsb,
            width,
            width_expr,
            description: flag.description.clone(),
        });
        lsb += width;
    }

    if lsb > BUS_DATA_WIDTH {
        return Err(CompileError::InterruptBankTooWide { width: lsb });
    }

    tracing::debug!("Interrupt bank: {} flags, {} bits", flags.len(), lsb);

    Ok(Some(InterruptBank {
        flags,
        width: lsb,
        im_offset: layout.interrupt_base + IM_OFFSET,
        mis_offset: layout.interrupt_base + MIS_OFFSET,
        ris_offset: layout.interrupt_base + RIS_OFFSET,
        ic_offset: layout.interrupt_base + IC_OFFSET,
    }))
}
