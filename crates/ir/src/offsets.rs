//! Offset validation and ordering.
//!
//! Offsets are authored (user registers), synthesized (FIFO bank) or fixed
//! (interrupt bank). This stage only checks them and produces the ascending
//! order every emitter walks.

use crate::error::{CompileError, Result};
use buswrap_config::{
    IpDescriptor, LayoutConfig, RegisterDescriptor, BUS_DATA_WIDTH, FIFO_STRIDE,
};
use std::collections::BTreeSet;

/// Checks the generator-owned regions themselves: both banks word aligned and
/// inside the decoded address window.
pub fn check_layout(layout: &LayoutConfig, fifo_count: usize) -> Result<()> {
    if !(1..=BUS_DATA_WIDTH).contains(&layout.bus_address_width) {
        return Err(CompileError::InvalidAddressWidth(layout.bus_address_width));
    }
    let limit = layout.address_limit();

    for (region, base) in [
        ("interrupt bank", layout.interrupt_base),
        ("FIFO bank", layout.fifo_base),
    ] {
        if base % 4 != 0 {
            return Err(CompileError::MisalignedBase { region, base });
        }
    }

    let mut banks = vec![("interrupt bank", layout.interrupt_base, layout.interrupt_end())];
    if fifo_count > 0 {
        banks.push(("FIFO bank", layout.fifo_base, fifo_bank_end(layout, fifo_count)));
    }
    for (region, start, end) in banks {
        if end > limit {
            return Err(CompileError::BankOutOfRange {
                region,
                start,
                end,
                bits: layout.bus_address_width,
            });
        }
    }
    Ok(())
}

fn fifo_bank_end(layout: &LayoutConfig, fifo_count: usize) -> u64 {
    layout
        .fifo_base
        .saturating_add((fifo_count as u64).saturating_mul(FIFO_STRIDE))
}

/// Checks user-declared registers against the generator-owned address regions.
///
/// Must run before FIFO synthesis so that only authored offsets are checked
/// against the FIFO bank.
pub fn check_regions(
    registers: &[RegisterDescriptor],
    fifo_count: usize,
    layout: &LayoutConfig,
) -> Result<()> {
    let fifo_start = layout.fifo_base;
    let fifo_end = fifo_bank_end(layout, fifo_count);

    // The FIFO bank has to sit entirely below the interrupt bank.
    if fifo_count > 0 && fifo_end > layout.interrupt_base {
        return Err(CompileError::FifoBankOverlap {
            start: fifo_start,
            end: fifo_end,
            interrupt_base: layout.interrupt_base,
        });
    }

    for reg in registers {
        if reg.offset >= fifo_start && reg.offset < fifo_end {
            return Err(CompileError::RegionOverlap {
                register: reg.name.clone(),
                offset: reg.offset,
                region: "FIFO bank",
                start: fifo_start,
                end: fifo_end,
            });
        }
        if reg.offset >= layout.interrupt_base && reg.offset < layout.interrupt_end() {
            return Err(CompileError::RegionOverlap {
                register: reg.name.clone(),
                offset: reg.offset,
                region: "interrupt bank",
                start: layout.interrupt_base,
                end: layout.interrupt_end(),
            });
        }
    }
    Ok(())
}

/// Validates every offset and reorders the register list ascending by offset.
///
/// The sort is stable, but equal offsets are rejected rather than resolved.
pub fn sort(mut ip: IpDescriptor, layout: &LayoutConfig) -> Result<IpDescriptor> {
    let mut names = BTreeSet::new();
    for reg in &ip.registers {
        if !names.insert(reg.name.as_str()) {
            return Err(CompileError::DuplicateRegister(reg.name.clone()));
        }
        if reg.offset % 4 != 0 {
            return Err(CompileError::MisalignedOffset {
                register: reg.name.clone(),
                offset: reg.offset,
            });
        }
        if reg.offset >= layout.address_limit() {
            return Err(CompileError::OffsetOutOfRange {
                register: reg.name.clone(),
                offset: reg.offset,
                bits: layout.bus_address_width,
            });
        }
        if reg.offset >= layout.interrupt_base {
            return Err(CompileError::BeyondInterruptBank {
                register: reg.name.clone(),
                offset: reg.offset,
                interrupt_base: layout.interrupt_base,
            });
        }
    }

    ip.registers.sort_by_key(|r| r.offset);

    if let Some(pair) = ip
        .registers
        .windows(2)
        .find(|pair| pair[0].offset == pair[1].offset)
    {
        return Err(CompileError::DuplicateOffset {
            first: pair[0].name.clone(),
            second: pair[1].name.clone(),
            offset: pair[0].offset,
        });
    }

    tracing::debug!("Ordered {} registers by offset", ip.registers.len());
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{register, two_regs};

    #[test]
    fn test_sort_ascending() {
        let mut ip = two_regs();
        ip.registers.reverse();
        let ip = sort(ip, &LayoutConfig::default()).unwrap();
        let offsets: Vec<_> = ip.registers.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0x00, 0x04]);
    }

    #[test]
    fn test_duplicate_offset_rejected() {
        let mut ip = two_regs();
        ip.registers.push(register("EXTRA", 0x04));
        let err = sort(ip, &LayoutConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateOffset {
                first: "DATAI".into(),
                second: "EXTRA".into(),
                offset: 0x04
            }
        );
    }

    #[test]
    fn test_misaligned_offset_rejected() {
        let mut ip = two_regs();
        ip.registers.push(register("ODD", 0x06));
        let err = sort(ip, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::MisalignedOffset { offset: 6, .. }));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut ip = two_regs();
        ip.registers.push(register("DATAO", 0x08));
        let err = sort(ip, &LayoutConfig::default()).unwrap_err();
        assert_eq!(err, CompileError::DuplicateRegister("DATAO".into()));
    }

    #[test]
    fn test_offset_beyond_bus_width() {
        let layout = LayoutConfig {
            bus_address_width: 8,
            interrupt_base: 0x80,
            fifo_base: 0x70,
        };
        let mut ip = two_regs();
        ip.registers.push(register("FAR", 0x100));
        let err = sort(ip, &layout).unwrap_err();
        assert!(matches!(err, CompileError::OffsetOutOfRange { bits: 8, .. }));
    }

    #[test]
    fn test_user_register_in_fifo_bank() {
        let regs = vec![register("BAD", 0xFE0C)];
        let err = check_regions(&regs, 1, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::RegionOverlap {
                region: "FIFO bank",
                ..
            }
        ));
        // Without FIFOs the bank is empty and the offset is free.
        assert!(check_regions(&regs, 0, &LayoutConfig::default()).is_ok());
    }

    #[test]
    fn test_user_register_in_interrupt_bank() {
        let regs = vec![register("BAD", 0xFF04)];
        let err = check_regions(&regs, 0, &LayoutConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::RegionOverlap {
                region: "interrupt bank",
                ..
            }
        ));
    }

    #[test]
    fn test_fifo_bank_must_precede_interrupt_bank() {
        let layout = LayoutConfig {
            fifo_base: 0xFEF0,
            ..LayoutConfig::default()
        };
        let err = check_regions(&[], 2, &layout).unwrap_err();
        assert!(matches!(err, CompileError::FifoBankOverlap { .. }));
    }

    #[test]
    fn test_default_layout_accepted() {
        assert!(check_layout(&LayoutConfig::default(), 2).is_ok());
    }

    #[test]
    fn test_interrupt_bank_outside_address_window() {
        let layout = LayoutConfig {
            bus_address_width: 8,
            ..LayoutConfig::default()
        };
        let err = check_layout(&layout, 0).unwrap_err();
        assert_eq!(
            err,
            CompileError::BankOutOfRange {
                region: "interrupt bank",
                start: 0xFF00,
                end: 0xFF10,
                bits: 8,
            }
        );
    }

    #[test]
    fn test_fifo_bank_outside_address_window() {
        let layout = LayoutConfig {
            bus_address_width: 12,
            interrupt_base: 0xF00,
            fifo_base: 0xFE00,
        };
        // Only checked when there are FIFOs to place.
        assert!(check_layout(&layout, 0).is_ok());
        let err = check_layout(&layout, 1).unwrap_err();
        assert!(matches!(
            err,
            CompileError::BankOutOfRange {
                region: "FIFO bank",
                bits: 12,
                ..
            }
        ));
    }

    #[test]
    fn test_misaligned_bases_rejected() {
        let layout = LayoutConfig {
            interrupt_base: 0xFF02,
            ..LayoutConfig::default()
        };
        assert_eq!(
            check_layout(&layout, 0).unwrap_err(),
            CompileError::MisalignedBase {
                region: "interrupt bank",
                base: 0xFF02
            }
        );

        let layout = LayoutConfig {
            fifo_base: 0xFE06,
            ..LayoutConfig::default()
        };
        assert_eq!(
            check_layout(&layout, 1).unwrap_err(),
            CompileError::MisalignedBase {
                region: "FIFO bank",
                base: 0xFE06
            }
        );
    }

    #[test]
    fn test_address_width_range() {
        for bits in [0, 33, 64] {
            let layout = LayoutConfig {
                bus_address_width: bits,
                ..LayoutConfig::default()
            };
            assert_eq!(
                check_layout(&layout, 0).unwrap_err(),
                CompileError::InvalidAddressWidth(bits)
            );
        }
        let layout = LayoutConfig {
            bus_address_width: 32,
            ..LayoutConfig::default()
        };
        assert!(check_layout(&layout, 0).is_ok());
    }
}
