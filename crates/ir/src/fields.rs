//! Bit-field packing: resolves field widths, checks placement and decides
//! how each register is written.

use crate::error::{CompileError, Result};
use crate::params::ParamTable;
use crate::{BusType, IrRegister, PackedField, RegisterKind, WriteStyle};
use buswrap_config::{
    FieldDescriptor, FifoKind, IpDescriptor, RegisterDescriptor, RegisterMode, BUS_DATA_WIDTH,
};

/// Lowers one register descriptor into its IR node.
pub fn pack(
    reg: &RegisterDescriptor,
    ip: &IpDescriptor,
    params: &ParamTable,
    target: BusType,
) -> Result<IrRegister> {
    let entity = format!("register {}", reg.name);
    let bits = params.resolve(&reg.size, &entity)?;
    if bits == 0 || bits > BUS_DATA_WIDTH {
        return Err(CompileError::InvalidSize {
            register: reg.name.clone(),
            size: bits,
        });
    }

    if reg.byte_access {
        if bits != 32 {
            return Err(CompileError::ByteAccessSize {
                register: reg.name.clone(),
                size: bits,
            });
        }
        if !target.is_byte_addressable() {
            return Err(CompileError::ByteAccessTarget {
                register: reg.name.clone(),
                target: target.name(),
            });
        }
    }

    if reg.mode == RegisterMode::ReadWrite && !reg.fields.is_empty() {
        return Err(CompileError::FieldsOnReadWrite(reg.name.clone()));
    }

    let fields = pack_fields(reg, bits, ip, params)?;

    let kind = if reg.fifo {
        let kind = ip
            .fifos
            .iter()
            .find(|f| f.register == reg.name)
            .map(|f| f.kind)
            .unwrap_or(match reg.mode {
                RegisterMode::Read => FifoKind::Read,
                _ => FifoKind::Write,
            });
        RegisterKind::FifoData(kind)
    } else {
        check_register_ports(reg, &fields, ip)?;
        let init = reg.init.clone().unwrap_or_default();
        match reg.mode {
            RegisterMode::Read => RegisterKind::ReadOnly,
            RegisterMode::ReadWrite => RegisterKind::ReadWrite { init },
            RegisterMode::Write => RegisterKind::Write {
                style: write_style(reg, &fields),
                init,
            },
        }
    };

    Ok(IrRegister {
        name: reg.name.clone(),
        offset: reg.offset,
        size: reg.size.clone(),
        bits,
        mode: reg.mode,
        kind,
        fields,
        read_port: reg.read_port.clone(),
        write_port: reg.write_port.clone(),
        description: reg.description.clone(),
    })
}

fn pack_fields(
    reg: &RegisterDescriptor,
    bits: u32,
    ip: &IpDescriptor,
    params: &ParamTable,
) -> Result<Vec<PackedField>> {
    let mut packed: Vec<PackedField> = Vec::with_capacity(reg.fields.len());

    for field in &reg.fields {
        if field.auto_clear && reg.mode != RegisterMode::Write {
            return Err(CompileError::AutoClearMode {
                register: reg.name.clone(),
                field: field.name.clone(),
                mode: reg.mode,
            });
        }

        let entity = format!("field {}.{}", reg.name, field.name);
        let width = params.resolve(&field.bit_width, &entity)?;
        if width == 0 {
            return Err(CompileError::ZeroWidthField {
                register: reg.name.clone(),
                field: field.name.clone(),
            });
        }
        let end = field.bit_offset as u64 + width as u64;
        if end > bits as u64 {
            return Err(CompileError::FieldOutOfRange {
                register: reg.name.clone(),
                field: field.name.clone(),
                msb: (end - 1) as u32,
                lsb: field.bit_offset,
                size: bits,
            });
        }

        let candidate = PackedField {
            name: field.name.clone(),
            lsb: field.bit_offset,
            width,
            width_expr: field.bit_width.clone(),
            port: field_port(reg, field, ip, &entity)?,
            auto_clear: field.auto_clear,
            description: field.description.clone(),
        };

        if let Some(other) = packed.iter().find(|p| p.mask() & candidate.mask() != 0) {
            return Err(CompileError::FieldOverlap {
                register: reg.name.clone(),
                first: other.name.clone(),
                second: candidate.name.clone(),
            });
        }
        packed.push(candidate);
    }

    Ok(packed)
}

/// The port a field drives (write registers) or samples (read registers).
fn field_port(
    reg: &RegisterDescriptor,
    field: &FieldDescriptor,
    ip: &IpDescriptor,
    entity: &str,
) -> Result<String> {
    // Fields of FIFO data registers only document the word layout.
    if reg.fifo {
        return Ok(field
            .write_port
            .clone()
            .or_else(|| field.read_port.clone())
            .unwrap_or_default());
    }

    let (port, needed) = match reg.mode {
        RegisterMode::Write => (field.write_port.as_ref(), "write_port"),
        _ => (field.read_port.as_ref(), "read_port"),
    };
    let port = port.ok_or_else(|| CompileError::MissingBinding {
        entity: entity.to_string(),
        needed,
    })?;
    require_port(ip, port, entity)?;
    Ok(port.clone())
}

fn check_register_ports(
    reg: &RegisterDescriptor,
    fields: &[PackedField],
    ip: &IpDescriptor,
) -> Result<()> {
    let entity = format!("register {}", reg.name);
    let mut required: Vec<(Option<&String>, &'static str)> = Vec::new();
    match reg.mode {
        RegisterMode::ReadWrite => {
            required.push((reg.read_port.as_ref(), "read_port"));
            required.push((reg.write_port.as_ref(), "write_port"));
        }
        RegisterMode::Write if fields.is_empty() => {
            required.push((reg.write_port.as_ref(), "write_port or fields"));
        }
        RegisterMode::Read if fields.is_empty() => {
            required.push((reg.read_port.as_ref(), "read_port or fields"));
        }
        _ => {}
    }

    for (port, needed) in required {
        let port = port.ok_or_else(|| CompileError::MissingBinding {
            entity: entity.clone(),
            needed,
        })?;
        require_port(ip, port, &entity)?;
    }
    Ok(())
}

fn require_port(ip: &IpDescriptor, port: &str, entity: &str) -> Result<()> {
    if ip.port(port).is_none() {
        return Err(CompileError::MissingPort {
            entity: entity.to_string(),
            port: port.to_string(),
        });
    }
    Ok(())
}

fn write_style(reg: &RegisterDescriptor, fields: &[PackedField]) -> WriteStyle {
    if fields.iter().any(|f| f.auto_clear) {
        if reg.byte_access {
            tracing::warn!(
                "Register {} has auto-clear fields; byte access is ignored",
                reg.name
            );
        }
        let keep_mask = fields
            .iter()
            .filter(|f| !f.auto_clear)
            .fold(0u32, |mask, f| mask | f.mask());
        WriteStyle::AutoClear { keep_mask }
    } else if reg.byte_access {
        WriteStyle::Byte
    } else {
        WriteStyle::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{field, register, uart};
    use buswrap_config::{PortDescriptor, Width};

    fn ctx() -> (IpDescriptor, ParamTable) {
        let ip = uart();
        let params = ParamTable::new(&ip);
        (ip, params)
    }

    fn with_ports(mut ip: IpDescriptor, names: &[&str]) -> IpDescriptor {
        for name in names {
            ip.ports.push(PortDescriptor {
                name: name.to_string(),
                width: Width::Bits(8),
                direction: None,
                description: String::new(),
            });
        }
        ip
    }

    #[test]
    fn test_pack_cfg_fields() {
        let (ip, params) = ctx();
        let cfg = pack(ip.register("CFG").unwrap(), &ip, &params, BusType::Apb).unwrap();
        assert_eq!(cfg.bits, 14);
        let ranges: Vec<_> = cfg.fields.iter().map(|f| (f.lsb, f.msb())).collect();
        assert_eq!(ranges, vec![(0, 3), (4, 4), (5, 7), (8, 13)]);
        assert_eq!(cfg.fields[3].mask(), 0x3F00);
        assert!(matches!(
            cfg.kind,
            RegisterKind::Write {
                style: WriteStyle::Plain,
                ..
            }
        ));
    }

    #[test]
    fn test_parameter_sized_register() {
        let (ip, params) = ctx();
        let reg = pack(ip.register("MATCH").unwrap(), &ip, &params, BusType::Wb).unwrap();
        assert_eq!(reg.bits, 9);
        assert_eq!(reg.size, Width::Param("MDW".into()));
    }

    #[test]
    fn test_fifo_register_kind() {
        let (ip, params) = ctx();
        let rx = pack(ip.register("RXDATA").unwrap(), &ip, &params, BusType::Apb).unwrap();
        assert_eq!(rx.kind, RegisterKind::FifoData(FifoKind::Read));
        let tx = pack(ip.register("TXDATA").unwrap(), &ip, &params, BusType::Apb).unwrap();
        assert_eq!(tx.kind, RegisterKind::FifoData(FifoKind::Write));
    }

    #[test]
    fn test_overlapping_fields_rejected() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["a", "b"]);
        let mut reg = register("OV", 0x40);
        reg.size = Width::Bits(8);
        reg.write_port = None;
        reg.fields = vec![field("A", 0, 4, "a"), field("B", 3, 2, "b")];
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert_eq!(
            err,
            CompileError::FieldOverlap {
                register: "OV".into(),
                first: "A".into(),
                second: "B".into()
            }
        );
    }

    #[test]
    fn test_field_out_of_range() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["a"]);
        let mut reg = register("OOR", 0x40);
        reg.size = Width::Bits(8);
        reg.fields = vec![field("A", 6, 4, "a")];
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert!(matches!(
            err,
            CompileError::FieldOutOfRange {
                msb: 9,
                lsb: 6,
                size: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_unresolved_field_width() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["a"]);
        let mut reg = register("UNR", 0x40);
        let mut f = field("A", 0, 1, "a");
        f.bit_width = Width::Param("NOPE".into());
        reg.fields = vec![f];
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert!(matches!(err, CompileError::UnresolvedParameter { .. }));
    }

    #[test]
    fn test_byte_access_rules() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["w32"]);
        let mut reg = register("BYTES", 0x40);
        reg.write_port = Some("w32".into());
        reg.byte_access = true;

        let packed = pack(&reg, &ip, &params, BusType::Ahbl).unwrap();
        assert!(matches!(
            packed.kind,
            RegisterKind::Write {
                style: WriteStyle::Byte,
                ..
            }
        ));

        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert!(matches!(err, CompileError::ByteAccessTarget { .. }));

        reg.size = Width::Bits(16);
        let err = pack(&reg, &ip, &params, BusType::Ahbl).unwrap_err();
        assert_eq!(
            err,
            CompileError::ByteAccessSize {
                register: "BYTES".into(),
                size: 16
            }
        );
    }

    #[test]
    fn test_auto_clear_mask() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["go", "mode"]);
        let mut reg = register("CMD", 0x40);
        reg.size = Width::Bits(8);
        reg.write_port = None;
        let mut go = field("GO", 0, 1, "go");
        go.auto_clear = true;
        reg.fields = vec![go, field("MODE", 4, 3, "mode")];
        let packed = pack(&reg, &ip, &params, BusType::Apb).unwrap();
        assert!(matches!(
            packed.kind,
            RegisterKind::Write {
                style: WriteStyle::AutoClear { keep_mask: 0x70 },
                ..
            }
        ));
    }

    #[test]
    fn test_auto_clear_on_read_register_rejected() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["st"]);
        let mut reg = register("ST", 0x40);
        reg.mode = RegisterMode::Read;
        let mut f = field("DONE", 0, 1, "st");
        f.read_port = Some("st".into());
        f.auto_clear = true;
        reg.fields = vec![f];
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert!(matches!(
            err,
            CompileError::AutoClearMode {
                mode: RegisterMode::Read,
                ..
            }
        ));
    }

    #[test]
    fn test_rw_register_rules() {
        let (ip, params) = ctx();
        let ip = with_ports(ip, &["a"]);
        let mut reg = register("RW", 0x40);
        reg.mode = RegisterMode::ReadWrite;
        reg.fields = vec![field("A", 0, 1, "a")];
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert_eq!(err, CompileError::FieldsOnReadWrite("RW".into()));

        reg.fields.clear();
        reg.write_port = Some("a".into());
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingBinding {
                needed: "read_port",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_port_rejected() {
        let (ip, params) = ctx();
        let mut reg = register("GHOST", 0x40);
        reg.write_port = Some("ghost".into());
        let err = pack(&reg, &ip, &params, BusType::Apb).unwrap_err();
        assert_eq!(
            err,
            CompileError::MissingPort {
                entity: "register GHOST".into(),
                port: "ghost".into()
            }
        );
    }
}
