//! Markdown programming guide.

use crate::bus::BusSignals;
use buswrap_config::Literal;
use buswrap_ir::model::parse_verilog_number;
use buswrap_ir::{IrRegister, RegisterKind, WrapperIr};
use std::fmt::{self, Write};

const INTERRUPT_DOCS: [(&str, &str, &str); 4] = [
    (
        "IM",
        "rw",
        "Interrupt Mask Register; write 1/0 to enable/disable interrupts; check the interrupt flags table for more details",
    ),
    (
        "MIS",
        "r",
        "Masked Interrupt Status; On a read, this register gives the current masked status value of the corresponding interrupt. A write has no effect; check the interrupt flags table for more details",
    ),
    (
        "RIS",
        "r",
        "Raw Interrupt Status; reflects the current interrupts status; check the interrupt flags table for more details",
    ),
    (
        "IC",
        "w",
        "Interrupt Clear Register; On a write of 1, the corresponding interrupt (both raw interrupt and masked interrupt, if enabled) is cleared; check the interrupt flags table for more details",
    ),
];

fn reset_value(reg: &IrRegister) -> String {
    let init = match &reg.kind {
        RegisterKind::Write { init, .. } | RegisterKind::ReadWrite { init } => init,
        _ => return "0x00000000".into(),
    };
    let value = match init {
        Literal::Int(v) => Some(*v),
        Literal::Text(t) => parse_verilog_number(t),
    };
    match value {
        Some(v) => format!("{:#010x}", v),
        None => init.to_string(),
    }
}

pub fn write_docs(out: &mut String, ir: &WrapperIr) -> fmt::Result {
    let bus = BusSignals::of(ir.target);
    let name = &ir.info.name;

    writeln!(out, "# {}\n", name)?;
    writeln!(out, "{}\n", ir.info.description)?;

    writeln!(out, "## The wrapped IP\n")?;
    writeln!(
        out,
        "The IP comes with an {} wrapper generated by BusWrap.\n",
        bus.name
    )?;
    writeln!(out, "### Wrapped IP System Integration\n")?;
    writeln!(out, "```verilog")?;
    write!(out, "{}_{} INST (\n\t`TB_{}_SLAVE_CONN", name, bus.name, bus.name)?;
    for ifc in &ir.external_interfaces {
        write!(out, ",\n\t.{}({})", ifc.name, ifc.name)?;
    }
    writeln!(out, "\n);")?;
    writeln!(out, "```")?;
    writeln!(
        out,
        "> **_NOTE:_** `TB_{}_SLAVE_CONN is a convenient macro provided by BusWrap.\n",
        bus.name
    )?;

    writeln!(out, "## The Programming Interface\n")?;
    writeln!(out, "### Registers\n")?;
    writeln!(out, "|Name|Offset|Reset Value|Access Mode|Description|")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for reg in &ir.registers {
        writeln!(
            out,
            "|{}|{:04x}|{}|{}|{}|",
            reg.name,
            reg.offset,
            reset_value(reg),
            reg.mode,
            reg.description
        )?;
    }
    if let Some(bank) = &ir.interrupts {
        for ((reg, offset), (_, mode, text)) in bank.registers().iter().zip(INTERRUPT_DOCS) {
            writeln!(out, "|{}|{:04x}|0x00000000|{}|{}|", reg, offset, mode, text)?;
        }
    }

    for reg in &ir.registers {
        writeln!(
            out,
            "\n### {} Register [Offset: {:#x}, mode: {}]\n",
            reg.name, reg.offset, reg.mode
        )?;
        writeln!(out, "{}", reg.description)?;
        if !reg.fields.is_empty() {
            writeln!(out, "\n|bit|field name|width|description|")?;
            writeln!(out, "|---|---|---|---|")?;
            for f in &reg.fields {
                writeln!(out, "|{}|{}|{}|{}|", f.lsb, f.name, f.width, f.description)?;
            }
        }
    }

    if let Some(bank) = &ir.interrupts {
        writeln!(out, "\n### Interrupt Flags\n")?;
        writeln!(
            out,
            "The wrapped IP provides four registers to deal with interrupts: IM, RIS, MIS and IC. \
             Each register has a group of bits for the interrupt sources/flags.\n"
        )?;
        writeln!(out, "- `IM`: is used to enable/disable interrupt sources.")?;
        writeln!(
            out,
            "- `RIS`: has the current interrupt status (interrupt flags) whether they are enabled or disabled."
        )?;
        writeln!(out, "- `MIS`: is the result of masking (ANDing) RIS by IM.")?;
        writeln!(out, "- `IC`: is used to clear an interrupt flag.\n")?;
        writeln!(
            out,
            "The following are the bit definitions for the interrupt registers:\n"
        )?;
        writeln!(out, "|Bit|Flag|Width|Description|")?;
        writeln!(out, "|---|---|---|---|")?;
        for flag in &bank.flags {
            writeln!(
                out,
                "|{}|{}|{}|{}|",
                flag.lsb,
                flag.name.to_ascii_uppercase(),
                flag.width,
                flag.description
            )?;
        }
    }

    writeln!(out, "\n### The Interface\n")?;
    if !ir.parameters.is_empty() {
        writeln!(out, "#### Module Parameters\n")?;
        writeln!(out, "|Parameter|Description|Default Value|")?;
        writeln!(out, "|---|---|---|")?;
        for p in &ir.parameters {
            writeln!(out, "|{}|{}|{}|", p.name, p.description, p.default)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "#### Ports\n")?;
    writeln!(out, "|Port|Direction|Width|Description|")?;
    writeln!(out, "|---|---|---|---|")?;
    for ifc in &ir.external_interfaces {
        writeln!(
            out,
            "|{}|{}|{}|{}|",
            ifc.name, ifc.direction, ifc.width, ifc.description
        )?;
    }
    for port in &ir.ports {
        let direction = port.direction.map(|d| d.to_string()).unwrap_or_default();
        writeln!(
            out,
            "|{}|{}|{}|{}|",
            port.name, direction, port.width, port.description
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buswrap_config::IpDescriptor;
    use buswrap_ir::{compile, BusType, CompileOptions};

    fn render(yaml: &str, target: BusType) -> String {
        let ip = IpDescriptor::from_yaml(yaml).unwrap();
        let ir = compile(&ip, &CompileOptions::new(target)).unwrap();
        let mut out = String::new();
        write_docs(&mut out, &ir).unwrap();
        out
    }

    #[test]
    fn test_uart_docs() {
        let md = render(
            include_str!("../../../tests/fixtures/ef_uart.yaml"),
            BusType::Ahbl,
        );
        assert!(md.starts_with("# EF_UART\n"));
        assert!(md.contains("EF_UART_AHBL INST (\n\t`TB_AHBL_SLAVE_CONN,\n\t.rx(rx),\n\t.tx(tx)\n);"));
        assert!(md.contains("|CFG|0010|0x00003f08|w|"));
        assert!(md.contains("|IC|ff0c|0x00000000|w|Interrupt Clear Register"));
        assert!(md.contains("### CFG Register [Offset: 0x10, mode: w]"));
        assert!(md.contains("|8|timeout|6|"));
        assert!(md.contains("|9|RTO|1|"));
        assert!(md.contains("|MDW|"));
        assert!(md.contains("|rx|input|1|"));
        assert!(md.contains("|rdata|output|MDW|"));
    }

    #[test]
    fn test_docs_without_flags_skip_interrupts() {
        let mut ip =
            IpDescriptor::from_yaml(include_str!("../../../tests/fixtures/two_regs.yaml")).unwrap();
        ip.flags.clear();
        let ir = compile(&ip, &CompileOptions::new(BusType::Apb)).unwrap();
        let mut md = String::new();
        write_docs(&mut md, &ir).unwrap();
        assert!(!md.contains("Interrupt Flags"));
        assert!(!md.contains("|IM|"));
        assert!(md.contains("|DATAI|0004|0x00000000|r|"));
    }
}
