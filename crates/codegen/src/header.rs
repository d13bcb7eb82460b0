//! C register definitions: bit/mask macros and a padded struct that
//! overlays the register block.

use crate::license;
use buswrap_config::RegisterMode;
use buswrap_ir::{HeaderSlot, WrapperIr};
use std::fmt::{self, Write};

fn io_type(mode: RegisterMode) -> &'static str {
    match mode {
        RegisterMode::Read => "__R ",
        RegisterMode::Write => "__W ",
        RegisterMode::ReadWrite => "__RW",
    }
}

pub fn write_header(out: &mut String, ir: &WrapperIr) -> fmt::Result {
    let ip = ir.info.name.to_ascii_uppercase();

    license::write_banner(out, &ir.info)?;
    writeln!(out, "#ifndef {}REGS_H", ip)?;
    writeln!(out, "#define {}REGS_H\n", ip)?;
    writeln!(out, "#ifndef IO_TYPES")?;
    writeln!(out, "#define IO_TYPES")?;
    writeln!(out, "#define   __R     volatile const unsigned int")?;
    writeln!(out, "#define   __W     volatile       unsigned int")?;
    writeln!(out, "#define   __RW    volatile       unsigned int")?;
    writeln!(out, "#endif\n")?;

    for reg in &ir.registers {
        let reg_name = reg.name.to_ascii_uppercase();
        for f in &reg.fields {
            let field = f.name.to_ascii_uppercase();
            writeln!(out, "#define {}_{}_REG_{}_BIT\t{}", ip, reg_name, field, f.lsb)?;
            writeln!(
                out,
                "#define {}_{}_REG_{}_MASK\t{:#x}",
                ip,
                reg_name,
                field,
                f.mask()
            )?;
        }
    }
    writeln!(out)?;

    if let Some(bank) = &ir.interrupts {
        for flag in &bank.flags {
            writeln!(
                out,
                "#define {}_{}_FLAG\t{:#x}",
                ip,
                flag.name.to_ascii_uppercase(),
                flag.mask()
            )?;
        }
        writeln!(out)?;
    }

    for slot in &ir.header.slots {
        match slot {
            HeaderSlot::Register { name, offset, .. } => writeln!(
                out,
                "#define {}_{}_REG_OFFSET\t{:#06x}",
                ip,
                name.to_ascii_uppercase(),
                offset
            )?,
            HeaderSlot::Interrupt { name, offset, .. } => writeln!(
                out,
                "#define {}_{}_REG_OFFSET\t{:#06x}",
                ip, name, offset
            )?,
            HeaderSlot::Reserved { .. } => {}
        }
    }
    writeln!(out)?;

    writeln!(out, "typedef struct _{}_TYPE_ {{", ip)?;
    let mut reserved = 0;
    for slot in &ir.header.slots {
        match slot {
            HeaderSlot::Register { name, mode, .. } => {
                writeln!(out, "\t{}\t{};", io_type(*mode), name)?
            }
            HeaderSlot::Reserved { words, .. } => {
                writeln!(out, "\t__R \treserved_{}[{}];", reserved, words)?;
                reserved += 1;
            }
            HeaderSlot::Interrupt { name, mode, .. } => {
                writeln!(out, "\t{}\t{};", io_type(*mode), name)?
            }
        }
    }
    writeln!(out, "}} {}_TYPE;", ip)?;
    writeln!(out, "\n#endif\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use buswrap_config::IpDescriptor;
    use buswrap_ir::{compile, BusType, CompileOptions};

    fn render(yaml: &str) -> String {
        let ip = IpDescriptor::from_yaml(yaml).unwrap();
        let ir = compile(&ip, &CompileOptions::new(BusType::Apb)).unwrap();
        let mut out = String::new();
        write_header(&mut out, &ir).unwrap();
        out
    }

    #[test]
    fn test_scenario_struct() {
        let h = render(include_str!("../../../tests/fixtures/two_regs.yaml"));
        let start = h.find("typedef struct _EF_GPIO8_TYPE_ {").unwrap();
        let body: Vec<&str> = h[start..].lines().skip(1).take(7).collect();
        assert_eq!(
            body,
            vec![
                "\t__W \tDATAO;",
                "\t__R \tDATAI;",
                "\t__R \treserved_0[16318];",
                "\t__RW\tIM;",
                "\t__R \tMIS;",
                "\t__R \tRIS;",
                "\t__W \tIC;",
            ]
        );
        assert!(h.contains("} EF_GPIO8_TYPE;"));
        assert!(h.contains("#define EF_GPIO8_PE_FLAG\t0xff"));
        assert!(h.contains("#define EF_GPIO8_DATAI_REG_OFFSET\t0x0004"));
        assert!(h.contains("#define EF_GPIO8_IC_REG_OFFSET\t0xff0c"));
    }

    #[test]
    fn test_field_macros_and_padding() {
        let h = render(include_str!("../../../tests/fixtures/ef_uart.yaml"));
        assert!(h.starts_with("/*\n"));
        assert!(h.contains("#ifndef EF_UARTREGS_H\n#define EF_UARTREGS_H\n"));
        assert!(h.contains("#define EF_UART_CFG_REG_TIMEOUT_BIT\t8"));
        assert!(h.contains("#define EF_UART_CFG_REG_TIMEOUT_MASK\t0x3f00"));
        assert!(h.contains("#define EF_UART_CTRL_REG_GFEN_MASK\t0x10"));
        assert!(h.contains("#define EF_UART_RTO_FLAG\t0x200"));
        // CFG at 0x10, MATCH at 0x1C: two words of padding in between.
        assert!(h.contains("\t__W \tCFG;\n\t__R \treserved_0[2];\n\t__W \tMATCH;"));
        assert!(h.contains("\t__W \tRX_FIFO_FLUSH;\n\t__R \treserved_2[1];\n\t__R \tTX_FIFO_LEVEL;"));
        assert!(h.trim_end().ends_with("#endif"));
    }
}
