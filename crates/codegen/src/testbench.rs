//! Verilog testbench skeleton built on the `tb_macros.vh` and
//! `<bus>_tasks.vh` helpers.

use crate::bus::BusSignals;
use crate::{interrupt_offsets, license, range};
use buswrap_config::Direction;
use buswrap_ir::WrapperIr;
use std::fmt::{self, Write};

pub fn write_testbench(out: &mut String, ir: &WrapperIr) -> fmt::Result {
    let bus = BusSignals::of(ir.target);
    let name = &ir.info.name;
    let tb = format!("{}_{}_tb", name, bus.name);

    license::write_banner(out, &ir.info)?;
    writeln!(out, "/* THIS FILE IS GENERATED, edit it to complete the testbench */\n")?;
    writeln!(out, "`timescale\t\t1ns/1ps\n")?;
    writeln!(out, "`default_nettype\tnone\n")?;
    writeln!(
        out,
        "`define\t\t\t{}_AW\t\t\t{}",
        bus.name, ir.layout.bus_address_width
    )?;
    writeln!(out, "`define\t\t\tMS_TB_SIMTIME\t\t1_000_000\n")?;
    writeln!(out, "`include\t\t\"tb_macros.vh\"\n")?;

    writeln!(out, "module {};\n", tb)?;
    writeln!(out, "\t// Change the following parameters as desired")?;
    writeln!(out, "\tparameter real CLOCK_PERIOD = 100.0;")?;
    writeln!(out, "\tparameter real RESET_DURATION = 999.0;\n")?;

    writeln!(out, "\t// DO NOT change the following parameters")?;
    writeln!(out, "\tlocalparam [`{}_AW-1:0]", bus.name)?;
    let offsets: Vec<String> = ir
        .registers
        .iter()
        .map(|r| (r.name.to_ascii_uppercase(), r.offset))
        .chain(
            interrupt_offsets(ir)
                .into_iter()
                .map(|(n, o)| (n.to_string(), o)),
        )
        .map(|(n, o)| format!("\t\t\t{}_REG_OFFSET =\t`{}_AW'h{:04x}", n, bus.name, o))
        .collect();
    writeln!(out, "{};\n", offsets.join(",\n"))?;

    writeln!(out, "\t`TB_{}_SIG\n", bus.name)?;
    for ifc in &ir.external_interfaces {
        let kind = if ifc.direction == Direction::Input {
            "reg"
        } else {
            "wire"
        };
        writeln!(out, "\t{}\t{}\t{};", kind, range(&ifc.width), ifc.name)?;
    }

    writeln!(out, "\n\t`TB_CLK({}, CLOCK_PERIOD)", bus.clock)?;
    writeln!(
        out,
        "\t`TB_ESRST({}, {}, {}, RESET_DURATION)",
        bus.reset,
        bus.reset_level(),
        bus.clock
    )?;
    writeln!(
        out,
        "\t`TB_DUMP(\"{}_{}_tb.vcd\", {}, 0)",
        bus.name, name, tb
    )?;
    writeln!(out, "\t`TB_FINISH(`MS_TB_SIMTIME)")?;

    write!(out, "\n\t{}_{} DUV (\n\t\t`TB_{}_SLAVE_CONN", name, bus.name, bus.name)?;
    for ifc in &ir.external_interfaces {
        write!(out, ",\n\t\t.{}({})", ifc.name, ifc.name)?;
    }
    writeln!(out, "\n\t);")?;

    writeln!(out, "\n\t`include \"{}_tasks.vh\"\n", bus.prefix())?;
    writeln!(out, "\t`TB_TEST_EVENT(test1)\n")?;
    writeln!(out, "\tinitial begin")?;
    writeln!(out, "\t\t#999 -> e_assert_reset;")?;
    writeln!(out, "\t\t@(e_reset_done);\n")?;
    writeln!(out, "\t\t// Perform Test 1")?;
    writeln!(out, "\t\t#1000 -> e_test1_start;")?;
    writeln!(out, "\t\t@(e_test1_done);\n")?;
    writeln!(out, "\t\t// Perform other tests\n")?;
    writeln!(out, "\t\t// Finish the simulation")?;
    writeln!(out, "\t\t#1000 $finish();")?;
    writeln!(out, "\tend\n")?;
    writeln!(out, "\t// Test 1")?;
    writeln!(out, "\t`TB_TEST_BEGIN(test1)")?;
    writeln!(out, "\t\t// Test 1 code goes here\n")?;
    writeln!(out, "\t`TB_TEST_END(test1)")?;
    writeln!(out, "endmodule")
}
