//! Signal names each bus exposes inside a generated wrapper.

use buswrap_ir::BusType;

/// How the wrapper tells the bus a transfer is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    /// A ready output tied high.
    Ready(&'static str),
    /// A registered acknowledge driven by the `wb_valid & ~ack_o` state machine.
    Ack(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusSignals {
    pub name: &'static str,
    pub clock: &'static str,
    /// Reset net as it appears on the bus.
    pub reset: &'static str,
    pub reset_active_high: bool,
    pub addr: &'static str,
    pub wdata: &'static str,
    pub rdata: &'static str,
    pub handshake: Handshake,
}

pub const APB: BusSignals = BusSignals {
    name: "APB",
    clock: "PCLK",
    reset: "PRESETn",
    reset_active_high: false,
    addr: "PADDR",
    wdata: "PWDATA",
    rdata: "PRDATA",
    handshake: Handshake::Ready("PREADY"),
};

pub const AHBL: BusSignals = BusSignals {
    name: "AHBL",
    clock: "HCLK",
    reset: "HRESETn",
    reset_active_high: false,
    addr: "last_HADDR",
    wdata: "HWDATA",
    rdata: "HRDATA",
    handshake: Handshake::Ready("HREADYOUT"),
};

pub const WB: BusSignals = BusSignals {
    name: "WB",
    clock: "clk_i",
    reset: "rst_i",
    reset_active_high: true,
    addr: "adr_i",
    wdata: "dat_i",
    rdata: "dat_o",
    handshake: Handshake::Ack("ack_o"),
};

impl BusSignals {
    pub fn of(bus: BusType) -> &'static BusSignals {
        match bus {
            BusType::Apb => &APB,
            BusType::Ahbl => &AHBL,
            BusType::Wb => &WB,
        }
    }

    /// Lower-case prefix of the `_re`/`_we` strobes and include files.
    pub fn prefix(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// The bus reset as an active-low expression.
    pub fn reset_n(&self) -> String {
        if self.reset_active_high {
            format!("(~{})", self.reset)
        } else {
            self.reset.to_string()
        }
    }

    /// Value of the reset net while reset is asserted.
    pub fn reset_level(&self) -> &'static str {
        if self.reset_active_high {
            "1'b1"
        } else {
            "1'b0"
        }
    }

    /// Sensitivity-list edge on which the reset net asserts.
    pub fn reset_edge(&self) -> &'static str {
        if self.reset_active_high {
            "posedge"
        } else {
            "negedge"
        }
    }

    /// `(ADDR[`BUS_AW-1:0] == <offset_name>)`
    pub fn addr_match(&self, offset_name: &str) -> String {
        format!(
            "({}[`{}_AW-1:0] == {})",
            self.addr, self.name, offset_name
        )
    }
}
