//! Text backends for a compiled [`WrapperIr`].
//!
//! Every artifact is rendered into a `String` in one pass; nothing is
//! written anywhere until rendering has succeeded. Backends only format what
//! the IR already decided, they never recompute offsets or masks.

use anyhow::Result;
use buswrap_config::Width;
use buswrap_ir::{HeaderSlot, PackedField, WrapperIr};

pub mod bus;
pub mod docs;
pub mod header;
pub mod license;
pub mod testbench;
pub mod wrapper;

pub use bus::BusSignals;

/// The kinds of file the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Verilog bus wrapper.
    Wrapper,
    /// Verilog testbench skeleton for the wrapper.
    Testbench,
    /// C register definitions.
    Header,
    /// Markdown programming guide.
    Docs,
}

impl Artifact {
    pub fn name(self) -> &'static str {
        match self {
            Artifact::Wrapper => "wrapper",
            Artifact::Testbench => "testbench",
            Artifact::Header => "C header",
            Artifact::Docs => "documentation",
        }
    }
}

/// Renders `artifact` for `ir`.
pub fn generate(ir: &WrapperIr, artifact: Artifact) -> Result<String> {
    let mut out = String::new();
    match artifact {
        Artifact::Wrapper => wrapper::write_wrapper(&mut out, ir)?,
        Artifact::Testbench => testbench::write_testbench(&mut out, ir)?,
        Artifact::Header => header::write_header(&mut out, ir)?,
        Artifact::Docs => docs::write_docs(&mut out, ir)?,
    }
    tracing::info!(
        "Generated {} {} for {} ({} bytes)",
        ir.target.name(),
        artifact.name(),
        ir.info.name,
        out.len()
    );
    Ok(out)
}

/// IM, MIS, RIS and IC with their offsets, in struct order.
pub(crate) fn interrupt_offsets(ir: &WrapperIr) -> Vec<(&'static str, u64)> {
    ir.header
        .slots
        .iter()
        .filter_map(|slot| match slot {
            HeaderSlot::Interrupt { name, offset, .. } => Some((*name, *offset)),
            _ => None,
        })
        .collect()
}

/// `[N-1:0]` for literal widths, `[P-1:0]` for parameters.
pub(crate) fn range(width: &Width) -> String {
    match width {
        Width::Bits(n) => format!("[{}:0]", n.saturating_sub(1)),
        Width::Param(p) => format!("[{}-1:0]", p),
    }
}

/// Most significant bit of a field, kept symbolic when its width is a parameter.
pub(crate) fn field_msb(field: &PackedField) -> String {
    match &field.width_expr {
        Width::Bits(_) => field.msb().to_string(),
        Width::Param(p) if field.lsb == 0 => format!("({} - 1)", p),
        Width::Param(p) => format!("({} + {})", p, field.lsb - 1),
    }
}
