//! Input synchronizers for external interfaces marked `sync: true`.

use crate::error::{CompileError, Result};
use crate::Synchronizer;
use buswrap_config::{Direction, IpDescriptor};

/// Depth of every emitted synchronizer chain.
pub const SYNC_STAGES: u32 = 2;

pub fn plan(ip: &IpDescriptor) -> Result<Vec<Synchronizer>> {
    let mut out = Vec::new();
    for ifc in ip.external_interface.iter().filter(|i| i.sync) {
        if ifc.direction != Direction::Input {
            return Err(CompileError::SyncOnNonInput {
                interface: ifc.name.clone(),
                direction: ifc.direction,
            });
        }
        out.push(Synchronizer {
            interface: ifc.name.clone(),
            port: ifc.port.clone(),
            width: ifc.width.clone(),
            stages: SYNC_STAGES,
        });
    }
    Ok(out)
}
