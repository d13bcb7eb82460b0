//! Parameter table used to resolve symbolic widths.

use crate::error::{CompileError, Result};
use buswrap_config::{IpDescriptor, Literal, Width};
use std::collections::BTreeMap;

/// Maps parameter names to their declared defaults. Lookups fail closed: an
/// unknown name is an error, never a default.
#[derive(Debug, Clone, Default)]
pub struct ParamTable {
    defaults: BTreeMap<String, Literal>,
}

impl ParamTable {
    pub fn new(ip: &IpDescriptor) -> Self {
        Self {
            defaults: ip
                .parameters
                .iter()
                .map(|p| (p.name.clone(), p.default.clone()))
                .collect(),
        }
    }

    /// Resolves `width` to a bit count. `entity` names the owner for error messages.
    pub fn resolve(&self, width: &Width, entity: &str) -> Result<u32> {
        match width {
            Width::Bits(bits) => Ok(*bits),
            Width::Param(name) => {
                let default =
                    self.defaults
                        .get(name)
                        .ok_or_else(|| CompileError::UnresolvedParameter {
                            entity: entity.to_string(),
                            param: name.clone(),
                        })?;
                default
                    .as_int()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| CompileError::NonIntegerParameter {
                        entity: entity.to_string(),
                        param: name.clone(),
                        value: default.to_string(),
                    })
            }
        }
    }

    /// Resolves the width of the named IP port.
    pub fn port_width(&self, ip: &IpDescriptor, port: &str, entity: &str) -> Result<u32> {
        let descriptor = ip.port(port).ok_or_else(|| CompileError::MissingPort {
            entity: entity.to_string(),
            port: port.to_string(),
        })?;
        self.resolve(&descriptor.width, entity)
    }
}
