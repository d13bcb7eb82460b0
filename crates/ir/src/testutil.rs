//! Shared fixtures for unit tests.

use buswrap_config::{FieldDescriptor, IpDescriptor, RegisterDescriptor, RegisterMode, Width};

pub fn uart() -> IpDescriptor {
    IpDescriptor::from_yaml(include_str!("../../../tests/fixtures/ef_uart.yaml")).unwrap()
}

pub fn two_regs() -> IpDescriptor {
    IpDescriptor::from_yaml(include_str!("../../../tests/fixtures/two_regs.yaml")).unwrap()
}

/// A 32-bit write register with no bindings.
pub fn register(name: &str, offset: u64) -> RegisterDescriptor {
    RegisterDescriptor {
        name: name.into(),
        size: Width::Bits(32),
        mode: RegisterMode::Write,
        offset,
        fifo: false,
        init: None,
        byte_access: false,
        read_port: None,
        write_port: None,
        description: String::new(),
        fields: Vec::new(),
    }
}

pub fn field(name: &str, lsb: u32, width: u32, port: &str) -> FieldDescriptor {
    FieldDescriptor {
        name: name.into(),
        bit_offset: lsb,
        bit_width: Width::Bits(width),
        read_port: None,
        write_port: Some(port.into()),
        auto_clear: false,
        description: String::new(),
    }
}
