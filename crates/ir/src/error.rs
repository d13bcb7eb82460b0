//! Errors raised while compiling an IP description.

use buswrap_config::{Direction, RegisterMode};
use thiserror::Error;

/// A configuration error. Every variant is fatal: the descriptor has to be
/// edited before compilation can succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A flag, register or field names a port that is not declared.
    #[error("Port {port} referenced by {entity} not found in the IP definition")]
    MissingPort { entity: String, port: String },

    /// A width names a parameter that is not declared.
    #[error("Parameter {param} referenced by {entity} is not declared")]
    UnresolvedParameter { entity: String, param: String },

    /// A width names a parameter whose default is not an integer.
    #[error("Parameter {param} used as a width by {entity} has non-integer default '{value}'")]
    NonIntegerParameter {
        entity: String,
        param: String,
        value: String,
    },

    #[error("{entity} has zero width")]
    ZeroWidthPort { entity: String },

    #[error("Bus address width must be between 1 and 32 bits, found {0}")]
    InvalidAddressWidth(u32),

    /// A bank base that is not a multiple of 4.
    #[error("The {region} base {base:#06x} is not aligned to 4 bytes")]
    MisalignedBase { region: &'static str, base: u64 },

    /// A bank that does not fit the decoded address window.
    #[error("The {region} {start:#06x}..{end:#06x} does not fit a {bits}-bit bus address")]
    BankOutOfRange {
        region: &'static str,
        start: u64,
        end: u64,
        bits: u32,
    },

    #[error("Register {0} is declared more than once")]
    DuplicateRegister(String),

    #[error("Register {register} offset {offset:#06x} is not aligned to 4 bytes")]
    MisalignedOffset { register: String, offset: u64 },

    #[error("Registers {first} and {second} share offset {offset:#06x}")]
    DuplicateOffset {
        first: String,
        second: String,
        offset: u64,
    },

    #[error("Register {register} offset {offset:#06x} does not fit a {bits}-bit bus address")]
    OffsetOutOfRange {
        register: String,
        offset: u64,
        bits: u32,
    },

    /// A register sits inside one of the generator-owned banks.
    #[error("Register {register} offset {offset:#06x} overlaps the {region} ({start:#06x}..{end:#06x})")]
    RegionOverlap {
        register: String,
        offset: u64,
        region: &'static str,
        start: u64,
        end: u64,
    },

    #[error("Register {register} offset {offset:#06x} lies above the interrupt bank at {interrupt_base:#06x}")]
    BeyondInterruptBank {
        register: String,
        offset: u64,
        interrupt_base: u64,
    },

    #[error("FIFO bank {start:#06x}..{end:#06x} overlaps the interrupt bank at {interrupt_base:#06x}")]
    FifoBankOverlap {
        start: u64,
        end: u64,
        interrupt_base: u64,
    },

    #[error("Register {register} has size {size}; sizes must be between 1 and 32 bits")]
    InvalidSize { register: String, size: u32 },

    #[error("Field {register}.{field} has zero width")]
    ZeroWidthField { register: String, field: String },

    #[error("Field {register}.{field} bits [{msb}:{lsb}] do not fit the {size}-bit register")]
    FieldOutOfRange {
        register: String,
        field: String,
        msb: u32,
        lsb: u32,
        size: u32,
    },

    #[error("Fields {register}.{first} and {register}.{second} overlap")]
    FieldOverlap {
        register: String,
        first: String,
        second: String,
    },

    #[error("Register {0} has mode rw and cannot carry fields")]
    FieldsOnReadWrite(String),

    /// A register or field lacks the port its direction requires.
    #[error("{entity} needs a {needed}")]
    MissingBinding {
        entity: String,
        needed: &'static str,
    },

    #[error("Byte access on register {register} requires a 32-bit register (size is {size})")]
    ByteAccessSize { register: String, size: u32 },

    #[error("Byte access on register {register} is not supported by the {target} bus")]
    ByteAccessTarget {
        register: String,
        target: &'static str,
    },

    #[error("Field {register}.{field} is auto-clear but register mode is {mode}; auto-clear needs mode w")]
    AutoClearMode {
        register: String,
        field: String,
        mode: RegisterMode,
    },

    #[error("Interrupt flags need {width} bits; the interrupt registers hold 32")]
    InterruptBankTooWide { width: u32 },

    #[error("Cannot attach a synchronizer to {direction} interface {interface}; only input interfaces can be synchronized")]
    SyncOnNonInput {
        interface: String,
        direction: Direction,
    },

    #[error("FIFO {fifo} refers to unknown register {register}")]
    UnknownFifoRegister { fifo: String, register: String },

    #[error("FIFO {fifo} register {register} is not declared with fifo: true")]
    NotFifoRegister { fifo: String, register: String },

    #[error("FIFO {fifo} address_width must be between 1 and 32, found {width}")]
    InvalidFifoAddressWidth { fifo: String, width: u32 },

    #[error("Reset level must be 0 or 1, found {0}")]
    InvalidResetLevel(u8),
}

pub type Result<T> = std::result::Result<T, CompileError>;
