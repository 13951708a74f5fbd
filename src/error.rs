use std::{io, path::PathBuf};

use crate::memory::TypeAddr;

/// Faults raised by the engine. None of them are recoverable: the host is
/// expected to dump state and stop stepping.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("unknown instruction {opcode:#06X} at {pc:#06X}")]
    UnknownInstruction { opcode: u16, pc: TypeAddr },

    #[error("memory access out of bounds at {addr:#06X}")]
    MemoryFault { addr: usize },

    #[error("stack overflow: call at {pc:#06X} with 16 return addresses stored")]
    StackOverflow { pc: TypeAddr },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: TypeAddr },
}

#[derive(Debug, thiserror::Error)]
pub enum RomError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("program is empty")]
    Empty,
}
