// 16 8-bit data registers named V0 to VF
// I -> address register (12 bits, held in 16)
//
// 16-entry stack of return addresses
//
// Delay timer & Sound timer: count down at 60 times / s until 0,
// independent of how fast instructions run
//
// Display res: 64 width, 32 height, wrapping at the edges
//
// 34 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod rng;
pub mod rom;
pub mod timer;

pub use config::{Quirks, Settings};
pub use decode::{decode, Instruction, Op};
pub use display::FrameBuffer;
pub use emulator::{Emulator, RegisterDump, StepOutcome};
pub use error::{RomError, VmError};
pub use keyboard::{KeyState, Keypad};
pub use rng::{RandomSource, SeededRng};
pub use rom::Rom;
pub use timer::{Pacer, Timer};
