use std::path::PathBuf;

// Separately:
// CPU: 700 times per second
// Display: 60 times per second
// Timer: 60 times per second
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 700;
pub const DEFAULT_SCALE: usize = 16;

/// Behaviors that differ between interpreter revisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// FX65 loads V0..VX (exclusive) from [I, I+X) instead of V0..=VX.
    pub load_store_exclusive: bool,
}

/// Everything the host needs to run a program.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rom_path: PathBuf,
    pub instructions_per_second: u32,
    pub seed: u64,
    pub scale: usize,
    pub quirks: Quirks,
}

impl Settings {
    pub fn new(rom_path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            rom_path: rom_path.into(),
            instructions_per_second: DEFAULT_INSTRUCTIONS_PER_SECOND,
            seed,
            scale: DEFAULT_SCALE,
            quirks: Quirks::default(),
        }
    }
}
