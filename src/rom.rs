use std::{fs, path::Path};

use crate::{error::RomError, memory::MAX_PROGRAM_SIZE};

/// A program image that is known to fit in memory.
///
/// Size checks happen here, before any VM state exists to be touched, so
/// [`crate::Emulator::load`] never has to reject anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.is_empty() {
            return Err(RomError::Empty);
        }
        if bytes.len() > MAX_PROGRAM_SIZE {
            return Err(RomError::TooLarge {
                size: bytes.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        Ok(Self { bytes })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RomError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| RomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_max_size() {
        let rom = Rom::from_bytes(vec![0; 3584]).unwrap();
        assert_eq!(rom.len(), 3584);
    }

    #[test]
    fn test_rejects_oversize() {
        match Rom::from_bytes(vec![0; 3585]) {
            Err(RomError::TooLarge { size, max }) => {
                assert_eq!(size, 3585);
                assert_eq!(max, 3584);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(Rom::from_bytes(vec![]), Err(RomError::Empty)));
    }

    #[test]
    fn test_missing_file() {
        let err = Rom::from_file("definitely/not/a/rom.ch8").unwrap_err();
        assert!(matches!(err, RomError::Io { .. }));
        assert!(err.to_string().contains("definitely/not/a/rom.ch8"));
    }

    #[test]
    fn test_reads_file() {
        let path = std::env::temp_dir().join(format!("chip8-vm-rom-{}.ch8", std::process::id()));
        fs::write(&path, [0x00u8, 0xE0]).unwrap();
        let rom = Rom::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(rom.bytes(), &[0x00, 0xE0]);
    }
}
