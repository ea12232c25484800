//! Cross-platform memory operations
//!
//! This module provides platform-agnostic abstractions for memory reading,
//! with implementations for Windows and Linux. Reads never fault the caller:
//! an unmapped or invalid address is reported as `None`.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

mod mock;
mod pointer;
mod process;

pub use mock::{MockMemoryReader, MockProcessFinder};
pub use pointer::Pointer;
pub use process::{ProcessInfo, SystemProcessFinder};

#[cfg(target_os = "windows")]
pub use windows::WindowsMemoryReader;

#[cfg(target_os = "linux")]
pub use linux::LinuxMemoryReader;

/// Trait for reading memory from an attached process
pub trait MemoryReader: Send + Sync {
    /// Read raw bytes from memory
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>>;

    /// Check if the reader is still valid (process still running)
    fn is_valid(&self) -> bool;

    /// Get the base address of the main module
    fn base_address(&self) -> usize;

    /// Get the size of the main module
    fn module_size(&self) -> usize;

    /// Whether pointers in the target process are 8 bytes wide
    fn is_64_bit(&self) -> bool {
        true
    }

    /// Read a u32 from memory
    fn read_u32(&self, address: usize) -> Option<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read an i32 from memory
    fn read_i32(&self, address: usize) -> Option<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read an i64 from memory
    fn read_i64(&self, address: usize) -> Option<i64> {
        let bytes = self.read_bytes(address, 8)?;
        Some(i64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3],
            bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    /// Read an f32 from memory
    fn read_f32(&self, address: usize) -> Option<f32> {
        let bytes = self.read_bytes(address, 4)?;
        Some(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a pointer-sized value, honoring the target's bitness
    fn read_ptr(&self, address: usize) -> Option<usize> {
        if self.is_64_bit() {
            self.read_i64(address).map(|v| v as usize)
        } else {
            self.read_u32(address).map(|v| v as usize)
        }
    }

    /// Read a fixed-length, NUL-terminated character buffer
    ///
    /// At most `max_len` bytes are read; the result is cut at the first NUL.
    fn read_string(&self, address: usize, max_len: usize) -> Option<String> {
        let bytes = self.read_bytes(address, max_len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

/// Trait for finding and attaching to processes
pub trait ProcessFinder: Send + Sync {
    /// Find a process by name from a list of target names
    /// Returns (pid, process_name) if found
    fn find_process(&self, target_names: &[&str]) -> Option<(u32, String)>;

    /// Open a process and create a memory reader
    fn open_process(&self, pid: u32) -> Option<Box<dyn MemoryReader>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_string_stops_at_nul() {
        let reader = MockMemoryReader::new();
        let mut block = b"base1".to_vec();
        block.resize(32, 0);
        reader.write_bytes(0x1000, &block);

        assert_eq!(reader.read_string(0x1000, 32), Some("base1".to_string()));
    }

    #[test]
    fn test_read_string_without_terminator_is_truncated() {
        let reader = MockMemoryReader::new();
        reader.write_bytes(0x1000, b"security_extra");

        assert_eq!(reader.read_string(0x1000, 8), Some("security".to_string()));
    }

    #[test]
    fn test_read_string_failure() {
        let reader = MockMemoryReader::new();
        assert_eq!(reader.read_string(0x1000, 32), None);
    }

    #[test]
    fn test_read_ptr_32_bit() {
        let reader = MockMemoryReader::new().with_64_bit(false);
        reader.write_bytes(0x1000, &[0x78, 0x56, 0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF]);

        assert_eq!(reader.read_ptr(0x1000), Some(0x12345678));
    }
}
