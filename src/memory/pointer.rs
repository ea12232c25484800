//! Pointer chain resolution
//!
//! A pointer is a list of offsets relative to the main module's base
//! address. Every offset except the last is dereferenced; the last one is
//! just added to get the final address. A single offset therefore names a
//! static cell inside the module image.

use serde::{Deserialize, Serialize};

use super::MemoryReader;

/// A module-relative pointer with an offset chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pointer {
    /// Chain of offsets to follow
    pub offsets: Vec<i64>,
}

impl Pointer {
    /// Create a pointer from a full offset chain
    pub fn new(offsets: Vec<i64>) -> Self {
        Self { offsets }
    }

    /// Create a pointer to a static cell at `offset` from the module base
    pub fn offset(offset: i64) -> Self {
        Self {
            offsets: vec![offset],
        }
    }

    /// Number of dereferences performed when resolving
    pub fn depth(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Resolve the pointer chain to get the final address
    ///
    /// Returns `None` when any intermediate read fails or yields null.
    pub fn resolve(&self, reader: &dyn MemoryReader) -> Option<usize> {
        let mut ptr = reader.base_address() as i64;

        for (i, &offset) in self.offsets.iter().enumerate() {
            let address = ptr.checked_add(offset)?;
            if address < 0 {
                return None;
            }

            if i + 1 < self.offsets.len() {
                ptr = reader.read_ptr(address as usize)? as i64;
                if ptr == 0 {
                    return None;
                }
            } else {
                ptr = address;
            }
        }

        Some(ptr as usize)
    }

    /// Read an i32 at the resolved address
    pub fn read_i32(&self, reader: &dyn MemoryReader) -> Option<i32> {
        reader.read_i32(self.resolve(reader)?)
    }

    /// Read an f32 at the resolved address
    pub fn read_f32(&self, reader: &dyn MemoryReader) -> Option<f32> {
        reader.read_f32(self.resolve(reader)?)
    }

    /// Read a NUL-terminated string of at most `max_len` bytes
    pub fn read_string(&self, reader: &dyn MemoryReader, max_len: usize) -> Option<String> {
        reader.read_string(self.resolve(reader)?, max_len)
    }
}

impl From<i64> for Pointer {
    fn from(offset: i64) -> Self {
        Self::offset(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryReader;

    #[test]
    fn test_pointer_no_offsets() {
        let reader = MockMemoryReader::new().with_base(0x1000);
        let ptr = Pointer::new(vec![]);

        assert_eq!(ptr.resolve(&reader), Some(0x1000));
        assert_eq!(ptr.depth(), 0);
    }

    #[test]
    fn test_pointer_single_offset_no_dereference() {
        let reader = MockMemoryReader::new().with_base(0x1000);
        let ptr = Pointer::offset(0x10);

        assert_eq!(ptr.resolve(&reader), Some(0x1010));
        assert_eq!(ptr.depth(), 0);
    }

    #[test]
    fn test_pointer_chain_dereferencing() {
        let reader = MockMemoryReader::new().with_base(0x1000);
        // 0x1000 + 0x8 -> 0x2000, then 0x2000 + 0x10
        reader.write_ptr(0x1008, 0x2000);

        let ptr = Pointer::new(vec![0x8, 0x10]);
        assert_eq!(ptr.depth(), 1);
        assert_eq!(ptr.resolve(&reader), Some(0x2010));
    }

    #[test]
    fn test_pointer_chain_32_bit() {
        let reader = MockMemoryReader::new().with_base(0x1000).with_64_bit(false);
        reader.write_ptr(0x1008, 0x3000);
        reader.write_i32(0x3004, 42);

        let ptr = Pointer::new(vec![0x8, 0x4]);
        assert_eq!(ptr.read_i32(&reader), Some(42));
    }

    #[test]
    fn test_null_pointer_detection() {
        let reader = MockMemoryReader::new().with_base(0x1000);
        reader.write_ptr(0x1000, 0);

        let ptr = Pointer::new(vec![0x0, 0x10]);
        assert_eq!(ptr.resolve(&reader), None);
    }

    #[test]
    fn test_unreadable_link_fails() {
        let reader = MockMemoryReader::new().with_base(0x1000);
        let ptr = Pointer::new(vec![0x0, 0x10]);

        assert_eq!(ptr.resolve(&reader), None);
        assert_eq!(ptr.read_i32(&reader), None);
    }

    #[test]
    fn test_pointer_deserializes_from_array() {
        #[derive(Deserialize)]
        struct Cell {
            cell: Pointer,
        }

        let cell: Cell = toml::from_str("cell = [0x286400]").unwrap();
        assert_eq!(cell.cell, Pointer::offset(0x286400));
    }
}
