//! Mock implementations for testing
//!
//! These allow the tracker, orchestrator and driver to be exercised without
//! a running game process.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{MemoryReader, ProcessFinder};

/// Mock memory reader that returns data from a pre-configured memory map
///
/// Clones share the same backing memory, so a test can keep one handle and
/// mutate memory while another handle is owned by the code under test.
#[derive(Clone)]
pub struct MockMemoryReader {
    /// Memory contents: address -> bytes
    memory: Arc<RwLock<HashMap<usize, Vec<u8>>>>,
    /// Base address of the module
    base: usize,
    /// Size of the module
    size: usize,
    /// Pointer width of the fake process
    is_64_bit: bool,
    /// Whether the process is "running"
    valid: Arc<AtomicBool>,
}

impl Default for MockMemoryReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemoryReader {
    /// Create a new mock memory reader
    pub fn new() -> Self {
        Self {
            memory: Arc::new(RwLock::new(HashMap::new())),
            base: 0x400000,
            size: 0x4000000,
            is_64_bit: true,
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Set the base address
    pub fn with_base(mut self, base: usize) -> Self {
        self.base = base;
        self
    }

    /// Set the module size
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Set the pointer width
    pub fn with_64_bit(mut self, is_64_bit: bool) -> Self {
        self.is_64_bit = is_64_bit;
        self
    }

    /// Write bytes to mock memory
    pub fn write_bytes(&self, address: usize, data: &[u8]) {
        self.memory.write().insert(address, data.to_vec());
    }

    /// Write an i32 to mock memory
    pub fn write_i32(&self, address: usize, value: i32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a u32 to mock memory
    pub fn write_u32(&self, address: usize, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write an f32 to mock memory
    pub fn write_f32(&self, address: usize, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a pointer to mock memory
    pub fn write_ptr(&self, address: usize, value: usize) {
        if self.is_64_bit {
            self.write_bytes(address, &(value as u64).to_le_bytes());
        } else {
            self.write_bytes(address, &(value as u32).to_le_bytes());
        }
    }

    /// Write a NUL-padded string buffer of `len` bytes
    pub fn write_string(&self, address: usize, value: &str, len: usize) {
        let mut buffer = value.as_bytes().to_vec();
        buffer.resize(len, 0);
        self.write_bytes(address, &buffer);
    }

    /// Remove the block starting at `address`, making reads there fail
    pub fn unmap(&self, address: usize) {
        self.memory.write().remove(&address);
    }

    /// Invalidate the process (simulate process exit)
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }
}

impl MemoryReader for MockMemoryReader {
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>> {
        if !self.is_valid() {
            return None;
        }

        let memory = self.memory.read();

        // Check for exact match first
        if let Some(data) = memory.get(&address) {
            if data.len() >= size {
                return Some(data[..size].to_vec());
            }
        }

        // Check if the address falls within any stored block
        for (&block_start, block_data) in memory.iter() {
            if address >= block_start && address < block_start + block_data.len() {
                let offset = address - block_start;
                if offset + size <= block_data.len() {
                    return Some(block_data[offset..offset + size].to_vec());
                }
            }
        }

        None
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn base_address(&self) -> usize {
        self.base
    }

    fn module_size(&self) -> usize {
        self.size
    }

    fn is_64_bit(&self) -> bool {
        self.is_64_bit
    }
}

/// Mock process finder for testing
#[derive(Default)]
pub struct MockProcessFinder {
    /// List of mock processes: (pid, name)
    processes: RwLock<Vec<(u32, String)>>,
    /// Memory readers to return for each process
    readers: RwLock<HashMap<u32, MockMemoryReader>>,
}

impl MockProcessFinder {
    /// Create a new mock process finder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock process without memory (cannot be opened)
    pub fn add_process(&self, pid: u32, name: &str) {
        self.processes.write().push((pid, name.to_string()));
    }

    /// Add a mock process with a memory reader
    pub fn add_process_with_reader(&self, pid: u32, name: &str, reader: MockMemoryReader) {
        self.processes.write().push((pid, name.to_string()));
        self.readers.write().insert(pid, reader);
    }

    /// Remove a process from the list (its readers stay as they are)
    pub fn remove_process(&self, pid: u32) {
        self.processes.write().retain(|(p, _)| *p != pid);
    }
}

impl ProcessFinder for MockProcessFinder {
    fn find_process(&self, target_names: &[&str]) -> Option<(u32, String)> {
        for (pid, name) in self.processes.read().iter() {
            let name_lower = name.to_lowercase();
            for target in target_names {
                let target_lower = target.to_lowercase();
                if name_lower == target_lower
                    || name_lower == format!("{}.exe", target_lower.trim_end_matches(".exe"))
                {
                    return Some((*pid, name.clone()));
                }
            }
        }
        None
    }

    fn open_process(&self, pid: u32) -> Option<Box<dyn MemoryReader>> {
        self.readers
            .read()
            .get(&pid)
            .cloned()
            .map(|r| Box::new(r) as Box<dyn MemoryReader>)
    }
}
