//! Process finding and module information

use super::{MemoryReader, ProcessFinder};

/// Information about a running process
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: u32,
    /// Process name
    pub name: String,
    /// Base address of the main module
    pub base_address: usize,
    /// Size of the main module
    pub module_size: usize,
    /// Whether the process is 64-bit
    pub is_64_bit: bool,
}

/// Process finder backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessFinder;

impl SystemProcessFinder {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessFinder for SystemProcessFinder {
    fn find_process(&self, target_names: &[&str]) -> Option<(u32, String)> {
        target_names
            .iter()
            .find_map(|name| find_process(name))
            .map(|info| (info.pid, info.name))
    }

    #[cfg(target_os = "windows")]
    fn open_process(&self, pid: u32) -> Option<Box<dyn MemoryReader>> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        let info = process_info(pid, &process_name(pid)?)?;
        let handle =
            unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, pid).ok()? };

        Some(Box::new(super::WindowsMemoryReader::new(
            handle,
            info.base_address,
            info.module_size,
            info.is_64_bit,
        )))
    }

    #[cfg(target_os = "linux")]
    fn open_process(&self, pid: u32) -> Option<Box<dyn MemoryReader>> {
        let info = process_info(pid, String::new())?;
        Some(Box::new(super::LinuxMemoryReader::new(
            info.pid as i32,
            info.base_address,
            info.module_size,
        )))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    fn open_process(&self, _pid: u32) -> Option<Box<dyn MemoryReader>> {
        None
    }
}

/// Find a process by name
///
/// Returns process info if found, None otherwise
#[cfg(target_os = "windows")]
pub fn find_process(process_name: &str) -> Option<ProcessInfo> {
    first_with_module(enumerate_processes(), process_name, |pid, name| {
        process_info(pid, &name)
    })
}

/// Module information for a process with a known name (Windows)
#[cfg(target_os = "windows")]
fn process_info(pid: u32, name: &str) -> Option<ProcessInfo> {
    let (base_address, module_size) = get_module_info(pid, name)?;
    Some(ProcessInfo {
        pid,
        name: name.to_string(),
        base_address,
        module_size,
        is_64_bit: check_is_64_bit(pid),
    })
}

/// Find a process by name (Linux implementation)
#[cfg(target_os = "linux")]
pub fn find_process(process_name: &str) -> Option<ProcessInfo> {
    use std::fs;
    use std::path::Path;

    let mut candidates = Vec::new();
    for entry in fs::read_dir("/proc").ok()?.flatten() {
        let path = entry.path();
        let Some(pid) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };

        let Ok(comm) = fs::read_to_string(path.join("comm")) else {
            continue;
        };
        let comm = comm.trim();

        // Wine processes show up under their full executable name in cmdline
        let exe_name = fs::read_to_string(path.join("cmdline"))
            .ok()
            .and_then(|s| s.split('\0').next().map(|s| s.replace('\\', "/")))
            .and_then(|s| Path::new(&s).file_name().map(|n| n.to_string_lossy().to_string()))
            .unwrap_or_else(|| comm.to_string());

        if matches_name(&exe_name, process_name) {
            candidates.push((pid, exe_name));
        } else {
            candidates.push((pid, comm.to_string()));
        }
    }

    first_with_module(candidates, process_name, process_info)
}

/// Module information for a process (Linux)
#[cfg(target_os = "linux")]
fn process_info(pid: u32, name: String) -> Option<ProcessInfo> {
    let (base_address, module_size) = get_module_base_from_maps(pid)?;
    Some(ProcessInfo {
        pid,
        name,
        base_address,
        module_size,
        is_64_bit: std::mem::size_of::<usize>() == 8,
    })
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub fn find_process(_process_name: &str) -> Option<ProcessInfo> {
    None
}

/// First process matching `target` whose module information can be read
///
/// A match that cannot be inspected (still starting, access denied) is
/// skipped rather than ending the search.
fn first_with_module<I, F>(candidates: I, target: &str, mut info: F) -> Option<ProcessInfo>
where
    I: IntoIterator<Item = (u32, String)>,
    F: FnMut(u32, String) -> Option<ProcessInfo>,
{
    candidates
        .into_iter()
        .filter(|(_, name)| matches_name(name, target))
        .find_map(|(pid, name)| info(pid, name))
}

/// Case-insensitive name match that tolerates a missing `.exe` suffix
fn matches_name(candidate: &str, target: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let target = target.to_lowercase();
    candidate == target
        || candidate.trim_end_matches(".exe") == target.trim_end_matches(".exe")
}

#[cfg(target_os = "windows")]
fn enumerate_processes() -> Vec<(u32, String)> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };

    let mut processes = Vec::new();

    unsafe {
        let Ok(snapshot) = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) else {
            return processes;
        };

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let len = entry
                    .szExeFile
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szExeFile.len());
                processes.push((
                    entry.th32ProcessID,
                    String::from_utf16_lossy(&entry.szExeFile[..len]),
                ));

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
    }

    processes
}

#[cfg(target_os = "windows")]
fn process_name(pid: u32) -> Option<String> {
    enumerate_processes()
        .into_iter()
        .find(|(p, _)| *p == pid)
        .map(|(_, name)| name)
}

/// Get (base address, size) of a module in a process
#[cfg(target_os = "windows")]
fn get_module_info(pid: u32, module_name: &str) -> Option<(usize, usize)> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, MODULEENTRY32W,
        TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32,
    };

    unsafe {
        let snapshot =
            CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid).ok()?;

        let mut entry = MODULEENTRY32W {
            dwSize: std::mem::size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        if Module32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let len = entry
                    .szModule
                    .iter()
                    .position(|&c| c == 0)
                    .unwrap_or(entry.szModule.len());
                let name = String::from_utf16_lossy(&entry.szModule[..len]);

                if name.eq_ignore_ascii_case(module_name) {
                    let _ = CloseHandle(snapshot);
                    return Some((entry.modBaseAddr as usize, entry.modBaseSize as usize));
                }

                if Module32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }

        let _ = CloseHandle(snapshot);
    }

    None
}

/// Check if a process is 64-bit (Windows)
#[cfg(target_os = "windows")]
fn check_is_64_bit(pid: u32) -> bool {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        IsWow64Process, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    unsafe {
        if let Ok(handle) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
            let mut is_wow64 = windows::Win32::Foundation::BOOL(0);
            if IsWow64Process(handle, &mut is_wow64).is_ok() {
                let _ = CloseHandle(handle);
                // WOW64 means a 32-bit process on 64-bit Windows
                return !is_wow64.as_bool();
            }
            let _ = CloseHandle(handle);
        }
    }

    std::mem::size_of::<usize>() == 8
}

/// Parse /proc/[pid]/maps to get base address and size of the first image
#[cfg(target_os = "linux")]
fn get_module_base_from_maps(pid: u32) -> Option<(usize, usize)> {
    let maps = std::fs::read_to_string(format!("/proc/{}/maps", pid)).ok()?;

    let mut base_address = None;
    let mut end_address = 0usize;
    let mut image_path: Option<String> = None;

    for line in maps.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }

        // Only consider the contiguous mappings of the first file-backed image
        let path = parts[5];
        match &image_path {
            None => image_path = Some(path.to_string()),
            Some(p) if p != path => break,
            Some(_) => {}
        }

        let Some((start, end)) = parts[0].split_once('-') else {
            continue;
        };
        let start = usize::from_str_radix(start, 16).ok()?;
        let end = usize::from_str_radix(end, 16).ok()?;

        if base_address.is_none() {
            base_address = Some(start);
        }
        end_address = end;
    }

    let base = base_address?;
    Some((base, end_address - base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_name_exact() {
        assert!(matches_name("q2pro.exe", "q2pro.exe"));
        assert!(matches_name("Q2PRO.EXE", "q2pro.exe"));
    }

    #[test]
    fn test_matches_name_without_extension() {
        assert!(matches_name("q2pro.exe", "q2pro"));
        assert!(matches_name("q2pro", "q2pro.exe"));
        assert!(!matches_name("q2pro-server", "q2pro"));
    }

    fn info(pid: u32, name: String) -> ProcessInfo {
        ProcessInfo {
            pid,
            name,
            base_address: 0x400000,
            module_size: 5033984,
            is_64_bit: false,
        }
    }

    #[test]
    fn test_first_with_module_skips_uninspectable_match() {
        let candidates = vec![
            (10, "explorer.exe".to_string()),
            (11, "q2pro.exe".to_string()),
            (12, "Q2PRO.exe".to_string()),
        ];

        let found = first_with_module(candidates, "q2pro", |pid, name| {
            (pid != 11).then(|| info(pid, name))
        })
        .unwrap();

        assert_eq!(found.pid, 12);
        assert_eq!(found.module_size, 5033984);
    }

    #[test]
    fn test_first_with_module_no_match() {
        let candidates = vec![(1, "quake2.exe".to_string())];
        assert!(first_with_module(candidates, "q2pro", |pid, name| Some(info(pid, name))).is_none());
    }
}
