use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

use crate::error::Error;

/// A memory mapping of the dump file which makes the file discoverable by
/// perf.
///
/// Mapping the jitdump file produces an `MMAP` record in the perf.data file,
/// captured either live (perf record running while we mmap) or after the
/// fact via `/proc/<pid>/maps`. perf recognizes the `jit-<pid>.dump` file
/// name in that record and processes the file during `perf inject`. The
/// mapping itself is never read or written.
///
/// The mapping must be `PROT_EXEC` to ensure it is captured by perf record
/// even when not using the `-d` option.
#[derive(Debug)]
pub struct MmapMarker {
    addr: *mut libc::c_void,
    len: usize,
}

// The marker owns its mapping exclusively and only ever unmaps it; the
// mapped memory is never accessed.
unsafe impl Send for MmapMarker {}

impl MmapMarker {
    /// Maps one page of `file` into the process's address space.
    pub fn open(file: &File) -> Result<Self, Error> {
        let len = page_size();
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_EXEC,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(Error::MarkerMmap(io::Error::last_os_error()));
        }
        Ok(Self { addr, len })
    }

    /// Unmaps the marker. Safe to call more than once.
    pub fn close(&mut self) {
        if self.addr.is_null() {
            return;
        }
        unsafe {
            libc::munmap(self.addr, self.len);
        }
        self.addr = ptr::null_mut();
    }
}

impl Drop for MmapMarker {
    fn drop(&mut self) {
        self.close();
    }
}

fn page_size() -> usize {
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret > 0 {
        ret as usize
    } else {
        4096
    }
}
