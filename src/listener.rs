use std::io;
use std::path::PathBuf;
use std::slice;
use std::sync::Mutex;

use crate::error::Error;
use crate::machine;
use crate::marker::MmapMarker;
use crate::object::{DebugInfoProvider, EmittedObject, LineEntry, SymbolKind};
use crate::records::{CodeLoadRecord, DebugInfoRecord};
use crate::session::DumpSession;
use crate::timestamp::monotonic_timestamp;

/// Receives object emission notifications from a JIT engine and writes
/// jitdump records for the contained functions.
///
/// A listener is either *active* or *disabled*. If any initialization step
/// fails (no monotonic clock, dump directory or file creation failure,
/// machine identification failure, marker mmap failure, header write
/// failure), the failure is logged and the listener stays permanently
/// disabled: all notifications are silently ignored and the JIT engine runs
/// normally, just without profiling support. An active listener never
/// becomes disabled.
///
/// The listener may be shared across JIT threads; the dump stream and the
/// code index counter sit behind a mutex which is held for the duration of
/// one whole object notification, so the records of one object are never
/// interleaved with another's.
#[derive(Debug)]
pub struct PerfJitDumpListener {
    pid: u32,
    session: Option<Mutex<ActiveSession>>,
}

#[derive(Debug)]
struct ActiveSession {
    dump: DumpSession,
    // Kept alive so the mapping persists until the listener goes away; the
    // drop order unmaps before the file closes.
    _marker: MmapMarker,
}

impl PerfJitDumpListener {
    /// Sets up the dump session for this process.
    ///
    /// This never fails; on error the returned listener is disabled and the
    /// cause is logged.
    pub fn new() -> Self {
        let pid = std::process::id();
        match Self::init_session(pid) {
            Ok(session) => Self {
                pid,
                session: Some(Mutex::new(session)),
            },
            Err(e) => {
                log::error!("jitdump profiling disabled: {e}");
                Self { pid, session: None }
            }
        }
    }

    fn init_session(pid: u32) -> Result<ActiveSession, Error> {
        if monotonic_timestamp() == 0 {
            return Err(Error::MonotonicClockUnavailable);
        }
        let mut dump = DumpSession::create(pid)?;
        let elf_mach = machine::elf_machine()?;
        // The marker must be mapped before anything is written; perf only
        // needs the mmap itself, not file contents.
        let marker = MmapMarker::open(dump.file())?;
        dump.write_header(elf_mach)?;
        io::Write::flush(&mut dump)?;
        Ok(ActiveSession {
            dump,
            _marker: marker,
        })
    }

    /// Whether initialization succeeded and records will be written.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The path of the dump file, if the listener is active.
    pub fn dump_path(&self) -> Option<PathBuf> {
        let session = self.session.as_ref()?;
        let session = session.lock().unwrap_or_else(|e| e.into_inner());
        Some(session.dump.path().to_owned())
    }

    /// Notifies the listener that the JIT engine finalized an object.
    ///
    /// Must be called exactly once per successfully finalized object, and
    /// only after the object's code pages are mapped executable and
    /// resident: the code bytes are read directly from the symbol addresses.
    ///
    /// For every function symbol with a resolvable name and address, a debug
    /// info record (when the line table is non-empty) and a code load record
    /// (when the code size is nonzero) are written, in that order. Symbols
    /// whose kind, name, or address fail to resolve are skipped without
    /// aborting the batch. The stream is flushed once per object so the
    /// profiler can read records as they are produced.
    pub fn notify_object_emitted(
        &self,
        object: &dyn EmittedObject,
        debug_info: &dyn DebugInfoProvider,
    ) {
        let Some(session) = &self.session else {
            return;
        };
        let mut session = session.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = self.emit_object(&mut session, object, debug_info) {
            log::warn!("could not write jitdump records: {e}");
        }
    }

    /// Notifies the listener that the JIT engine is freeing an object.
    ///
    /// Intentionally a no-op: the jitdump protocol has no code-unload
    /// record.
    pub fn notify_object_freed(&self, _object: &dyn EmittedObject) {}

    fn emit_object(
        &self,
        session: &mut ActiveSession,
        object: &dyn EmittedObject,
        debug_info: &dyn DebugInfoProvider,
    ) -> Result<(), io::Error> {
        for symbol in object.symbols() {
            if !matches!(symbol.kind, Ok(SymbolKind::Function)) {
                continue;
            }
            let Ok(name) = symbol.name else { continue };
            let Ok(addr) = symbol.address else { continue };
            let size = symbol.size;

            // The debug info record has to precede the code load record for
            // the same function.
            let lines = debug_info.line_table(addr, size);
            self.emit_debug_info(session, addr, &lines)?;
            self.emit_code_load(session, &name, addr, size)?;
        }
        io::Write::flush(&mut session.dump)
    }

    fn emit_code_load(
        &self,
        session: &mut ActiveSession,
        name: &str,
        code_addr: u64,
        code_size: u64,
    ) -> Result<(), io::Error> {
        // Zero-length functions can't have samples.
        if code_size == 0 {
            return Ok(());
        }
        let code_bytes = unsafe { code_bytes_at(code_addr, code_size as usize) };
        let record = CodeLoadRecord {
            pid: self.pid,
            tid: thread_id(),
            code_addr,
            code_index: session.dump.next_code_index(),
            function_name: name,
            code_bytes,
        };
        record.write(&mut session.dump, monotonic_timestamp())
    }

    fn emit_debug_info(
        &self,
        session: &mut ActiveSession,
        code_addr: u64,
        lines: &[LineEntry],
    ) -> Result<(), io::Error> {
        if lines.is_empty() {
            return Ok(());
        }
        let record = DebugInfoRecord {
            code_addr,
            entries: lines,
        };
        record.write(&mut session.dump, monotonic_timestamp())
    }
}

impl Default for PerfJitDumpListener {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the jitted code bytes out of the process's own memory.
///
/// # Safety
///
/// `addr..addr + len` must be valid, live, readable memory for the duration
/// of the call. This holds under the `notify_object_emitted` precondition
/// that the object's code pages are mapped and resident.
unsafe fn code_bytes_at(addr: u64, len: usize) -> &'static [u8] {
    slice::from_raw_parts(addr as *const u8, len)
}

fn thread_id() -> u32 {
    unsafe { libc::gettid() as u32 }
}
