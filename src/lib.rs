//! A writer for [jitdump][jitdump] files.
//!
//! jitdump files describe jit-compiled code to the Linux perf tool: which
//! address ranges contain code for which functions, and how those addresses
//! map back to source lines. perf uses them (via `perf inject -j`) to
//! attribute samples in jitted code to function names and source locations
//! instead of raw addresses.
//!
//! The file contents are binary. The file starts with a file header. The
//! header is followed by a sequence of records. Each record starts with a
//! record header with the record type, the full size of the record, and a
//! timestamp. Consumers find record boundaries solely via the size field,
//! which lets them skip record types they don't know.
//!
//! The entry point is [`PerfJitDumpListener`]: hand it to your JIT engine
//! and notify it whenever an object is finalized. It resolves the dump
//! location (`$JITDUMPDIR`, else the home directory), writes
//! `jit-<pid>.dump` into a fresh per-process directory, and mmaps the file
//! so that perf discovers it. If any of that fails, the listener stays
//! disabled and notifications become no-ops; the JIT engine is never
//! affected.
//!
//! [jitdump]: https://raw.githubusercontent.com/torvalds/linux/master/tools/perf/Documentation/jitdump-specification.txt
//!
//! # Example
//!
//! ```no_run
//! use jitdump_writer::PerfJitDumpListener;
//!
//! let listener = PerfJitDumpListener::new();
//! if listener.is_active() {
//!     println!("writing jitdump data to {:?}", listener.dump_path().unwrap());
//! }
//! // On every finalized object, with `object: &dyn EmittedObject` and
//! // `debug_info: &dyn DebugInfoProvider` from your engine:
//! // listener.notify_object_emitted(object, debug_info);
//! ```

mod error;
mod header;
mod listener;
mod machine;
mod marker;
mod object;
mod record;
mod records;
mod session;
mod timestamp;

pub use error::Error;
pub use header::{JitDumpHeader, JITDUMP_FLAGS_ARCH_TIMESTAMP, JITDUMP_MAGIC, JITDUMP_VERSION};
pub use listener::PerfJitDumpListener;
pub use machine::elf_machine;
pub use marker::MmapMarker;
pub use object::{
    DebugInfoProvider, EmittedObject, LineEntry, SymbolError, SymbolInfo, SymbolKind,
};
pub use record::{JitDumpRecordHeader, JitDumpRecordType};
pub use records::{CodeLoadRecord, DebugInfoRecord, PERF_ELF_PREAMBLE_SIZE};
pub use session::{DumpSession, JITDUMP_DIR_ENV, JIT_LANG};
pub use timestamp::monotonic_timestamp;
