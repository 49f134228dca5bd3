use std::io;
use std::path::PathBuf;

/// The error type used in this crate.
///
/// All of these can only occur while a [`PerfJitDumpListener`](crate::PerfJitDumpListener)
/// initializes. They are reported via [`log`] and leave the listener disabled;
/// they are never propagated to the JIT engine.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The kernel does not support CLOCK_MONOTONIC")]
    MonotonicClockUnavailable,

    #[error("Could not create jit dump directory {0}: {1}")]
    CreateDumpDirectory(PathBuf, #[source] io::Error),

    #[error("Could not create a unique jit dump directory under {0}")]
    UniqueDumpDirectory(PathBuf),

    #[error("Could not open jit dump file {0}: {1}")]
    OpenDumpFile(PathBuf, #[source] io::Error),

    #[error("Could not open /proc/self/exe: {0}")]
    OpenSelfExe(#[source] io::Error),

    #[error("Could not read the ELF header of /proc/self/exe: {0}")]
    ReadElfHeader(#[source] io::Error),

    #[error("The executable does not have a valid ELF signature, got magic bytes: {:02x} {:02x} {:02x} {:02x}", .0[0], .0[1], .0[2], .0[3])]
    InvalidElfSignature([u8; 4]),

    #[error("Could not mmap the jit dump marker page: {0}")]
    MarkerMmap(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
