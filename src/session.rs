use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::header::JitDumpHeader;
use crate::timestamp::monotonic_timestamp;

/// Language identifier embedded in the dump directory name.
pub const JIT_LANG: &str = "llvm-IR";

/// Environment variable overriding the base directory for all dump output.
pub const JITDUMP_DIR_ENV: &str = "JITDUMPDIR";

const DIR_CREATE_ATTEMPTS: u32 = 128;

/// The per-process dump output: the resolved dump file path, the open file,
/// and the code generation counter.
///
/// Dump files live at
/// `<base>/.debug/jit/<lang>-jit-<YYYYMMDD>-<suffix>/jit-<pid>.dump`, where
/// `<base>` is the [`JITDUMP_DIR_ENV`] override if set, else the user's home
/// directory, else the current directory. The `<suffix>` makes the directory
/// unique even across concurrent processes started on the same day.
#[derive(Debug)]
pub struct DumpSession {
    pid: u32,
    path: PathBuf,
    file: BufWriter<File>,
    code_generation: u64,
}

impl DumpSession {
    /// Resolves the output directory, creates it, and opens the dump file.
    pub fn create(pid: u32) -> Result<Self, Error> {
        Self::create_in(&resolve_base_dir(), pid)
    }

    /// Like [`DumpSession::create`], but with an explicit base directory.
    pub fn create_in(base: &Path, pid: u32) -> Result<Self, Error> {
        let jit_dir = base.join(".debug").join("jit");
        fs::create_dir_all(&jit_dir).map_err(|e| Error::CreateDumpDirectory(jit_dir.clone(), e))?;
        let dump_dir = create_unique_dump_dir(&jit_dir)?;
        let path = dump_dir.join(format!("jit-{pid}.dump"));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o666)
            .open(&path)
            .map_err(|e| Error::OpenDumpFile(path.clone(), e))?;
        Ok(Self {
            pid,
            path,
            file: BufWriter::new(file),
            code_generation: 1,
        })
    }

    /// The path of the dump file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open dump file. Used to mmap the visibility marker.
    pub fn file(&self) -> &File {
        self.file.get_ref()
    }

    /// Returns the next code index and advances the counter.
    ///
    /// Indices start at 1 and strictly increase for the lifetime of the
    /// session, so every emitted function gets a unique identifier even when
    /// code addresses are reused.
    pub fn next_code_index(&mut self) -> u64 {
        let index = self.code_generation;
        self.code_generation += 1;
        index
    }

    /// Writes the file header. Must be called once, before any record.
    pub fn write_header(&mut self, elf_mach: u32) -> Result<(), io::Error> {
        let header = JitDumpHeader::new(elf_mach, self.pid, monotonic_timestamp());
        header.write(self)
    }
}

impl Write for DumpSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn resolve_base_dir() -> PathBuf {
    if let Some(dir) = env::var_os(JITDUMP_DIR_ENV) {
        return dir.into();
    }
    if let Some(home) = env::var_os("HOME") {
        return home.into();
    }
    PathBuf::from(".")
}

/// Creates `<lang>-jit-<YYYYMMDD>-<suffix>` under `jit_dir` with a random
/// suffix. `create_dir` is atomic, so retrying on `AlreadyExists` is safe
/// against concurrent processes picking the same name.
fn create_unique_dump_dir(jit_dir: &Path) -> Result<PathBuf, Error> {
    let date = chrono::Local::now().format("%Y%m%d");
    for _ in 0..DIR_CREATE_ATTEMPTS {
        let suffix = rand::random::<u32>() & 0xff_ffff;
        let candidate = jit_dir.join(format!("{JIT_LANG}-jit-{date}-{suffix:06x}"));
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(Error::CreateDumpDirectory(candidate, e)),
        }
    }
    Err(Error::UniqueDumpDirectory(jit_dir.to_owned()))
}
