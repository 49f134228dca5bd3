use std::io::{self, Write};

use byteorder::{NativeEndian, WriteBytesExt};

/// The file magic, "JiTD". Written as a `u32` in host endian; consumers use
/// the resulting byte order to detect the endianness of the file.
pub const JITDUMP_MAGIC: u32 = 0x4A69_5444;

/// The jitdump format version emitted by this crate.
pub const JITDUMP_VERSION: u32 = 1;

/// Header flag bit 0: set if the file uses an architecture-specific timestamp
/// clock source. This crate uses `CLOCK_MONOTONIC`, so the bit stays unset.
pub const JITDUMP_FLAGS_ARCH_TIMESTAMP: u64 = 1 << 0;

/// The jitdump file header. Written exactly once, at the very start of the
/// file, before any record.
#[derive(Debug, Clone)]
pub struct JitDumpHeader {
    /// Four bytes tagging the file type, [`JITDUMP_MAGIC`].
    pub magic: u32,
    /// The format version, [`JITDUMP_VERSION`].
    pub version: u32,
    /// The size in bytes of the file header, [`JitDumpHeader::SIZE`].
    pub total_size: u32,
    /// ELF architecture encoding (ELF e_machine value as specified in /usr/include/elf.h).
    pub elf_mach: u32,
    /// The process ID of the JIT runtime process.
    pub pid: u32,
    /// The timestamp of when the file was created.
    pub timestamp: u64,
    /// A bitmask of flags.
    pub flags: u64,
}

impl JitDumpHeader {
    pub const SIZE: usize = 40; // 40 bytes

    pub fn new(elf_mach: u32, pid: u32, timestamp: u64) -> Self {
        Self {
            magic: JITDUMP_MAGIC,
            version: JITDUMP_VERSION,
            total_size: Self::SIZE as u32,
            elf_mach,
            pid,
            timestamp,
            flags: 0,
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), io::Error> {
        writer.write_u32::<NativeEndian>(self.magic)?;
        writer.write_u32::<NativeEndian>(self.version)?;
        writer.write_u32::<NativeEndian>(self.total_size)?;
        writer.write_u32::<NativeEndian>(self.elf_mach)?;
        writer.write_u32::<NativeEndian>(0)?; // pad1, reserved
        writer.write_u32::<NativeEndian>(self.pid)?;
        writer.write_u64::<NativeEndian>(self.timestamp)?;
        writer.write_u64::<NativeEndian>(self.flags)?;
        Ok(())
    }
}
