use std::io::{self, Write};

use byteorder::{NativeEndian, WriteBytesExt};

use crate::object::LineEntry;
use crate::record::{JitDumpRecordHeader, JitDumpRecordType};

/// The fixed offset added to every debug entry address before it is written.
///
/// perf reconstructs each jitted function as a small in-memory ELF image and
/// prepends an ELF header to the code bytes, so the addresses it resolves
/// against are shifted by the size of that header. Without this adjustment
/// the line lookups come out wrong. The value depends on the header layout
/// the consuming perf version synthesizes; 0x40 matches a 64-bit ELF header.
pub const PERF_ELF_PREAMBLE_SIZE: u64 = 0x40;

/// A `JIT_CODE_LOAD` record, announcing that an address range now contains
/// code for a named function.
///
/// The fixed fields are followed by the null-terminated function name and
/// then the raw code bytes.
#[derive(Debug, Clone)]
pub struct CodeLoadRecord<'a> {
    /// The process ID of the runtime generating the jitted code.
    pub pid: u32,
    /// The thread ID of the runtime thread generating the jitted code.
    pub tid: u32,
    /// The code start address for the jitted code.
    pub code_addr: u64,
    /// A unique, strictly increasing identifier for this piece of jitted
    /// code. Code emitted at a reused address still gets a fresh index.
    pub code_index: u64,
    /// The function name, without a null terminator.
    pub function_name: &'a str,
    /// The jitted code bytes.
    pub code_bytes: &'a [u8],
}

impl CodeLoadRecord<'_> {
    /// Record size up to and excluding the variable-length tail.
    pub const FIXED_SIZE: usize = JitDumpRecordHeader::SIZE + 4 + 4 + 8 + 8 + 8 + 8;

    /// The total record size: fixed fields, name with null terminator, code.
    pub fn total_size(&self) -> u32 {
        (Self::FIXED_SIZE + self.function_name.len() + 1 + self.code_bytes.len()) as u32
    }

    pub fn write<W: Write>(&self, writer: &mut W, timestamp: u64) -> Result<(), io::Error> {
        let prefix = JitDumpRecordHeader {
            record_type: JitDumpRecordType::JIT_CODE_LOAD,
            total_size: self.total_size(),
            timestamp,
        };
        prefix.write(writer)?;
        writer.write_u32::<NativeEndian>(self.pid)?;
        writer.write_u32::<NativeEndian>(self.tid)?;
        writer.write_u64::<NativeEndian>(0)?; // vma, unused
        writer.write_u64::<NativeEndian>(self.code_addr)?;
        writer.write_u64::<NativeEndian>(self.code_bytes.len() as u64)?;
        writer.write_u64::<NativeEndian>(self.code_index)?;
        writer.write_all(self.function_name.as_bytes())?;
        writer.write_all(&[0])?;
        writer.write_all(self.code_bytes)?;
        Ok(())
    }
}

/// A `JIT_CODE_DEBUG_INFO` record, mapping a function's address range to
/// source file/line/column entries.
///
/// Must be written immediately before the [`CodeLoadRecord`] for the same
/// function; the consuming profiler associates a debug info record with the
/// next code load record it encounters.
#[derive(Debug, Clone)]
pub struct DebugInfoRecord<'a> {
    /// The address of the code bytes of the function which this debug
    /// information describes.
    pub code_addr: u64,
    /// The line entries, ordered by address.
    pub entries: &'a [LineEntry],
}

impl DebugInfoRecord<'_> {
    /// Record size up to and excluding the entries.
    pub const FIXED_SIZE: usize = JitDumpRecordHeader::SIZE + 8 + 8;

    /// Entry size up to and excluding the null-terminated file path.
    pub const ENTRY_FIXED_SIZE: usize = 8 + 4 + 4;

    /// The total record size: fixed fields plus, per entry, the fixed entry
    /// fields and the file path with null terminator.
    pub fn total_size(&self) -> u32 {
        let entries_size: usize = self
            .entries
            .iter()
            .map(|entry| Self::ENTRY_FIXED_SIZE + entry.file_path.len() + 1)
            .sum();
        (Self::FIXED_SIZE + entries_size) as u32
    }

    pub fn write<W: Write>(&self, writer: &mut W, timestamp: u64) -> Result<(), io::Error> {
        let prefix = JitDumpRecordHeader {
            record_type: JitDumpRecordType::JIT_CODE_DEBUG_INFO,
            total_size: self.total_size(),
            timestamp,
        };
        prefix.write(writer)?;
        writer.write_u64::<NativeEndian>(self.code_addr)?;
        writer.write_u64::<NativeEndian>(self.entries.len() as u64)?;
        for entry in self.entries {
            writer.write_u64::<NativeEndian>(entry.address + PERF_ELF_PREAMBLE_SIZE)?;
            writer.write_u32::<NativeEndian>(entry.line)?;
            writer.write_u32::<NativeEndian>(entry.column)?;
            writer.write_all(entry.file_path.as_bytes())?;
            writer.write_all(&[0])?;
        }
        Ok(())
    }
}
