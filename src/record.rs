use std::io::{self, Write};

use byteorder::{NativeEndian, WriteBytesExt};

/// The record type of a jitdump record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JitDumpRecordType(pub u32);

impl JitDumpRecordType {
    pub const JIT_CODE_LOAD: Self = Self(0);
    /// Defined by the protocol but never emitted; jitted code is not moved.
    pub const JIT_CODE_MOVE: Self = Self(1);
    pub const JIT_CODE_DEBUG_INFO: Self = Self(2);
    /// Defined by the protocol but never emitted.
    pub const JIT_CODE_CLOSE: Self = Self(3);
    /// Defined by the protocol but never emitted.
    pub const JIT_CODE_UNWINDING_INFO: Self = Self(4);
}

/// The prefix at the start of every jitdump record.
///
/// `total_size` must equal the exact byte count of the whole record,
/// including this prefix and all variable-length trailing data. Consumers
/// rely on it to find record boundaries and to skip unknown record types.
#[derive(Debug, Clone)]
pub struct JitDumpRecordHeader {
    /// The record type.
    pub record_type: JitDumpRecordType,
    /// The size in bytes of the record including this header.
    pub total_size: u32,
    /// A timestamp of when the record was created.
    pub timestamp: u64,
}

impl JitDumpRecordHeader {
    pub const SIZE: usize = 16; // 16 bytes

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), io::Error> {
        writer.write_u32::<NativeEndian>(self.record_type.0)?;
        writer.write_u32::<NativeEndian>(self.total_size)?;
        writer.write_u64::<NativeEndian>(self.timestamp)?;
        Ok(())
    }
}
