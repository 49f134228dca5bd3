use std::fs::File;
use std::io::Read;

use byteorder::{ByteOrder, NativeEndian};

use crate::error::Error;

/// `e_ident` (16 bytes) followed by `e_type: u16` and `e_machine: u16`.
const ELF_HEADER_PREFIX_LEN: usize = 20;
const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
const E_MACHINE_OFFSET: usize = 18;

/// Reads the ELF `e_machine` value of the running process's own executable.
///
/// The jitdump file header carries this value so that the consuming profiler
/// knows which architecture the recorded code bytes belong to. The running
/// executable necessarily matches the architecture of the code the process
/// jit-compiles, so `/proc/self/exe` is the authoritative source.
pub fn elf_machine() -> Result<u32, Error> {
    let mut file = File::open("/proc/self/exe").map_err(Error::OpenSelfExe)?;
    let mut header = [0; ELF_HEADER_PREFIX_LEN];
    file.read_exact(&mut header).map_err(Error::ReadElfHeader)?;
    parse_elf_machine(&header)
}

fn parse_elf_machine(header: &[u8; ELF_HEADER_PREFIX_LEN]) -> Result<u32, Error> {
    if header[..4] != ELF_MAGIC {
        let mut magic = [0; 4];
        magic.copy_from_slice(&header[..4]);
        return Err(Error::InvalidElfSignature(magic));
    }
    let e_machine = NativeEndian::read_u16(&header[E_MACHINE_OFFSET..]);
    Ok(e_machine as u32)
}
