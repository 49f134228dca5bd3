//! Traits through which the JIT engine hands emitted objects to the listener.
//!
//! The listener does not enumerate symbols or extract debug info itself; it
//! consumes the output of the engine's object reader and debug-info context
//! through these traits.

/// The resolved kind of a symbol. Only [`SymbolKind::Function`] symbols
/// produce jitdump records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Data,
    Other,
}

/// Returned by a symbol accessor when the object reader could not resolve
/// the attribute. The listener skips such symbols individually and keeps
/// processing the rest of the object.
#[derive(thiserror::Error, Debug, Clone)]
#[error("could not resolve symbol {0}")]
pub struct SymbolError(pub &'static str);

/// One symbol of an emitted object, with its computed size.
///
/// Each attribute can fail to resolve independently, which mirrors what
/// object readers report per symbol.
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub kind: Result<SymbolKind, SymbolError>,
    pub name: Result<String, SymbolError>,
    pub address: Result<u64, SymbolError>,
    pub size: u64,
}

/// A finalized object image, as produced by the JIT engine.
pub trait EmittedObject {
    /// The object's symbols together with their computed sizes.
    fn symbols(&self) -> Vec<SymbolInfo>;
}

/// One source line entry of a function's line table.
///
/// Describes the range of code bytes from `address` to the next entry's
/// address, or to the end of the function for the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEntry {
    /// The start address of the range of code bytes which this entry describes.
    pub address: u64,
    /// The line number in the source file (1-based).
    pub line: u32,
    /// The column discriminator. Zero means "no column information".
    pub column: u32,
    /// The path of the source code file.
    pub file_path: String,
}

/// Debug-info extraction for an emitted object, typically backed by the
/// object's DWARF context.
pub trait DebugInfoProvider {
    /// The ordered line table for the given address range. Empty when the
    /// object carries no usable debug info for the range.
    fn line_table(&self, code_addr: u64, code_size: u64) -> Vec<LineEntry>;
}
