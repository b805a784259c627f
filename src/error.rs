//! Error types for asset decoding and loading.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while inflating a zlib / DEFLATE stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InflateError {
    #[error("zlib stream is truncated")]
    UnexpectedEof,

    #[error("unsupported zlib compression method {0} (expected 8)")]
    UnknownCompressionMethod(u8),

    #[error("zlib window size exponent {0} exceeds 7")]
    WindowTooLarge(u8),

    #[error("zlib header checksum 0x{0:04X} is not a multiple of 31")]
    InvalidHeaderChecksum(u16),

    #[error("zlib preset dictionaries are not supported")]
    PresetDictionary,

    #[error("reserved DEFLATE block type 3")]
    ReservedBlockType,

    #[error("stored block length {len} does not match its complement {nlen}")]
    StoredLengthMismatch { len: u16, nlen: u16 },

    #[error("invalid Huffman code length table")]
    InvalidCodeLengths,

    #[error("bit pattern does not match any Huffman code")]
    InvalidSymbol,

    #[error("repeat code with no previous length")]
    RepeatWithoutPrevious,

    #[error("code length run overflows the declared alphabet size")]
    CodeLengthOverflow,

    #[error("back-reference distance {distance} exceeds the {available} bytes decoded so far")]
    DistanceTooFar { distance: usize, available: usize },

    #[error("Adler-32 mismatch: stream says 0x{expected:08X}, data hashes to 0x{actual:08X}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("inflated data exceeds the {0}-byte output limit")]
    OutputLimit(usize),
}

/// Structural problems in the PNG chunk stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    #[error("chunk stream ends inside a chunk frame")]
    Truncated,

    #[error("chunk declares a length of {0} bytes, above the 2^31-1 limit")]
    LengthTooLarge(u32),

    #[error("first chunk is {0}, expected IHDR")]
    IhdrNotFirst(String),

    #[error("duplicate {0} chunk")]
    Duplicate(String),

    #[error("IHDR must be 13 bytes, found {0}")]
    IhdrLength(usize),

    #[error("invalid IHDR field {field}: {value}")]
    InvalidHeaderField { field: &'static str, value: u32 },

    #[error("bit depth {bit_depth} is not allowed for colour type {color_type}")]
    DisallowedBitDepth { bit_depth: u8, color_type: u8 },

    #[error("unknown critical chunk {0}")]
    UnknownCritical(String),

    #[error("CRC mismatch in {chunk}: stored 0x{expected:08X}, computed 0x{actual:08X}")]
    CrcMismatch {
        chunk: String,
        expected: u32,
        actual: u32,
    },

    #[error("IDAT chunks are not consecutive")]
    NonConsecutiveIdat,

    #[error("no IDAT chunk before IEND")]
    MissingIdat,

    #[error("stream ended without an IEND chunk")]
    MissingIend,

    #[error("palette image without a PLTE chunk")]
    MissingPalette,

    #[error("invalid PLTE chunk of {0} bytes")]
    InvalidPalette(usize),
}

/// Everything that can go wrong turning PNG bytes into pixels.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not a PNG stream: signature mismatch")]
    Header,

    #[error("malformed chunk: {0}")]
    Chunk(#[from] ChunkError),

    #[error("image data too short: expected {expected} bytes, inflated {actual}")]
    Data { expected: usize, actual: usize },

    #[error("decompression failed: {0}")]
    Decompression(#[from] InflateError),

    #[error("invalid scanline filter type {filter} on row {row}")]
    Filter { filter: u8, row: usize },

    #[error("unsupported channel expansion: {from} -> {to} channels")]
    Channel { from: usize, to: usize },

    #[error("image needs {requested} bytes, above the {limit}-byte limit")]
    Memory { requested: u64, limit: u64 },

    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

/// Importer-level failures: file access plus whatever the decoder reports.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PNG decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{} contains no meshes", .0.display())]
    EmptyModel(PathBuf),
}

impl LoadError {
    /// Map an I/O error to `FileNotFound` or `FileRead`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound(path)
        } else {
            LoadError::FileRead { path, source }
        }
    }
}

/// Viewer configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Ear clipping could not finish.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriangulateError {
    #[error("a polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// No ear was found among the remaining vertices. `triangles` holds the
    /// ears emitted so far; `remaining` is the unclipped residue in ring order.
    #[error("degenerate polygon: no ear among {} remaining vertices", .remaining.len())]
    Degenerate {
        triangles: Vec<[usize; 3]>,
        remaining: Vec<usize>,
    },
}
