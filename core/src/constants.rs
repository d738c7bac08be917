/// Binary (IEC) size units, powers of 1024.
pub const BYTE: usize = 1;
pub const KIBIBYTE: usize = BYTE * 1024;
pub const MEBIBYTE: usize = KIBIBYTE * 1024;
pub const GIBIBYTE: usize = MEBIBYTE * 1024;
pub const TEBIBYTE: u64 = GIBIBYTE as u64 * 1024;
pub const PEBIBYTE: u64 = TEBIBYTE * 1024;

pub const KIB: usize = KIBIBYTE;
pub const MIB: usize = MEBIBYTE;
pub const GIB: usize = GIBIBYTE;
pub const TIB: u64 = TEBIBYTE;
pub const PIB: u64 = PEBIBYTE;

/// Frame delimiter of the newline format and of the chunker.
pub const NEWLINE: u8 = b'\n';

/// Defaults when a config field is left out
pub const DEFAULT_MAX_LINE_LEN: usize = MIB;
pub const DEFAULT_BUFFER_SIZE: usize = 4 * KIB;
pub const DEFAULT_CHUNK_SIZE: usize = 64 * KIB;

/// Largest accepted chunk size; each chunk read allocates a window this big.
pub const MAX_CHUNK_SIZE: usize = GIB;

/// Initial capacity of the length-prefixed reader's scratch buffer.
pub const VARLEN_READER_BUFFER_SIZE: usize = 256;

/// Longest uvarint encoding of a u64.
pub const MAX_VARINT_LEN64: usize = 10;
