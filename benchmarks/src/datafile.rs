use std::{fmt, io::{self, Read, Write}, slice};

/**
 * Binary format for fast reading of sets, with basic checks to avoid misuse.
 *
 * Header
 * - 24-bit magic: E9, AA, 05
 * - 8-bit flags:
 *      LSB is 1 if datafile was written in little endian, 0 otherwise.
 * - u32 set count
 *
 * Data
 * - array of set `length`s, each u32
 * - array of sets of `length` items, where each element is a u32.
 */

const MAGIC: [u8; 3] = [0xe9, 0xaa, 0x05];
const LITTLE_ENDIAN_BIT: u8 = 1;

const MIN_SET_COUNT: u32 = 2;
const MAX_SET_COUNT: u32 = 256;

pub type DatafileSet = Vec<u32>;

#[derive(Debug)]
pub enum ReadError {
    Io(io::Error),
    BadMagic,
    BadEndianness,
    BadSetCount(u32),
}

#[derive(Debug)]
pub enum WriteError {
    Io(io::Error),
    BadSetCount(u32),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(e) => write!(f, "{}", e),
            ReadError::BadMagic => write!(f, "bad magic"),
            ReadError::BadEndianness => {
                let expected = if little_endian() {
                    "little endian"
                } else {
                    "big endian"
                };
                write!(f, "bad endianness - system is {}", expected)
            },
            ReadError::BadSetCount(c) => write!(f, "bad set count {}", c),
        }
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Io(e) => write!(f, "{}", e),
            WriteError::BadSetCount(c) => write!(f, "bad set count {}", c),
        }
    }
}

impl std::error::Error for ReadError {}
impl std::error::Error for WriteError {}

pub fn from_reader(mut reader: impl Read) -> Result<Vec<DatafileSet>, ReadError> {
    // Unbuffered reads straight into the sets.
    let mut header: [u8; 8] = [0; 8];
    reader.read_exact(&mut header)
        .map_err(ReadError::Io)?;

    if header[0..3] != MAGIC {
        return Err(ReadError::BadMagic);
    }
    let le_bit_set = (header[3] & LITTLE_ENDIAN_BIT) != 0;
    if le_bit_set != little_endian() {
        return Err(ReadError::BadEndianness);
    }

    let set_count = u32::from_ne_bytes([header[4], header[5], header[6], header[7]]);
    if !(MIN_SET_COUNT..=MAX_SET_COUNT).contains(&set_count) {
        return Err(ReadError::BadSetCount(set_count));
    }

    let mut lengths: Vec<u32> = vec![0; set_count as usize];
    reader.read_exact(as_bytes_mut(&mut lengths))
        .map_err(ReadError::Io)?;

    let mut results: Vec<DatafileSet> = Vec::with_capacity(set_count as usize);
    for length in lengths {
        let mut result = vec![0; length as usize];
        reader.read_exact(as_bytes_mut(&mut result))
            .map_err(ReadError::Io)?;

        results.push(result);
    }

    Ok(results)
}

pub fn to_writer(mut writer: impl Write, sets: &[DatafileSet]) -> Result<(), WriteError> {
    let set_count = sets.len() as u32;
    if !(MIN_SET_COUNT..=MAX_SET_COUNT).contains(&set_count) {
        return Err(WriteError::BadSetCount(set_count));
    }

    let le_bit_set = if little_endian() { LITTLE_ENDIAN_BIT } else { 0 };
    let count = set_count.to_ne_bytes();

    let header: [u8; 8] = [
        MAGIC[0], MAGIC[1], MAGIC[2], le_bit_set,
        count[0], count[1], count[2], count[3]
    ];

    writer.write_all(&header)
        .map_err(WriteError::Io)?;

    let lengths: Vec<u32> = sets.iter()
        .map(|s| s.len() as u32).collect();

    writer.write_all(as_bytes(&lengths))
        .map_err(WriteError::Io)?;

    for set in sets {
        writer.write_all(as_bytes(set))
            .map_err(WriteError::Io)?;
    }
    Ok(())
}

fn as_bytes(items: &[u32]) -> &[u8] {
    unsafe { slice::from_raw_parts(
        items.as_ptr() as *const u8,
        std::mem::size_of_val(items)
    )}
}

fn as_bytes_mut(items: &mut [u32]) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(
        items.as_mut_ptr() as *mut u8,
        std::mem::size_of_val(items)
    )}
}

#[cfg(target_endian = "little")]
const fn little_endian() -> bool {
    true
}

#[cfg(not(target_endian = "little"))]
const fn little_endian() -> bool {
    false
}
