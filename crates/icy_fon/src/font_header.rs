//! The fixed-layout header at the start of every font resource.
//!
//! All multi byte values are little endian. Offsets stored in the header are
//! relative to the start of the font resource.

use std::io::{Cursor, Read};

use bstr::BString;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::{FonError, Result};

pub const FONT_HEADER_LEN: usize = 0x76;
const COPYRIGHT_LEN: usize = 60;

/// Font version using the compact character table.
pub const FONT_VERSION_2: u16 = 0x0200;

/// Shape of the per glyph character table, selected by the font version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharTableLayout {
    /// Version 0x200: u16 width, u16 offset. Table starts right after the header.
    Compact,
    /// Every other version: u16 width, u32 offset. Table starts at 0x94.
    Extended,
}

impl CharTableLayout {
    pub fn for_version(version: u16) -> Self {
        if version == FONT_VERSION_2 {
            CharTableLayout::Compact
        } else {
            CharTableLayout::Extended
        }
    }

    /// Start of the table relative to the resource.
    pub fn table_start(self) -> u64 {
        match self {
            CharTableLayout::Compact => 0x76,
            CharTableLayout::Extended => 0x94,
        }
    }

    pub fn entry_size(self) -> u64 {
        match self {
            CharTableLayout::Compact => 4,
            CharTableLayout::Extended => 6,
        }
    }

    /// Position of the entry for `glyph` relative to the resource.
    pub fn entry_offset(self, glyph: usize) -> u64 {
        self.table_start() + self.entry_size() * glyph as u64
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontHeader {
    pub version: u16,
    pub size: u32,
    /// Copyright notice with the space padding removed.
    pub copyright: BString,
    pub font_type: u16,
    pub points: u16,
    pub vert_res: u16,
    pub horiz_res: u16,
    pub ascent: u16,
    pub internal_leading: u16,
    pub external_leading: u16,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub weight: u16,
    pub char_set: u8,
    pub pix_width: u16,
    pub pix_height: u16,
    pub pitch_and_family: u8,
    pub avg_width: u16,
    pub max_width: u16,
    pub first_char: u8,
    pub last_char: u8,
    pub default_char: u8,
    pub break_char: u8,
    pub width_bytes: u16,
    pub device: u16,
    pub face_data: u16,
    /// Offset of the NUL terminated face name, 0 if the font has none.
    pub bits_pointer: u16,
    pub bits_offset: u16,
    pub reserved: u8,
}

impl FontHeader {
    /// Parses the header from the first [`FONT_HEADER_LEN`] bytes of a font resource.
    ///
    /// # Errors
    ///
    /// Fails with [`FonError::HeaderTooShort`] if `data` is shorter than the header.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < FONT_HEADER_LEN {
            return Err(FonError::HeaderTooShort {
                region: "font",
                expected: FONT_HEADER_LEN,
                actual: data.len(),
            });
        }
        let mut br = Cursor::new(data);

        let version = br.read_u16::<LittleEndian>()?;
        let size = br.read_u32::<LittleEndian>()?;
        let mut copyright = [0u8; COPYRIGHT_LEN];
        br.read_exact(&mut copyright)?;

        Ok(Self {
            version,
            size,
            copyright: trim_spaces(&copyright),
            font_type: br.read_u16::<LittleEndian>()?,
            points: br.read_u16::<LittleEndian>()?,
            vert_res: br.read_u16::<LittleEndian>()?,
            horiz_res: br.read_u16::<LittleEndian>()?,
            ascent: br.read_u16::<LittleEndian>()?,
            internal_leading: br.read_u16::<LittleEndian>()?,
            external_leading: br.read_u16::<LittleEndian>()?,
            italic: br.read_u8()? != 0,
            underline: br.read_u8()? != 0,
            strike_out: br.read_u8()? != 0,
            weight: br.read_u16::<LittleEndian>()?,
            char_set: br.read_u8()?,
            pix_width: br.read_u16::<LittleEndian>()?,
            pix_height: br.read_u16::<LittleEndian>()?,
            pitch_and_family: br.read_u8()?,
            avg_width: br.read_u16::<LittleEndian>()?,
            max_width: br.read_u16::<LittleEndian>()?,
            first_char: br.read_u8()?,
            last_char: br.read_u8()?,
            default_char: br.read_u8()?,
            break_char: br.read_u8()?,
            width_bytes: br.read_u16::<LittleEndian>()?,
            device: br.read_u16::<LittleEndian>()?,
            face_data: br.read_u16::<LittleEndian>()?,
            bits_pointer: br.read_u16::<LittleEndian>()?,
            bits_offset: br.read_u16::<LittleEndian>()?,
            reserved: br.read_u8()?,
        })
    }

    pub fn char_table_layout(&self) -> CharTableLayout {
        CharTableLayout::for_version(self.version)
    }

    /// Number of glyphs in `first_char..=last_char`.
    ///
    /// # Errors
    ///
    /// Fails with [`FonError::InvalidCharRange`] if the range is reversed.
    pub fn glyph_count(&self) -> Result<usize> {
        if self.last_char < self.first_char {
            return Err(FonError::InvalidCharRange {
                first: self.first_char,
                last: self.last_char,
            });
        }
        Ok((self.last_char - self.first_char) as usize + 1)
    }
}

/// Strips leading and trailing spaces. Other whitespace is kept.
pub(crate) fn trim_spaces(data: &[u8]) -> BString {
    let start = data.iter().position(|&b| b != b' ').unwrap_or(data.len());
    let end = data.iter().rposition(|&b| b != b' ').map_or(start, |i| i + 1);
    BString::from(&data[start..end])
}
