use std::io::{Read, Seek, SeekFrom};

use bstr::BString;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::{eof_as, read_region, CharTableLayout, FonError, FontHeader, GlyphAtlas, Result, RuneRange, FONT_HEADER_LEN, MAX_ATLAS_PIXELS};

/// Glyph metrics shared by all glyphs of a face, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FaceMetrics {
    pub advance: i32,
    pub width: i32,
    /// Inter-line height.
    pub height: i32,
    pub ascent: i32,
    pub descent: i32,
    /// Left side bearing, positive values move the glyph right of the dot.
    pub left: i32,
}

/// One entry of the character table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharTableEntry {
    pub width: u16,
    /// Relative to the start of the font resource.
    pub bitmap_offset: u32,
}

impl CharTableEntry {
    fn read<R: Read>(reader: &mut R, layout: CharTableLayout) -> Result<Self> {
        let width = reader.read_u16::<LittleEndian>().map_err(eof_as("character table"))?;
        let bitmap_offset = match layout {
            CharTableLayout::Compact => reader.read_u16::<LittleEndian>().map(u32::from),
            CharTableLayout::Extended => reader.read_u32::<LittleEndian>(),
        }
        .map_err(eof_as("character table"))?;
        Ok(Self { width, bitmap_offset })
    }
}

/// A font resource decoded into metadata, metrics and a glyph atlas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedFont {
    pub header: FontHeader,
    pub name: Option<BString>,
    pub metrics: FaceMetrics,
    pub atlas: GlyphAtlas,
    pub range: RuneRange,
}

impl DecodedFont {
    /// Decodes the font resource starting at the absolute position `resource_start`.
    ///
    /// # Errors
    ///
    /// Fails on a short header, an unterminated face name or a truncated
    /// character table or glyph bitmap.
    pub fn decode<R: Read + Seek>(reader: &mut R, resource_start: u64) -> Result<Self> {
        reader.seek(SeekFrom::Start(resource_start))?;
        let data = read_region(reader, FONT_HEADER_LEN, "font")?;
        let header = FontHeader::from_bytes(&data)?;

        let name = if header.bits_pointer > 0 {
            reader.seek(SeekFrom::Start(resource_start + header.bits_pointer as u64))?;
            Some(read_name(reader)?)
        } else {
            None
        };

        let layout = header.char_table_layout();
        let glyph_count = header.glyph_count()?;
        let width = header.pix_width as usize;
        let glyph_height = header.pix_height as usize;
        let pixel_count = width
            .checked_mul(glyph_height)
            .and_then(|cell| cell.checked_mul(glyph_count))
            .filter(|&len| len <= MAX_ATLAS_PIXELS);
        if pixel_count.is_none() {
            return Err(FonError::InvalidDimensions {
                width: header.pix_width,
                height: header.pix_height,
                glyphs: glyph_count,
            });
        }
        log::debug!(
            "Font {:?} at {resource_start:#X}: version {:#06X}, {}x{}, chars {:#04X}..={:#04X}",
            name.as_ref().map(ToString::to_string).unwrap_or_default(),
            header.version,
            header.pix_width,
            header.pix_height,
            header.first_char,
            header.last_char
        );

        let mut atlas = GlyphAtlas::new(width, glyph_height, glyph_count);
        for glyph in 0..glyph_count {
            reader.seek(SeekFrom::Start(resource_start + layout.entry_offset(glyph)))?;
            let entry = CharTableEntry::read(reader, layout)?;
            log::trace!("Glyph {glyph}: width {}, bitmap at {:#X}", entry.width, entry.bitmap_offset);
            if entry.width == 0 {
                continue;
            }
            if entry.width > header.pix_width {
                log::warn!("Glyph {glyph} is {} pixels wide, face width is {}", entry.width, header.pix_width);
            }

            reader.seek(SeekFrom::Start(resource_start + entry.bitmap_offset as u64))?;
            let bitmap = read_bitmap(reader, (entry.width as usize).div_ceil(8) * glyph_height)?;
            atlas.unpack_glyph(glyph, entry.width as usize, &bitmap);
        }

        let metrics = FaceMetrics {
            advance: header.avg_width as i32,
            width: header.pix_width as i32,
            height: header.pix_height as i32,
            ascent: header.pix_height as i32,
            descent: 0,
            left: 0,
        };
        let range = RuneRange {
            low: char::from(header.first_char),
            high: char::from(header.last_char),
            offset: 0,
        };

        Ok(Self {
            header,
            name,
            metrics,
            atlas,
            range,
        })
    }

    pub fn name(&self) -> Option<&BString> {
        self.name.as_ref()
    }

    pub fn copyright(&self) -> &BString {
        &self.header.copyright
    }

    /// The atlas cell for `ch`, `None` if the font doesn't cover it.
    pub fn glyph(&self, ch: char) -> Option<&[u8]> {
        self.range.glyph_index(ch).and_then(|index| self.atlas.glyph(index))
    }
}

/// Reads `len` bitmap bytes, growing the buffer only as far as the data reaches.
fn read_bitmap<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut bitmap = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bitmap)?;
    if bitmap.len() != len {
        return Err(FonError::UnexpectedEof("glyph bitmap"));
    }
    Ok(bitmap)
}

fn read_name<R: Read>(reader: &mut R) -> Result<BString> {
    let mut name = Vec::new();
    loop {
        match reader.read_u8().map_err(eof_as("font name"))? {
            0 => break,
            b => name.push(b),
        }
    }
    Ok(BString::from(name))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_read_name() {
        let mut reader = Cursor::new(b"Terminal\0Fixedsys\0".to_vec());
        assert_eq!(read_name(&mut reader).unwrap(), BString::from("Terminal"));
        assert_eq!(read_name(&mut reader).unwrap(), BString::from("Fixedsys"));
        assert!(matches!(read_name(&mut reader), Err(FonError::UnexpectedEof("font name"))));
    }

    #[test]
    fn test_read_unterminated_name() {
        let mut reader = Cursor::new(b"System".to_vec());
        assert!(matches!(read_name(&mut reader), Err(FonError::UnexpectedEof(_))));
    }

    #[test]
    fn test_read_bitmap() {
        let mut reader = Cursor::new(vec![0x18, 0x3C, 0x66]);
        assert_eq!(read_bitmap(&mut reader, 2).unwrap(), vec![0x18, 0x3C]);
        assert!(matches!(read_bitmap(&mut reader, 2), Err(FonError::UnexpectedEof("glyph bitmap"))));

        // a corrupt width must not size the buffer up front
        let mut reader = Cursor::new(vec![0xFF; 8]);
        assert!(matches!(
            read_bitmap(&mut reader, 0xFFFF_usize.div_ceil(8) * 0xFFFF),
            Err(FonError::UnexpectedEof("glyph bitmap"))
        ));
    }

    #[test]
    fn test_char_table_entry() {
        let mut reader = Cursor::new(vec![0x08, 0x00, 0x34, 0x12, 0x06, 0x00, 0x78, 0x56, 0x34, 0x12]);
        let compact = CharTableEntry::read(&mut reader, CharTableLayout::Compact).unwrap();
        assert_eq!(compact, CharTableEntry { width: 8, bitmap_offset: 0x1234 });

        let extended = CharTableEntry::read(&mut reader, CharTableLayout::Extended).unwrap();
        assert_eq!(
            extended,
            CharTableEntry {
                width: 6,
                bitmap_offset: 0x1234_5678
            }
        );

        assert!(matches!(
            CharTableEntry::read(&mut reader, CharTableLayout::Compact),
            Err(FonError::UnexpectedEof("character table"))
        ));
    }
}
