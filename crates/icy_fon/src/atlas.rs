//! Alpha mask holding all glyphs of a font stacked vertically.

/// Pixel value for set bits.
pub const INK: u8 = 0xFF;
pub const TRANSPARENT: u8 = 0x00;

/// Upper bound for the number of atlas pixels, 64 MiB.
pub const MAX_ATLAS_PIXELS: usize = 64 * 1024 * 1024;

/// One byte per pixel, glyph `i` occupies rows `i * glyph_height..(i + 1) * glyph_height`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphAtlas {
    width: usize,
    glyph_height: usize,
    glyph_count: usize,
    pixels: Vec<u8>,
}

impl GlyphAtlas {
    /// Allocates a fully transparent atlas.
    pub fn new(width: usize, glyph_height: usize, glyph_count: usize) -> Self {
        Self {
            width,
            glyph_height,
            glyph_count,
            pixels: vec![TRANSPARENT; width * glyph_height * glyph_count],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.glyph_height * self.glyph_count
    }

    pub fn glyph_height(&self) -> usize {
        self.glyph_height
    }

    pub fn glyph_count(&self) -> usize {
        self.glyph_count
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Buffer index of pixel `(column, row)` inside glyph `glyph`.
    #[inline]
    pub fn offset(&self, column: usize, row: usize, glyph: usize) -> usize {
        (glyph * self.glyph_height + row) * self.width + column
    }

    /// Pixel at `(x, y)` in atlas coordinates.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height() {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// The rows of one glyph cell.
    pub fn glyph(&self, index: usize) -> Option<&[u8]> {
        if index >= self.glyph_count {
            return None;
        }
        let start = self.offset(0, 0, index);
        Some(&self.pixels[start..start + self.width * self.glyph_height])
    }

    /// Unpacks a glyph bitmap into cell `glyph`.
    ///
    /// `data` holds `ceil(glyph_width / 8)` columns of `glyph_height` bytes each,
    /// column after column. Bits are read MSB first; bits that fall beyond the
    /// atlas width are padding and never written.
    pub(crate) fn unpack_glyph(&mut self, glyph: usize, glyph_width: usize, data: &[u8]) {
        let columns = glyph_width.div_ceil(8);
        debug_assert!(data.len() >= columns * self.glyph_height);

        for column in 0..columns {
            for row in 0..self.glyph_height {
                let mut b = data[column * self.glyph_height + row];
                for bit in 0..8 {
                    let x = column * 8 + bit;
                    if x >= self.width {
                        break;
                    }
                    let offset = self.offset(x, row, glyph);
                    self.pixels[offset] = if b & 0x80 != 0 { INK } else { TRANSPARENT };
                    b <<= 1;
                }
            }
        }
    }
}

/// Maps the characters `low..=high` onto consecutive atlas cells starting at `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuneRange {
    pub low: char,
    pub high: char,
    pub offset: usize,
}

impl RuneRange {
    pub fn contains(&self, ch: char) -> bool {
        (self.low..=self.high).contains(&ch)
    }

    pub fn glyph_index(&self, ch: char) -> Option<usize> {
        if !self.contains(ch) {
            return None;
        }
        Some(self.offset + (ch as usize - self.low as usize))
    }
}
