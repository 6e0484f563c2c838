//! Builds minimal NE font files in memory.

pub const NE_OFFSET: usize = 0x40;
pub const RESOURCE_TABLE_OFFSET: usize = 0x80;

pub struct GlyphSpec {
    pub width: u16,
    /// Column-major bitmap, `ceil(width / 8) * pix_height` bytes.
    pub bitmap: Vec<u8>,
}

impl GlyphSpec {
    pub fn new(width: u16, bitmap: &[u8]) -> Self {
        Self {
            width,
            bitmap: bitmap.to_vec(),
        }
    }
}

pub struct FontSpec {
    pub version: u16,
    pub copyright: &'static str,
    pub name: Option<&'static str>,
    pub first_char: u8,
    pub last_char: u8,
    pub pix_width: u16,
    pub pix_height: u16,
    pub avg_width: u16,
    pub points: u16,
    pub glyphs: Vec<GlyphSpec>,
}

impl FontSpec {
    pub fn new(first_char: u8, last_char: u8, pix_width: u16, pix_height: u16) -> Self {
        Self {
            version: 0x0200,
            copyright: "",
            name: None,
            first_char,
            last_char,
            pix_width,
            pix_height,
            avg_width: pix_width,
            points: 10,
            glyphs: Vec::new(),
        }
    }

    pub fn with_glyph(mut self, width: u16, bitmap: &[u8]) -> Self {
        self.glyphs.push(GlyphSpec::new(width, bitmap));
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let (table_start, entry_size) = if self.version == 0x0200 { (0x76, 4) } else { (0x94, 6) };
        let mut data = vec![0u8; table_start + entry_size * self.glyphs.len()];

        put_u16(&mut data, 0x00, self.version);
        let copyright = &mut data[0x06..0x42];
        copyright.fill(b' ');
        copyright[..self.copyright.len()].copy_from_slice(self.copyright.as_bytes());
        put_u16(&mut data, 0x44, self.points);
        put_u16(&mut data, 0x4A, self.pix_height);
        put_u16(&mut data, 0x53, 400);
        put_u16(&mut data, 0x56, self.pix_width);
        put_u16(&mut data, 0x58, self.pix_height);
        put_u16(&mut data, 0x5B, self.avg_width);
        put_u16(&mut data, 0x5D, self.pix_width);
        data[0x5F] = self.first_char;
        data[0x60] = self.last_char;
        data[0x61] = self.first_char;

        if let Some(name) = self.name {
            let pos = data.len();
            put_u16(&mut data, 0x69, pos as u16);
            data.extend_from_slice(name.as_bytes());
            data.push(0);
        }

        for (i, glyph) in self.glyphs.iter().enumerate() {
            let offset = data.len();
            let entry = table_start + entry_size * i;
            put_u16(&mut data, entry, glyph.width);
            if entry_size == 4 {
                put_u16(&mut data, entry + 2, offset as u16);
            } else {
                put_u32(&mut data, entry + 2, offset as u32);
            }
            data.extend_from_slice(&glyph.bitmap);
        }
        let len = data.len() as u32;
        put_u32(&mut data, 0x02, len);
        data
    }
}

/// An NE file with one table entry per resource, each in its own type group.
pub fn ne_file(resources: &[(u16, Vec<u8>)], shift: u16) -> Vec<u8> {
    let mut data = vec![0u8; RESOURCE_TABLE_OFFSET];
    data[0..2].copy_from_slice(b"MZ");
    put_u32(&mut data, 0x3C, NE_OFFSET as u32);
    data[NE_OFFSET..NE_OFFSET + 2].copy_from_slice(b"NE");
    put_u16(&mut data, NE_OFFSET + 0x24, (RESOURCE_TABLE_OFFSET - NE_OFFSET) as u16);

    let align = 1usize << shift;
    let table_len = 2 + resources.len() * (8 + 12) + 2;
    let mut pos = (RESOURCE_TABLE_OFFSET + table_len).next_multiple_of(align);

    data.extend_from_slice(&shift.to_le_bytes());
    let mut positions = Vec::new();
    for (resource_type, bytes) in resources {
        data.extend_from_slice(&resource_type.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&((pos >> shift) as u16).to_le_bytes());
        data.extend_from_slice(&(bytes.len().div_ceil(align) as u16).to_le_bytes());
        data.extend_from_slice(&[0; 8]);
        positions.push(pos);
        pos = (pos + bytes.len()).next_multiple_of(align);
    }
    data.extend_from_slice(&0u16.to_le_bytes());

    for ((_, bytes), position) in resources.iter().zip(positions) {
        data.resize(position, 0);
        data.extend_from_slice(bytes);
    }
    data
}

/// MZ header pointing to the given extended header signature.
pub fn stub_with_signature(signature: &[u8; 4]) -> Vec<u8> {
    let mut data = vec![0u8; 0x80];
    data[0..2].copy_from_slice(b"MZ");
    put_u32(&mut data, 0x3C, NE_OFFSET as u32);
    data[NE_OFFSET..NE_OFFSET + 4].copy_from_slice(signature);
    data
}

pub fn put_u16(data: &mut [u8], pos: usize, value: u16) {
    data[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(data: &mut [u8], pos: usize, value: u32) {
    data[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
}
