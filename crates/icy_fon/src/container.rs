//! MZ/NE container parsing.
//!
//! Only the parts of the New Executable header needed to reach the resource
//! table are read. PE images are identified and rejected.
//!
//! NE resource table layout:
//! - u16 alignment shift
//! - type groups: u16 type id (0 ends the table), u16 count, 4 reserved bytes,
//!   followed by `count` entries of 12 bytes (u16 start, u16 size, flags, id, reserved)

use std::{
    fmt,
    io::{Cursor, Read, Seek, SeekFrom},
};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{eof_as, read_region, FonError, Result};

pub const MZ_HEADER_LEN: usize = 64;

/// "MZ"
pub const MZ_SIGNATURE: u16 = 0x5A4D;

/// Offset of the NE/COFF header pointer inside the MZ header.
const NE_HEADER_POINTER: u64 = 0x3C;

/// Offset of the resource table pointer inside the NE header.
const NE_RESOURCE_TABLE_POINTER: u64 = 0x24;

/// Largest alignment shift accepted. Shifted values are kept in 32 bits.
pub const MAX_ALIGNMENT_SHIFT: u16 = 15;

/// RT_FONT with the integer id flag set.
pub const FONT_RESOURCE_TYPE: u16 = 0x8008;

/// RT_FONTDIR with the integer id flag set.
pub const FONT_DIR_RESOURCE_TYPE: u16 = 0x8007;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Other,
    Pe,
    Ne,
}

impl ContainerFormat {
    /// Identifies the format from the first 4 bytes of the extended header.
    pub fn identify(preamble: &[u8; 4]) -> Self {
        if &preamble[0..2] == b"NE" {
            ContainerFormat::Ne
        } else if preamble == b"PE\0\0" {
            ContainerFormat::Pe
        } else {
            ContainerFormat::Other
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFormat::Other => write!(f, "unknown"),
            ContainerFormat::Pe => write!(f, "PE"),
            ContainerFormat::Ne => write!(f, "NE"),
        }
    }
}

/// One entry of the NE resource table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Absolute byte position in the file.
    pub offset: u32,
    pub size: u32,
    pub resource_type: u16,
}

/// The DOS header every 16-bit Windows executable starts with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MzHeader {
    pub signature: u16,
    pub bytes_in_last_block: u16,
    pub blocks_in_file: u16,
    pub num_relocs: u16,
    pub header_paragraphs: u16,
    pub min_extra_paragraphs: u16,
    pub max_extra_paragraphs: u16,
    pub ss: u16,
    pub sp: u16,
    pub checksum: u16,
    pub ip: u16,
    pub cs: u16,
    pub reloc_table_offset: u16,
    pub overlay_number: u16,
    /// Absolute offset of the NE (or PE) header.
    pub coff_header_offset: u32,
}

impl MzHeader {
    /// Parses the 64 byte MZ header.
    ///
    /// # Errors
    ///
    /// Fails with [`FonError::NotAnExecutable`] if the signature isn't "MZ".
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < MZ_HEADER_LEN {
            return Err(FonError::HeaderTooShort {
                region: "MZ",
                expected: MZ_HEADER_LEN,
                actual: data.len(),
            });
        }
        let mut br = Cursor::new(data);
        let signature = br.read_u16::<LittleEndian>()?;
        if signature != MZ_SIGNATURE {
            return Err(FonError::NotAnExecutable { signature });
        }

        let mut header = MzHeader {
            signature,
            bytes_in_last_block: br.read_u16::<LittleEndian>()?,
            blocks_in_file: br.read_u16::<LittleEndian>()?,
            num_relocs: br.read_u16::<LittleEndian>()?,
            header_paragraphs: br.read_u16::<LittleEndian>()?,
            min_extra_paragraphs: br.read_u16::<LittleEndian>()?,
            max_extra_paragraphs: br.read_u16::<LittleEndian>()?,
            ss: br.read_u16::<LittleEndian>()?,
            sp: br.read_u16::<LittleEndian>()?,
            checksum: br.read_u16::<LittleEndian>()?,
            ip: br.read_u16::<LittleEndian>()?,
            cs: br.read_u16::<LittleEndian>()?,
            reloc_table_offset: br.read_u16::<LittleEndian>()?,
            overlay_number: br.read_u16::<LittleEndian>()?,
            ..Default::default()
        };

        // 0x1C..0x3C is reserved/OEM data
        br.set_position(NE_HEADER_POINTER);
        header.coff_header_offset = br.read_u32::<LittleEndian>()?;
        Ok(header)
    }
}

/// Parsed MZ/NE metadata plus the resource table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub header: MzHeader,
    pub format: ContainerFormat,
    pub resource_table_offset: u64,
    pub alignment_shift: u16,
    /// Resources in on-disk table order.
    pub resources: Vec<ResourceDescriptor>,
}

impl Container {
    /// Reads the MZ header and walks the NE resource table.
    ///
    /// # Errors
    ///
    /// Only NE containers are supported, PE and anything else fail with
    /// [`FonError::UnsupportedContainerFormat`].
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let data = read_region(reader, MZ_HEADER_LEN, "MZ")?;
        let header = MzHeader::from_bytes(&data)?;
        let ne_offset = header.coff_header_offset as u64;

        reader.seek(SeekFrom::Start(ne_offset))?;
        let mut preamble = [0u8; 4];
        reader.read_exact(&mut preamble).map_err(eof_as("extended header signature"))?;
        let format = ContainerFormat::identify(&preamble);
        if format != ContainerFormat::Ne {
            return Err(FonError::UnsupportedContainerFormat(format));
        }

        reader.seek(SeekFrom::Start(ne_offset + NE_RESOURCE_TABLE_POINTER))?;
        let relative_table = reader.read_u16::<LittleEndian>().map_err(eof_as("NE header"))?;
        let resource_table_offset = ne_offset + relative_table as u64;

        reader.seek(SeekFrom::Start(resource_table_offset))?;
        let alignment_shift = reader.read_u16::<LittleEndian>().map_err(eof_as("resource table"))?;
        let resources = read_resource_entries(reader, alignment_shift)?;
        log::debug!(
            "NE resource table at {resource_table_offset:#X}: shift {alignment_shift}, {} resources",
            resources.len()
        );

        Ok(Self {
            header,
            format,
            resource_table_offset,
            alignment_shift,
            resources,
        })
    }

    /// All resources of the given type, in table order.
    pub fn resources_of_type(&self, resource_type: u16) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter().filter(move |res| res.resource_type == resource_type)
    }

    pub fn font_resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources_of_type(FONT_RESOURCE_TYPE)
    }
}

fn read_resource_entries<R: Read + Seek>(reader: &mut R, shift: u16) -> Result<Vec<ResourceDescriptor>> {
    let mut resources = Vec::new();
    loop {
        let resource_type = reader.read_u16::<LittleEndian>().map_err(eof_as("resource table"))?;
        if resource_type == 0 {
            break;
        }
        let count = reader.read_u16::<LittleEndian>().map_err(eof_as("resource table"))?;
        // reserved
        reader.seek(SeekFrom::Current(4))?;

        for _ in 0..count {
            let raw_start = reader.read_u16::<LittleEndian>().map_err(eof_as("resource entry"))?;
            let raw_size = reader.read_u16::<LittleEndian>().map_err(eof_as("resource entry"))?;
            resources.push(ResourceDescriptor {
                offset: align(raw_start, shift)?,
                size: align(raw_size, shift)?,
                resource_type,
            });
            // flags, name/id, 4 bytes reserved
            reader.seek(SeekFrom::Current(8))?;
        }
    }
    Ok(resources)
}

fn align(raw: u16, shift: u16) -> Result<u32> {
    if shift > MAX_ALIGNMENT_SHIFT {
        return Err(FonError::InvalidOffset { raw, shift });
    }
    Ok((raw as u32) << shift)
}
