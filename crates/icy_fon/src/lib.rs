#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::module_name_repetitions
)]
//! Reader for the bitmap fonts stored in Windows 3.x `.FON` files.
//!
//! A `.FON` file is a 16-bit "New Executable" that carries one or more font
//! resources. [`read_fonts`] walks the resource table and turns every font
//! resource into a [`DecodedFont`]: header metadata, face metrics and an
//! alpha glyph atlas.

use std::{
    fs::File,
    io::{self, BufReader, Read, Seek},
    path::{Path, PathBuf},
};

use thiserror::Error;

pub mod atlas;
pub use atlas::*;

pub mod container;
pub use container::*;

pub mod font_header;
pub use font_header::*;

mod font;
pub use font::*;

pub type Result<T> = std::result::Result<T, FonError>;

#[derive(Error, Debug)]
pub enum FonError {
    #[error("{region} header too short: expected {expected} bytes, got {actual}")]
    HeaderTooShort { region: &'static str, expected: usize, actual: usize },

    #[error("Not an MZ executable (signature {signature:#06X})")]
    NotAnExecutable { signature: u16 },

    #[error("Unsupported container format: {0}")]
    UnsupportedContainerFormat(ContainerFormat),

    #[error("Invalid resource offset: {raw:#06X} shifted by {shift}")]
    InvalidOffset { raw: u16, shift: u16 },

    #[error("Unexpected end of file while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("Invalid character range {first:#04X}..={last:#04X}")]
    InvalidCharRange { first: u8, last: u8 },

    #[error("Glyph atlas too large: {glyphs} glyphs of {width}x{height}")]
    InvalidDimensions { width: u16, height: u16, glyphs: usize },

    #[error("Failed to open font file '{path}': {message}")]
    OpenFile { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reads all fonts contained in a `.FON` file.
///
/// Fonts are returned in resource table order. The first error aborts the
/// whole read, no partial result is returned.
pub fn read_fonts<R: Read + Seek>(reader: &mut R) -> Result<Vec<DecodedFont>> {
    let container = Container::read(reader)?;
    let resources: Vec<ResourceDescriptor> = container.font_resources().copied().collect();
    log::debug!("{} of {} resources are fonts", resources.len(), container.resources.len());

    let mut fonts = Vec::with_capacity(resources.len());
    for resource in resources {
        fonts.push(DecodedFont::decode(reader, resource.offset as u64)?);
    }
    Ok(fonts)
}

/// Opens the file under the given path and returns the fonts it contains.
pub fn open_fonts<P: AsRef<Path>>(path: P) -> Result<Vec<DecodedFont>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| FonError::OpenFile {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    log::info!("Reading fonts from {}", path.display());
    read_fonts(&mut BufReader::new(file))
}

/// Reads a fixed size region. A short read is reported as [`FonError::HeaderTooShort`].
pub(crate) fn read_region<R: Read>(reader: &mut R, len: usize, region: &'static str) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(len);
    reader.by_ref().take(len as u64).read_to_end(&mut data)?;
    if data.len() != len {
        return Err(FonError::HeaderTooShort {
            region,
            expected: len,
            actual: data.len(),
        });
    }
    Ok(data)
}

/// Maps an EOF from the underlying reader to [`FonError::UnexpectedEof`].
pub(crate) fn eof_as(context: &'static str) -> impl Fn(io::Error) -> FonError {
    move |err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            FonError::UnexpectedEof(context)
        } else {
            FonError::Io(err)
        }
    }
}
