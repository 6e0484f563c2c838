//! Lists the fonts of a Windows `.FON` file and optionally exports their glyph atlases.
//!
//! Usage: cargo run -p icy_fon --bin fon_dump -- FONT.FON [--export DIR] [--show A]

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use flexi_logger::Logger;
use icy_fon::{Container, DecodedFont, INK};

#[derive(Parser, Debug)]
#[command(version, about = "Lists and exports the bitmap fonts stored in Windows .FON files", long_about = None)]
pub struct Args {
    /// .FON file to read
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Write the glyph atlas of every font as PNG into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Print this character of every font
    #[arg(long, value_name = "CHAR")]
    show: Option<char>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = Logger::try_with_env_or_str("info")?.log_to_stderr().start()?;

    let file = File::open(&args.path).with_context(|| format!("Failed to open {}", args.path.display()))?;
    let mut reader = BufReader::new(file);

    let container = Container::read(&mut reader)?;
    println!(
        "{}: {} container, {} resources (alignment shift {})",
        args.path.display(),
        container.format,
        container.resources.len(),
        container.alignment_shift
    );
    for res in &container.resources {
        println!("  type {:#06X} at {:#08X}, {} bytes", res.resource_type, res.offset, res.size);
    }

    let fonts = icy_fon::read_fonts(&mut reader)?;
    for (i, font) in fonts.iter().enumerate() {
        print_font(i, font);
        if let Some(ch) = args.show {
            print_glyph(font, ch);
        }
        if let Some(dir) = &args.export {
            export_atlas(dir, &args.path, i, font)?;
        }
    }
    Ok(())
}

fn print_font(index: usize, font: &DecodedFont) {
    let header = &font.header;
    println!(
        "Font {index}: {} ({}) [{}x{}] {}pt, chars {:#04X}..={:#04X}, version {:#06X}",
        font.name().cloned().unwrap_or_default(),
        font.copyright(),
        header.pix_width,
        header.pix_height,
        header.points,
        header.first_char,
        header.last_char,
        header.version
    );
}

fn print_glyph(font: &DecodedFont, ch: char) {
    let Some(cell) = font.glyph(ch) else {
        println!("  '{ch}' not in font");
        return;
    };
    let width = font.atlas.width();
    if width == 0 {
        return;
    }
    for row in cell.chunks(width) {
        let line: String = row.iter().map(|&p| if p == INK { '#' } else { '.' }).collect();
        println!("  {line}");
    }
}

fn export_atlas(dir: &Path, source: &Path, index: usize, font: &DecodedFont) -> anyhow::Result<()> {
    let atlas = &font.atlas;
    if atlas.pixels().is_empty() {
        log::warn!("Font {index} has an empty atlas, skipping export");
        return Ok(());
    }
    let stem = source.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "font".to_string());
    let out = dir.join(format!("{stem}_{index}.png"));

    let Some(image) = image::GrayImage::from_raw(atlas.width() as u32, atlas.height() as u32, atlas.pixels().to_vec()) else {
        anyhow::bail!("Atlas of font {index} doesn't match its dimensions");
    };
    image.save(&out).with_context(|| format!("Failed to write {}", out.display()))?;
    log::info!("Wrote {}", out.display());
    Ok(())
}
