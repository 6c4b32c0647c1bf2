//! Human readable listing of a file's structure
//!
//! Images are described from their section headers and never decoded. Property
//! lists and CAMF sections are resolved; a section that fails to resolve is
//! reported in place and the listing goes on.

use std::io::Write;

use x3f_core::X3fResult;
use x3f_headers::{CamfVariant, SectionHeader};

use crate::X3fFile;

/// Write the header, directory, properties and CAMF entry names of `file`
pub fn write_info<W: Write>(file: &X3fFile, out: &mut W) -> X3fResult<()> {
    let header = file.header();
    writeln!(out, "header:")?;
    writeln!(out, "  version: {}", header.version)?;
    write!(out, "  unique identifier: ")?;
    for byte in header.unique_identifier {
        write!(out, "{:02x}", byte)?;
    }
    writeln!(out)?;
    writeln!(out, "  mark bits: {:#010x}", header.mark_bits)?;
    writeln!(out, "  size: {}x{}", header.columns, header.rows)?;
    writeln!(out, "  rotation: {:?}", header.rotation)?;
    if let Some(extended) = &header.extended {
        writeln!(out, "  white balance: {}", extended.white_balance())?;
        for (kind, value) in extended.adjustments() {
            writeln!(out, "  {:?}: {}", kind, value)?;
        }
    }

    let directory = file.directory();
    writeln!(
        out,
        "directory: {} entries at {:#x}, version {}",
        directory.entries.len(),
        directory.offset,
        directory.version
    )?;
    for (index, entry) in directory.entries.iter().enumerate() {
        write!(
            out,
            "  [{}] {} offset {:#x} size {}: ",
            index,
            entry.kind(),
            entry.input.offset,
            entry.input.size
        )?;
        match &entry.header {
            SectionHeader::PropertyList(_) => write_properties(file, index, out)?,
            SectionHeader::Image(image) => writeln!(
                out,
                "image {} {}x{} stride {}",
                image.type_format, image.columns, image.rows, image.row_stride
            )?,
            SectionHeader::Camf(camf) => {
                match camf.variant() {
                    CamfVariant::Type4 {
                        decoded_size,
                        block_size,
                        block_count,
                        ..
                    } => writeln!(
                        out,
                        "CAMF type 4, {} blocks of {}, decoded size {}",
                        block_count, block_size, decoded_size
                    )?,
                    _ => writeln!(out, "CAMF type {}", camf.camf_type)?,
                }
                write_camf_names(file, index, out)?;
            }
        }
    }
    Ok(())
}

fn write_properties<W: Write>(file: &X3fFile, index: usize, out: &mut W) -> X3fResult<()> {
    match file.property_list(index) {
        Ok(list) => {
            writeln!(out, "{} properties", list.len())?;
            for (name, value) in list.iter() {
                writeln!(out, "    {} = {}", name, value)?;
            }
        }
        Err(e) => writeln!(out, "unreadable property list: {}", e)?,
    }
    Ok(())
}

fn write_camf_names<W: Write>(file: &X3fFile, index: usize, out: &mut W) -> X3fResult<()> {
    match file.camf(index) {
        Ok(camf) => {
            for entry in camf.entries() {
                writeln!(out, "    {:?} {}", entry.kind(), entry.name_str())?;
            }
            for problem in &camf.skipped {
                writeln!(out, "    skipped: {}", problem)?;
            }
        }
        Err(e) => writeln!(out, "    unreadable: {}", e)?,
    }
    Ok(())
}
