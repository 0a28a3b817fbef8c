use std::io::Write;

use crate::{Error, MetaHeader, MetaLine, MwrmVersion};

/// Writes a manifest header, including the separator lines that precede
/// the first entry.
pub fn write_header<W: Write>(
    out: &mut W,
    header: &MetaHeader,
    width: u16,
    height: u16,
) -> std::io::Result<()> {
    match header.version {
        MwrmVersion::V1 => write!(out, "{width} {height}\n0\n\n"),
        MwrmVersion::V2 => {
            let marker = if header.has_checksum { "checksum" } else { "nochecksum" };
            write!(out, "v2\n{width} {height}\n{marker}\n\n\n")
        }
    }
}

/// Appends one manifest entry in the layout announced by `header`.
pub fn write_line<W: Write>(out: &mut W, header: &MetaHeader, line: &MetaLine) -> Result<(), Error> {
    write!(out, "{}", line.filename)?;

    if header.version == MwrmVersion::V2 {
        let stat = line.stat.unwrap_or_default();
        write!(
            out,
            " {} {} {} {} {} {} {} {}",
            stat.size, stat.mode, stat.uid, stat.gid, stat.dev, stat.ino, stat.mtime, stat.ctime
        )?;
    }

    write!(out, " {} {}", line.start_time, line.stop_time)?;

    let with_hashes = header.version == MwrmVersion::V1 || header.has_checksum;
    if with_hashes {
        let hashes = line.hashes.as_ref().ok_or(Error::MissingHashes)?;
        write!(out, " {} {}", hex::encode(hashes.hash1), hex::encode(hashes.hash2))?;
    }

    writeln!(out)?;
    Ok(())
}
