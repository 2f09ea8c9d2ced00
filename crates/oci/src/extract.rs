//! Writing pulled layers into a destination directory.
//!
//! Packed directories (tar, optionally gzip-compressed) are unpacked in place.
//! Any other blob is written as a single file named by its title annotation.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, trace};

use crate::manifest::LayerDescriptor;
use crate::{Error, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Write a downloaded layer blob into `dest`.
pub fn unpack_layer(blob: &Path, layer: &LayerDescriptor, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    if layer.is_archive() {
        unpack_archive(blob, &layer.digest, dest)
    } else {
        write_file_layer(blob, layer, dest).map(|_| ())
    }
}

fn unpack_archive(blob: &Path, digest: &str, dest: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(blob)?);
    let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    let stream: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };

    let mut archive = Archive::new(stream);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let mut count = 0usize;
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        trace!(?path, "Unpacking entry");
        if !entry.unpack_in(dest)? {
            return Err(Error::unpack(
                digest,
                format!("entry '{}' escapes the destination", path.display()),
            ));
        }
        count += 1;
    }

    debug!(digest, entries = count, ?dest, "Unpacked archive layer");
    Ok(())
}

fn write_file_layer(blob: &Path, layer: &LayerDescriptor, dest: &Path) -> Result<PathBuf> {
    let name = match layer.title() {
        Some(title) => title.to_string(),
        None => layer
            .digest
            .split_once(':')
            .map_or_else(|| layer.digest.clone(), |(_, hex)| hex.to_string()),
    };

    let relative = Path::new(&name);
    let is_safe = relative.components().next().is_some()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !is_safe {
        return Err(Error::unpack(
            &layer.digest,
            format!("layer title '{name}' is not a relative file name"),
        ));
    }

    let target = dest.join(relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(blob, &target)?;
    debug!(digest = %layer.digest, ?target, "Wrote file layer");
    Ok(target)
}
