//! Loading and writing index documents

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::index::catalog::VersionCatalog;
use crate::index::error::IndexError;

/// Parse index bytes into a sorted catalog.
pub fn load_index(data: &[u8]) -> Result<VersionCatalog, IndexError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(IndexError::EmptyInput);
    }

    let mut catalog: VersionCatalog = serde_yaml_ng::from_slice(data)?;
    if catalog.api_version.is_empty() {
        return Err(IndexError::NoApiVersion);
    }

    catalog.sort_entries();
    Ok(catalog)
}

pub fn load_index_file(path: &Path) -> Result<VersionCatalog, IndexError> {
    let data = std::fs::read(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_index(&data)
}

pub fn encode_index(catalog: &VersionCatalog) -> Result<Vec<u8>, IndexError> {
    Ok(serde_yaml_ng::to_string(catalog)?.into_bytes())
}

/// Serialize `catalog` to `path`, replacing any existing file.
pub fn write_index_file(catalog: &VersionCatalog, path: &Path) -> Result<(), IndexError> {
    let data = encode_index(catalog)?;
    let io_error = |source: std::io::Error| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&data).map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    writer.get_ref().sync_all().map_err(io_error)?;

    debug!("Wrote index with {} charts to {:?}", catalog.entries.len(), path);
    Ok(())
}
