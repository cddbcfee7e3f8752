//! Result-file discovery: a single report file, or a directory searched
//! (optionally recursively) for `*.xml` files.

use std::path::{Path, PathBuf};

use testlog2db_core::errors::{ImportError, ImportResult};
use tracing::info;

/// Collect the report files to import. Fails when the path does not exist
/// or the search yields nothing.
pub fn discover_reports(path: &Path, recursive: bool) -> ImportResult<Vec<PathBuf>> {
    if !path.exists() {
        return Err(ImportError::InputNotFound {
            path: path.display().to_string(),
        });
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    info!(
        path = %path.display(),
        recursive,
        "searching for result *.xml files"
    );
    let mut entries = Vec::new();
    collect_xml(path, recursive, &mut entries).map_err(|err| ImportError::InputNotFound {
        path: format!("{} ({err})", path.display()),
    })?;
    if entries.is_empty() {
        return Err(ImportError::InputNotFound {
            path: format!("no *.xml report files under '{}'", path.display()),
        });
    }
    // Directory iteration order is platform-defined; imports should not be.
    entries.sort();
    Ok(entries)
}

fn collect_xml(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_xml(&path, recursive, out)?;
            }
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            out.push(path);
        }
    }
    Ok(())
}
