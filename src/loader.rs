//! Reading a document collection from disk.
//!
//! A `.csv` file contributes the first column of each record after the
//! header; any other file contributes one document per line.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load documents from `path`. Empty CSV cells come back as `None`.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<Option<String>>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let documents = if is_csv {
        load_csv(path)?
    } else {
        load_lines(path)?
    };
    log::info!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}

fn load_csv(path: &Path) -> Result<Vec<Option<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record?;
        let doc = record
            .get(0)
            .filter(|cell| !cell.trim().is_empty())
            .map(str::to_string);
        documents.push(doc);
    }
    Ok(documents)
}

fn load_lines(path: &Path) -> Result<Vec<Option<String>>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(|line| Some(line.to_string())).collect())
}
