//! Part library: the directory tree of printable part meshes.
//!
//! Each top-level directory is named after a [`Category`] and holds `.stl`
//! files. A file's path relative to the library root, minus its extension,
//! is the part's [`ModelId`].

use std::path::Path;

use mount_types::{AttachmentPoint, Category, ModelId, Side};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::errors::LibraryError;

const MESH_EXTENSION: &str = "stl";

/// One node of the library tree. Paths are relative to the library root
/// and always use `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LibraryEntry {
    Directory {
        name: String,
        path: String,
        children: Vec<LibraryEntry>,
    },
    File {
        name: String,
        path: String,
    },
}

impl LibraryEntry {
    pub fn name(&self) -> &str {
        match self {
            LibraryEntry::Directory { name, .. } | LibraryEntry::File { name, .. } => name,
        }
    }

    /// Model id of a file entry: its path without the extension.
    pub fn model_id(&self) -> Option<ModelId> {
        match self {
            LibraryEntry::File { path, .. } => {
                let stem = path.rsplit_once('.').map_or(path.as_str(), |(stem, _)| stem);
                Some(ModelId::new(stem))
            }
            LibraryEntry::Directory { .. } => None,
        }
    }

    /// Every file entry at or below this one, depth first.
    pub fn files(&self) -> Vec<&LibraryEntry> {
        match self {
            LibraryEntry::File { .. } => vec![self],
            LibraryEntry::Directory { children, .. } => children.iter().flat_map(|c| c.files()).collect(),
        }
    }
}

/// Scan `root` recursively for `.stl` files (extension matched case-insensitively).
///
/// Entries are sorted by name. Subdirectories that cannot be read are logged
/// and left empty; only an unreadable `root` is an error.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan_library(root: &Path) -> Result<Vec<LibraryEntry>, LibraryError> {
    let entries = scan_dir(root, "").map_err(|e| LibraryError::Unreadable {
        path: root.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(top_level = entries.len(), "library scanned");
    Ok(entries)
}

fn scan_dir(dir: &Path, prefix: &str) -> std::io::Result<Vec<LibraryEntry>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), %err, "skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };
        let entry_path = entry.path();

        if entry_path.is_dir() {
            let children = scan_dir(&entry_path, &path).unwrap_or_else(|err| {
                warn!(dir = %entry_path.display(), %err, "skipping unreadable directory");
                Vec::new()
            });
            out.push(LibraryEntry::Directory { name, path, children });
        } else if entry_path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(MESH_EXTENSION))
        {
            out.push(LibraryEntry::File { name, path });
        }
    }
    out.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(out)
}

/// File-name marker selecting parts for each side of a side-filtered slot.
pub fn side_marker(side: Side) -> &'static str {
    match side {
        Side::Primary => "left",
        Side::Opposite => "right",
    }
}

/// Models in the library that may be offered for `point`.
///
/// Looks in the top-level directory named after the point's category. For
/// side-filtered categories only files whose name contains the side marker
/// (case-insensitive) are kept.
pub fn candidate_models(entries: &[LibraryEntry], point: &AttachmentPoint) -> Vec<ModelId> {
    models_for(entries, point.category, point.side())
}

pub fn models_for(entries: &[LibraryEntry], category: Category, side: Side) -> Vec<ModelId> {
    let Some(dir) = entries
        .iter()
        .find(|e| matches!(e, LibraryEntry::Directory { .. }) && e.name() == category.as_str())
    else {
        return Vec::new();
    };
    let marker = side_marker(side);
    dir.files()
        .into_iter()
        .filter(|f| !category.spec().side_filter || f.name().to_ascii_lowercase().contains(marker))
        .filter_map(LibraryEntry::model_id)
        .collect()
}
