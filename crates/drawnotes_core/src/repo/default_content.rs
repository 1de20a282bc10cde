//! Bundled seed drawings for first-run stores.
//!
//! # Responsibility
//! - Resolve default drawing names to opaque records.
//! - Build the fallback store used when nothing valid is persisted.
//!
//! # Invariants
//! - Unresolvable names are skipped, never reported to callers.
//! - Resulting order follows the requested name order.

use crate::model::drawing::{DrawingRecord, DrawingStore};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File extension of drawing assets inside an asset directory.
pub const DRAWING_ASSET_EXTENSION: &str = "drawing";

/// Failure to resolve one named asset.
#[derive(Debug)]
pub enum AssetError {
    NotFound(String),
    Unreadable { name: String, reason: String },
}

impl Display for AssetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "drawing asset not found: {name}"),
            Self::Unreadable { name, reason } => {
                write!(f, "drawing asset `{name}` is unreadable: {reason}")
            }
        }
    }
}

impl Error for AssetError {}

/// Source of bundled drawings, keyed by name.
pub trait DefaultContentSource: Send {
    fn drawing(&self, name: &str) -> Result<DrawingRecord, AssetError>;
}

/// Builds a store from `names`, skipping any the source cannot resolve.
pub fn load_default_drawings(source: &dyn DefaultContentSource, names: &[&str]) -> DrawingStore {
    let drawings = names
        .iter()
        .filter_map(|name| match source.drawing(name) {
            Ok(record) => Some(record),
            Err(err) => {
                debug!(
                    "event=default_drawing_skip module=repo status=skip name={} reason={}",
                    name, err
                );
                None
            }
        })
        .collect();
    DrawingStore::with_drawings(drawings)
}

/// Assets read from `<dir>/<name>.drawing`.
#[derive(Debug, Clone)]
pub struct AssetDirectory {
    dir: PathBuf,
}

impl AssetDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn asset_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{DRAWING_ASSET_EXTENSION}"))
    }
}

impl DefaultContentSource for AssetDirectory {
    fn drawing(&self, name: &str) -> Result<DrawingRecord, AssetError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(AssetError::NotFound(name.to_string()));
        }

        match fs::read(self.asset_path(name)) {
            Ok(bytes) => Ok(DrawingRecord::from(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(name.to_string()))
            }
            Err(err) => Err(AssetError::Unreadable {
                name: name.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// In-memory asset table, e.g. for assets compiled in with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    assets: BTreeMap<String, DrawingRecord>,
}

impl StaticAssets {
    /// A source with no bundled drawings; first run starts empty.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, name: impl Into<String>, bytes: impl Into<DrawingRecord>) -> Self {
        self.assets.insert(name.into(), bytes.into());
        self
    }
}

impl DefaultContentSource for StaticAssets {
    fn drawing(&self, name: &str) -> Result<DrawingRecord, AssetError> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{load_default_drawings, AssetDirectory, AssetError, DefaultContentSource, StaticAssets};
    use crate::model::drawing::DrawingRecord;

    #[test]
    fn skips_missing_names_and_keeps_order() {
        let assets = StaticAssets::none()
            .with_asset("b", b"B".to_vec())
            .with_asset("a", b"A".to_vec());

        let store = load_default_drawings(&assets, &["a", "missing", "b"]);
        assert_eq!(
            store.drawings,
            vec![DrawingRecord::from(b"A".to_vec()), DrawingRecord::from(b"B".to_vec())]
        );
    }

    #[test]
    fn no_assets_yields_empty_store() {
        let store = load_default_drawings(&StaticAssets::none(), &["Notes"]);
        assert!(store.is_empty());
    }

    #[test]
    fn asset_directory_reads_named_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Notes.drawing"), b"strokes").unwrap();

        let source = AssetDirectory::new(dir.path());
        let record = source.drawing("Notes").unwrap();
        assert_eq!(record.as_bytes(), b"strokes");
        assert!(matches!(source.drawing("Other"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn asset_directory_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let source = AssetDirectory::new(dir.path());
        assert!(matches!(source.drawing("../Notes"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn unreadable_asset_is_reported_as_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Notes.drawing")).unwrap();

        let source = AssetDirectory::new(dir.path());
        assert!(matches!(
            source.drawing("Notes"),
            Err(AssetError::Unreadable { .. })
        ));
    }
}
