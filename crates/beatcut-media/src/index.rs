// crates/beatcut-media/src/index.rs
//
// Asset index: the flat ordered list of Asset records on disk.
//
// Serialized as a JSON array in insertion order; asset ids are stable for
// the asset's lifetime, so projects reference them freely across
// sessions. Saves go through a temp file + atomic persist so a crash
// mid-write never corrupts the index.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use beatcut_core::state::Asset;

pub struct AssetIndex {
    path:       PathBuf,
    pub assets: Vec<Asset>,
}

impl AssetIndex {
    /// Load the index at `path`; a missing file is an empty index.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let assets = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse asset index {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e).context("read asset index"),
        };
        Ok(Self { path, assets })
    }

    /// Write the index atomically (temp file in the same directory, then
    /// rename over the target).
    pub fn save(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.assets)?;
        tmp.persist(&self.path)
            .with_context(|| format!("persist asset index {}", self.path.display()))?;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Asset> {
        self.assets.iter_mut().find(|a| a.id == id)
    }

    /// Append an asset; replaces an existing record with the same id.
    pub fn upsert(&mut self, asset: Asset) {
        match self.assets.iter_mut().find(|a| a.id == asset.id) {
            Some(slot) => *slot = asset,
            None => self.assets.push(asset),
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Asset> {
        self.assets
            .iter()
            .position(|a| a.id == id)
            .map(|i| self.assets.remove(i))
    }
}
