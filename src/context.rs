use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Platform resources a player needs, passed explicitly to whoever needs them
#[derive(Debug, Clone)]
pub struct PlatformContext {
    storage_dir: PathBuf,
}

impl PlatformContext {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    /// Context rooted in the user's data directory
    pub fn from_data_dir() -> Option<Self> {
        dirs::data_dir().map(|p| Self::new(p.join("tandem")))
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Copy a bundled asset into private storage so engines can open it by path.
    ///
    /// Existing files are overwritten.
    pub fn stage_asset(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        if name.is_empty() || Path::new(name).components().count() != 1 {
            anyhow::bail!("Asset name must be a plain file name: {:?}", name);
        }

        fs::create_dir_all(&self.storage_dir).with_context(|| {
            format!("Failed to create storage dir {}", self.storage_dir.display())
        })?;
        let path = self.storage_dir.join(name);
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to stage asset {}", path.display()))?;
        debug!("Staged asset {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_asset_writes_file() {
        let dir = std::env::temp_dir().join(format!("tandem-assets-{}", std::process::id()));
        let context = PlatformContext::new(&dir);

        let path = context.stage_asset("demo.he", b"{\"Metadata\":{}}").unwrap();
        assert_eq!(path, dir.join("demo.he"));
        assert!(path.starts_with(context.storage_dir()));
        assert_eq!(fs::read(&path).unwrap(), b"{\"Metadata\":{}}");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_stage_asset_rejects_paths() {
        let context = PlatformContext::new(std::env::temp_dir());
        assert!(context.stage_asset("../escape.he", b"").is_err());
        assert!(context.stage_asset("", b"").is_err());
    }
}
