use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AssetError;

/// Asset folder a logical name is looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Images,
    Sprites,
    Sounds,
    Fonts,
}

impl AssetCategory {
    pub fn dir(self) -> &'static str {
        match self {
            AssetCategory::Images => "images",
            AssetCategory::Sprites => "sprites",
            AssetCategory::Sounds => "sounds",
            AssetCategory::Fonts => "fonts",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Two-tier asset root resolution.
///
/// A lookup tries `<primary>/<category>/<name>` first and falls back to
/// `<fallback>/<category>/<name>`. The defaults (`assets` and `../../assets`)
/// cover both launching from the project root and from a `cmd/<tool>` folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetPaths {
    primary: PathBuf,
    fallback: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::new("assets", Path::new("..").join("..").join("assets"))
    }
}

impl AssetPaths {
    pub fn new(primary: impl Into<PathBuf>, fallback: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    pub fn primary(&self) -> &Path {
        &self.primary
    }

    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    /// Opens an asset, returning the handle and the path that succeeded.
    pub fn open(&self, category: AssetCategory, name: &str) -> Result<(File, PathBuf), AssetError> {
        let rel = sanitize_rel_path(Path::new(name))?;
        if rel.as_os_str().is_empty() {
            return Err(AssetError::NotFound {
                category,
                name: name.to_string(),
            });
        }

        let mut failure = None;
        for root in [&self.primary, &self.fallback] {
            let path = root.join(category.dir()).join(&rel);
            match File::open(&path) {
                Ok(file) => {
                    debug!(path = %path.display(), "resolved asset");
                    return Ok((file, path));
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => failure = Some(err),
            }
        }

        Err(match failure {
            Some(err) => AssetError::Io(err),
            None => AssetError::NotFound {
                category,
                name: name.to_string(),
            },
        })
    }

    /// Reads an asset fully into memory.
    pub fn read(&self, category: AssetCategory, name: &str) -> Result<Vec<u8>, AssetError> {
        let (mut file, path) = self.open(category, name)?;
        let capacity = fs::metadata(&path).map(|meta| meta.len() as usize).unwrap_or(0);
        let mut bytes = Vec::with_capacity(capacity);
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

pub fn sanitize_rel_path(rel: &Path) -> Result<PathBuf, AssetError> {
    use std::path::Component::*;
    let mut out = PathBuf::new();
    for component in rel.components() {
        match component {
            CurDir => {}
            Normal(part) => out.push(part),
            ParentDir | RootDir | Prefix(_) => return Err(AssetError::Traversal),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_asset(root: &Path, category: AssetCategory, name: &str, bytes: &[u8]) {
        let dir = root.join(category.dir());
        std::fs::create_dir_all(&dir).expect("category dir should be created");
        std::fs::write(dir.join(name), bytes).expect("asset file should be written");
    }

    #[test]
    fn primary_root_wins_when_both_exist() {
        let primary = tempfile::tempdir().expect("tempdir");
        let fallback = tempfile::tempdir().expect("tempdir");
        write_asset(primary.path(), AssetCategory::Sounds, "theme.wav", b"primary");
        write_asset(fallback.path(), AssetCategory::Sounds, "theme.wav", b"fallback");

        let paths = AssetPaths::new(primary.path(), fallback.path());
        let bytes = paths
            .read(AssetCategory::Sounds, "theme.wav")
            .expect("asset should resolve");
        assert_eq!(bytes, b"primary");
    }

    #[test]
    fn fallback_root_used_when_primary_misses() {
        let primary = tempfile::tempdir().expect("tempdir");
        let fallback = tempfile::tempdir().expect("tempdir");
        write_asset(fallback.path(), AssetCategory::Fonts, "font.ttf", b"face");

        let paths = AssetPaths::new(primary.path(), fallback.path());
        let (_, resolved) = paths
            .open(AssetCategory::Fonts, "font.ttf")
            .expect("fallback should resolve");
        assert!(resolved.starts_with(fallback.path()));
    }

    #[test]
    fn missing_in_both_roots_is_not_found() {
        let primary = tempfile::tempdir().expect("tempdir");
        let fallback = tempfile::tempdir().expect("tempdir");
        let paths = AssetPaths::new(primary.path(), fallback.path());

        let err = paths
            .read(AssetCategory::Images, "nowhere.png")
            .expect_err("missing asset must fail");
        assert!(matches!(
            err,
            AssetError::NotFound {
                category: AssetCategory::Images,
                ..
            }
        ));
    }

    #[test]
    fn parent_components_are_rejected() {
        let paths = AssetPaths::default();
        let err = paths
            .read(AssetCategory::Sprites, "../secrets.png")
            .expect_err("traversal must be blocked");
        assert!(matches!(err, AssetError::Traversal));
    }

    #[test]
    fn empty_name_never_opens_the_category_folder() {
        let primary = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(primary.path().join("images")).expect("images dir");
        let paths = AssetPaths::new(primary.path(), primary.path());

        assert!(matches!(
            paths.open(AssetCategory::Images, ""),
            Err(AssetError::NotFound { .. })
        ));
    }
}
