//! Output tree: path normalization and image writes
//!
//! Layout: `<root>/<project>/<screen>.png` for the current image and
//! `<root>/<project>/<screen>_<created>.png` for each historical version,
//! where both names go through [`normalize`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Turn a display name into a path segment
///
/// Surrounding whitespace is trimmed, spaces become `_` and slashes become `-`.
/// Applying it twice gives the same result as applying it once.
///
/// ```
/// use screens_dl::sink::normalize;
///
/// assert_eq!(normalize("My Screen/V2"), "My_Screen-V2");
/// assert_eq!(normalize(" Home "), "Home");
/// ```
#[must_use]
pub fn normalize(name: &str) -> String {
    name.trim().replace(' ', "_").replace('/', "-")
}

/// Writes images below one output root
#[derive(Clone, Debug)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    /// A sink writing below `root`; the directory is not touched
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Remove `root` with everything in it, recreate it empty and return a sink for it
    ///
    /// A missing root is not an error.
    pub async fn reset(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        match tokio::fs::remove_dir_all(&root).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(Error::Write { path: root, source }),
        }
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| Error::Write {
                path: root.clone(),
                source,
            })?;

        tracing::info!(output_dir = %root.display(), "Output directory reset");
        Ok(Self { root })
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination of a screen image, or of one of its versions when `created` is set
    pub fn image_path(&self, project_name: &str, screen_name: &str, created: Option<i64>) -> PathBuf {
        let file_name = match created {
            Some(created) => format!("{}_{}.png", normalize(screen_name), created),
            None => format!("{}.png", normalize(screen_name)),
        };
        self.root.join(normalize(project_name)).join(file_name)
    }

    /// Write `bytes` to the screen's destination, creating the project directory as needed
    ///
    /// An existing file at the same path is overwritten.
    pub async fn write(
        &self,
        project_name: &str,
        screen_name: &str,
        created: Option<i64>,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self.image_path(project_name, screen_name, created);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| Error::Write {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
