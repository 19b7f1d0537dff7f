use crate::output::SinkError;
use crate::utils::mirror_path;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Saves rendered pages below a root directory as `<host>/<path>`
#[derive(Debug, Clone)]
pub struct HtmlMirror {
    root: PathBuf,
}

impl HtmlMirror {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `url` lands in the mirror, or None if it is not a parseable URL
    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        Url::parse(url).ok().map(|url| self.root.join(mirror_path(&url)))
    }

    /// Writes `html` for `url`, creating directories as needed
    pub fn save(&self, url: &str, html: &str) -> Result<PathBuf, SinkError> {
        let path = self.path_for(url).ok_or_else(|| {
            SinkError::io(
                &self.root,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("cannot mirror unparseable URL {}", url),
                ),
            )
        })?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
        }
        fs::write(&path, html).map_err(|e| SinkError::io(&path, e))?;
        ::log::debug!("Mirrored {} to {}", url, path.display());
        Ok(path)
    }
}
