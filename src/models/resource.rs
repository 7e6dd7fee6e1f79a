use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use url::Url;

/// A document identity. Two resources are equal iff their URIs are equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Resource(Url);

impl Resource {
    pub fn parse(uri: &str) -> Result<Self, url::ParseError> {
        Url::parse(uri).map(Self)
    }

    pub fn from_file_path(path: impl AsRef<Path>) -> Option<Self> {
        Url::from_file_path(path).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    pub fn to_file_path(&self) -> Option<PathBuf> {
        if self.scheme() != "file" {
            return None;
        }
        self.0.to_file_path().ok()
    }

    /// Last path segment, used as the default tab title.
    pub fn basename(&self) -> String {
        if let Some(name) = self
            .to_file_path()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
        {
            return name;
        }

        self.0
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_string)
            .unwrap_or_else(|| self.as_str().to_string())
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.basename();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource({})", self.0)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Url> for Resource {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/resource.rs"]
mod tests;
