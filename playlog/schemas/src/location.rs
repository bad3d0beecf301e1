//! Location type that handles both file paths and URLs

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// A dataset location that can be either a file path or a URL
///
/// File paths are converted to `file://` URLs during deserialization, so the same
/// configuration shape serves `s3://` prefixes for Redshift and local directories for
/// the embedded engine.
///
/// # Examples
///
/// ```
/// use playlog_schemas::Location;
///
/// let s3: Location = "s3://udacity-dend/log_data".try_into().unwrap();
/// assert_eq!(s3.scheme(), "s3");
///
/// let local: Location = "/data/song_data".try_into().unwrap();
/// assert_eq!(local.scheme(), "file");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Location(pub Url);

impl Location {
    /// `true` for object-store prefixes Redshift `COPY` can read from
    pub fn is_s3(&self) -> bool {
        self.0.scheme() == "s3"
    }

    /// The location as a listing prefix.
    ///
    /// A location pointing at a directory-like prefix gets a trailing `/` so object
    /// stores list everything beneath it; a location naming a `.json` file is kept as-is.
    pub fn as_prefix(&self) -> Url {
        let mut url = self.0.clone();
        let path = url.path().to_string();

        if !path.ends_with('/') && !path.ends_with(".json") {
            url.set_path(&format!("{path}/"));
        }

        url
    }

    fn from_path(raw: &str) -> Result<Self, String> {
        let path = Path::new(raw);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let cwd = std::env::current_dir()
                .map_err(|e| format!("cannot resolve '{raw}': {e}"))?;
            cwd.join(path)
        };

        Url::from_file_path(&absolute)
            .map(Location)
            .map_err(|_| format!("'{raw}' is neither a URL nor a usable path"))
    }
}

impl TryFrom<&str> for Location {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match Url::parse(s) {
            // `C:\data` parses with scheme `c`
            Ok(url) if url.scheme().len() > 1 => Ok(Location(url)),
            _ => Location::from_path(s),
        }
    }
}

impl TryFrom<String> for Location {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Location::try_from(s.as_str())
    }
}

impl From<Url> for Location {
    fn from(url: Url) -> Self {
        Location(url)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<Url> for Location {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl std::ops::Deref for Location {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
