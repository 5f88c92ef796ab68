//! Label Map - class index -> human label
//!
//! Exported from the training-time label encoder as JSON, either
//! `["Aphids", "No Pest", ...]` (index = position) or `{"0": "Aphids", ...}`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelMapError {
    #[error("failed to read label map {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid label map JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("label map key is not an integer: {0:?}")]
    InvalidKey(String),
    #[error("label map is empty")]
    Empty,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// Immutable index -> label table, loaded once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: BTreeMap<i64, String>,
}

impl LabelMap {
    pub fn load(path: &Path) -> Result<Self, LabelMapError> {
        let content = std::fs::read_to_string(path).map_err(|source| LabelMapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let map = Self::from_json(&content)?;
        log::info!("Loaded label map from {} ({} classes)", path.display(), map.len());
        Ok(map)
    }

    pub fn from_json(content: &str) -> Result<Self, LabelMapError> {
        let labels = match serde_json::from_str::<LabelFile>(content)? {
            LabelFile::List(list) => list
                .into_iter()
                .enumerate()
                .map(|(i, label)| (i as i64, label))
                .collect(),
            LabelFile::Map(map) => map
                .into_iter()
                .map(|(key, label)| {
                    key.trim()
                        .parse::<i64>()
                        .map(|index| (index, label))
                        .map_err(|_| LabelMapError::InvalidKey(key))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?,
        };

        if labels.is_empty() {
            return Err(LabelMapError::Empty);
        }
        Ok(Self { labels })
    }

    #[cfg(test)]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels
                .into_iter()
                .enumerate()
                .map(|(i, label)| (i as i64, label.into()))
                .collect(),
        }
    }

    pub fn decode(&self, index: i64) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}
