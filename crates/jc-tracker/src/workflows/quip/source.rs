use crate::workflows::tracker::PeriodKey;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Raw markup published for one quarter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub period: PeriodKey,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("no document for period {period}")]
    NotFound { period: PeriodKey },
    #[error("period key {period} is not a plain file name")]
    InvalidKey { period: PeriodKey },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed thread payload in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where quarterly documents come from.
pub trait DocumentSource: Send + Sync {
    fn fetch(&self, period: &PeriodKey) -> Result<SourceDocument, RetrievalError>;
}

/// Thread payload as returned by the document service; only `html` is used.
#[derive(Debug, Deserialize)]
struct ThreadPayload {
    html: String,
}

/// Reads `<root>/<period>.html`, falling back to a saved `<root>/<period>.json`
/// thread payload.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys name files directly under the root.
    fn is_plain_key(period: &PeriodKey) -> bool {
        let key = period.as_str();
        !key.is_empty() && !key.contains(['/', '\\']) && !key.contains("..")
    }

    fn read(path: &Path) -> Result<Option<String>, RetrievalError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(RetrievalError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl DocumentSource for DirectorySource {
    fn fetch(&self, period: &PeriodKey) -> Result<SourceDocument, RetrievalError> {
        if !Self::is_plain_key(period) {
            return Err(RetrievalError::InvalidKey {
                period: period.clone(),
            });
        }

        let html_path = self.root.join(format!("{period}.html"));
        if let Some(html) = Self::read(&html_path)? {
            return Ok(SourceDocument {
                period: period.clone(),
                html,
            });
        }

        let json_path = self.root.join(format!("{period}.json"));
        let Some(raw) = Self::read(&json_path)? else {
            return Err(RetrievalError::NotFound {
                period: period.clone(),
            });
        };
        let payload: ThreadPayload =
            serde_json::from_str(&raw).map_err(|source| RetrievalError::Malformed {
                path: json_path,
                source,
            })?;

        Ok(SourceDocument {
            period: period.clone(),
            html: payload.html,
        })
    }
}

/// Documents supplied directly, e.g. in a request body.
#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    documents: HashMap<PeriodKey, String>,
}

impl InlineSource {
    pub fn new<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (PeriodKey, String)>,
    {
        Self {
            documents: documents.into_iter().collect(),
        }
    }

    pub fn periods(&self) -> Vec<PeriodKey> {
        let mut periods: Vec<_> = self.documents.keys().cloned().collect();
        periods.sort();
        periods
    }
}

impl DocumentSource for InlineSource {
    fn fetch(&self, period: &PeriodKey) -> Result<SourceDocument, RetrievalError> {
        self.documents
            .get(period)
            .map(|html| SourceDocument {
                period: period.clone(),
                html: html.clone(),
            })
            .ok_or_else(|| RetrievalError::NotFound {
                period: period.clone(),
            })
    }
}
