//! Mock payloads read from disk once at startup

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use serde_json::Value;

use crate::error::PayloadError;

/// Which mock file to send.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSelector {
    /// `input<n>.json`
    Index(u32),
    /// One of `input1.json` to `input4.json`, picked at startup
    Random,
}

impl FromStr for PayloadSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("random") {
            return Ok(Self::Random);
        }
        s.parse()
            .map(Self::Index)
            .map_err(|_| format!("expected a mock index or \"random\", got {s:?}"))
    }
}

impl fmt::Display for PayloadSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Random => f.write_str("random"),
        }
    }
}

/// Payload text shared read-only by every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    body: Arc<str>,
}

impl Payload {
    #[must_use]
    pub fn new(body: impl Into<Arc<str>>) -> Self {
        Self { body: body.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[inline]
    pub(crate) fn to_value(&self) -> Value {
        Value::String(self.body.to_string())
    }
}

#[must_use]
pub fn mock_path(dir: &Path, index: u32) -> PathBuf {
    dir.join(format!("input{index}.json"))
}

/// Reads and checks the selected mock file. Any failure here is fatal for the run.
pub fn load_payload(dir: &Path, selector: PayloadSelector) -> Result<Payload, PayloadError> {
    let index = match selector {
        PayloadSelector::Index(i) => i,
        PayloadSelector::Random => rand::thread_rng().gen_range(1..5),
    };
    let path = mock_path(dir, index);
    let text = std::fs::read_to_string(&path).map_err(|source| PayloadError::Read {
        path: path.clone(),
        source,
    })?;
    if let Err(source) = serde_json::from_str::<serde::de::IgnoredAny>(&text) {
        return Err(PayloadError::Invalid { path, source });
    }
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded payload");
    Ok(Payload::new(text))
}
