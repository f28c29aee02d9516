//! JSON save format of a trained agent.

use std::io;

use chrono::{DateTime, Utc};
use qtris_engine::Action;
use serde::{Deserialize, Serialize};

use crate::{exploration::Exploration, history::EpisodeScore, value::ValueModel};

/// Version written into every snapshot. Bumped on incompatible changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LoadError {
    #[display("save data is empty")]
    Empty,
    #[display("save data is malformed: {_0}")]
    Malformed(serde_json::Error),
    #[display("unsupported save format version {found}")]
    UnsupportedVersion { found: u32 },
    #[display("saved action vocabulary does not match this build")]
    VocabularyMismatch,
    #[display("saved model does not fit the configuration: {reason}")]
    IncompatibleModel {
        #[error(not(source))]
        reason: String,
    },
    #[display("failed to read save data: {_0}")]
    Io(io::Error),
}

/// Everything needed to resume training or play with a learned model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub format_version: u32,
    pub saved_at: DateTime<Utc>,
    /// Action names in value-index order.
    pub actions: Vec<Action>,
    pub exploration: Exploration,
    pub values: ValueModel,
    pub history: Vec<EpisodeScore>,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

impl AgentSnapshot {
    #[must_use]
    pub fn new(exploration: Exploration, values: ValueModel, history: Vec<EpisodeScore>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            actions: Action::ALL.to_vec(),
            exploration,
            values,
            history,
        }
    }

    pub fn to_writer<W>(&self, writer: W) -> Result<(), serde_json::Error>
    where
        W: io::Write,
    {
        serde_json::to_writer(writer, self)
    }

    /// Reads a snapshot, checking the format version before the body.
    pub fn from_reader<R>(mut reader: R) -> Result<Self, LoadError>
    where
        R: io::Read,
    {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(LoadError::Io)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        if text.trim().is_empty() {
            return Err(LoadError::Empty);
        }
        let probe: VersionProbe = serde_json::from_str(text).map_err(LoadError::Malformed)?;
        if probe.format_version != FORMAT_VERSION {
            return Err(LoadError::UnsupportedVersion {
                found: probe.format_version,
            });
        }
        let snapshot: Self = serde_json::from_str(text).map_err(LoadError::Malformed)?;
        if snapshot.actions != Action::ALL {
            return Err(LoadError::VocabularyMismatch);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TabularValues;

    fn snapshot() -> AgentSnapshot {
        AgentSnapshot::new(
            Exploration::new(0.25, 0.9),
            ValueModel::Tabular(TabularValues::new()),
            vec![EpisodeScore {
                reward: -1.5,
                score: 100,
                cleared_lines: 1,
                locked_pieces: 12,
                steps: 240,
            }],
        )
    }

    #[test]
    fn test_json_roundtrip() {
        let snapshot = snapshot();
        let mut buf = Vec::new();
        snapshot.to_writer(&mut buf).unwrap();
        let back = AgentSnapshot::from_reader(buf.as_slice()).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert!(matches!(
            AgentSnapshot::from_json("  \n"),
            Err(LoadError::Empty)
        ));
        assert!(matches!(
            AgentSnapshot::from_json("{\"format_version\": 1, \"values\""),
            Err(LoadError::Malformed(_))
        ));
        assert!(matches!(
            AgentSnapshot::from_json("[1, 2, 3]"),
            Err(LoadError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_other_version() {
        let err = AgentSnapshot::from_json(r#"{"format_version": 99}"#).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedVersion { found: 99 }));
        assert_eq!(err.to_string(), "unsupported save format version 99");
    }

    #[test]
    fn test_rejects_reordered_actions() {
        let mut snapshot = snapshot();
        snapshot.actions.swap(0, 1);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            AgentSnapshot::from_json(&json),
            Err(LoadError::VocabularyMismatch)
        ));
    }
}
