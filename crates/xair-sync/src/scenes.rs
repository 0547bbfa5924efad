/// Scene name → snapshot slot mapping.
///
/// Entries keep the order they were first defined in, so the JSON mirror
/// reads back the way the user wrote it.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use xair_protocol::SnapshotIndex;

use crate::error::SceneMapError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneMap {
    entries: Vec<(String, SnapshotIndex)>,
}

impl SceneMap {
    /// Build from raw pairs, dropping blank names and out-of-range slots.
    /// A repeated name overwrites the slot but keeps its first position.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for (name, slot) in entries {
            let name = name.as_ref().trim();
            if name.is_empty() {
                warn!(slot, "Ignoring mapping with empty scene name");
                continue;
            }
            match SnapshotIndex::new(slot) {
                Ok(index) => map.insert(name, index),
                Err(e) => warn!(scene = %name, "Ignoring mapping: {}", e),
            }
        }
        map
    }

    fn insert(&mut self, name: &str, index: SnapshotIndex) {
        match self.entries.iter_mut().find(|(existing, _)| existing.as_str() == name) {
            Some(entry) => entry.1 = index,
            None => self.entries.push((name.to_string(), index)),
        }
    }

    /// Parse a JSON object of `"scene": slot`. Slots may be numbers,
    /// numeric strings or booleans (`true` is 1); anything else is skipped.
    pub fn from_json(raw: &str) -> Result<Self, SceneMapError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(object) = value else {
            return Err(SceneMapError::NotAnObject);
        };

        let pairs = object.iter().filter_map(|(name, slot)| {
            let parsed = match slot {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                Value::Bool(b) => Some(i64::from(*b)),
                _ => None,
            };
            if parsed.is_none() {
                debug!(scene = %name, value = %slot, "Skipping non-numeric snapshot");
            }
            parsed.map(|slot| (name.as_str(), slot))
        });

        Ok(Self::from_entries(pairs))
    }

    /// Pretty JSON mirror of the mapping (2-space indent).
    pub fn to_json(&self) -> String {
        let plain: Map<String, Value> = self
            .entries
            .iter()
            .map(|(name, index)| (name.clone(), Value::from(index.get())))
            .collect();
        serde_json::to_string_pretty(&Value::Object(plain)).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn get(&self, scene: &str) -> Option<SnapshotIndex> {
        let scene = scene.trim();
        self.entries
            .iter()
            .find(|(name, _)| name.as_str() == scene)
            .map(|(_, index)| *index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SnapshotIndex)> {
        self.entries.iter().map(|(name, index)| (name.as_str(), *index))
    }
}
