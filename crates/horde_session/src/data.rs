//! Static data tables
//!
//! Read-only definitions loaded once at match start from JSON arrays.

use horde_combat::FirearmDefinition;
use horde_core::{HordeError, Result, StaticData};
use horde_quest::QuestData;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// A definition addressable by a symbolic id
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for QuestData {
    fn key(&self) -> &str {
        &self.quest_id
    }
}

impl Keyed for FirearmDefinition {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Definitions by id
#[derive(Debug, Clone)]
pub struct DataTable<T> {
    rows: BTreeMap<String, T>,
}

impl<T> Default for DataTable<T> {
    fn default() -> Self {
        Self { rows: BTreeMap::new() }
    }
}

impl<T: Keyed> DataTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows. Rows without an id are skipped and later
    /// duplicates replace earlier ones.
    pub fn from_rows(rows: impl IntoIterator<Item = T>) -> Self {
        let mut table = Self::new();
        for row in rows {
            table.insert(row);
        }
        table
    }

    pub fn insert(&mut self, row: T) -> bool {
        if row.key().is_empty() {
            log::warn!("Skipping data row without an id");
            return false;
        }
        if self.rows.contains_key(row.key()) {
            log::warn!("Duplicate data row '{}', keeping the later one", row.key());
        }
        self.rows.insert(row.key().to_string(), row);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

impl<T: Keyed + DeserializeOwned> DataTable<T> {
    /// Parse a JSON array of rows
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<T> = serde_json::from_str(json).map_err(|e| HordeError::ConfigParse(e.to_string()))?;
        Ok(Self::from_rows(rows))
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&content)?;
        log::info!("Loaded {} rows from {}", table.len(), path.display());
        Ok(table)
    }
}

impl<T> StaticData<T> for DataTable<T> {
    fn find(&self, id: &str) -> Option<&T> {
        self.rows.get(id)
    }

    fn ids(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_combat::FireMode;

    #[test]
    fn test_quest_table_from_json() {
        let table: DataTable<QuestData> = DataTable::from_json_str(
            r#"[
                {
                    "quest_id": "FindKey",
                    "name": "Find the key",
                    "objectives": [
                        { "objective_id": "key", "objective_type": "CollectItem", "target_item_id": "Key_Red" }
                    ],
                    "follow_up_quest_id": "OpenDoor"
                },
                { "quest_id": "OpenDoor" }
            ]"#,
        )
        .unwrap();

        assert_eq!(table.ids(), vec!["FindKey".to_string(), "OpenDoor".to_string()]);
        let quest = table.find("FindKey").unwrap();
        assert_eq!(quest.objectives[0].target_count, 1);
        assert_eq!(quest.completion_points, 500);
    }

    #[test]
    fn test_miss_returns_default() {
        let table: DataTable<FirearmDefinition> =
            DataTable::from_json_str(r#"[{ "id": "m4", "fire_modes": ["Single", "Full"] }]"#).unwrap();

        assert!(table.find("ak47").is_none());
        assert_eq!(table.find_or_default("ak47").id, "");
        assert_eq!(table.find("m4").unwrap().fire_modes, vec![FireMode::Single, FireMode::Full]);
    }

    #[test]
    fn test_rows_without_id_skipped() {
        let table: DataTable<FirearmDefinition> = DataTable::from_json_str(r#"[{ "id": "" }, { "id": "pistol" }]"#).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            DataTable::<QuestData>::from_json_str("{ not json"),
            Err(HordeError::ConfigParse(_))
        ));
    }
}
