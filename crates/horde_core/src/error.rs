//! Error types shared by the horde crates

use thiserror::Error;

/// Errors for missing references and configuration problems.
///
/// Gameplay preconditions (no ammo, quest already active, attack on cooldown)
/// are not errors; those operations simply report that nothing happened.
#[derive(Debug, Error)]
pub enum HordeError {
    /// Quest id not present in the template table
    #[error("Quest not found: {0}")]
    QuestNotFound(String),

    /// Objective id not present in the quest
    #[error("Objective '{objective}' not found in quest '{quest}'")]
    ObjectiveNotFound { quest: String, objective: String },

    /// Agent handle is stale or was never allocated
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Spawner has no class configured
    #[error("Spawner '{0}' has no spawn class configured")]
    MissingSpawnClass(String),

    /// Static data lookup miss
    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config or data parse failure
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// I/O failure while loading configuration or data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for horde operations
pub type Result<T> = std::result::Result<T, HordeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HordeError::ObjectiveNotFound {
            quest: "FindKey".into(),
            objective: "pickup".into(),
        };
        assert_eq!(err.to_string(), "Objective 'pickup' not found in quest 'FindKey'");
    }

    #[test]
    fn test_io_conversion() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.toml")?)
        }
        assert!(matches!(read(), Err(HordeError::Io(_))));
    }
}
