// FICHIER : engine/src/utils/config.rs

use crate::json_db::storage::JsonDbConfig;
use crate::utils::env;
use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Constantes Système
pub const DEFAULT_SPACE: &str = "default";
pub const DEFAULT_DB: &str = "main";
pub const DEFAULT_METADATA_COLLECTION: &str = "_migrations";

pub const ENV_DATA_ROOT: &str = "DOCMIGRATE_DATA_ROOT";
pub const ENV_DB_VERSION: &str = "DOCMIGRATE_DB_VERSION";
pub const ENV_LOG_LEVEL: &str = "DOCMIGRATE_LOG_LEVEL";

/// Paramètres d'exécution du moteur de migration.
///
/// Chargée une seule fois au démarrage puis passée par référence :
/// aucune valeur n'est modifiée pendant une migration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrateConfig {
    pub data_root: PathBuf,

    #[serde(default = "default_space")]
    pub space: String,
    #[serde(default = "default_db")]
    pub db: String,

    /// Collection de suivi (historique des actions + schéma courant)
    #[serde(default = "default_metadata_collection")]
    pub metadata_collection: String,

    /// Version de base déclarée. Si absente, on interroge le store.
    #[serde(default)]
    pub db_version: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

// --- HELPERS SERDE ---

fn default_space() -> String {
    DEFAULT_SPACE.to_string()
}
fn default_db() -> String {
    DEFAULT_DB.to_string()
}
fn default_metadata_collection() -> String {
    DEFAULT_METADATA_COLLECTION.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl MigrateConfig {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            space: default_space(),
            db: default_db(),
            metadata_collection: default_metadata_collection(),
            db_version: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }

    /// Charge un fichier JSON puis applique les surcharges d'environnement.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Lecture impossible de {:?} : {}", path, e))
        })?;
        let mut config: MigrateConfig = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Format invalide ({:?}) : {}", path, e)))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Configuration construite uniquement depuis l'environnement.
    pub fn from_env() -> Result<Self> {
        let root = env::get_optional(ENV_DATA_ROOT).ok_or_else(|| {
            AppError::Config(format!("Variable d'environnement manquante : {}", ENV_DATA_ROOT))
        })?;
        let mut config = Self::new(root);
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(root) = env::get_optional(ENV_DATA_ROOT) {
            self.data_root = PathBuf::from(root);
        }
        if let Some(version) = env::get_optional(ENV_DB_VERSION) {
            self.db_version = Some(version);
        }
        self.log_level = env::get_or(ENV_LOG_LEVEL, &self.log_level);
    }

    fn validate(&self) -> Result<()> {
        if self.space.is_empty() || self.db.is_empty() {
            return Err(AppError::Config(
                "'space' et 'db' ne peuvent pas être vides".to_string(),
            ));
        }
        if self.metadata_collection.is_empty() {
            return Err(AppError::Config(
                "'metadata_collection' ne peut pas être vide".to_string(),
            ));
        }
        Ok(())
    }

    pub fn json_db_config(&self) -> JsonDbConfig {
        JsonDbConfig::new(self.data_root.clone())
    }
}
