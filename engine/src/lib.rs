// FICHIER : engine/src/lib.rs

//! Moteur de migration de schéma pour base de documents JSON.
//!
//! Les migrations sont des suites ordonnées d'actions réversibles ; le schéma
//! attendu est suivi d'un snapshot à l'autre et persisté dans le store.

pub mod json_db;
pub mod utils;

pub use json_db::collections::manager::CollectionsManager;
pub use json_db::collections::{Collection, Database, DocumentStore};
pub use json_db::migrations::{Migration, MigrationStatus, Migrator};
pub use json_db::schema::{DocumentSchema, FieldSchema, FieldType, Schema};
pub use utils::{AppError, MigrateConfig, Result};
