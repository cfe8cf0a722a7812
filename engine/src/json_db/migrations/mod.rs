// FICHIER : engine/src/json_db/migrations/mod.rs

//! Système de migrations de schémas

pub mod actions;
pub mod consistency;
pub mod expr;
pub mod migrator;
pub mod updater;
pub mod version;

pub use actions::{Action, BoundAction, RunContext};
pub use migrator::{AppliedMigration, MigrationState, Migrator, PartialMigration};
pub use version::{DbVersion, VersionRange};

use serde::{Deserialize, Serialize};

/// Migration déclarée : suite ordonnée d'actions.
#[derive(Debug)]
pub struct Migration {
    pub name: String,
    pub actions: Vec<Box<dyn Action>>,
}

impl Migration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            actions: Vec::new(),
        }
    }

    pub fn with_action<A: Action + 'static>(mut self, action: A) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Forme rejouable de chaque action, dans l'ordre.
    pub fn action_exprs(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.to_expr()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Pending,
    /// Interrompue : une partie de ses actions est appliquée.
    Partial,
    Applied,
}
