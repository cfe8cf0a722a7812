// FICHIER : engine/src/utils/error.rs

use serde::Serialize;
use std::fmt;
use std::io;

/// Type de résultat standard du moteur de migration.
pub type Result<T> = std::result::Result<T, AppError>;

/// Sens d'exécution d'une action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Enumération centrale des erreurs du moteur.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Document ou champ absent (ou déjà présent) dans le schéma courant.
    /// Levée au `prepare`, avant toute mutation.
    #[error("Erreur de schéma : {0}")]
    Schema(String),

    /// Les données en base violent un invariant requis par l'action.
    #[error("Incohérence des données : {0}")]
    Inconsistency(String),

    /// Action mal construite (ex: RunCode sans aucune fonction).
    #[error("Action invalide : {0}")]
    Action(String),

    /// Défaut d'implémentation, jamais réessayable.
    #[error("Violation de contrat : {0}")]
    Contract(String),

    #[error("Historique des migrations incohérent : {0}")]
    History(String),

    #[error(
        "Migration '{migration}' interrompue ({direction}) à l'action #{position} {action} : {source}"
    )]
    Migration {
        migration: String,
        position: usize,
        action: String,
        direction: Direction,
        #[source]
        source: Box<AppError>,
    },

    #[error("Erreur de configuration : {0}")]
    Config(String),

    #[error("Erreur Base de Données : {0}")]
    Database(String),

    #[error("Introuvable : {0}")]
    NotFound(String),

    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] io::Error),

    #[error("Erreur de sérialisation : {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erreur Système : {0}")]
    System(#[from] anyhow::Error),
}

impl AppError {
    /// Indique si l'opérateur peut relancer après correction (migration ou données).
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Schema(_)
            | AppError::Inconsistency(_)
            | AppError::History(_)
            | AppError::Database(_) => true,
            AppError::Migration { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Erreur d'origine, sans l'enveloppe du runner.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Migration { source, .. } => source.root(),
            other => other,
        }
    }
}

// Sérialisation en simple chaîne (rapports JSON, historique)
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

// Permet de faire : return Err("Mon erreur".into());
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::System(anyhow::anyhow!(s))
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::System(anyhow::anyhow!(s.to_string()))
    }
}
