// FICHIER : engine/src/json_db/migrations/version.rs

use crate::utils::prelude::*;
use std::cmp::Ordering;
use std::fmt;

/// Version du serveur de base (ex: "3.6", "4.2.1").
/// Les composants absents valent 0 : "4.2" == "4.2.0".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbVersion {
    parts: Vec<u32>,
    raw: String,
}

impl DbVersion {
    pub fn parse(version_str: &str) -> Result<Self> {
        let trimmed = version_str.trim();
        if trimmed.is_empty() {
            return Err(AppError::Config("Version de base vide".to_string()));
        }

        let mut parts = Vec::new();
        for segment in trimmed.split('.') {
            let value: u32 = segment.parse().map_err(|_| {
                AppError::Config(format!(
                    "Le format de version '{}' est invalide (composant '{}')",
                    version_str, segment
                ))
            })?;
            parts.push(value);
        }

        Ok(Self {
            parts,
            raw: trimmed.to_string(),
        })
    }

    fn component(&self, i: usize) -> u32 {
        self.parts.get(i).copied().unwrap_or(0)
    }
}

// Comparaison composant par composant, en complétant par des zéros
impl Ord for DbVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for DbVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DbVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DbVersion {}

impl fmt::Display for DbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

// --- PLAGES DE VERSIONS ---

/// Plage `[min, max)`. Au moins une borne est toujours présente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<DbVersion>,
    max: Option<DbVersion>,
}

impl VersionRange {
    /// Versions `>= min`.
    pub fn since(min: &str) -> Result<Self> {
        Ok(Self {
            min: Some(DbVersion::parse(min)?),
            max: None,
        })
    }

    /// Versions `< max`.
    pub fn until(max: &str) -> Result<Self> {
        Ok(Self {
            min: None,
            max: Some(DbVersion::parse(max)?),
        })
    }

    pub fn between(min: &str, max: &str) -> Result<Self> {
        Ok(Self {
            min: Some(DbVersion::parse(min)?),
            max: Some(DbVersion::parse(max)?),
        })
    }

    /// Construction depuis des bornes optionnelles (ex: configuration).
    pub fn from_bounds(min: Option<&str>, max: Option<&str>) -> Result<Self> {
        match (min, max) {
            (None, None) => Err(AppError::Contract(
                "Une plage de versions exige au moins une borne".to_string(),
            )),
            (Some(min), None) => Self::since(min),
            (None, Some(max)) => Self::until(max),
            (Some(min), Some(max)) => Self::between(min, max),
        }
    }

    pub fn contains(&self, version: &DbVersion) -> bool {
        let above_min = self.min.as_ref().map_or(true, |min| version >= min);
        let below_max = self.max.as_ref().map_or(true, |max| version < max);
        above_min && below_max
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, "[{}, {})", min, max),
            (Some(min), None) => write!(f, ">= {}", min),
            (None, Some(max)) => write!(f, "< {}", max),
            (None, None) => write!(f, "*"),
        }
    }
}

// ============================================================================
// TESTS UNITAIRES
// ============================================================================
