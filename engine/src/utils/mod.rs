// FICHIER : engine/src/utils/mod.rs

// =========================================================================
//  Foundation Layer : erreurs, configuration, logs, accès JSON
// =========================================================================

pub mod config;
pub mod env;
pub mod error;
pub mod json;
pub mod logger;

/// **Le Prélude** : À utiliser via `use crate::utils::prelude::*;`
pub mod prelude {
    pub use super::config::MigrateConfig;
    pub use super::error::{AppError, Direction, Result};
    pub use super::json::{json, Map, Value, ID_FIELD};
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, instrument, warn};
}

// --> Config & Erreurs
pub use config::MigrateConfig;
pub use error::{AppError, Result};
pub use logger::init_logging;

// --> Async Runtime
pub use std::future::Future;
pub use std::pin::Pin;

/// Future boxée, utilisée aux frontières dynamiques (code utilisateur).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
