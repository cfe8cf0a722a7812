// FICHIER : engine/src/json_db/collections/mod.rs

//! Frontière avec le store de documents.
//!
//! Le moteur de migration ne parle au stockage qu'à travers [`DocumentStore`].
//! [`Database`] et [`Collection`] sont des poignées légères (clonables) qui
//! transportent le store partagé ; la version serveur est figée au `connect`.

pub mod manager;

use crate::json_db::migrations::version::DbVersion;
use crate::json_db::query::{Filter, UpdateOp};
use crate::utils::prelude::*;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Opérations minimales attendues d'un store de documents.
/// Les erreurs du store remontent telles quelles.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Version annoncée par le serveur (ex: "4.4.0").
    async fn server_version(&self) -> Result<String>;

    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Idempotent : une collection existante n'est pas une erreur.
    async fn create_collection(&self, name: &str) -> Result<()>;

    async fn drop_collection(&self, name: &str) -> Result<()>;

    async fn rename_collection(&self, from: &str, to: &str) -> Result<()>;

    async fn find(&self, collection: &str, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>>;

    /// Upsert par `_id`.
    async fn save(&self, collection: &str, doc: &Value) -> Result<()>;

    /// Applique les opérateurs aux documents filtrés. Renvoie le nombre modifié.
    async fn update_many(&self, collection: &str, filter: &Filter, ops: &[UpdateOp]) -> Result<u64>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64>;
}

// --- BASE DE DONNÉES ---

#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
    version: DbVersion,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Établit la version une fois pour toutes : surcharge de config, sinon serveur.
    pub async fn connect(store: Arc<dyn DocumentStore>, config: &MigrateConfig) -> Result<Self> {
        let raw = match &config.db_version {
            Some(forced) => {
                info!("🔧 Version de base forcée par la configuration : {}", forced);
                forced.clone()
            }
            None => store.server_version().await?,
        };
        let version = DbVersion::parse(&raw)?;
        debug!("Connexion établie (version {})", version);
        Ok(Self { store, version })
    }

    pub fn with_version(store: Arc<dyn DocumentStore>, version: DbVersion) -> Self {
        Self { store, version }
    }

    pub fn version(&self) -> &DbVersion {
        &self.version
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            name: name.to_string(),
            store: self.store.clone(),
        }
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        self.store.list_collections().await
    }

    pub async fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.store.list_collections().await?.iter().any(|c| c == name))
    }
}

// --- COLLECTION ---

/// Poignée sur une collection nommée.
#[derive(Clone)]
pub struct Collection {
    name: String,
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create(&self) -> Result<()> {
        self.store.create_collection(&self.name).await
    }

    pub async fn drop(&self) -> Result<()> {
        self.store.drop_collection(&self.name).await
    }

    /// Renomme la collection côté store ; la poignée courante garde l'ancien nom.
    pub async fn rename(&self, to: &str) -> Result<Collection> {
        self.store.rename_collection(&self.name, to).await?;
        Ok(Collection {
            name: to.to_string(),
            store: self.store.clone(),
        })
    }

    pub async fn find(&self, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>> {
        self.store.find(&self.name, filter, limit).await
    }

    pub async fn find_all(&self) -> Result<Vec<Value>> {
        self.store.find(&self.name, &Filter::All, None).await
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<Value>> {
        Ok(self.store.find(&self.name, filter, Some(1)).await?.into_iter().next())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.find_one(&Filter::All).await?.is_none())
    }

    pub async fn save(&self, doc: &Value) -> Result<()> {
        self.store.save(&self.name, doc).await
    }

    pub async fn update_many(&self, filter: &Filter, ops: &[UpdateOp]) -> Result<u64> {
        self.store.update_many(&self.name, filter, ops).await
    }

    pub async fn delete_many(&self, filter: &Filter) -> Result<u64> {
        self.store.delete_many(&self.name, filter).await
    }
}
