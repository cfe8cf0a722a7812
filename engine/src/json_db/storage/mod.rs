// FICHIER : engine/src/json_db/storage/mod.rs

pub mod cache;
pub mod file_storage;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Version annoncée par le store fichier (niveau de compatibilité des opérateurs).
pub const ENGINE_VERSION: &str = "4.4.0";

// --- CONFIGURATION ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDbConfig {
    pub data_root: PathBuf,
    #[serde(default = "default_server_version")]
    pub server_version: String,
}

fn default_server_version() -> String {
    ENGINE_VERSION.to_string()
}

impl JsonDbConfig {
    pub fn new(data_root: PathBuf) -> Self {
        Self {
            data_root,
            server_version: default_server_version(),
        }
    }

    /// Simule un serveur d'une autre version (tests de compatibilité).
    pub fn with_server_version(mut self, version: &str) -> Self {
        self.server_version = version.to_string();
        self
    }

    pub fn db_root(&self, space: &str, db: &str) -> PathBuf {
        self.data_root.join(space).join(db)
    }

    pub fn db_collections_root(&self, space: &str, db: &str) -> PathBuf {
        self.db_root(space, db).join("collections")
    }

    pub fn db_collection_path(&self, space: &str, db: &str, collection: &str) -> PathBuf {
        self.db_collections_root(space, db).join(collection)
    }
}

// --- MOTEUR DE STOCKAGE ---

#[derive(Debug, Clone)]
pub struct StorageEngine {
    pub config: JsonDbConfig,
    pub cache: cache::Cache<String, Value>,
}

fn cache_key(space: &str, db: &str, collection: &str, id: &str) -> String {
    format!("{}/{}/{}/{}", space, db, collection, id)
}

fn collection_prefix(space: &str, db: &str, collection: &str) -> String {
    format!("{}/{}/{}/", space, db, collection)
}

impl StorageEngine {
    pub fn new(config: JsonDbConfig) -> Self {
        Self {
            config,
            cache: cache::Cache::new(1000),
        }
    }

    /// Écrit un document (Disque + Cache)
    pub async fn write_document(
        &self,
        space: &str,
        db: &str,
        collection: &str,
        id: &str,
        doc: &Value,
    ) -> Result<()> {
        file_storage::write_document(&self.config, space, db, collection, id, doc).await?;
        self.cache
            .put(cache_key(space, db, collection, id), doc.clone());
        Ok(())
    }

    /// Lit un document (Cache Hit d'abord, sinon Disque)
    pub async fn read_document(
        &self,
        space: &str,
        db: &str,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>> {
        let key = cache_key(space, db, collection, id);

        if let Some(doc) = self.cache.get(&key) {
            return Ok(Some(doc));
        }

        let doc_opt = file_storage::read_document(&self.config, space, db, collection, id).await?;
        if let Some(doc) = &doc_opt {
            self.cache.put(key, doc.clone());
        }
        Ok(doc_opt)
    }

    pub async fn delete_document(
        &self,
        space: &str,
        db: &str,
        collection: &str,
        id: &str,
    ) -> Result<()> {
        file_storage::delete_document(&self.config, space, db, collection, id).await?;
        self.cache.remove(&cache_key(space, db, collection, id));
        Ok(())
    }

    /// Tous les documents d'une collection, dans l'ordre des identifiants.
    pub async fn list_documents(&self, space: &str, db: &str, collection: &str) -> Result<Vec<Value>> {
        let ids = file_storage::list_document_ids(&self.config, space, db, collection).await?;
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.read_document(space, db, collection, &id).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    pub async fn drop_collection(&self, space: &str, db: &str, collection: &str) -> Result<()> {
        file_storage::drop_collection(&self.config, space, db, collection).await?;
        let prefix = collection_prefix(space, db, collection);
        self.cache.remove_where(|k| k.starts_with(&prefix));
        Ok(())
    }

    pub async fn rename_collection(&self, space: &str, db: &str, from: &str, to: &str) -> Result<()> {
        file_storage::rename_collection(&self.config, space, db, from, to).await?;
        let prefix = collection_prefix(space, db, from);
        self.cache.remove_where(|k| k.starts_with(&prefix));
        Ok(())
    }
}
