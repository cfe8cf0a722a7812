// FICHIER : engine/src/json_db/collections/manager.rs

use crate::json_db::collections::DocumentStore;
use crate::json_db::query::{Filter, UpdateOp};
use crate::json_db::storage::{file_storage, StorageEngine};
use crate::utils::json::id_of;
use crate::utils::prelude::*;
use async_trait::async_trait;

/// Store fichier : un dossier par collection, un fichier par document.
#[derive(Debug, Clone)]
pub struct CollectionsManager {
    pub storage: StorageEngine,
    pub space: String,
    pub db: String,
}

impl CollectionsManager {
    pub fn new(storage: StorageEngine, space: &str, db: &str) -> Self {
        Self {
            storage,
            space: space.to_string(),
            db: db.to_string(),
        }
    }

    pub fn from_config(config: &MigrateConfig) -> Self {
        Self::new(
            StorageEngine::new(config.json_db_config()),
            &config.space,
            &config.db,
        )
    }

    // --- MÉTHODES DE LECTURE ---

    pub async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        check_name(collection)?;
        check_name(id)?;
        Ok(self
            .storage
            .read_document(&self.space, &self.db, collection, id)
            .await?)
    }

    pub async fn list_all(&self, collection: &str) -> Result<Vec<Value>> {
        check_name(collection)?;
        Ok(self
            .storage
            .list_documents(&self.space, &self.db, collection)
            .await?)
    }

    async fn write(&self, collection: &str, id: &str, doc: &Value) -> Result<()> {
        self.storage
            .write_document(&self.space, &self.db, collection, id, doc)
            .await?;
        Ok(())
    }
}

/// Les noms (collections, identifiants) deviennent des chemins : on refuse
/// tout ce qui sortirait du dossier.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('.') || name.contains('/') || name.contains('\\') {
        return Err(AppError::Database(format!("Nom invalide pour le stockage : '{}'", name)));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for CollectionsManager {
    async fn server_version(&self) -> Result<String> {
        Ok(self.storage.config.server_version.clone())
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(file_storage::list_collection_names(&self.storage.config, &self.space, &self.db).await?)
    }

    async fn create_collection(&self, name: &str) -> Result<()> {
        check_name(name)?;
        file_storage::create_collection(&self.storage.config, &self.space, &self.db, name).await?;
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        check_name(name)?;
        self.storage.drop_collection(&self.space, &self.db, name).await?;
        Ok(())
    }

    async fn rename_collection(&self, from: &str, to: &str) -> Result<()> {
        check_name(from)?;
        check_name(to)?;
        self.storage
            .rename_collection(&self.space, &self.db, from, to)
            .await?;
        Ok(())
    }

    async fn find(&self, collection: &str, filter: &Filter, limit: Option<usize>) -> Result<Vec<Value>> {
        filter.validate()?;
        let docs = self.list_all(collection).await?;
        let matched = docs.into_iter().filter(|d| filter.evaluate(d));
        Ok(match limit {
            Some(n) => matched.take(n).collect(),
            None => matched.collect(),
        })
    }

    async fn save(&self, collection: &str, doc: &Value) -> Result<()> {
        check_name(collection)?;
        let id = id_of(doc).ok_or_else(|| {
            AppError::Database(format!(
                "Document sans {} exploitable dans '{}'",
                ID_FIELD, collection
            ))
        })?;
        check_name(&id)?;
        self.write(collection, &id, doc).await
    }

    async fn update_many(&self, collection: &str, filter: &Filter, ops: &[UpdateOp]) -> Result<u64> {
        let mut modified = 0u64;
        for mut doc in self.find(collection, filter, None).await? {
            let Some(id) = id_of(&doc) else {
                warn!("Document sans identifiant ignoré dans '{}'", collection);
                continue;
            };
            if UpdateOp::apply_all(ops, &mut doc)? {
                self.write(collection, &id, &doc).await?;
                modified += 1;
            }
        }
        debug!("update_many '{}' : {} document(s) modifié(s)", collection, modified);
        Ok(modified)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let mut deleted = 0u64;
        for doc in self.find(collection, filter, None).await? {
            if let Some(id) = id_of(&doc) {
                self.storage
                    .delete_document(&self.space, &self.db, collection, &id)
                    .await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
