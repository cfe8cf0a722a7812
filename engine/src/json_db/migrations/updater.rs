// FICHIER : engine/src/json_db/migrations/updater.rs

//! Updaters : appliquent un changement structurel unique à tous les documents
//! d'une collection pour un champ donné.
//!
//! - [`DocumentUpdater`] : opérateurs natifs du store, un `update_many` par changement.
//! - [`FallbackUpdater`] : réécriture document par document, pour les serveurs
//!   qui ne supportent pas l'opérateur natif.
//!
//! [`version_gate`] choisit l'un ou l'autre selon la version connue de la base.

use super::version::{DbVersion, VersionRange};
use crate::json_db::collections::Collection;
use crate::json_db::query::{Filter, UpdateOp, ValueKind};
use crate::json_db::schema::FieldType;
use crate::utils::json::{get_path, remove_path, set_path};
use crate::utils::prelude::*;
use async_trait::async_trait;

#[async_trait]
pub trait FieldUpdater: Send + Sync {
    fn collection(&self) -> &Collection;

    /// Clé de stockage visée.
    fn db_field(&self) -> &str;

    fn is_fallback(&self) -> bool {
        false
    }

    /// Déplace la clé vers `new_db_field` sur chaque document qui la porte.
    async fn rename_to(&self, new_db_field: &str) -> Result<u64>;

    /// Pose `value` sur les documents où la clé est absente.
    async fn set_missing(&self, value: &Value) -> Result<u64>;

    async fn unset(&self) -> Result<u64>;

    /// Convertit les valeurs non nulles vers `target`.
    async fn convert_to(&self, target: FieldType) -> Result<u64>;
}

fn present_not_null(db_field: &str) -> Filter {
    Filter::and(vec![
        Filter::exists(db_field),
        Filter::negate(Filter::type_is(db_field, &[ValueKind::Null])),
    ])
}

// --- UPDATER PRINCIPAL ---

#[derive(Debug, Clone)]
pub struct DocumentUpdater {
    collection: Collection,
    db_field: String,
}

impl DocumentUpdater {
    pub fn new(collection: Collection, db_field: &str) -> Self {
        Self {
            collection,
            db_field: db_field.to_string(),
        }
    }
}

#[async_trait]
impl FieldUpdater for DocumentUpdater {
    fn collection(&self) -> &Collection {
        &self.collection
    }

    fn db_field(&self) -> &str {
        &self.db_field
    }

    async fn rename_to(&self, new_db_field: &str) -> Result<u64> {
        let ops = [UpdateOp::Rename {
            from: self.db_field.clone(),
            to: new_db_field.to_string(),
        }];
        self.collection
            .update_many(&Filter::exists(&self.db_field), &ops)
            .await
    }

    async fn set_missing(&self, value: &Value) -> Result<u64> {
        let ops = [UpdateOp::Set {
            field: self.db_field.clone(),
            value: value.clone(),
        }];
        self.collection
            .update_many(&Filter::missing(&self.db_field), &ops)
            .await
    }

    async fn unset(&self) -> Result<u64> {
        let ops = [UpdateOp::Unset {
            field: self.db_field.clone(),
        }];
        self.collection
            .update_many(&Filter::exists(&self.db_field), &ops)
            .await
    }

    async fn convert_to(&self, target: FieldType) -> Result<u64> {
        let ops = [UpdateOp::Convert {
            field: self.db_field.clone(),
            to: target,
        }];
        self.collection
            .update_many(&present_not_null(&self.db_field), &ops)
            .await
    }
}

// --- UPDATER DE REPLI ---

/// Même sémantique que [`DocumentUpdater`], par lecture/modification/écriture.
#[derive(Debug, Clone)]
pub struct FallbackUpdater {
    inner: DocumentUpdater,
}

impl FallbackUpdater {
    pub fn new(inner: DocumentUpdater) -> Self {
        Self { inner }
    }

    async fn rewrite<F>(&self, filter: &Filter, mut mutate: F) -> Result<u64>
    where
        F: FnMut(&mut Value) -> Result<bool> + Send,
    {
        let collection = &self.inner.collection;
        let mut modified = 0u64;
        for mut doc in collection.find(filter, None).await? {
            if mutate(&mut doc)? {
                collection.save(&doc).await?;
                modified += 1;
            }
        }
        Ok(modified)
    }
}

#[async_trait]
impl FieldUpdater for FallbackUpdater {
    fn collection(&self) -> &Collection {
        &self.inner.collection
    }

    fn db_field(&self) -> &str {
        &self.inner.db_field
    }

    fn is_fallback(&self) -> bool {
        true
    }

    async fn rename_to(&self, new_db_field: &str) -> Result<u64> {
        let from = self.inner.db_field.as_str();
        self.rewrite(&Filter::exists(from), |doc| {
            Ok(match remove_path(doc, from) {
                Some(value) => {
                    set_path(doc, new_db_field, value);
                    true
                }
                None => false,
            })
        })
        .await
    }

    async fn set_missing(&self, value: &Value) -> Result<u64> {
        let field = self.inner.db_field.as_str();
        self.rewrite(&Filter::missing(field), |doc| {
            Ok(set_path(doc, field, value.clone()))
        })
        .await
    }

    async fn unset(&self) -> Result<u64> {
        let field = self.inner.db_field.as_str();
        self.rewrite(&Filter::exists(field), |doc| Ok(remove_path(doc, field).is_some()))
            .await
    }

    async fn convert_to(&self, target: FieldType) -> Result<u64> {
        let field = self.inner.db_field.as_str();
        self.rewrite(&present_not_null(field), |doc| {
            let Some(current) = get_path(doc, field) else {
                return Ok(false);
            };
            let converted = target.convert_value(current).ok_or_else(|| {
                AppError::Database(format!(
                    "Conversion impossible de '{}' en {} : {}",
                    field, target, current
                ))
            })?;
            Ok(set_path(doc, field, converted))
        })
        .await
    }
}

// --- SÉLECTION PAR VERSION ---

/// Renvoie l'updater principal si `version` est dans `range`, sinon le repli.
pub fn version_gate(
    range: &VersionRange,
    version: &DbVersion,
    updater: DocumentUpdater,
) -> Box<dyn FieldUpdater> {
    if range.contains(version) {
        debug!(
            "Updater natif pour '{}.{}' (version {} dans {})",
            updater.collection.name(),
            updater.db_field,
            version,
            range
        );
        Box::new(updater)
    } else {
        warn!(
            "⚠️ Version {} hors de {} : mode compatibilité pour '{}.{}'",
            version,
            range,
            updater.collection.name(),
            updater.db_field
        );
        Box::new(FallbackUpdater::new(updater))
    }
}
