// FICHIER : engine/src/json_db/storage/file_storage.rs

//! Primitives disque : un dossier par collection, un fichier JSON par document.
//! Aucune logique de requête ici, uniquement persistance et I/O.

use crate::json_db::storage::JsonDbConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

fn doc_file(config: &JsonDbConfig, space: &str, db: &str, collection: &str, id: &str) -> std::path::PathBuf {
    config
        .db_collection_path(space, db, collection)
        .join(format!("{}.json", id))
}

pub async fn create_collection(config: &JsonDbConfig, space: &str, db: &str, collection: &str) -> Result<()> {
    let col_path = config.db_collection_path(space, db, collection);
    fs::create_dir_all(&col_path)
        .await
        .with_context(|| format!("Création de la collection {:?} impossible", col_path))?;
    Ok(())
}

pub async fn drop_collection(config: &JsonDbConfig, space: &str, db: &str, collection: &str) -> Result<()> {
    let col_path = config.db_collection_path(space, db, collection);
    if col_path.exists() {
        fs::remove_dir_all(&col_path)
            .await
            .with_context(|| format!("Suppression de la collection {:?} impossible", col_path))?;
    }
    Ok(())
}

pub async fn rename_collection(
    config: &JsonDbConfig,
    space: &str,
    db: &str,
    from: &str,
    to: &str,
) -> Result<()> {
    let from_path = config.db_collection_path(space, db, from);
    let to_path = config.db_collection_path(space, db, to);

    if !from_path.exists() {
        // Collection jamais matérialisée : rien à déplacer
        return Ok(());
    }
    if to_path.exists() {
        anyhow::bail!("La collection cible '{}' existe déjà", to);
    }
    fs::rename(&from_path, &to_path)
        .await
        .with_context(|| format!("Renommage {:?} -> {:?} impossible", from_path, to_path))?;
    Ok(())
}

pub async fn write_document(
    config: &JsonDbConfig,
    space: &str,
    db: &str,
    collection: &str,
    id: &str,
    doc: &Value,
) -> Result<()> {
    let file_path = doc_file(config, space, db, collection, id);
    let content = serde_json::to_string_pretty(doc)?;
    atomic_write(file_path, content.as_bytes()).await?;
    Ok(())
}

pub async fn read_document(
    config: &JsonDbConfig,
    space: &str,
    db: &str,
    collection: &str,
    id: &str,
) -> Result<Option<Value>> {
    let file_path = doc_file(config, space, db, collection, id);

    if !file_path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&file_path)
        .await
        .with_context(|| format!("Lecture de {:?} impossible", file_path))?;
    let doc = serde_json::from_str(&content)
        .with_context(|| format!("Document corrompu : {:?}", file_path))?;
    Ok(Some(doc))
}

pub async fn delete_document(
    config: &JsonDbConfig,
    space: &str,
    db: &str,
    collection: &str,
    id: &str,
) -> Result<()> {
    let file_path = doc_file(config, space, db, collection, id);
    if file_path.exists() {
        fs::remove_file(file_path).await?;
    }
    Ok(())
}

/// Identifiants des documents d'une collection, triés.
pub async fn list_document_ids(
    config: &JsonDbConfig,
    space: &str,
    db: &str,
    collection: &str,
) -> Result<Vec<String>> {
    let root = config.db_collection_path(space, db, collection);
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    let mut entries = fs::read_dir(&root).await?;
    while let Some(e) = entries.next_entry().await? {
        let p = e.path();
        if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("json") {
            if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                out.push(stem.to_string());
            }
        }
    }
    out.sort();
    Ok(out)
}

pub async fn list_collection_names(config: &JsonDbConfig, space: &str, db: &str) -> Result<Vec<String>> {
    let root = config.db_collections_root(space, db);
    let mut out = Vec::new();
    if !root.exists() {
        return Ok(out);
    }
    let mut entries = fs::read_dir(&root).await?;
    while let Some(e) = entries.next_entry().await? {
        if e.file_type().await?.is_dir() {
            if let Ok(name) = e.file_name().into_string() {
                out.push(name);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Écriture atomique sécurisée (write -> sync -> rename)
pub async fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content).await?;
        // On force l'écriture physique sur le disque
        file.sync_all().await?;
    }

    fs::rename(&temp_path, path).await?;
    Ok(())
}
