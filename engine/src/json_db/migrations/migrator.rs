// FICHIER : engine/src/json_db/migrations/migrator.rs

use super::actions::BoundAction;
use super::{Action, Migration, MigrationStatus};
use crate::json_db::collections::{Collection, Database};
use crate::json_db::query::Filter;
use crate::json_db::schema::Schema;
use crate::utils::prelude::*;

use chrono::Utc;
use std::collections::HashSet;
use tracing::Instrument;
use uuid::Uuid;

const SCHEMA_RECORD_ID: &str = "__schema__";
const PROGRESS_RECORD_ID: &str = "__progress__";
const KIND_MIGRATION: &str = "migration";
const KIND_SCHEMA: &str = "schema";
const KIND_PROGRESS: &str = "progress";

/// Enregistrement d'une migration appliquée (collection de suivi).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedMigration {
    #[serde(rename = "_id")]
    pub name: String,
    pub order: usize,
    pub applied_at: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Migration interrompue : ses `completed` premières actions sont appliquées,
/// les suivantes non. Elle n'apparaît pas dans l'historique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialMigration {
    pub migration: String,
    pub order: usize,
    pub completed: usize,
}

/// État persisté : historique ordonné, migration interrompue éventuelle et
/// dernier snapshot écrit.
#[derive(Debug, Clone, Default)]
pub struct MigrationState {
    pub applied: Vec<AppliedMigration>,
    pub partial: Option<PartialMigration>,
    pub schema: Option<Schema>,
}

pub struct Migrator {
    db: Database,
    metadata: Collection,
}

impl Migrator {
    pub fn new(db: Database, config: &MigrateConfig) -> Self {
        Self::with_metadata_collection(db, &config.metadata_collection)
    }

    pub fn with_metadata_collection(db: Database, name: &str) -> Self {
        let metadata = db.collection(name);
        Self { db, metadata }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Initialise la collection de suivi des migrations
    pub async fn init(&self) -> Result<()> {
        if !self.db.has_collection(self.metadata.name()).await? {
            info!("⚙️ Création de la collection de suivi '{}'", self.metadata.name());
            self.metadata.create().await?;
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(metadata = %self.metadata.name()))]
    pub async fn load_state(&self) -> Result<MigrationState> {
        let mut applied = Vec::new();
        for record in self
            .metadata
            .find(&Filter::eq("kind", json!(KIND_MIGRATION)), None)
            .await?
        {
            applied.push(serde_json::from_value::<AppliedMigration>(record)?);
        }
        applied.sort_by_key(|m| m.order);

        let partial = match self.system_record(PROGRESS_RECORD_ID).await? {
            Some(record) => Some(serde_json::from_value::<PartialMigration>(record)?),
            None => None,
        };
        // Reliquat d'une migration enregistrée entre-temps
        let partial = partial.filter(|p| p.order >= applied.len());

        let schema = match self
            .system_record(SCHEMA_RECORD_ID)
            .await?
            .and_then(|record| record.get("schema").cloned())
        {
            Some(raw) => Some(serde_json::from_value(raw)?),
            None => None,
        };

        Ok(MigrationState {
            applied,
            partial,
            schema,
        })
    }

    pub async fn status(&self, declared: &[Migration]) -> Result<Vec<(String, MigrationStatus)>> {
        let state = self.load_state().await?;
        check_history(&state, declared)?;
        Ok(declared
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let status = if i < state.applied.len() {
                    MigrationStatus::Applied
                } else if state.partial.as_ref().is_some_and(|p| p.order == i) {
                    MigrationStatus::Partial
                } else {
                    MigrationStatus::Pending
                };
                (m.name.clone(), status)
            })
            .collect())
    }

    /// Applique les migrations en attente jusqu'à `target` inclus (toutes si `None`).
    /// Une migration interrompue reprend après sa dernière action réussie.
    /// Renvoie les noms des migrations appliquées.
    pub async fn migrate_forward(&self, declared: &[Migration], target: Option<&str>) -> Result<Vec<String>> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("migration_run", %run_id, direction = %Direction::Forward);
        self.forward_walk(declared, target).instrument(span).await
    }

    /// Annule les migrations appliquées, de la plus récente jusqu'à `target` exclu
    /// (toutes si `None`), en commençant par une éventuelle migration interrompue.
    /// Renvoie les noms des migrations annulées.
    pub async fn migrate_backward(&self, declared: &[Migration], target: Option<&str>) -> Result<Vec<String>> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("migration_run", %run_id, direction = %Direction::Backward);
        self.backward_walk(declared, target).instrument(span).await
    }

    // --- PARCOURS ---

    async fn forward_walk(&self, declared: &[Migration], target: Option<&str>) -> Result<Vec<String>> {
        self.init().await?;
        let state = self.load_state().await?;
        check_history(&state, declared)?;

        let applied_count = state.applied.len();
        let end = match target_index(declared, target)? {
            Some(i) => i + 1,
            None => declared.len(),
        };

        let (mut schema, _) = replay(&declared[..applied_count])?;
        let mut resume_from = 0;
        if let Some(partial) = &state.partial {
            let (prefix, _) = replay_actions(&declared[partial.order], schema, partial.completed)?;
            schema = prefix;
            resume_from = partial.completed;
        }
        if state.schema.as_ref().is_some_and(|persisted| persisted != &schema) {
            warn!("⚠️ Le snapshot persisté diverge de l'historique rejoué : l'historique fait foi");
        }

        if end <= applied_count {
            info!("✅ Aucune migration à appliquer");
            return Ok(Vec::new());
        }

        let mut applied = Vec::new();
        for (order, migration) in declared.iter().enumerate().take(end).skip(applied_count) {
            let skip = if order == applied_count { resume_from } else { 0 };
            if skip > 0 {
                info!("🔁 Reprise de la migration '{}' après l'action #{}", migration.name, skip);
            } else {
                info!("🚀 Application de la migration '{}'", migration.name);
            }

            // Toute erreur de schéma sort ici, avant la première écriture
            preflight(migration, &schema, skip)?;

            for (index, action) in migration.actions.iter().enumerate().skip(skip) {
                info!(
                    migration = %migration.name,
                    position = index + 1,
                    kind = action.kind(),
                    direction = %Direction::Forward,
                    "▶️ {}",
                    action.to_expr()
                );
                schema = self
                    .step_forward(action.as_ref(), &schema)
                    .await
                    .map_err(|e| wrap(migration, index, action.as_ref(), Direction::Forward, e))?;
                self.record_progress(migration, order, index + 1).await?;
            }
            self.record_migration(migration, order).await?;
            self.clear_progress().await?;
            applied.push(migration.name.clone());
        }
        Ok(applied)
    }

    async fn backward_walk(&self, declared: &[Migration], target: Option<&str>) -> Result<Vec<String>> {
        self.init().await?;
        let state = self.load_state().await?;
        check_history(&state, declared)?;

        let applied_count = state.applied.len();
        let stop = match target_index(declared, target)? {
            Some(i) => i + 1,
            None => 0,
        };
        let partial = state.partial.filter(|p| p.order >= stop);
        if stop >= applied_count && partial.is_none() {
            info!("✅ Aucune migration à annuler");
            return Ok(Vec::new());
        }

        // Schéma de gauche de chaque action, tel qu'à l'aller
        let (schema, lefts) = replay(&declared[..applied_count])?;

        let mut reverted = Vec::new();
        if let Some(partial) = partial {
            let migration = &declared[partial.order];
            let (_, prefix_lefts) = replay_actions(migration, schema, partial.completed)?;
            self.revert_migration(migration, partial.order, &prefix_lefts, false)
                .await?;
            reverted.push(migration.name.clone());
        }

        for order in (stop..applied_count).rev() {
            let migration = &declared[order];
            self.revert_migration(migration, order, &lefts[order], true).await?;
            reverted.push(migration.name.clone());
        }
        Ok(reverted)
    }

    /// Annule les actions dont `lefts` donne le schéma de gauche, de la
    /// dernière à la première. `recorded` : la migration figure dans l'historique.
    async fn revert_migration(
        &self,
        migration: &Migration,
        order: usize,
        lefts: &[Schema],
        mut recorded: bool,
    ) -> Result<()> {
        info!("⏪ Annulation de la migration '{}'", migration.name);
        for (index, action) in migration.actions.iter().enumerate().take(lefts.len()).rev() {
            info!(
                migration = %migration.name,
                position = index + 1,
                kind = action.kind(),
                direction = %Direction::Backward,
                "◀️ {}",
                action.to_expr()
            );
            self.step_backward(action.as_ref(), &lefts[index])
                .await
                .map_err(|e| wrap(migration, index, action.as_ref(), Direction::Backward, e))?;

            // La migration devient partielle dès la première action annulée
            if index > 0 {
                self.record_progress(migration, order, index).await?;
            }
            if recorded {
                self.forget_migration(&migration.name).await?;
                recorded = false;
            }
        }
        if recorded {
            self.forget_migration(&migration.name).await?;
        }
        self.clear_progress().await
    }

    async fn step_forward(&self, action: &dyn Action, left: &Schema) -> Result<Schema> {
        let patch = action.to_schema_patch(left)?;
        let bound = BoundAction::bind(action, &self.db, left)?;
        bound.run_forward().await?;
        let right = patch.apply_to(left)?;
        self.persist_schema(&right).await?;
        Ok(right)
    }

    async fn step_backward(&self, action: &dyn Action, left: &Schema) -> Result<()> {
        let bound = BoundAction::bind(action, &self.db, left)?;
        bound.run_backward().await?;
        self.persist_schema(left).await
    }

    // --- PERSISTANCE ---

    async fn system_record(&self, id: &str) -> Result<Option<Value>> {
        self.metadata.find_one(&Filter::eq(ID_FIELD, json!(id))).await
    }

    async fn persist_schema(&self, schema: &Schema) -> Result<()> {
        let record = json!({
            ID_FIELD: SCHEMA_RECORD_ID,
            "kind": KIND_SCHEMA,
            "schema": serde_json::to_value(schema)?,
            "updated_at": Utc::now().to_rfc3339(),
        });
        self.metadata.save(&record).await
    }

    async fn record_progress(&self, migration: &Migration, order: usize, completed: usize) -> Result<()> {
        let record = json!({
            ID_FIELD: PROGRESS_RECORD_ID,
            "kind": KIND_PROGRESS,
            "migration": migration.name,
            "order": order,
            "completed": completed,
        });
        self.metadata.save(&record).await
    }

    async fn clear_progress(&self) -> Result<()> {
        self.metadata
            .delete_many(&Filter::eq(ID_FIELD, json!(PROGRESS_RECORD_ID)))
            .await?;
        Ok(())
    }

    async fn record_migration(&self, migration: &Migration, order: usize) -> Result<()> {
        let record = json!({
            ID_FIELD: migration.name,
            "kind": KIND_MIGRATION,
            "order": order,
            "applied_at": Utc::now().to_rfc3339(),
            "actions": migration.action_exprs(),
        });
        self.metadata.save(&record).await
    }

    async fn forget_migration(&self, name: &str) -> Result<()> {
        self.metadata
            .delete_many(&Filter::eq(ID_FIELD, json!(name)))
            .await?;
        Ok(())
    }
}

// --- HELPERS ---

/// L'historique appliqué doit être un préfixe exact des migrations déclarées,
/// et une migration interrompue doit être la suivante déclarée.
fn check_history(state: &MigrationState, declared: &[Migration]) -> Result<()> {
    let applied = &state.applied;
    let mut seen = HashSet::new();
    for migration in declared {
        if !seen.insert(migration.name.as_str()) {
            return Err(AppError::History(format!(
                "Migration '{}' déclarée plusieurs fois",
                migration.name
            )));
        }
    }

    if applied.len() > declared.len() {
        return Err(AppError::History(format!(
            "{} migration(s) appliquée(s) mais seulement {} déclarée(s)",
            applied.len(),
            declared.len()
        )));
    }

    for (i, (record, migration)) in applied.iter().zip(declared).enumerate() {
        if record.name != migration.name {
            return Err(AppError::History(format!(
                "Position {} : '{}' appliquée, '{}' déclarée",
                i + 1,
                record.name,
                migration.name
            )));
        }
        if record.actions != migration.action_exprs() {
            warn!(
                "⚠️ La migration '{}' a été modifiée depuis son application",
                migration.name
            );
        }
    }

    if let Some(partial) = &state.partial {
        let expected = declared.get(applied.len());
        let consistent = partial.order == applied.len()
            && expected.is_some_and(|m| m.name == partial.migration && partial.completed <= m.actions.len());
        if !consistent {
            return Err(AppError::History(format!(
                "Migration interrompue '{}' ({} action(s) appliquée(s)) absente des migrations déclarées à la position {}",
                partial.migration,
                partial.completed,
                partial.order + 1
            )));
        }
    }
    Ok(())
}

fn target_index(declared: &[Migration], target: Option<&str>) -> Result<Option<usize>> {
    match target {
        None => Ok(None),
        Some(name) => declared
            .iter()
            .position(|m| m.name == name)
            .map(Some)
            .ok_or_else(|| AppError::NotFound(format!("Migration cible '{}' non déclarée", name))),
    }
}

/// Valide les actions restantes d'une migration sur leurs schémas de gauche
/// successifs, sans toucher au store.
fn preflight(migration: &Migration, left: &Schema, skip: usize) -> Result<()> {
    let mut schema = left.clone();
    for (index, action) in migration.actions.iter().enumerate().skip(skip) {
        schema = action
            .validate(&schema)
            .and_then(|_| action.collection_name(&schema))
            .and_then(|_| action.to_schema_patch(&schema))
            .and_then(|patch| patch.apply_to(&schema))
            .map_err(|e| wrap(migration, index, action.as_ref(), Direction::Forward, e))?;
    }
    Ok(())
}

/// Rejoue les `count` premières actions d'une migration à partir de `schema`.
/// Renvoie le schéma obtenu et le schéma de gauche de chaque action rejouée.
fn replay_actions(migration: &Migration, mut schema: Schema, count: usize) -> Result<(Schema, Vec<Schema>)> {
    let mut lefts = Vec::with_capacity(count);
    for (index, action) in migration.actions.iter().enumerate().take(count) {
        lefts.push(schema.clone());
        schema = action
            .to_schema_patch(&schema)
            .and_then(|patch| patch.apply_to(&schema))
            .map_err(|e| wrap(migration, index, action.as_ref(), Direction::Forward, e))?;
    }
    Ok((schema, lefts))
}

/// Rejoue les patchs depuis un schéma vide.
/// Renvoie le snapshot final et le schéma de gauche de chaque action.
fn replay(migrations: &[Migration]) -> Result<(Schema, Vec<Vec<Schema>>)> {
    let mut schema = Schema::new();
    let mut lefts = Vec::with_capacity(migrations.len());
    for migration in migrations {
        let (next, per_action) = replay_actions(migration, schema, migration.actions.len())?;
        schema = next;
        lefts.push(per_action);
    }
    Ok((schema, lefts))
}

fn wrap(migration: &Migration, index: usize, action: &dyn Action, direction: Direction, source: AppError) -> AppError {
    error!(
        "❌ Migration '{}' interrompue ({}) à l'action #{} : {}",
        migration.name,
        direction,
        index + 1,
        source
    );
    AppError::Migration {
        migration: migration.name.clone(),
        position: index + 1,
        action: action.to_expr(),
        direction,
        source: Box::new(source),
    }
}

// ============================================================================
// TESTS D'INTÉGRATION
// ============================================================================
