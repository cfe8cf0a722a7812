// FICHIER : engine/src/json_db/migrations/actions/field.rs

//! Actions au niveau des champs.
//!
//! Les données sont toujours adressées par la clé de stockage (`db_field`),
//! jamais par le nom déclaré dans le schéma.

use super::{require_absent_field, require_document, require_field, Action, RunContext};
use crate::json_db::migrations::consistency::check_empty_result;
use crate::json_db::migrations::expr::ExprBuilder;
use crate::json_db::migrations::updater::{version_gate, DocumentUpdater, FieldUpdater};
use crate::json_db::migrations::version::VersionRange;
use crate::json_db::query::Filter;
use crate::json_db::schema::{FieldSchema, FieldType, Schema, SchemaEdit, SchemaPatch};
use crate::utils::prelude::*;
use async_trait::async_trait;

/// Première version supportant l'opérateur de conversion natif.
pub const CONVERT_MIN_VERSION: &str = "4.2";

fn field_updater(ctx: &RunContext, db_field: &str) -> DocumentUpdater {
    DocumentUpdater::new(ctx.collection().clone(), db_field)
}

// --- CREATE FIELD ---

/// Destructif en arrière : la clé est retirée de tous les documents, y compris
/// ceux qui la portaient déjà avant l'action.
#[derive(Debug, Clone)]
pub struct CreateField {
    pub document: String,
    pub field: String,
    pub descriptor: FieldSchema,
}

impl CreateField {
    pub fn new(document: &str, field: &str, descriptor: FieldSchema) -> Self {
        Self {
            document: document.to_string(),
            field: field.to_string(),
            descriptor,
        }
    }

    fn db_field(&self) -> &str {
        self.descriptor.db_field_for(&self.field)
    }
}

#[async_trait]
impl Action for CreateField {
    fn kind(&self) -> &'static str {
        "CreateField"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_absent_field(schema, &self.document, &self.field)
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        let db_field = self.db_field();
        match &self.descriptor.default {
            Some(default) => {
                let n = field_updater(ctx, db_field).set_missing(default).await?;
                info!("➕ {}.{} : valeur par défaut posée sur {} document(s)", ctx.collection().name(), db_field, n);
            }
            None if !self.descriptor.nullable => {
                // Champ requis sans défaut : les documents existants doivent déjà le porter
                check_empty_result(ctx.collection(), db_field, &Filter::missing(db_field)).await?;
            }
            None => {}
        }
        Ok(())
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        let n = field_updater(ctx, self.db_field()).unset().await?;
        warn!(
            "⚠️ {}.{} retiré de {} document(s) : les valeurs antérieures à l'action sont perdues",
            ctx.collection().name(),
            self.db_field(),
            n
        );
        Ok(())
    }

    fn to_schema_patch(&self, _schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::AddField {
            document: self.document.clone(),
            field: self.field.clone(),
            descriptor: self.descriptor.clone(),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .arg(&self.field)
            .kwarg("descriptor", &self.descriptor)
            .build()
    }
}

// --- DROP FIELD ---

/// Destructif : en arrière, seule la valeur par défaut est restaurée.
#[derive(Debug, Clone)]
pub struct DropField {
    pub document: String,
    pub field: String,
}

impl DropField {
    pub fn new(document: &str, field: &str) -> Self {
        Self {
            document: document.to_string(),
            field: field.to_string(),
        }
    }
}

#[async_trait]
impl Action for DropField {
    fn kind(&self) -> &'static str {
        "DropField"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_field(schema, &self.document, &self.field)
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        let descriptor = ctx.left_schema().field(&self.document, &self.field)?;
        let db_field = descriptor.db_field_for(&self.field);
        let n = field_updater(ctx, db_field).unset().await?;
        warn!("🗑️ {}.{} supprimé de {} document(s)", ctx.collection().name(), db_field, n);
        Ok(())
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        let descriptor = ctx.left_schema().field(&self.document, &self.field)?;
        let db_field = descriptor.db_field_for(&self.field);
        match &descriptor.default {
            Some(default) => {
                field_updater(ctx, db_field).set_missing(default).await?;
            }
            None => warn!(
                "⚠️ {}.{} : aucune valeur par défaut, données non restaurées",
                ctx.collection().name(),
                db_field
            ),
        }
        Ok(())
    }

    fn to_schema_patch(&self, schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::RemoveField {
            document: self.document.clone(),
            field: self.field.clone(),
            descriptor: schema.field(&self.document, &self.field)?.clone(),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .arg(&self.field)
            .build()
    }
}

// --- RENAME FIELD ---

#[derive(Debug, Clone)]
pub struct RenameField {
    pub document: String,
    pub field: String,
    pub new_name: String,
}

impl RenameField {
    pub fn new(document: &str, field: &str, new_name: &str) -> Self {
        Self {
            document: document.to_string(),
            field: field.to_string(),
            new_name: new_name.to_string(),
        }
    }

    /// Déplace `from` vers `to` après avoir vérifié que `to` est libre partout.
    async fn move_key(&self, ctx: &RunContext, from: &str, to: &str) -> Result<()> {
        let descriptor = ctx.left_schema().field(&self.document, &self.field)?;
        if descriptor.db_field.is_some() {
            debug!("Clé de stockage explicite pour {}.{} : données inchangées", self.document, self.field);
            return Ok(());
        }
        check_empty_result(ctx.collection(), to, &Filter::exists(to)).await?;
        let n = field_updater(ctx, from).rename_to(to).await?;
        info!("✏️ {}.{} -> {} sur {} document(s)", ctx.collection().name(), from, to, n);
        Ok(())
    }
}

#[async_trait]
impl Action for RenameField {
    fn kind(&self) -> &'static str {
        "RenameField"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_field(schema, &self.document, &self.field)?;
        require_absent_field(schema, &self.document, &self.new_name)
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        self.move_key(ctx, &self.field, &self.new_name).await
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        self.move_key(ctx, &self.new_name, &self.field).await
    }

    fn to_schema_patch(&self, _schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::single(SchemaEdit::RenameField {
            document: self.document.clone(),
            from: self.field.clone(),
            to: self.new_name.clone(),
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .arg(&self.field)
            .kwarg("new_name", &self.new_name)
            .build()
    }
}

// --- ALTER FIELD TYPE ---

/// Change le type sémantique d'un champ et convertit les valeurs stockées.
/// L'aller-retour float -> int tronque : l'annulation peut perdre de l'information.
#[derive(Debug, Clone)]
pub struct AlterFieldType {
    pub document: String,
    pub field: String,
    pub new_type: FieldType,
}

impl AlterFieldType {
    pub fn new(document: &str, field: &str, new_type: FieldType) -> Self {
        Self {
            document: document.to_string(),
            field: field.to_string(),
            new_type,
        }
    }

    async fn convert(&self, ctx: &RunContext, target: FieldType) -> Result<()> {
        let descriptor = ctx.left_schema().field(&self.document, &self.field)?;
        let db_field = descriptor.db_field_for(&self.field);

        if let Some(filter) = target.unconvertible_filter(db_field) {
            check_empty_result(ctx.collection(), db_field, &filter).await?;
        }

        let range = VersionRange::since(CONVERT_MIN_VERSION)?;
        let updater = version_gate(&range, ctx.db().version(), field_updater(ctx, db_field));
        let n = updater.convert_to(target).await?;
        info!(
            "🔄 {}.{} converti en {} sur {} document(s)",
            ctx.collection().name(),
            db_field,
            target,
            n
        );
        Ok(())
    }
}

#[async_trait]
impl Action for AlterFieldType {
    fn kind(&self) -> &'static str {
        "AlterFieldType"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_document(schema, &self.document)?;
        require_field(schema, &self.document, &self.field)
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        self.convert(ctx, self.new_type).await
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        let original = ctx.left_schema().field(&self.document, &self.field)?.field_type;
        if original == FieldType::Int && self.new_type == FieldType::Float {
            warn!(
                "⚠️ Retour float -> int sur {}.{} : les décimales sont tronquées",
                self.document, self.field
            );
        }
        self.convert(ctx, original).await
    }

    fn to_schema_patch(&self, schema: &Schema) -> Result<SchemaPatch> {
        let from = schema.field(&self.document, &self.field)?.clone();
        let mut to = from.clone();
        to.field_type = self.new_type;
        if self.new_type != FieldType::Reference {
            to.reference = None;
        }
        Ok(SchemaPatch::single(SchemaEdit::AlterField {
            document: self.document.clone(),
            field: self.field.clone(),
            from,
            to,
        }))
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .arg(&self.field)
            .kwarg("new_type", &self.new_type)
            .build()
    }
}
