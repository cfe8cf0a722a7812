// FICHIER : engine/src/json_db/migrations/actions/run_code.rs

//! Échappatoire : exécution de code utilisateur arbitraire.
//!
//! Le schéma n'est pas suivi : `to_schema_patch` renvoie toujours un patch vide.

use super::{require_document, Action, RunContext};
use crate::json_db::collections::{Collection, Database};
use crate::json_db::migrations::expr::{ExprBuilder, ToExpr};
use crate::json_db::schema::{Schema, SchemaPatch};
use crate::utils::prelude::*;
use crate::utils::BoxFuture;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub type UserFn = dyn for<'a> Fn(&'a Database, &'a Collection, &'a Schema) -> BoxFuture<'a, Result<()>>
    + Send
    + Sync;

/// Fonction utilisateur nommée. Seul le nom est sérialisé.
#[derive(Clone)]
pub struct UserCode {
    name: String,
    func: Arc<UserFn>,
}

impl UserCode {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: for<'a> Fn(&'a Database, &'a Collection, &'a Schema) -> BoxFuture<'a, Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.replace(' ', ""),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn call(&self, db: &Database, collection: &Collection, schema: &Schema) -> Result<()> {
        (self.func)(db, collection, schema).await
    }
}

impl fmt::Debug for UserCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCode").field("name", &self.name).finish()
    }
}

impl ToExpr for UserCode {
    fn to_expr(&self) -> String {
        self.name.clone()
    }
}

/// Construit un [`UserCode`] en capturant le chemin déclaré de la fonction.
///
/// ```ignore
/// fn backfill<'a>(db: &'a Database, col: &'a Collection, schema: &'a Schema) -> BoxFuture<'a, Result<()>> {
///     Box::pin(async move { Ok(()) })
/// }
/// let code = user_code!(backfill);
/// ```
#[macro_export]
macro_rules! user_code {
    ($func:path) => {
        $crate::json_db::migrations::actions::UserCode::new(stringify!($func), $func)
    };
}

// --- ACTION ---

#[derive(Debug, Clone)]
pub struct RunCode {
    pub document: String,
    pub forward: Option<UserCode>,
    pub backward: Option<UserCode>,
}

impl RunCode {
    /// Au moins une des deux fonctions est requise.
    pub fn new(document: &str, forward: Option<UserCode>, backward: Option<UserCode>) -> Result<Self> {
        if forward.is_none() && backward.is_none() {
            return Err(AppError::Action(format!(
                "RunCode('{}') exige au moins une fonction (forward ou backward)",
                document
            )));
        }
        Ok(Self {
            document: document.to_string(),
            forward,
            backward,
        })
    }

    async fn invoke(&self, code: Option<&UserCode>, ctx: &RunContext, direction: Direction) -> Result<()> {
        match code {
            Some(code) => {
                info!("⚙️ Code utilisateur '{}' ({}) sur '{}'", code.name(), direction, ctx.collection().name());
                code.call(ctx.db(), ctx.collection(), ctx.left_schema()).await
            }
            None => {
                debug!("RunCode('{}') : rien à exécuter en {}", self.document, direction);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Action for RunCode {
    fn kind(&self) -> &'static str {
        "RunCode"
    }

    fn document_type(&self) -> &str {
        &self.document
    }

    fn validate(&self, schema: &Schema) -> Result<()> {
        require_document(schema, &self.document)
    }

    async fn run_forward(&self, ctx: &RunContext) -> Result<()> {
        self.invoke(self.forward.as_ref(), ctx, Direction::Forward).await
    }

    async fn run_backward(&self, ctx: &RunContext) -> Result<()> {
        self.invoke(self.backward.as_ref(), ctx, Direction::Backward).await
    }

    fn to_schema_patch(&self, _schema: &Schema) -> Result<SchemaPatch> {
        Ok(SchemaPatch::empty())
    }

    fn to_expr(&self) -> String {
        ExprBuilder::new(self.kind())
            .arg(&self.document)
            .kwarg_opt("forward", self.forward.as_ref())
            .kwarg_opt("backward", self.backward.as_ref())
            .build()
    }
}
