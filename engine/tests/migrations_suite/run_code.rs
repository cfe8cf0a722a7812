// FICHIER : engine/tests/migrations_suite/run_code.rs

use crate::{dump_db, init_test_env};
use docmigrate::json_db::collections::{Collection, Database};
use docmigrate::json_db::migrations::actions::{Action, CreateDocument, RunCode};
use docmigrate::json_db::migrations::{Migration, Migrator};
use docmigrate::json_db::query::{Filter, UpdateOp};
use docmigrate::json_db::schema::Schema;
use docmigrate::utils::BoxFuture;
use docmigrate::{user_code, AppError, Result};
use serde_json::json;

fn add_slug<'a>(_db: &'a Database, col: &'a Collection, _schema: &'a Schema) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        for mut doc in col.find_all().await? {
            let title = doc["title"].as_str().unwrap_or_default().to_lowercase();
            doc["slug"] = json!(title.replace(' ', "-"));
            col.save(&doc).await?;
        }
        Ok(())
    })
}

fn remove_slug<'a>(_db: &'a Database, col: &'a Collection, _schema: &'a Schema) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        let ops = [UpdateOp::Unset {
            field: "slug".into(),
        }];
        col.update_many(&Filter::exists("slug"), &ops).await?;
        Ok(())
    })
}

fn fail_always<'a>(_db: &'a Database, _col: &'a Collection, _schema: &'a Schema) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move { Err(AppError::Inconsistency("refusé par le code utilisateur".into())) })
}

#[test]
fn test_run_code_without_functions_is_rejected() {
    let err = RunCode::new("Post", None, None).unwrap_err();
    assert!(matches!(err, AppError::Action(_)));
}

#[test]
fn test_run_code_patch_is_empty() {
    let action = RunCode::new("Post", None, Some(user_code!(remove_slug))).unwrap();
    let schema = Schema::new();
    assert!(action.to_schema_patch(&schema).unwrap().is_empty());
    assert_eq!(
        action.to_expr(),
        r#"RunCode("Post", backward=remove_slug)"#
    );
}

#[tokio::test]
async fn test_run_code_in_migration_round_trip() {
    let env = init_test_env().await;
    env.seed(
        "posts",
        vec![
            json!({ "_id": "p1", "title": "Hello World" }),
            json!({ "_id": "p2", "title": "Rust" }),
        ],
    )
    .await;
    let before = dump_db(&env).await;

    let migrations = vec![Migration::new("0001_posts")
        .with_action(CreateDocument::new("Post", "posts"))
        .with_action(
            RunCode::new("Post", Some(user_code!(add_slug)), Some(user_code!(remove_slug))).unwrap(),
        )];

    let migrator = Migrator::new(env.db.clone(), &env.config);
    migrator.migrate_forward(&migrations, None).await.unwrap();

    let dump = dump_db(&env).await;
    assert_eq!(dump["posts"][0]["slug"], "hello-world");
    assert_eq!(dump["posts"][1]["slug"], "rust");

    // Le code utilisateur ne touche pas au schéma suivi
    let schema = migrator.load_state().await.unwrap().schema.unwrap();
    assert!(schema.document("Post").unwrap().fields.is_empty());

    migrator.migrate_backward(&migrations, None).await.unwrap();
    assert_eq!(dump_db(&env).await, before);
}

#[tokio::test]
async fn test_user_code_error_is_wrapped() {
    let env = init_test_env().await;
    let migrations = vec![Migration::new("0001_fail")
        .with_action(CreateDocument::new("Post", "posts"))
        .with_action(RunCode::new("Post", Some(user_code!(fail_always)), None).unwrap())];

    let migrator = Migrator::new(env.db.clone(), &env.config);
    let err = migrator.migrate_forward(&migrations, None).await.unwrap_err();

    match &err {
        AppError::Migration { position, action, .. } => {
            assert_eq!(*position, 2);
            assert!(action.contains("forward=fail_always"));
        }
        other => panic!("erreur de migration attendue, obtenu {:?}", other),
    }
    assert!(matches!(err.root(), AppError::Inconsistency(_)));
}
