// FICHIER : engine/tests/migrations_suite/rename_document.rs

use crate::{dump_db, init_test_env};
use docmigrate::json_db::migrations::actions::{Action, CreateDocument, CreateField, RenameDocument};
use docmigrate::json_db::migrations::{Migration, Migrator};
use docmigrate::json_db::schema::{DocumentSchema, FieldSchema, FieldType, Schema};
use docmigrate::AppError;
use serde_json::json;

fn declared() -> Vec<Migration> {
    vec![
        Migration::new("0001_initial")
            .with_action(CreateDocument::new("Schema1Doc1", "schema1_doc1"))
            .with_action(CreateField::new(
                "Schema1Doc1",
                "title",
                FieldSchema::new(FieldType::String),
            )),
        Migration::new("0002_rename_document")
            .with_action(RenameDocument::new("Schema1Doc1", "NewNameDoc")),
    ]
}

#[tokio::test]
async fn test_rename_document_leaves_data_untouched() {
    let env = init_test_env().await;
    env.seed(
        "schema1_doc1",
        vec![
            json!({ "_id": "1", "title": "premier" }),
            json!({ "_id": "2", "title": "second", "extra": [1, 2] }),
        ],
    )
    .await;

    let migrator = Migrator::new(env.db.clone(), &env.config);
    let migrations = declared();

    migrator.migrate_forward(&migrations, Some("0001_initial")).await.unwrap();
    let before = dump_db(&env).await;

    migrator.migrate_forward(&migrations, None).await.unwrap();
    assert_eq!(dump_db(&env).await, before);

    let schema = migrator.load_state().await.unwrap().schema.unwrap();
    assert!(!schema.contains("Schema1Doc1"));
    assert_eq!(schema.document("NewNameDoc").unwrap().collection, "schema1_doc1");
    assert!(schema.field("NewNameDoc", "title").is_ok());

    migrator
        .migrate_backward(&migrations, Some("0001_initial"))
        .await
        .unwrap();
    assert_eq!(dump_db(&env).await, before);

    let schema = migrator.load_state().await.unwrap().schema.unwrap();
    assert!(schema.contains("Schema1Doc1"));
    assert!(!schema.contains("NewNameDoc"));
}

#[tokio::test]
async fn test_prepare_on_missing_document_fails_without_mutation() {
    let env = init_test_env().await;
    env.seed("schema1_doc1", vec![json!({ "_id": "1" })]).await;
    let before = dump_db(&env).await;

    let left = Schema::new().with_document("Other", DocumentSchema::new("other"));
    let action = RenameDocument::new("Schema1Doc1", "NewNameDoc");

    let err = action.prepare(&env.db, &left).err().expect("prepare doit échouer");
    assert!(matches!(err, AppError::Schema(_)));
    assert!(err.is_retryable());
    assert_eq!(dump_db(&env).await, before);
}

#[tokio::test]
async fn test_rename_to_existing_name_is_rejected() {
    let env = init_test_env().await;
    let left = Schema::new()
        .with_document("Schema1Doc1", DocumentSchema::new("a"))
        .with_document("NewNameDoc", DocumentSchema::new("b"));

    let action = RenameDocument::new("Schema1Doc1", "NewNameDoc");
    assert!(matches!(
        action.prepare(&env.db, &left).err(),
        Some(AppError::Schema(_))
    ));
    assert!(action.to_schema_patch(&left).unwrap().apply_to(&left).is_err());
}
