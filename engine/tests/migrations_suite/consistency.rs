// FICHIER : engine/tests/migrations_suite/consistency.rs

use crate::{dump_db, init_test_env};
use docmigrate::json_db::migrations::actions::{AlterFieldType, CreateDocument, CreateField};
use docmigrate::json_db::migrations::consistency::{check_empty_result, MAX_EXAMPLES};
use docmigrate::json_db::migrations::{Migration, Migrator};
use docmigrate::json_db::query::Filter;
use docmigrate::json_db::schema::{FieldSchema, FieldType};
use docmigrate::AppError;
use serde_json::json;

#[tokio::test]
async fn test_report_lists_at_most_three_examples_with_id_and_value() {
    let env = init_test_env().await;
    env.seed(
        "users",
        (1..=6)
            .map(|i| json!({ "_id": format!("u{}", i), "age": format!("{} ans", i) }))
            .collect(),
    )
    .await;

    let users = env.db.collection("users");
    let err = check_empty_result(&users, "age", &Filter::exists("age"))
        .await
        .unwrap_err();
    let message = err.to_string();

    assert!(matches!(err, AppError::Inconsistency(_)));
    assert_eq!(message.matches("{_id: ").count(), MAX_EXAMPLES);
    assert!(message.contains(r#"{_id: u1,...age: "1 ans"}"#));
    assert!(!message.contains("u4"));
}

#[tokio::test]
async fn test_failed_check_aborts_migration_before_mutation() {
    let env = init_test_env().await;
    env.seed(
        "users",
        vec![
            json!({ "_id": "u1", "age": "31" }),
            json!({ "_id": "u2", "age": "trente" }),
        ],
    )
    .await;

    let migrations = vec![
        Migration::new("0001_users")
            .with_action(CreateDocument::new("User", "users"))
            .with_action(CreateField::new("User", "age", FieldSchema::new(FieldType::String))),
        Migration::new("0002_age_int").with_action(AlterFieldType::new("User", "age", FieldType::Int)),
    ];

    let migrator = Migrator::new(env.db.clone(), &env.config);
    migrator.migrate_forward(&migrations, Some("0001_users")).await.unwrap();
    let before = dump_db(&env).await;

    let err = migrator.migrate_forward(&migrations, None).await.unwrap_err();
    assert!(matches!(err.root(), AppError::Inconsistency(_)));
    assert!(err.is_retryable());
    assert_eq!(dump_db(&env).await, before);

    // Données corrigées : la migration passe
    env.seed("users", vec![json!({ "_id": "u2", "age": "30" })]).await;
    let applied = migrator.migrate_forward(&migrations, None).await.unwrap();
    assert_eq!(applied, vec!["0002_age_int"]);
    assert_eq!(dump_db(&env).await["users"][1]["age"], 30);
}

#[tokio::test]
async fn test_values_rejected_by_conversion_are_caught_before_any_write() {
    let env = init_test_env().await;
    env.seed(
        "events",
        vec![
            json!({ "_id": "e1", "at": "2024-01-01T00:00:00Z", "count": "5" }),
            json!({ "_id": "e2", "at": "2024-02-30T00:00:00Z", "count": "99999999999999999999" }),
        ],
    )
    .await;

    let migrations = vec![
        Migration::new("0001_events")
            .with_action(CreateDocument::new("Event", "events"))
            .with_action(CreateField::new("Event", "at", FieldSchema::new(FieldType::String)))
            .with_action(CreateField::new("Event", "count", FieldSchema::new(FieldType::String))),
        Migration::new("0002_at_datetime").with_action(AlterFieldType::new("Event", "at", FieldType::DateTime)),
        Migration::new("0003_count_int").with_action(AlterFieldType::new("Event", "count", FieldType::Int)),
    ];

    let migrator = Migrator::new(env.db.clone(), &env.config);
    migrator.migrate_forward(&migrations, Some("0001_events")).await.unwrap();
    let before = dump_db(&env).await;

    // Date impossible : format valide mais jour inexistant
    let err = migrator
        .migrate_forward(&migrations, Some("0002_at_datetime"))
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Inconsistency(_)));
    assert!(err.to_string().contains("e2"));
    assert_eq!(dump_db(&env).await, before);

    // Entier hors de la plage i64
    env.seed("events", vec![json!({ "_id": "e2", "at": "2024-02-28T00:00:00Z", "count": "99999999999999999999" })])
        .await;
    migrator
        .migrate_forward(&migrations, Some("0002_at_datetime"))
        .await
        .unwrap();
    let converted = dump_db(&env).await;

    let err = migrator.migrate_forward(&migrations, None).await.unwrap_err();
    assert!(matches!(err.root(), AppError::Inconsistency(_)));
    assert_eq!(dump_db(&env).await, converted);
    assert_eq!(converted["events"][0]["count"], "5");
}
