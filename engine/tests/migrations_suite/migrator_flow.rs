// FICHIER : engine/tests/migrations_suite/migrator_flow.rs

use crate::{dump_db, init_test_env};
use docmigrate::json_db::collections::DocumentStore;
use docmigrate::json_db::migrations::actions::{
    AlterFieldType, CreateDocument, CreateField, DropDocument, DropField, RenameField,
};
use docmigrate::json_db::migrations::{Migration, MigrationStatus, Migrator};
use docmigrate::json_db::query::Filter;
use docmigrate::json_db::schema::{FieldSchema, FieldType};
use docmigrate::AppError;
use serde_json::json;

fn declared() -> Vec<Migration> {
    vec![
        Migration::new("0001_products")
            .with_action(CreateDocument::new("Product", "products"))
            .with_action(CreateField::new("Product", "cost", FieldSchema::new(FieldType::String)))
            .with_action(CreateField::new(
                "Product",
                "stock",
                FieldSchema::new(FieldType::Int).with_default(json!(0)),
            )),
        Migration::new("0002_price")
            .with_action(RenameField::new("Product", "cost", "price"))
            .with_action(AlterFieldType::new("Product", "price", FieldType::Float)),
        Migration::new("0003_cleanup").with_action(DropField::new("Product", "stock")),
    ]
}

async fn seeded() -> crate::TestEnv {
    let env = init_test_env().await;
    env.seed(
        "products",
        vec![
            json!({ "_id": "p1", "cost": "12.5" }),
            json!({ "_id": "p2", "cost": "3", "stock": 4 }),
        ],
    )
    .await;
    env
}

#[tokio::test]
async fn test_full_forward_and_partial_backward() {
    let env = seeded().await;
    let migrator = Migrator::new(env.db.clone(), &env.config);
    let migrations = declared();

    let applied = migrator.migrate_forward(&migrations, None).await.unwrap();
    assert_eq!(applied, vec!["0001_products", "0002_price", "0003_cleanup"]);

    let dump = dump_db(&env).await;
    assert_eq!(
        dump["products"],
        vec![json!({ "_id": "p1", "price": 12.5 }), json!({ "_id": "p2", "price": 3.0 })]
    );

    let schema = migrator.load_state().await.unwrap().schema.unwrap();
    let price = schema.field("Product", "price").unwrap();
    assert_eq!(price.field_type, FieldType::Float);
    assert!(schema.field("Product", "stock").is_err());

    // Retour juste après 0001 : stock restauré par défaut, prix redevenu texte
    let reverted = migrator
        .migrate_backward(&migrations, Some("0001_products"))
        .await
        .unwrap();
    assert_eq!(reverted, vec!["0003_cleanup", "0002_price"]);

    let dump = dump_db(&env).await;
    assert_eq!(
        dump["products"],
        vec![
            json!({ "_id": "p1", "cost": "12.5", "stock": 0 }),
            json!({ "_id": "p2", "cost": "3.0", "stock": 0 }),
        ]
    );

    let status = migrator.status(&migrations).await.unwrap();
    assert_eq!(
        status,
        vec![
            ("0001_products".to_string(), MigrationStatus::Applied),
            ("0002_price".to_string(), MigrationStatus::Pending),
            ("0003_cleanup".to_string(), MigrationStatus::Pending),
        ]
    );

    let schema = migrator.load_state().await.unwrap().schema.unwrap();
    assert_eq!(schema.field("Product", "cost").unwrap().field_type, FieldType::String);
}

#[tokio::test]
async fn test_metadata_records() {
    let env = seeded().await;
    let migrator = Migrator::new(env.db.clone(), &env.config);
    migrator.migrate_forward(&declared(), Some("0002_price")).await.unwrap();

    let records = env
        .store
        .find(&env.config.metadata_collection, &Filter::eq("kind", json!("migration")), None)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    let state = migrator.load_state().await.unwrap();
    assert_eq!(state.applied[0].name, "0001_products");
    assert_eq!(state.applied[1].order, 1);
    assert_eq!(
        state.applied[1].actions,
        vec![
            r#"RenameField("Product", "cost", new_name="price")"#.to_string(),
            r#"AlterFieldType("Product", "price", new_type=float)"#.to_string(),
        ]
    );
    assert!(state.schema.unwrap().field("Product", "price").is_ok());
}

#[tokio::test]
async fn test_history_divergence_is_rejected() {
    let env = seeded().await;
    let migrator = Migrator::new(env.db.clone(), &env.config);
    migrator.migrate_forward(&declared(), None).await.unwrap();

    let mut edited = declared();
    edited.remove(1);
    let err = migrator.migrate_forward(&edited, None).await.unwrap_err();
    assert!(matches!(err, AppError::History(_)));

    let err = migrator.migrate_backward(&edited, None).await.unwrap_err();
    assert!(matches!(err, AppError::History(_)));
}

#[tokio::test]
async fn test_drop_document_is_lossy() {
    let env = seeded().await;
    let migrator = Migrator::new(env.db.clone(), &env.config);

    let migrations = vec![
        Migration::new("0001_products").with_action(CreateDocument::new("Product", "products")),
        Migration::new("0002_drop").with_action(DropDocument::new("Product")),
    ];
    migrator.migrate_forward(&migrations, None).await.unwrap();
    assert!(!dump_db(&env).await.contains_key("products"));

    migrator
        .migrate_backward(&migrations, Some("0001_products"))
        .await
        .unwrap();
    let schema = migrator.load_state().await.unwrap().schema.unwrap();
    assert!(schema.contains("Product"));
    assert!(!dump_db(&env).await.contains_key("products"));
}

#[tokio::test]
async fn test_schema_error_later_in_migration_leaves_data_untouched() {
    let env = seeded().await;
    let migrator = Migrator::new(env.db.clone(), &env.config);

    let mut broken = declared();
    broken[1] = Migration::new("0002_price")
        .with_action(RenameField::new("Product", "cost", "price"))
        .with_action(RenameField::new("Product", "ghost", "other"));
    migrator.migrate_forward(&broken, Some("0001_products")).await.unwrap();
    let before = dump_db(&env).await;

    let err = migrator.migrate_forward(&broken, None).await.unwrap_err();
    match &err {
        AppError::Migration { position, source, .. } => {
            assert_eq!(*position, 2);
            assert!(matches!(**source, AppError::Schema(_)));
        }
        other => panic!("erreur de migration attendue, obtenu {:?}", other),
    }
    assert_eq!(dump_db(&env).await, before);
    assert!(migrator.load_state().await.unwrap().partial.is_none());

    // Migration corrigée : l'application reprend normalement
    let applied = migrator.migrate_forward(&declared(), None).await.unwrap();
    assert_eq!(applied, vec!["0002_price", "0003_cleanup"]);
    assert_eq!(dump_db(&env).await["products"][0]["price"], 12.5);
}
