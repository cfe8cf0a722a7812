// FICHIER : engine/tests/migrations_suite/field_actions.rs

//! Aller-retour forward/backward : la base revient à son état initial
//! pour chaque action réversible.

use crate::{dump_db, init_test_env, TestEnv};
use docmigrate::json_db::migrations::actions::{
    Action, AlterFieldType, CreateDocument, CreateField, DropField, RenameCollection, RenameField,
};
use docmigrate::json_db::schema::{DocumentSchema, FieldSchema, FieldType, Schema};
use serde_json::json;

fn left_schema() -> Schema {
    Schema::new().with_document(
        "Article",
        DocumentSchema::new("articles")
            .with_field("title", FieldSchema::new(FieldType::String))
            .with_field("views", FieldSchema::new(FieldType::Int))
            .with_field("score", FieldSchema::new(FieldType::Int).with_default(json!(0)))
            .with_field("legacy", FieldSchema::new(FieldType::String).with_db_field("lg")),
    )
}

async fn seeded_env() -> TestEnv {
    let env = init_test_env().await;
    env.seed(
        "articles",
        vec![
            json!({ "_id": "a1", "title": "Un", "views": 10, "score": 3 }),
            json!({ "_id": "a2", "title": "Deux", "views": 7, "lg": "x" }),
            json!({ "_id": "a3", "title": "Trois", "views": null, "meta": { "tag": "t" } }),
        ],
    )
    .await;
    env
}

async fn assert_round_trip<A: Action>(env: &TestEnv, action: A) {
    let before = dump_db(env).await;
    let schema = left_schema();

    let bound = action.prepare(&env.db, &schema).unwrap();
    bound.run_forward().await.unwrap();
    bound.run_backward().await.unwrap();

    assert_eq!(dump_db(env).await, before, "aller-retour de {}", action.to_expr());
}

#[tokio::test]
async fn test_create_field_round_trip() {
    let env = seeded_env().await;
    let action = CreateField::new(
        "Article",
        "published",
        FieldSchema::new(FieldType::Bool).with_default(json!(false)),
    );
    assert_round_trip(&env, action).await;
}

#[tokio::test]
async fn test_rename_field_round_trip() {
    let env = seeded_env().await;
    assert_round_trip(&env, RenameField::new("Article", "title", "headline")).await;
}

#[tokio::test]
async fn test_alter_field_type_round_trip() {
    let env = seeded_env().await;
    assert_round_trip(&env, AlterFieldType::new("Article", "views", FieldType::String)).await;
}

#[tokio::test]
async fn test_rename_collection_round_trip() {
    let env = seeded_env().await;
    assert_round_trip(&env, RenameCollection::new("Article", "posts")).await;
}

#[tokio::test]
async fn test_create_document_round_trip() {
    let env = seeded_env().await;
    assert_round_trip(&env, CreateDocument::new("Comment", "comments")).await;
}

#[tokio::test]
async fn test_drop_field_restores_default_only() {
    let env = seeded_env().await;
    let action = DropField::new("Article", "score");
    let bound = action.prepare(&env.db, &left_schema()).unwrap();

    bound.run_forward().await.unwrap();
    let dump = dump_db(&env).await;
    assert!(dump["articles"].iter().all(|d| d.get("score").is_none()));

    // Les valeurs d'origine sont perdues : seul le défaut revient
    bound.run_backward().await.unwrap();
    let dump = dump_db(&env).await;
    assert!(dump["articles"].iter().all(|d| d["score"] == 0));
}

#[tokio::test]
async fn test_alter_field_type_float_to_int_truncates() {
    let env = init_test_env().await;
    env.seed("articles", vec![json!({ "_id": "a1", "views": 10 })]).await;

    let schema = left_schema();
    let action = AlterFieldType::new("Article", "views", FieldType::Float);
    let bound = action.prepare(&env.db, &schema).unwrap();
    bound.run_forward().await.unwrap();
    assert_eq!(dump_db(&env).await["articles"][0]["views"], 10.0);

    env.seed("articles", vec![json!({ "_id": "a1", "views": 10.75 })]).await;
    bound.run_backward().await.unwrap();
    assert_eq!(dump_db(&env).await["articles"][0]["views"], 10);
}

#[tokio::test]
async fn test_field_actions_use_storage_key() {
    let env = seeded_env().await;
    let action = AlterFieldType::new("Article", "legacy", FieldType::Int);
    let bound = action.prepare(&env.db, &left_schema()).unwrap();

    // "x" stocké sous "lg" n'est pas un entier
    let err = bound.run_forward().await.unwrap_err();
    assert!(err.to_string().contains("articles.lg"));
}
