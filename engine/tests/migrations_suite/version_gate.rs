// FICHIER : engine/tests/migrations_suite/version_gate.rs

use crate::{dump_db, init_test_env_with};
use docmigrate::json_db::migrations::actions::{Action, AlterFieldType};
use docmigrate::json_db::migrations::updater::{version_gate, DocumentUpdater, FieldUpdater};
use docmigrate::json_db::migrations::version::{DbVersion, VersionRange};
use docmigrate::json_db::schema::{DocumentSchema, FieldSchema, FieldType, Schema};
use docmigrate::AppError;
use serde_json::json;

fn v(s: &str) -> DbVersion {
    DbVersion::parse(s).unwrap()
}

#[tokio::test]
async fn test_gate_picks_fallback_outside_range() {
    let env = init_test_env_with(None).await;
    let range = VersionRange::between("3.6", "4.2").unwrap();
    let make = || DocumentUpdater::new(env.db.collection("c"), "f");

    // Sous le min
    assert!(version_gate(&range, &v("3.4"), make()).is_fallback());
    // Min inclus
    assert!(!version_gate(&range, &v("3.6"), make()).is_fallback());
    assert!(!version_gate(&range, &v("4.0.9"), make()).is_fallback());
    // Max exclu
    assert!(version_gate(&range, &v("4.2"), make()).is_fallback());
    assert!(version_gate(&range, &v("5.0"), make()).is_fallback());
}

#[test]
fn test_range_requires_a_bound() {
    assert!(matches!(
        VersionRange::from_bounds(None, None),
        Err(AppError::Contract(_))
    ));
}

#[tokio::test]
async fn test_connect_honours_configured_version() {
    let env = init_test_env_with(Some("3.6")).await;
    assert_eq!(env.db.version(), &v("3.6"));

    let default_env = init_test_env_with(None).await;
    assert_eq!(default_env.db.version(), &v("4.4.0"));
}

#[tokio::test]
async fn test_primary_and_fallback_produce_same_data() {
    let schema = Schema::new().with_document(
        "Reading",
        DocumentSchema::new("readings").with_field("value", FieldSchema::new(FieldType::String)),
    );
    let docs = vec![
        json!({ "_id": "r1", "value": "1.5" }),
        json!({ "_id": "r2", "value": "-2" }),
        json!({ "_id": "r3" }),
    ];

    let mut dumps = Vec::new();
    for version in ["3.6", "4.4"] {
        let env = init_test_env_with(Some(version)).await;
        env.seed("readings", docs.clone()).await;

        let action = AlterFieldType::new("Reading", "value", FieldType::Float);
        action.prepare(&env.db, &schema).unwrap().run_forward().await.unwrap();
        dumps.push(dump_db(&env).await);
    }

    assert_eq!(dumps[0], dumps[1]);
    assert_eq!(dumps[0]["readings"][0]["value"], 1.5);
    assert_eq!(dumps[0]["readings"][1]["value"], -2.0);
}
