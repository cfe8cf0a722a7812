// FICHIER : engine/src/json_db/mod.rs

pub mod collections;
pub mod migrations;
pub mod query;
pub mod schema;
pub mod storage;
