//! Filtres et opérateurs de mise à jour du store JSON

pub mod filter;
pub mod update;

pub use filter::{Filter, ValueKind};
pub use update::UpdateOp;
