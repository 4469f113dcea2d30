//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Deserialize` create / update DTOs where the entity is written directly

pub mod selection;
pub mod supervision;
pub mod thesis;
pub mod user;
