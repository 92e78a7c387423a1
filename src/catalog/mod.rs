//! Catalog: the metadata store
//!
//! One JSON file per engine instance maps database name to its collections
//! and tables: partition counts for document collections, declared schemas
//! and constraints for relational tables, and a derived reverse-reference
//! map (referenced table -> referencing tables) used to guard drops.
//!
//! The catalog is loaded whole at open and written back whole after every
//! structural mutation, with an atomic temp-write-and-rename replace so a
//! reader never observes a half-written file.

mod errors;
mod store;
mod types;

pub use errors::{CatalogError, CatalogErrorCode, CatalogResult};
pub use store::Catalog;
pub use types::{
    CatalogData, CollectionEntry, ColumnDef, ColumnType, DatabaseEntry, ForeignKey, TableSchema,
};
