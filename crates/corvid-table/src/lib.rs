//! Tables, secondary indexes and updatable views for CorvidDB.
//!
//! This crate provides:
//! - `Table` / `MutableTable` traits with an in-memory `MemTable`
//! - Lazily fetched rows (`TableRow`)
//! - Secondary indexes kept in sorted row-id indexes, grouped per table
//! - Constraint and default-value hooks
//! - `UpdatableView`, a positional selection with a one-row mutation protocol

pub mod constraint;
pub mod projection;
pub mod row;
pub mod schema;
pub mod secondary;
pub mod table;
pub mod view;

pub use constraint::{
    ConstraintCheck, DefaultValues, NoDefaults, NotNullCheck, RowImage, SchemaDefaults, WriteKind,
};
pub use projection::{ProjectedColumn, Projection, ProjectionExpr};
pub use row::TableRow;
pub use schema::{Column, Schema};
pub use secondary::{IndexRegistry, SecondaryIndex, SharedRegistry};
pub use table::{MemTable, MutableTable, SharedTable, Table};
pub use view::{MutationState, ResultCursor, UpdatableView};
