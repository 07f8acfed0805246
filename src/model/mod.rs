//! The resolved schema graph.

pub mod column;
pub mod constraint;
pub mod database;
pub mod ident;
pub mod index;
pub mod routine;
pub mod table;

pub use column::{Column, Link};
pub use constraint::{ConstraintKind, ForeignKeyConstraint, ReferentialAction};
pub use database::Database;
pub use ident::IdentMap;
pub use index::{IndexColumn, TableIndex};
pub use routine::{Routine, RoutineParameter};
pub use table::{CheckConstraint, Table, TableKind};

/// Position of a table in the [`Database`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableId(pub(crate) usize);

/// A column, addressed by its table and ordinal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId {
    pub table: TableId,
    pub index: usize,
}

/// Position of a foreign-key constraint in the [`Database`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintId(pub(crate) usize);
