//! Projections from a view's columns back to source table columns.

use crate::schema::Schema;
use corvid_common::{CorvidError, Result, Value};

/// What a projected column is computed from.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionExpr {
    /// A source column, by name.
    Column(String),
    /// A constant.
    Literal(Value),
    /// An expression evaluated by the query layer, kept for error messages.
    Computed(String),
}

/// One output column of a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedColumn {
    pub alias: Option<String>,
    pub expr: ProjectionExpr,
}

impl ProjectedColumn {
    pub fn column(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            expr: ProjectionExpr::Column(name.into()),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self {
            alias: None,
            expr: ProjectionExpr::Literal(value.into()),
        }
    }

    pub fn computed(description: impl Into<String>) -> Self {
        Self {
            alias: None,
            expr: ProjectionExpr::Computed(description.into()),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Output name: the alias, else the source column name.
    pub fn output_name(&self) -> Option<&str> {
        match (&self.alias, &self.expr) {
            (Some(alias), _) => Some(alias),
            (None, ProjectionExpr::Column(name)) => Some(name),
            (None, _) => None,
        }
    }
}

/// Ordered output columns of a view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    columns: Vec<ProjectedColumn>,
}

impl Projection {
    pub fn new(columns: Vec<ProjectedColumn>) -> Self {
        Self { columns }
    }

    /// Projects every column of `schema` unchanged.
    pub fn identity(schema: &Schema) -> Self {
        Self::new(
            schema
                .columns()
                .iter()
                .map(|c| ProjectedColumn::column(c.name.clone()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[ProjectedColumn] {
        &self.columns
    }

    fn get(&self, offset: usize) -> Result<&ProjectedColumn> {
        self.columns.get(offset).ok_or(CorvidError::OutOfRange {
            offset,
            count: self.columns.len(),
        })
    }

    /// Name of the source column behind output column `offset`.
    ///
    /// Literals and computed expressions have no source and fail with
    /// `NotUpdatable`.
    pub fn source_column(&self, offset: usize) -> Result<&str> {
        match &self.get(offset)?.expr {
            ProjectionExpr::Column(name) => Ok(name),
            ProjectionExpr::Literal(value) => Err(CorvidError::NotUpdatable(format!(
                "output column {} is the literal {}",
                offset, value
            ))),
            ProjectionExpr::Computed(description) => Err(CorvidError::NotUpdatable(format!(
                "output column {} is computed from {}",
                offset, description
            ))),
        }
    }

    /// Offset of the source column behind output column `offset`.
    pub fn resolve(&self, offset: usize, schema: &Schema) -> Result<usize> {
        schema.index_of(self.source_column(offset)?)
    }

    pub(crate) fn expr(&self, offset: usize) -> Result<&ProjectionExpr> {
        Ok(&self.get(offset)?.expr)
    }
}
