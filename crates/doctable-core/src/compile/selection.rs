use crate::{
    compile::{
        ClauseKind, CompileError, SEPARATOR, SQL_AND, SQL_AS, SQL_MAX, SUB_SELECT_ALIAS,
        condition::{CompiledCondition, ConditionCompiler, contains_aggregate},
        template::Template,
        validate_identifier,
    },
    expr::Expr,
    resolve::{BindError, resolve},
    schema::{Attribute, Schema, Values},
};
use doctable_primitives::AttributeType;
use std::fmt::Write as _;

///
/// CONSTANTS
///

/// Limit emitted when only an offset is requested.
pub const UNBOUNDED_LIMIT: u64 = 2_147_483_647;

/// Prefix of the output name given to unnamed computed columns.
pub const SYNTHETIC_PREFIX: &str = "_col";

///
/// SelectColumn
///

#[derive(Clone, Debug, PartialEq)]
pub struct SelectColumn {
    pub expr: Expr,
    pub rename: Option<String>,
}

impl SelectColumn {
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self { expr, rename: None }
    }

    #[must_use]
    pub fn named(expr: Expr, rename: impl Into<String>) -> Self {
        Self {
            expr,
            rename: Some(rename.into()),
        }
    }
}

///
/// SortOrder
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

///
/// OrderByKey
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderByKey {
    pub expr: Expr,
    pub order: SortOrder,
}

impl OrderByKey {
    #[must_use]
    pub const fn asc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Asc,
        }
    }

    #[must_use]
    pub const fn desc(expr: Expr) -> Self {
        Self {
            expr,
            order: SortOrder::Desc,
        }
    }
}

///
/// Selection
///
/// Uncompiled selection: columns plus optional group-by, having, order-by
/// and paging.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub columns: Vec<SelectColumn>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Selection {
    #[must_use]
    pub fn new(columns: Vec<SelectColumn>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn group_by(mut self, keys: Vec<Expr>) -> Self {
        self.group_by = keys;
        self
    }

    #[must_use]
    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    #[must_use]
    pub fn order_by(mut self, keys: Vec<OrderByKey>) -> Self {
        self.order_by = keys;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

///
/// SubSelect
///
/// Correlated sub-select of a last-value rewrite: the inner projection and
/// the outer join condition against it.
///

#[derive(Clone, Debug)]
pub struct SubSelect {
    inner: CompiledCondition,
    join: CompiledCondition,
}

impl SubSelect {
    #[must_use]
    pub const fn inner(&self) -> &CompiledCondition {
        &self.inner
    }

    #[must_use]
    pub const fn join(&self) -> &CompiledCondition {
        &self.join
    }
}

///
/// CompiledSelection
///

#[derive(Clone, Debug)]
pub struct CompiledSelection {
    table: String,
    select: CompiledCondition,
    sub_select: Option<SubSelect>,
    group_by: Option<CompiledCondition>,
    having: Option<CompiledCondition>,
    order_by: Option<CompiledCondition>,
    limit: Option<u64>,
    offset: Option<u64>,
    output: Schema,
}

impl CompiledSelection {
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn select(&self) -> &CompiledCondition {
        &self.select
    }

    #[must_use]
    pub const fn sub_select(&self) -> Option<&SubSelect> {
        self.sub_select.as_ref()
    }

    #[must_use]
    pub const fn group_by(&self) -> Option<&CompiledCondition> {
        self.group_by.as_ref()
    }

    #[must_use]
    pub const fn having(&self) -> Option<&CompiledCondition> {
        self.having.as_ref()
    }

    #[must_use]
    pub const fn order_by(&self) -> Option<&CompiledCondition> {
        self.order_by.as_ref()
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Projection of result documents, in select-column order.
    #[must_use]
    pub const fn output_schema(&self) -> &Schema {
        &self.output
    }

    #[must_use]
    pub const fn has_last_value(&self) -> bool {
        self.sub_select.is_some()
    }

    /// Total placeholders across every compiled clause.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        let clauses = [
            Some(&self.select),
            self.sub_select.as_ref().map(SubSelect::inner),
            self.sub_select.as_ref().map(SubSelect::join),
            self.group_by.as_ref(),
            self.having.as_ref(),
            self.order_by.as_ref(),
        ];

        clauses
            .into_iter()
            .flatten()
            .map(CompiledCondition::placeholder_count)
            .sum()
    }

    /// Resolve every clause and assemble the executable query.
    ///
    /// `filter` is the already-resolved find condition; empty means no filter.
    pub fn resolve(&self, values: &Values, filter: &str) -> Result<String, BindError> {
        let group_by = self
            .group_by
            .as_ref()
            .map(|clause| resolve(clause, values))
            .transpose()?;

        let mut query = format!(
            "SELECT {} FROM {}",
            resolve(&self.select, values)?,
            self.table
        );
        let mut predicates = Vec::new();

        if let Some(sub_select) = &self.sub_select {
            let _ = write!(
                query,
                ", (SELECT {} FROM {}",
                resolve(&sub_select.inner, values)?,
                self.table
            );
            if !filter.is_empty() {
                let _ = write!(query, " WHERE {filter}");
            }
            if let Some(keys) = &group_by {
                let _ = write!(query, " GROUP BY {keys}");
            }
            let _ = write!(query, "){SQL_AS}{SUB_SELECT_ALIAS}");

            predicates.push(resolve(&sub_select.join, values)?);
        }
        if !filter.is_empty() {
            predicates.push(filter.to_string());
        }
        if !predicates.is_empty() {
            let _ = write!(query, " WHERE {}", predicates.join(SQL_AND));
        }

        if let Some(keys) = &group_by {
            let _ = write!(query, " GROUP BY {keys}");
        }
        if let Some(having) = &self.having {
            let _ = write!(query, " HAVING {}", resolve(having, values)?);
        }
        if let Some(order_by) = &self.order_by {
            let _ = write!(query, " ORDER BY {}", resolve(order_by, values)?);
        }
        if self.limit.is_some() || self.offset.is_some() {
            let _ = write!(
                query,
                " OFFSET {} LIMIT {}",
                self.offset.unwrap_or(0),
                self.limit.unwrap_or(UNBOUNDED_LIMIT)
            );
        }

        Ok(query)
    }
}

///
/// SelectionCompiler
///
/// Compiles every clause of a selection against one table and merges their
/// ordinals in clause order.
///

#[derive(Clone, Debug)]
pub struct SelectionCompiler {
    table: String,
}

impl SelectionCompiler {
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn compile(&self, selection: &Selection) -> Result<CompiledSelection, CompileError> {
        validate_identifier(&self.table)?;
        if selection.columns.is_empty() {
            return Err(CompileError::EmptySelection);
        }

        let names = selection
            .columns
            .iter()
            .enumerate()
            .map(|(position, column)| output_name(column, position))
            .collect::<Result<Vec<_>, _>>()?;

        let has_last_value = selection
            .columns
            .iter()
            .any(|column| column.expr.is_last_value());

        let (select, sub_select, output) = if has_last_value {
            self.compile_last_value_columns(&selection.columns, &names)?
        } else {
            self.compile_plain_columns(&selection.columns, &names)?
        };

        let group_by = if selection.group_by.is_empty() {
            None
        } else {
            let compiler = self.compiler(ClauseKind::GroupBy);
            let keys = selection
                .group_by
                .iter()
                .map(|key| compiler.compile(key))
                .collect::<Result<Vec<_>, _>>()?;

            Some(CompiledCondition::join(keys, SEPARATOR))
        };

        let having = selection
            .having
            .as_ref()
            .map(|expr| self.compiler(ClauseKind::Having).compile(expr))
            .transpose()?;

        let order_by = if selection.order_by.is_empty() {
            None
        } else {
            let compiler = self.compiler(ClauseKind::OrderBy);
            let keys = selection
                .order_by
                .iter()
                .map(|key| {
                    compiler
                        .compile(&key.expr)
                        .map(|compiled| compiled.wrap("", &format!(" {}", key.order.keyword())))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Some(CompiledCondition::join(keys, SEPARATOR))
        };

        Ok(CompiledSelection {
            table: self.table.clone(),
            select,
            sub_select,
            group_by,
            having,
            order_by,
            limit: selection.limit,
            offset: selection.offset,
            output,
        })
    }

    fn compiler(&self, clause: ClauseKind) -> ConditionCompiler {
        ConditionCompiler::new(self.table.clone(), clause)
    }

    // Plain projection: `expr [AS rename]` per column.
    fn compile_plain_columns(
        &self,
        columns: &[SelectColumn],
        names: &[String],
    ) -> Result<(CompiledCondition, Option<SubSelect>, Schema), CompileError> {
        let compiler = self.compiler(ClauseKind::Selection);
        let mut parts = Vec::with_capacity(columns.len());
        let mut output = Vec::with_capacity(columns.len());

        for (column, name) in columns.iter().zip(names) {
            let compiled = compiler.compile(&column.expr)?;
            output.push(output_attribute(name, compiled.result_type()));

            parts.push(if column.rename.is_some() || column.expr.leaf_name().is_none() {
                compiled.wrap("", &format!("{SQL_AS}{name}"))
            } else {
                compiled
            });
        }

        Ok((
            CompiledCondition::join(parts, SEPARATOR),
            None,
            output.into_iter().collect(),
        ))
    }

    // Last-value rewrite: project the latest row per group through a
    // correlated sub-select joined on the max timestamp and the group keys.
    fn compile_last_value_columns(
        &self,
        columns: &[SelectColumn],
        names: &[String],
    ) -> Result<(CompiledCondition, Option<SubSelect>, Schema), CompileError> {
        let compiler = self.compiler(ClauseKind::Selection);
        let mut outer = Vec::with_capacity(columns.len());
        let mut inner = Vec::with_capacity(columns.len());
        let mut join = Vec::new();
        let mut output = Vec::with_capacity(columns.len());
        let mut timestamp_joined = false;

        for (column, name) in columns.iter().zip(names) {
            validate_identifier(name)?;
            let alias = format!("{SQL_AS}{name}");

            if let Some(args) = column.expr.last_value_args() {
                let [value, timestamp] = args else {
                    return Err(CompileError::Arity {
                        name: "incrementalAggregator:last".to_string(),
                        expected: "2",
                        found: args.len(),
                    });
                };
                let Some(timestamp_name) = timestamp
                    .leaf_name()
                    .filter(|_| value.leaf_name().is_some())
                else {
                    return Err(CompileError::LastValueArguments);
                };
                validate_identifier(timestamp_name)?;

                let compiled = compiler.compile(value)?;
                output.push(output_attribute(name, compiled.result_type()));
                outer.push(compiled.wrap("", &alias));

                if !timestamp_joined {
                    let max = compiler.compile(timestamp)?;
                    inner.push(max.wrap(
                        &format!("{SQL_MAX}("),
                        &format!("){SQL_AS}{timestamp_name}"),
                    ));

                    let outer_timestamp = compiler.compile(timestamp)?;
                    join.push(outer_timestamp.wrap(
                        "",
                        &format!(" = {SUB_SELECT_ALIAS}.{timestamp_name}"),
                    ));
                    timestamp_joined = true;
                }
            } else if contains_aggregate(&column.expr) {
                let compiled = compiler.compile(&column.expr)?;
                output.push(output_attribute(name, compiled.result_type()));

                outer.push(CompiledCondition::from_template(Template::text(format!(
                    "{SQL_MAX}({SUB_SELECT_ALIAS}.{name}){alias}"
                ))));
                inner.push(compiled.wrap("", &alias));
            } else {
                let compiled = compiler.compile(&column.expr)?;
                output.push(output_attribute(name, compiled.result_type()));

                outer.push(compiled.clone().wrap("", &alias));
                inner.push(compiled.clone().wrap("", &alias));
                join.push(compiled.wrap("", &format!(" = {SUB_SELECT_ALIAS}.{name}")));
            }
        }

        let sub_select = SubSelect {
            inner: CompiledCondition::join(inner, SEPARATOR),
            join: CompiledCondition::join(join, SQL_AND),
        };

        Ok((
            CompiledCondition::join(outer, SEPARATOR),
            Some(sub_select),
            output.into_iter().collect(),
        ))
    }
}

// Rename, else the attribute name of a leaf column, else `_col<position>`.
fn output_name(column: &SelectColumn, position: usize) -> Result<String, CompileError> {
    if let Some(rename) = &column.rename {
        validate_identifier(rename)?;
        return Ok(rename.clone());
    }

    let source = column
        .expr
        .last_value_args()
        .and_then(<[Expr]>::first)
        .unwrap_or(&column.expr);

    Ok(source
        .leaf_name()
        .map_or_else(|| format!("{SYNTHETIC_PREFIX}{}", position + 1), str::to_string))
}

fn output_attribute(name: &str, ty: Option<AttributeType>) -> Attribute {
    Attribute::new(name, ty.unwrap_or(AttributeType::Object))
}
