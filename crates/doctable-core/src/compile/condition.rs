use crate::{
    compile::{
        ALWAYS_TRUE_TEXT, ClauseKind, CompileError, SEPARATOR,
        param::ParameterDescriptor,
        template::{Template, merge_ordinals},
    },
    expr::{CompareOp, Expr, INCREMENTAL_AGGREGATOR_NAMESPACE, MathOp, STR_NAMESPACE},
    schema::Values,
};
use doctable_primitives::AttributeType;
use std::{fmt, sync::Arc};

///
/// InMemoryFilter
///
/// Host-supplied check of whether a pending insert already satisfies the
/// condition for an incoming record.
///

pub trait InMemoryFilter: fmt::Debug + Send + Sync {
    fn matches(&self, pending: &Values, incoming: &Values) -> bool;
}

///
/// UpdateReducer
///
/// Host-supplied fold of an incoming record into a pending insert.
///

pub trait UpdateReducer: fmt::Debug + Send + Sync {
    fn reduce(&self, pending: &mut Values, incoming: &Values);
}

///
/// CompiledCondition
///
/// Immutable compile artifact: parameterized text plus the ordinal-ordered
/// descriptor list. Safe to resolve concurrently.
///

#[derive(Clone, Debug)]
pub struct CompiledCondition {
    template: Template,
    contains_ordinals: Vec<usize>,
    always_true: bool,
    result_type: Option<AttributeType>,
    update_reducer: Option<Arc<dyn UpdateReducer>>,
    in_memory_filter: Option<Arc<dyn InMemoryFilter>>,
}

impl CompiledCondition {
    fn new(
        template: Template,
        contains_ordinals: Vec<usize>,
        result_type: Option<AttributeType>,
    ) -> Self {
        Self {
            template,
            contains_ordinals,
            always_true: false,
            result_type,
            update_reducer: None,
            in_memory_filter: None,
        }
    }

    /// The always-true sentinel; resolves to an empty filter.
    #[must_use]
    pub fn always_true() -> Self {
        Self {
            always_true: true,
            ..Self::new(
                Template::text(ALWAYS_TRUE_TEXT),
                Vec::new(),
                Some(AttributeType::Bool),
            )
        }
    }

    /// Wrap a template with no contains pattern.
    pub(crate) fn from_template(template: Template) -> Self {
        Self::new(template, Vec::new(), None)
    }

    /// Surround the compiled text with fixed text; ordinals are unchanged.
    pub(crate) fn wrap(self, prefix: &str, suffix: &str) -> Self {
        let mut template = Template::text(prefix);
        template.append(self.template);
        template.push_str(suffix);

        Self {
            template,
            ..self
        }
    }

    /// Concatenate compiled parts, renumbering ordinals in part order.
    pub(crate) fn join(parts: Vec<Self>, separator: &str) -> Self {
        let mut offset = 0;
        let mut contains_ordinals = Vec::new();
        let mut templates = Vec::with_capacity(parts.len());

        for part in parts {
            contains_ordinals.extend(
                part.contains_ordinals
                    .iter()
                    .map(|ordinal| ordinal + offset),
            );
            offset += part.template.placeholder_count();
            templates.push(part.template);
        }

        Self::new(merge_ordinals(templates, separator), contains_ordinals, None)
    }

    ///
    /// HOOKS
    ///

    #[must_use]
    pub fn with_update_reducer(mut self, reducer: Arc<dyn UpdateReducer>) -> Self {
        self.update_reducer = Some(reducer);
        self
    }

    #[must_use]
    pub fn with_in_memory_filter(mut self, filter: Arc<dyn InMemoryFilter>) -> Self {
        self.in_memory_filter = Some(filter);
        self
    }

    #[must_use]
    pub const fn supports_update_reduction(&self) -> bool {
        self.update_reducer.is_some()
    }

    #[must_use]
    pub const fn supports_in_memory_filter(&self) -> bool {
        self.in_memory_filter.is_some()
    }

    #[must_use]
    pub fn update_reducer(&self) -> Option<&dyn UpdateReducer> {
        self.update_reducer.as_deref()
    }

    #[must_use]
    pub fn in_memory_filter(&self) -> Option<&dyn InMemoryFilter> {
        self.in_memory_filter.as_deref()
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn query_text(&self) -> String {
        self.template.query_text()
    }

    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        self.template.parameters()
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.template.placeholder_count()
    }

    #[must_use]
    pub fn contains_pattern_present(&self) -> bool {
        !self.contains_ordinals.is_empty()
    }

    /// Ordinal of the first contains-pattern placeholder.
    #[must_use]
    pub fn contains_pattern_ordinal(&self) -> Option<usize> {
        self.contains_ordinals.first().copied()
    }

    #[must_use]
    pub fn contains_pattern_ordinals(&self) -> &[usize] {
        &self.contains_ordinals
    }

    #[must_use]
    pub const fn is_always_true(&self) -> bool {
        self.always_true
    }

    /// Type the compiled expression evaluates to, when known.
    #[must_use]
    pub const fn result_type(&self) -> Option<AttributeType> {
        self.result_type
    }
}

///
/// ConditionCompiler
///
/// Walks one expression tree depth-first, left to right. Every leaf emits one
/// placeholder and one descriptor in visit order.
///

#[derive(Clone, Debug)]
pub struct ConditionCompiler {
    table: String,
    clause: ClauseKind,
}

impl ConditionCompiler {
    #[must_use]
    pub fn new(table: impl Into<String>, clause: ClauseKind) -> Self {
        Self {
            table: table.into(),
            clause,
        }
    }

    #[must_use]
    pub const fn clause(&self) -> ClauseKind {
        self.clause
    }

    pub fn compile(&self, expr: &Expr) -> Result<CompiledCondition, CompileError> {
        match self.clause {
            ClauseKind::Condition if expr.is_always_true() => {
                return Ok(CompiledCondition::always_true());
            }
            ClauseKind::SetAttribute
                if !matches!(expr, Expr::Constant(_) | Expr::Attribute { .. }) =>
            {
                return Err(CompileError::SetValueNotLeaf);
            }
            _ => {}
        }

        let mut emitter = Emitter {
            table: &self.table,
            clause: self.clause,
            out: Template::new(),
            contains: Vec::new(),
        };
        let result_type = emitter.visit(expr)?;

        Ok(CompiledCondition::new(
            emitter.out,
            emitter.contains,
            result_type,
        ))
    }
}

///
/// Emitter
///

struct Emitter<'a> {
    table: &'a str,
    clause: ClauseKind,
    out: Template,
    contains: Vec<usize>,
}

impl Emitter<'_> {
    fn visit(&mut self, expr: &Expr) -> Result<Option<AttributeType>, CompileError> {
        match expr {
            Expr::Constant(value) => {
                self.out
                    .push_param(ParameterDescriptor::constant(value.clone()));

                Ok(value.attribute_type())
            }
            Expr::Attribute { name, ty } => {
                self.out
                    .push_param(ParameterDescriptor::attribute(name.clone(), *ty));

                Ok(Some(*ty))
            }
            Expr::TableAttribute { name, ty } => {
                let path = if self.clause.qualifies_fields() {
                    format!("{}.{name}", self.table)
                } else {
                    name.clone()
                };
                self.out.push_param(ParameterDescriptor::field(path, *ty));

                Ok(Some(*ty))
            }
            Expr::Compare { op, left, right } => self.visit_compare(*op, left, right),
            Expr::And(left, right) => self.visit_connective("AND", left, right),
            Expr::Or(left, right) => self.visit_connective("OR", left, right),
            Expr::Not(inner) => {
                self.out.push_str("(NOT ");
                let ty = self.visit(inner)?;
                self.out.push_str(")");
                expect_bool("NOT", ty)?;

                Ok(Some(AttributeType::Bool))
            }
            Expr::IsNull(inner) => {
                self.out.push_str("(");
                self.visit(inner)?;
                self.out.push_str(" IS NULL)");

                Ok(Some(AttributeType::Bool))
            }
            Expr::Contains { attribute, pattern } => self.visit_contains(attribute, pattern),
            Expr::Math { op, left, right } => self.visit_math(*op, left, right),
            Expr::Function {
                namespace,
                name,
                args,
            } => self.visit_function(namespace.as_deref(), name, args),
            Expr::In { .. } => Err(CompileError::UnsupportedExpression { kind: "in" }),
        }
    }

    fn visit_compare(
        &mut self,
        op: CompareOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Option<AttributeType>, CompileError> {
        self.out.push_str("(");
        let left_ty = self.visit(left)?;
        self.out.push_str(" ");
        self.out.push_str(op.symbol());
        self.out.push_str(" ");
        let right_ty = self.visit(right)?;
        self.out.push_str(")");

        if op.is_ordering() {
            for ty in [left_ty, right_ty].into_iter().flatten() {
                if !ty.supports_ordering() {
                    return Err(CompileError::NotOrderable { op, ty });
                }
            }
        }

        Ok(Some(AttributeType::Bool))
    }

    fn visit_connective(
        &mut self,
        connective: &'static str,
        left: &Expr,
        right: &Expr,
    ) -> Result<Option<AttributeType>, CompileError> {
        self.out.push_str("(");
        let left_ty = self.visit(left)?;
        self.out.push_str(" ");
        self.out.push_str(connective);
        self.out.push_str(" ");
        let right_ty = self.visit(right)?;
        self.out.push_str(")");

        expect_bool(connective, left_ty)?;
        expect_bool(connective, right_ty)?;

        Ok(Some(AttributeType::Bool))
    }

    fn visit_contains(
        &mut self,
        attribute: &Expr,
        pattern: &Expr,
    ) -> Result<Option<AttributeType>, CompileError> {
        if !pattern.is_leaf() {
            return Err(CompileError::ContainsPatternNotLeaf);
        }

        self.out.push_str("CONTAINS(");
        self.visit(attribute)?;
        self.out.push_str(SEPARATOR);
        self.contains.push(self.out.placeholder_count());
        self.visit(pattern)?;
        self.out.push_str(")");

        Ok(Some(AttributeType::Bool))
    }

    fn visit_math(
        &mut self,
        op: MathOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Option<AttributeType>, CompileError> {
        self.out.push_str("(");
        let left_ty = self.visit(left)?;
        self.out.push_str(" ");
        self.out.push_str(op.symbol());
        self.out.push_str(" ");
        let right_ty = self.visit(right)?;
        self.out.push_str(")");

        for ty in [left_ty, right_ty].into_iter().flatten() {
            if !ty.supports_arithmetic() {
                return Err(CompileError::NotArithmetic { op, ty });
            }
        }

        Ok(match (left_ty, right_ty) {
            (Some(l), Some(r)) => Some(wider_numeric(l, r)),
            (ty, None) | (None, ty) => ty,
        })
    }

    fn visit_function(
        &mut self,
        namespace: Option<&str>,
        name: &str,
        args: &[Expr],
    ) -> Result<Option<AttributeType>, CompileError> {
        match namespace {
            None => {
                let Some(aggregate) = Aggregate::from_name(name) else {
                    return Err(CompileError::UnsupportedFunction {
                        name: name.to_string(),
                    });
                };

                self.visit_aggregate(aggregate, args)
            }
            Some(STR_NAMESPACE) if name == "contains" => match args {
                [attribute, pattern] => self.visit_contains(attribute, pattern),
                _ => Err(CompileError::Arity {
                    name: format!("{STR_NAMESPACE}:{name}"),
                    expected: "2",
                    found: args.len(),
                }),
            },
            Some(INCREMENTAL_AGGREGATOR_NAMESPACE) if name == "last" => {
                Err(CompileError::LastValueMisplaced)
            }
            Some(ns) => Err(CompileError::UnsupportedFunction {
                name: format!("{ns}:{name}"),
            }),
        }
    }

    fn visit_aggregate(
        &mut self,
        aggregate: Aggregate,
        args: &[Expr],
    ) -> Result<Option<AttributeType>, CompileError> {
        if !self.clause.allows_aggregates() {
            return Err(CompileError::AggregateNotAllowed {
                name: aggregate.name().to_string(),
                clause: self.clause,
            });
        }

        self.out.push_str(aggregate.keyword());
        self.out.push_str("(");

        let arg_ty = match (aggregate, args) {
            (Aggregate::Count, []) => {
                self.out.push_str("1");
                None
            }
            (_, [arg]) => self.visit(arg)?,
            _ => {
                return Err(CompileError::Arity {
                    name: aggregate.name().to_string(),
                    expected: if aggregate == Aggregate::Count { "0 or 1" } else { "1" },
                    found: args.len(),
                });
            }
        };
        self.out.push_str(")");

        aggregate.result_type(arg_ty)
    }
}

///
/// Aggregate
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Aggregate {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    const fn keyword(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Count => "COUNT",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    fn result_type(
        self,
        arg: Option<AttributeType>,
    ) -> Result<Option<AttributeType>, CompileError> {
        let unsupported = |ty| CompileError::NotAggregatable {
            name: self.name().to_string(),
            ty,
        };

        match (self, arg) {
            (Self::Count, _) => Ok(Some(AttributeType::Long)),
            (_, None) => Ok(None),
            (Self::Sum | Self::Avg, Some(ty)) if !ty.supports_arithmetic() => Err(unsupported(ty)),
            (Self::Min | Self::Max, Some(ty)) if !ty.supports_ordering() => Err(unsupported(ty)),
            (Self::Sum, Some(AttributeType::Int | AttributeType::Long)) => {
                Ok(Some(AttributeType::Long))
            }
            (Self::Sum | Self::Avg, Some(_)) => Ok(Some(AttributeType::Double)),
            (Self::Min | Self::Max, Some(ty)) => Ok(Some(ty)),
        }
    }
}

/// Whether any node of `expr` is an aggregate function call.
pub(crate) fn contains_aggregate(expr: &Expr) -> bool {
    match expr {
        Expr::Function {
            namespace: None,
            name,
            ..
        } if Aggregate::from_name(name).is_some() => true,
        Expr::Function { args, .. } => args.iter().any(contains_aggregate),
        Expr::Compare { left, right, .. }
        | Expr::Math { left, right, .. }
        | Expr::And(left, right)
        | Expr::Or(left, right) => contains_aggregate(left) || contains_aggregate(right),
        Expr::Contains { attribute, pattern } => {
            contains_aggregate(attribute) || contains_aggregate(pattern)
        }
        Expr::Not(inner) | Expr::IsNull(inner) => contains_aggregate(inner),
        Expr::In { left, .. } => contains_aggregate(left),
        Expr::Constant(_) | Expr::Attribute { .. } | Expr::TableAttribute { .. } => false,
    }
}

fn expect_bool(connective: &'static str, ty: Option<AttributeType>) -> Result<(), CompileError> {
    match ty {
        Some(ty) if ty != AttributeType::Bool => Err(CompileError::NotBoolean { connective, ty }),
        _ => Ok(()),
    }
}

const fn numeric_rank(ty: AttributeType) -> u8 {
    match ty {
        AttributeType::Int => 0,
        AttributeType::Long => 1,
        AttributeType::Float => 2,
        _ => 3,
    }
}

fn wider_numeric(left: AttributeType, right: AttributeType) -> AttributeType {
    if numeric_rank(left) >= numeric_rank(right) {
        left
    } else {
        right
    }
}
