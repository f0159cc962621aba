//! Runtime binding of compiled artifacts.
//!
//! Resolution never mutates the artifact; one compiled condition may be
//! resolved concurrently against many value maps.

#[cfg(test)]
mod tests;

use crate::{
    compile::{CompiledCondition, ParameterDescriptor, Template},
    schema::Values,
    value::Value,
};
use thiserror::Error as ThisError;

///
/// BindError
///
/// Failure to bind one invocation's values; the artifact stays valid.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BindError {
    #[error("no runtime value bound for attribute '{name}'")]
    MissingAttribute { name: String },

    #[error("row has {found} values, schema expects {expected}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("compiled expression is not a single value")]
    NotScalar,
}

/// Substitute every placeholder in ordinal order and return executable text.
///
/// The always-true sentinel resolves to an empty filter without reading
/// `values`.
pub fn resolve(compiled: &CompiledCondition, values: &Values) -> Result<String, BindError> {
    if compiled.is_always_true() {
        return Ok(String::new());
    }

    render_template(
        compiled.template(),
        compiled.contains_pattern_ordinals(),
        values,
    )
}

/// Evaluate a single-placeholder artifact to its bound value.
pub fn resolve_scalar(compiled: &CompiledCondition, values: &Values) -> Result<Value, BindError> {
    let template = compiled.template();

    match template.parameters() {
        [ParameterDescriptor::Constant { value, .. }] if template.is_single_placeholder() => {
            Ok(value.clone())
        }
        [ParameterDescriptor::AttributeReference { name, .. }]
            if template.is_single_placeholder() =>
        {
            lookup(values, name).cloned()
        }
        _ => Err(BindError::NotScalar),
    }
}

// Single pass over pre-split segments; rendered literals are never rescanned.
fn render_template(
    template: &Template,
    text_ordinals: &[usize],
    values: &Values,
) -> Result<String, BindError> {
    let segments = template.segments();
    let parameters = template.parameters();
    let capacity = segments.iter().map(String::len).sum::<usize>() + 16 * parameters.len();
    let mut out = String::with_capacity(capacity);

    for (ordinal, (segment, parameter)) in segments.iter().zip(parameters).enumerate() {
        out.push_str(segment);
        render_parameter(parameter, text_ordinals.contains(&ordinal), values, &mut out)?;
    }
    if let Some(tail) = segments.get(parameters.len()) {
        out.push_str(tail);
    }

    Ok(out)
}

fn render_parameter(
    parameter: &ParameterDescriptor,
    as_text: bool,
    values: &Values,
    out: &mut String,
) -> Result<(), BindError> {
    let (value, ty) = match parameter {
        ParameterDescriptor::Constant { ty, value } => (value, *ty),
        ParameterDescriptor::AttributeReference { name, ty } => (lookup(values, name)?, *ty),
        ParameterDescriptor::Field { path, .. } => {
            out.push_str(path);
            return Ok(());
        }
    };

    if as_text {
        value.render_text_literal(out);
    } else {
        value.render_literal(ty, out);
    }

    Ok(())
}

fn lookup<'a>(values: &'a Values, name: &str) -> Result<&'a Value, BindError> {
    values.get(name).ok_or_else(|| BindError::MissingAttribute {
        name: name.to_string(),
    })
}
