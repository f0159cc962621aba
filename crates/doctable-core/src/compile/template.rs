use crate::compile::{PLACEHOLDER, param::ParameterDescriptor};

///
/// Template
///
/// Parameterized query text held as pre-split segments.
///
/// Invariant: `segments.len() == parameters.len() + 1`.
/// Placeholder `i` sits between `segments[i]` and `segments[i + 1]`, so the
/// ordinal of a parameter is its position in `parameters`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    segments: Vec<String>,
    parameters: Vec<ParameterDescriptor>,
}

impl Template {
    #[must_use]
    pub fn new() -> Self {
        Self {
            segments: vec![String::new()],
            parameters: Vec::new(),
        }
    }

    /// Template consisting of fixed text only.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
            parameters: Vec::new(),
        }
    }

    ///
    /// BUILDING
    ///

    /// Append fixed text after the last placeholder.
    pub fn push_str(&mut self, text: &str) {
        if let Some(tail) = self.segments.last_mut() {
            tail.push_str(text);
        }
    }

    /// Append one placeholder; its ordinal is the current placeholder count.
    pub fn push_param(&mut self, descriptor: ParameterDescriptor) {
        self.parameters.push(descriptor);
        self.segments.push(String::new());
    }

    /// Append another template, shifting its ordinals past ours.
    pub fn append(&mut self, other: Self) {
        let mut segments = other.segments.into_iter();
        if let Some(head) = segments.next() {
            self.push_str(&head);
        }
        self.segments.extend(segments);
        self.parameters.extend(other.parameters);
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.parameters.len()
    }

    /// True when there is neither text nor any placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.segments.iter().all(String::is_empty)
    }

    /// True when the template is exactly one placeholder.
    #[must_use]
    pub fn is_single_placeholder(&self) -> bool {
        self.parameters.len() == 1 && self.segments.iter().all(String::is_empty)
    }

    /// Query text with one `?` per placeholder.
    #[must_use]
    pub fn query_text(&self) -> String {
        self.segments.join(PLACEHOLDER)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate templates in order, joining them with `separator`.
///
/// Ordinals of each template are offset by the placeholder count of all
/// templates before it, so the result stays contiguous from 0 in input order.
#[must_use]
pub fn merge_ordinals<I>(templates: I, separator: &str) -> Template
where
    I: IntoIterator<Item = Template>,
{
    templates
        .into_iter()
        .enumerate()
        .fold(Template::new(), |mut merged, (index, template)| {
            if index > 0 {
                merged.push_str(separator);
            }
            merged.append(template);
            merged
        })
}
