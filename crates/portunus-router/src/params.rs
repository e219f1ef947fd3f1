//! Parameter extraction, storage, and typed definitions.
//!
//! Matched path parameters (and bound query parameters) are stored as
//! (name, value) pairs with a small-vector optimization to avoid heap
//! allocations for the common 1-4 parameter case. A service may attach
//! typed [`ParamDef`]s; binding validates request values against them
//! before any handler runs.

use smallvec::SmallVec;

use portunus_core::{PortunusError, PortunusResult};

/// Maximum number of parameters stored inline (stack allocated).
const INLINE_PARAMS: usize = 4;

/// Matched parameters from a route match.
///
/// # Example
///
/// ```
/// use portunus_router::Params;
///
/// let mut params = Params::new();
/// params.push("user_id", "123");
///
/// assert_eq!(params.get("user_id"), Some("123"));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates a new empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter to the set.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value for a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// The value shape a parameter definition accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Any string value.
    Str,
    /// A base-10 signed integer.
    Int,
    /// `true` or `false`.
    Bool,
}

impl ParamKind {
    fn validate(self, name: &str, value: &str) -> PortunusResult<()> {
        match self {
            Self::Str => Ok(()),
            Self::Int => value
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| PortunusError::parameter(name, "expected an integer")),
            Self::Bool => match value {
                "true" | "false" => Ok(()),
                _ => Err(PortunusError::parameter(name, "expected true or false")),
            },
        }
    }
}

/// Where a parameter value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Bound from a `{name}` path segment.
    Path,
    /// Bound from the query string.
    Query,
}

/// A typed parameter definition attached to a service.
///
/// Path parameters are required by construction (the template cannot match
/// without them); query parameters default to required and can be relaxed
/// with [`ParamDef::optional`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    name: String,
    source: ParamSource,
    kind: ParamKind,
    required: bool,
}

impl ParamDef {
    /// Defines a path parameter of the given kind.
    pub fn path(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            source: ParamSource::Path,
            kind,
            required: true,
        }
    }

    /// Defines a required query parameter of the given kind.
    pub fn query(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            source: ParamSource::Query,
            kind,
            required: true,
        }
    }

    /// Marks the definition optional: an absent value passes, a present
    /// one is still validated.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns where the value is bound from.
    #[must_use]
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// Returns the accepted value shape.
    #[must_use]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }
}

/// Looks up `name` in a raw query string (`a=1&b=2`).
fn query_value<'q>(query: &'q str, name: &str) -> Option<&'q str> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then_some(value)
    })
}

/// Validates request values against the definitions and folds bound query
/// values into `params` so handlers read every parameter uniformly.
///
/// # Errors
///
/// Returns [`PortunusError::ParameterValidation`] carrying the offending
/// parameter name on the first violation.
pub(crate) fn bind_parameters(
    definitions: &[ParamDef],
    params: &mut Params,
    query: Option<&str>,
) -> PortunusResult<()> {
    for def in definitions {
        let value = match def.source {
            ParamSource::Path => params.get(&def.name).map(ToString::to_string),
            ParamSource::Query => query
                .and_then(|q| query_value(q, &def.name))
                .map(ToString::to_string),
        };
        match value {
            Some(value) => {
                def.kind.validate(&def.name, &value)?;
                if def.source == ParamSource::Query {
                    params.push(def.name.clone(), value);
                }
            }
            None if def.required => {
                return Err(PortunusError::parameter(&def.name, "missing required value"));
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_push_and_get() {
        let mut params = Params::new();
        assert!(params.is_empty());
        params.push("user_id", "123");
        params.push("action", "view");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("user_id"), Some("123"));
        assert_eq!(params.get("action"), Some("view"));
        assert_eq!(params.get("unknown"), None);
    }

    #[test]
    fn test_params_iter() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        let collected: Vec<_> = params.iter().collect();
        assert_eq!(collected, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_bind_validates_path_int() {
        let defs = [ParamDef::path("id", ParamKind::Int)];
        let mut params = Params::new();
        params.push("id", "42");
        bind_parameters(&defs, &mut params, None).unwrap();

        let mut params = Params::new();
        params.push("id", "forty-two");
        let err = bind_parameters(&defs, &mut params, None).unwrap_err();
        assert!(matches!(
            err,
            PortunusError::ParameterValidation { ref name, .. } if name == "id"
        ));
    }

    #[test]
    fn test_bind_query_value_folds_into_params() {
        let defs = [ParamDef::query("page", ParamKind::Int)];
        let mut params = Params::new();
        bind_parameters(&defs, &mut params, Some("page=3&sort=asc")).unwrap();
        assert_eq!(params.get("page"), Some("3"));
    }

    #[test]
    fn test_bind_missing_required_query() {
        let defs = [ParamDef::query("page", ParamKind::Int)];
        let mut params = Params::new();
        let err = bind_parameters(&defs, &mut params, Some("sort=asc")).unwrap_err();
        assert!(matches!(
            err,
            PortunusError::ParameterValidation { ref name, .. } if name == "page"
        ));
    }

    #[test]
    fn test_bind_optional_query_absent_passes() {
        let defs = [ParamDef::query("page", ParamKind::Int).optional()];
        let mut params = Params::new();
        bind_parameters(&defs, &mut params, None).unwrap();
        assert_eq!(params.get("page"), None);
    }

    #[test]
    fn test_bind_optional_present_still_validated() {
        let defs = [ParamDef::query("debug", ParamKind::Bool).optional()];
        let mut params = Params::new();
        let err = bind_parameters(&defs, &mut params, Some("debug=maybe")).unwrap_err();
        assert!(matches!(err, PortunusError::ParameterValidation { .. }));
    }

    #[test]
    fn test_query_value_handles_flag_pairs() {
        assert_eq!(query_value("a=1&flag&b=2", "flag"), Some(""));
        assert_eq!(query_value("a=1", "missing"), None);
    }
}
