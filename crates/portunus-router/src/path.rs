//! Path templates and matching.
//!
//! A [`PathSpec`] is a normalized path template: static segments, `{name}`
//! parameter segments, and an optional trailing wildcard (`/**` anonymous,
//! or `*name` binding the remainder). Matching is pure and allocation-light;
//! specificity ordering is what lets the domain pick the best of several
//! matching services.

use portunus_core::{PortunusError, PortunusResult};

use crate::params::Params;

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Static path segment (e.g., "users", "api").
    Static(String),
    /// Named parameter (e.g., "{id}").
    Param(String),
    /// Trailing wildcard; `Some` binds the remainder under that name.
    Wildcard(Option<String>),
}

/// A normalized path template.
///
/// # Example
///
/// ```
/// use portunus_router::PathSpec;
///
/// let spec = PathSpec::parse("/users/{id}/files/**").unwrap();
/// let params = spec.matches("/users/7/files/a/b.txt").unwrap();
/// assert_eq!(params.get("id"), Some("7"));
///
/// assert!(spec.matches("/users").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    raw: String,
    segments: Vec<Segment>,
}

impl PathSpec {
    /// Parses and normalizes a template.
    ///
    /// Empty segments are dropped, a leading slash is implied, and a
    /// wildcard is only legal as the last segment.
    ///
    /// # Errors
    ///
    /// Returns [`PortunusError::Configuration`] on a malformed template.
    pub fn parse(spec: &str) -> PortunusResult<Self> {
        let pieces: Vec<&str> = spec.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(pieces.len());
        for (index, piece) in pieces.iter().enumerate() {
            let last = index + 1 == pieces.len();
            let segment = if *piece == "**" {
                Segment::Wildcard(None)
            } else if let Some(name) = piece.strip_prefix('*') {
                Segment::Wildcard(Some(name.to_string()))
            } else if let Some(name) = piece.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if name.is_empty() {
                    return Err(PortunusError::configuration(format!(
                        "empty parameter name in path spec {spec:?}"
                    )));
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Static((*piece).to_string())
            };

            if matches!(segment, Segment::Wildcard(_)) && !last {
                return Err(PortunusError::configuration(format!(
                    "wildcard must be the last segment in path spec {spec:?}"
                )));
            }
            segments.push(segment);
        }

        let raw = if segments.is_empty() {
            "/".to_string()
        } else {
            let mut raw = String::new();
            for segment in &segments {
                raw.push('/');
                match segment {
                    Segment::Static(s) => raw.push_str(s),
                    Segment::Param(name) => {
                        raw.push('{');
                        raw.push_str(name);
                        raw.push('}');
                    }
                    Segment::Wildcard(None) => raw.push_str("**"),
                    Segment::Wildcard(Some(name)) => {
                        raw.push('*');
                        raw.push_str(name);
                    }
                }
            }
            raw
        };

        Ok(Self { raw, segments })
    }

    /// The default template: a catch-all matching every path.
    #[must_use]
    pub fn catch_all() -> Self {
        Self::parse("/**").expect("catch-all template is well-formed")
    }

    /// Returns the normalized template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the template ends in a wildcard.
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// Matches a request path against the template, returning the bound
    /// parameters on success.
    ///
    /// Trailing slashes on the request path are normalized away; a
    /// wildcard consumes zero or more remaining segments.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();

        let mut cursor = 0;
        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if parts.get(cursor) != Some(&expected.as_str()) {
                        return None;
                    }
                    cursor += 1;
                }
                Segment::Param(name) => {
                    let value = parts.get(cursor)?;
                    params.push(name.clone(), (*value).to_string());
                    cursor += 1;
                }
                Segment::Wildcard(name) => {
                    if let Some(name) = name {
                        params.push(name.clone(), parts[cursor..].join("/"));
                    }
                    cursor = parts.len();
                }
            }
        }

        (cursor == parts.len()).then_some(params)
    }

    /// Specificity ordering key: more static segments beat more parameters
    /// beat a wildcard. Greater means more specific.
    #[must_use]
    pub fn specificity(&self) -> (usize, usize, bool) {
        let statics = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count();
        let parameters = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count();
        (statics, parameters, !self.has_wildcard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(PathSpec::parse("users//{id}/").unwrap().as_str(), "/users/{id}");
        assert_eq!(PathSpec::parse("").unwrap().as_str(), "/");
        assert_eq!(PathSpec::parse("/").unwrap().as_str(), "/");
    }

    #[test]
    fn test_parse_rejects_inner_wildcard() {
        assert!(PathSpec::parse("/files/**/meta").is_err());
        assert!(PathSpec::parse("/files/*rest/meta").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_param_name() {
        assert!(PathSpec::parse("/users/{}").is_err());
    }

    #[test]
    fn test_static_match() {
        let spec = PathSpec::parse("/demo").unwrap();
        assert!(spec.matches("/demo").is_some());
        assert!(spec.matches("/demo/").is_some());
        assert!(spec.matches("/other").is_none());
        assert!(spec.matches("/demo/more").is_none());
    }

    #[test]
    fn test_param_match_binds_value() {
        let spec = PathSpec::parse("/users/{id}").unwrap();
        let params = spec.matches("/users/123").unwrap();
        assert_eq!(params.get("id"), Some("123"));
        assert!(spec.matches("/users").is_none());
    }

    #[test]
    fn test_anonymous_wildcard_matches_zero_or_more() {
        let spec = PathSpec::parse("/files/**").unwrap();
        assert!(spec.matches("/files").is_some());
        assert!(spec.matches("/files/a").is_some());
        assert!(spec.matches("/files/a/b/c").is_some());
        assert!(spec.matches("/other").is_none());
    }

    #[test]
    fn test_named_wildcard_binds_remainder() {
        let spec = PathSpec::parse("/files/*path").unwrap();
        let params = spec.matches("/files/images/logo.png").unwrap();
        assert_eq!(params.get("path"), Some("images/logo.png"));
    }

    #[test]
    fn test_catch_all_matches_root() {
        let spec = PathSpec::catch_all();
        assert!(spec.matches("/").is_some());
        assert!(spec.matches("/anything/at/all").is_some());
    }

    #[test]
    fn test_specificity_ordering() {
        let static_spec = PathSpec::parse("/users/me").unwrap();
        let param_spec = PathSpec::parse("/users/{id}").unwrap();
        let wild_spec = PathSpec::parse("/users/**").unwrap();
        let catch_all = PathSpec::catch_all();

        assert!(static_spec.specificity() > param_spec.specificity());
        assert!(param_spec.specificity() > wild_spec.specificity());
        assert!(wild_spec.specificity() > catch_all.specificity());
    }
}
