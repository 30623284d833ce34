//! IRI reference handling (RFC 3986)
//!
//! Two operations live here:
//! - [`resolve`] turns a relative reference into an absolute IRI against a
//!   base (RFC 3986 section 5.2). Parsers use it for every IRI they read.
//! - [`relativize`] computes the shortest reference that [`resolve`] maps
//!   back onto the original IRI. Stream writers use it for output.
//!
//! Neither operation performs percent-decoding or case normalization.

use crate::error::IriError;

/// The five components of an IRI reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> Parts<'a> {
    fn parse(iri: &'a str) -> Self {
        let (rest, fragment) = match iri.find('#') {
            Some(pos) => (&iri[..pos], Some(&iri[pos + 1..])),
            None => (iri, None),
        };
        let (rest, query) = match rest.find('?') {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };
        let (scheme, rest) = match scheme_end(rest) {
            Some(pos) => (Some(&rest[..pos]), &rest[pos + 1..]),
            None => (None, rest),
        };
        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                (Some(&after[..end]), &after[end..])
            }
            None => (None, rest),
        };
        Parts {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }
}

impl std::fmt::Display for Parts<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(s) = self.scheme {
            write!(f, "{}:", s)?;
        }
        if let Some(a) = self.authority {
            write!(f, "//{}", a)?;
        }
        f.write_str(self.path)?;
        if let Some(q) = self.query {
            write!(f, "?{}", q)?;
        }
        if let Some(frag) = self.fragment {
            write!(f, "#{}", frag)?;
        }
        Ok(())
    }
}

/// Position of the ':' ending a valid scheme, if `s` starts with one.
fn scheme_end(s: &str) -> Option<usize> {
    let pos = s.find(':')?;
    let scheme = &s[..pos];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
    {
        Some(pos)
    } else {
        None
    }
}

/// Returns true if `iri` starts with a scheme.
pub fn is_absolute(iri: &str) -> bool {
    let end = iri
        .find(|c| c == '/' || c == '?' || c == '#')
        .unwrap_or(iri.len());
    scheme_end(&iri[..end]).is_some()
}

/// Remove `.` and `..` segments from a path (RFC 3986 section 5.2.4).
pub fn remove_dot_segments(path: &str) -> String {
    let mut input = path;
    let mut output = String::with_capacity(path.len());

    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest;
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest;
        } else if input.starts_with("/./") {
            input = &input[2..];
        } else if input == "/." {
            input = "/";
        } else if input.starts_with("/../") {
            input = &input[3..];
            pop_segment(&mut output);
        } else if input == "/.." {
            input = "/";
            pop_segment(&mut output);
        } else if input == "." || input == ".." {
            input = "";
        } else {
            let skip = usize::from(input.starts_with('/'));
            let end = input[skip..]
                .find('/')
                .map(|i| i + skip)
                .unwrap_or(input.len());
            output.push_str(&input[..end]);
            input = &input[end..];
        }
    }
    output
}

fn pop_segment(output: &mut String) {
    match output.rfind('/') {
        Some(pos) => output.truncate(pos),
        None => output.clear(),
    }
}

/// Resolve `reference` against an absolute `base` (RFC 3986 section 5.2.2).
///
/// An absolute `reference` is returned verbatim; the base is not consulted
/// and its dot segments are left in place.
///
/// ```
/// use sflo_graph_ir::iri::resolve;
///
/// assert_eq!(resolve("http://example.org/doc", "rel").unwrap(), "http://example.org/rel");
/// assert_eq!(resolve("http://example.org/doc", "#frag").unwrap(), "http://example.org/doc#frag");
/// ```
pub fn resolve(base: &str, reference: &str) -> Result<String, IriError> {
    let r = Parts::parse(reference);
    if r.scheme.is_some() {
        return Ok(reference.to_string());
    }

    let b = Parts::parse(base);
    if b.scheme.is_none() {
        return Err(IriError::RelativeBase(base.to_string()));
    }

    let merged;
    let (authority, path, query) = if r.authority.is_some() {
        merged = remove_dot_segments(r.path);
        (r.authority, merged.as_str(), r.query)
    } else if r.path.is_empty() {
        (b.authority, b.path, r.query.or(b.query))
    } else if r.path.starts_with('/') {
        merged = remove_dot_segments(r.path);
        (b.authority, merged.as_str(), r.query)
    } else {
        let joined = if b.authority.is_some() && b.path.is_empty() {
            format!("/{}", r.path)
        } else {
            let dir = match b.path.rfind('/') {
                Some(pos) => &b.path[..=pos],
                None => "",
            };
            format!("{}{}", dir, r.path)
        };
        merged = remove_dot_segments(&joined);
        (b.authority, merged.as_str(), r.query)
    };

    Ok(Parts {
        scheme: b.scheme,
        authority,
        path,
        query,
        fragment: r.fragment,
    }
    .to_string())
}

/// Resolve against an optional base; a relative reference without a base is
/// an error.
pub fn resolve_opt(base: Option<&str>, reference: &str) -> Result<String, IriError> {
    match base {
        Some(b) => resolve(b, reference),
        None if is_absolute(reference) => Ok(reference.to_string()),
        None => Err(IriError::MissingBase(reference.to_string())),
    }
}

/// Compute the shortest reference that resolves against `base` to `iri`.
///
/// Returns `None` when `iri` does not share the base's scheme and authority
/// or when no relative form round-trips exactly; callers then write `iri`
/// unchanged.
///
/// ```
/// use sflo_graph_ir::iri::relativize;
///
/// let base = "http://example.org/a/doc";
/// assert_eq!(relativize("http://example.org/a/other", base).as_deref(), Some("other"));
/// assert_eq!(relativize("http://example.org/a/sub/x", base).as_deref(), Some("sub/x"));
/// assert_eq!(relativize("http://example.org/b/x", base).as_deref(), Some("/b/x"));
/// assert_eq!(relativize("https://elsewhere.org/x", base), None);
/// ```
pub fn relativize(iri: &str, base: &str) -> Option<String> {
    let t = Parts::parse(iri);
    let b = Parts::parse(base);
    if t.scheme.is_none() || t.scheme != b.scheme || t.authority != b.authority {
        return None;
    }

    let candidate = relative_candidate(&t, &b)?;
    // Only hand out forms that resolve back to the exact input.
    match resolve(base, &candidate) {
        Ok(back) if back == iri => Some(candidate),
        _ => None,
    }
}

fn relative_candidate(t: &Parts<'_>, b: &Parts<'_>) -> Option<String> {
    let mut out = String::new();

    if t.path == b.path && t.query == b.query {
        // Same document; an empty reference drops only the fragment.
    } else if t.path == b.path && t.query.is_some() {
        // Query-only reference keeps the base path.
    } else {
        if b.authority.is_none() && !b.path.starts_with('/') {
            return None;
        }
        out.push_str(&path_reference(t.path, b.path));
    }

    if let Some(q) = t.query {
        if !(t.path == b.path && t.query == b.query) {
            out.push('?');
            out.push_str(q);
        }
    }
    if let Some(frag) = t.fragment {
        out.push('#');
        out.push_str(frag);
    }
    Some(out)
}

/// Relative path from the directory of `base_path` to `target`.
fn path_reference(target: &str, base_path: &str) -> String {
    let base_dir = match base_path.rfind('/') {
        Some(pos) => &base_path[..=pos],
        None => "/",
    };
    let base_segments: Vec<&str> = base_dir
        .trim_start_matches('/')
        .split_terminator('/')
        .collect();
    let target_segments: Vec<&str> = target.trim_start_matches('/').split('/').collect();
    let target_dirs = &target_segments[..target_segments.len().saturating_sub(1)];

    let common = base_segments
        .iter()
        .zip(target_dirs.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = "../".repeat(base_segments.len() - common);
    rel.push_str(&target_segments[common..].join("/"));

    if rel.is_empty() {
        rel.push_str("./");
    } else {
        let first = rel.split('/').next().unwrap_or_default();
        if first.contains(':') {
            rel.insert_str(0, "./");
        }
    }

    // Prefer an absolute path when climbing out costs more than restating it.
    if target.starts_with('/') && !target.starts_with("//") && target.len() < rel.len() {
        return target.to_string();
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://a/b/c/d;p?q";

    #[test]
    fn test_rfc3986_normal_examples() {
        let cases = [
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("g?y#s", "http://a/b/c/g?y#s"),
            (";x", "http://a/b/c/;x"),
            ("g;x", "http://a/b/c/g;x"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../", "http://a/"),
            ("../../g", "http://a/g"),
        ];
        for (reference, expected) in cases {
            assert_eq!(resolve(BASE, reference).unwrap(), expected, "ref {reference}");
        }
    }

    #[test]
    fn test_rfc3986_abnormal_examples() {
        let cases = [
            ("../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("/../g", "http://a/g"),
            ("g.", "http://a/b/c/g."),
            ("..g", "http://a/b/c/..g"),
            ("./../g", "http://a/b/g"),
            ("g/./h", "http://a/b/c/g/h"),
            ("g/../h", "http://a/b/c/h"),
        ];
        for (reference, expected) in cases {
            assert_eq!(resolve(BASE, reference).unwrap(), expected, "ref {reference}");
        }
    }

    #[test]
    fn test_resolve_relative_against_document_base() {
        assert_eq!(
            resolve("http://example.org/doc", "rel").unwrap(),
            "http://example.org/rel"
        );
    }

    #[test]
    fn test_resolve_file_base() {
        assert_eq!(
            resolve("file:///mesh/node/data.ttl", "other.ttl#x").unwrap(),
            "file:///mesh/node/other.ttl#x"
        );
    }

    #[test]
    fn test_resolve_requires_absolute_base() {
        assert!(matches!(
            resolve("relative/base", "x"),
            Err(IriError::RelativeBase(_))
        ));
        assert!(matches!(
            resolve_opt(None, "x"),
            Err(IriError::MissingBase(_))
        ));
        assert_eq!(resolve_opt(None, "urn:x").unwrap(), "urn:x");
    }

    #[test]
    fn test_absolute_reference_is_kept_verbatim() {
        assert_eq!(
            resolve("http://example.org/doc", "http://ex.org/a/../b").unwrap(),
            "http://ex.org/a/../b"
        );
        assert_eq!(resolve_opt(None, "http://ex.org/a/./b").unwrap(), "http://ex.org/a/./b");
    }

    #[test]
    fn test_is_absolute() {
        assert!(is_absolute("http://example.org"));
        assert!(is_absolute("urn:isbn:123"));
        assert!(!is_absolute("rel/path"));
        assert!(!is_absolute("./a:b"));
        assert!(!is_absolute("#frag"));
    }

    #[test]
    fn test_relativize_cases() {
        let base = "http://example.org/a/b/doc.ttl";
        let cases = [
            ("http://example.org/a/b/doc.ttl", ""),
            ("http://example.org/a/b/doc.ttl#me", "#me"),
            ("http://example.org/a/b/other", "other"),
            ("http://example.org/a/b/", "./"),
            ("http://example.org/a/c/x", "../c/x"),
            ("http://example.org/z", "/z"),
            ("http://example.org/a/b/doc.ttl?v=1", "?v=1"),
        ];
        for (iri, expected) in cases {
            assert_eq!(relativize(iri, base).as_deref(), Some(expected), "iri {iri}");
        }
    }

    #[test]
    fn test_relativize_is_inverse_of_resolve() {
        let base = "file:///mesh/node/_ref/_working/node_ref.ttl";
        let iris = [
            "file:///mesh/node/_ref/_working/node_ref.ttl#section1",
            "file:///mesh/node/_meta/x",
            "file:///other",
            "file:///mesh/node/_ref/_working/a:b",
        ];
        for iri in iris {
            let rel = relativize(iri, base).unwrap();
            assert_eq!(resolve(base, &rel).unwrap(), iri);
        }
    }

    #[test]
    fn test_relativize_refuses_foreign_iris() {
        let base = "http://example.org/doc";
        assert_eq!(relativize("https://example.org/doc", base), None);
        assert_eq!(relativize("http://other.org/doc", base), None);
        assert_eq!(relativize("urn:x:y", base), None);
    }

    #[test]
    fn test_relativize_refuses_non_normalized_paths() {
        // "/a/./b" cannot be reproduced by resolution
        assert_eq!(
            relativize("http://example.org/a/./b", "http://example.org/a/"),
            None
        );
    }
}
