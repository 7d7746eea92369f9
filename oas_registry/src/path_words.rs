//! Splits a URL path template into the words operation ids are built from.
//!
//! A template such as `/users/{userId}/orders` is read as a sequence of
//! segments. A placeholder is only accepted directly after a plural
//! collection word, and only when its name ends in `Id`:
//! `users/{userId}` addresses one item of the `users` collection.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathFormatError {
    #[error("path is empty")]
    Empty,

    #[error("unsupported path format, path must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("unsupported path format, path ends with '/': {0}")]
    TrailingSlash(String),

    #[error("unsupported path format, empty segment: {0}")]
    EmptySegment(String),

    #[error("unsupported path format, empty placeholder: {0}")]
    EmptyPlaceholder(String),

    #[error("unsupported path format, malformed segment {segment}: {path}")]
    MalformedSegment { path: String, segment: String },

    #[error("unsupported path format, placeholder {{{placeholder}}} must follow a plural word and end in Id: {path}")]
    UnaddressedPlaceholder { path: String, placeholder: String },
}

/// One step of a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// A literal word, e.g. `health`.
    Word(&'a str),
    /// A plural word followed by an id placeholder, e.g. `users/{userId}`.
    Item {
        collection: &'a str,
        param: &'a str,
    },
}

impl<'a> PathSegment<'a> {
    /// The word this segment contributes to an operation id.
    ///
    /// For [`PathSegment::Item`] exactly one trailing `s` is stripped from
    /// the collection word. There is no irregular plural handling.
    pub fn word(&self) -> &'a str {
        match *self {
            PathSegment::Word(word) => word,
            PathSegment::Item { collection, .. } => {
                collection.strip_suffix(['s', 'S']).unwrap_or(collection)
            }
        }
    }
}

enum RawSegment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn classify<'a>(path: &str, segment: &'a str) -> Result<RawSegment<'a>, PathFormatError> {
    if segment.is_empty() {
        return Err(PathFormatError::EmptySegment(path.to_string()));
    }
    let malformed = || PathFormatError::MalformedSegment {
        path: path.to_string(),
        segment: segment.to_string(),
    };
    if let Some(name) = segment
        .strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
    {
        if name.is_empty() {
            return Err(PathFormatError::EmptyPlaceholder(path.to_string()));
        }
        if name.contains(['{', '}']) {
            return Err(malformed());
        }
        return Ok(RawSegment::Placeholder(name));
    }
    if segment.contains(['{', '}']) {
        return Err(malformed());
    }
    Ok(RawSegment::Literal(segment))
}

/// `users` + `{userId}`: the word is plural and the placeholder names an id.
fn addresses_item(word: &str, param: &str) -> bool {
    let is_id = param.len() > 2
        && param
            .get(param.len() - 2..)
            .is_some_and(|suffix| suffix.eq_ignore_ascii_case("id"));
    let is_plural = word.len() > 1 && word.ends_with(['s', 'S']);
    is_id && is_plural
}

/// Splits `path` into ordered segments.
pub fn split(path: &str) -> Result<Vec<PathSegment<'_>>, PathFormatError> {
    if path.is_empty() {
        return Err(PathFormatError::Empty);
    }
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| PathFormatError::MissingLeadingSlash(path.to_string()))?;
    if rest.is_empty() || rest.ends_with('/') {
        return Err(PathFormatError::TrailingSlash(path.to_string()));
    }

    let raw = rest
        .split('/')
        .map(|segment| classify(path, segment))
        .collect::<Result<Vec<_>, _>>()?;

    let unaddressed = |placeholder: &str| PathFormatError::UnaddressedPlaceholder {
        path: path.to_string(),
        placeholder: placeholder.to_string(),
    };

    let mut segments = Vec::with_capacity(raw.len());
    let mut iter = raw.into_iter().peekable();
    while let Some(segment) = iter.next() {
        let word = match segment {
            RawSegment::Literal(word) => word,
            RawSegment::Placeholder(param) => return Err(unaddressed(param)),
        };
        match iter.peek() {
            Some(&RawSegment::Placeholder(param)) if addresses_item(word, param) => {
                segments.push(PathSegment::Item {
                    collection: word,
                    param,
                });
                iter.next();
            }
            Some(&RawSegment::Placeholder(param)) => return Err(unaddressed(param)),
            _ => segments.push(PathSegment::Word(word)),
        }
    }
    Ok(segments)
}
