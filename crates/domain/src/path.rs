//! Dot/index addresses into the save tree.
//!
//! A path such as `relations.Li Qinglian.memory.0` is tokenized once into
//! segments. A segment made only of ASCII digits is an index; anything else is
//! an object key. Bracket notation (`quests.active[0].name`) is accepted as an
//! alias for the dotted index form.
//!
//! Resolution rules:
//! - `get` and `remove` on an absent path return `None` and never allocate.
//! - `set` creates intermediate records for absent (or `null`) segments.
//! - An index segment addressing a record is used as a string key, so numeric
//!   keys in records stay reachable.
//! - Writing index `len` of a sequence appends; anything beyond is an error.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Path `{path}` contains an empty segment")]
    EmptySegment { path: String },

    #[error("Path `{path}` has a malformed index in `{segment}`")]
    MalformedIndex { path: String, segment: String },

    #[error("Cannot traverse `{segment}` of `{path}`: value is not a record or sequence")]
    NotAContainer { path: String, segment: String },

    #[error("Index {index} of `{path}` is out of bounds (length {len})")]
    IndexOutOfBounds { path: String, index: usize, len: usize },

    #[error("Key `{key}` of `{path}` addresses a sequence")]
    KeyOnSequence { path: String, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = raw.parse::<usize>() {
                return Segment::Index(index);
            }
        }
        Segment::Key(raw.to_string())
    }

    /// The segment as a record key.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(key) => Cow::Borrowed(key.as_str()),
            Segment::Index(index) => Cow::Owned(index.to_string()),
        }
    }

    pub fn is_key(&self, key: &str) -> bool {
        self.as_key() == key
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

/// A parsed save-tree address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for part in trimmed.split('.') {
            split_brackets(part, trimmed, &mut segments)?;
        }
        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<Segment>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Key form of the segment at `index`, if any.
    pub fn key_at(&self, index: usize) -> Option<Cow<'_, str>> {
        self.segments.get(index).map(Segment::as_key)
    }

    pub fn parent(&self) -> Option<Path> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn child(&self, key: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::parse(&key.into()));
        Self { segments }
    }

    /// Segment-wise prefix test against a dotted literal.
    pub fn starts_with(&self, prefix: &str) -> bool {
        let mut count = 0;
        for (i, part) in prefix.split('.').enumerate() {
            match self.segments.get(i) {
                Some(segment) if segment.is_key(part) => count += 1,
                _ => return false,
            }
        }
        count > 0
    }

    /// Segment-wise equality against a dotted literal.
    pub fn is(&self, literal: &str) -> bool {
        self.starts_with(literal) && literal.split('.').count() == self.segments.len()
    }

    pub fn ends_with_key(&self, key: &str) -> bool {
        self.last().is_some_and(|segment| segment.is_key(key))
    }
}

fn split_brackets(part: &str, whole: &str, out: &mut Vec<Segment>) -> Result<(), PathError> {
    let Some(open) = part.find('[') else {
        if part.is_empty() {
            return Err(PathError::EmptySegment {
                path: whole.to_string(),
            });
        }
        out.push(Segment::parse(part));
        return Ok(());
    };

    let head = &part[..open];
    if !head.is_empty() {
        out.push(Segment::parse(head));
    } else if out.is_empty() && open == 0 {
        return Err(PathError::EmptySegment {
            path: whole.to_string(),
        });
    }

    let mut rest = &part[open..];
    while !rest.is_empty() {
        let malformed = || PathError::MalformedIndex {
            path: whole.to_string(),
            segment: part.to_string(),
        };
        let inner_end = rest.find(']').ok_or_else(malformed)?;
        if !rest.starts_with('[') {
            return Err(malformed());
        }
        let inner = &rest[1..inner_end];
        match Segment::parse(inner) {
            Segment::Index(index) => out.push(Segment::Index(index)),
            Segment::Key(_) => return Err(malformed()),
        }
        rest = &rest[inner_end + 1..];
    }
    Ok(())
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Read the value at `path`.
pub fn get<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |cursor, segment| step(cursor, segment))
}

/// Mutable access to an existing value at `path`.
pub fn get_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut cursor = root;
    for segment in path.segments() {
        cursor = step_mut(cursor, segment)?;
    }
    Some(cursor)
}

/// Write `value` at `path`, creating intermediate records as needed.
pub fn set(root: &mut Value, path: &Path, value: Value) -> Result<(), PathError> {
    let (last, parents) = path.segments().split_last().ok_or(PathError::Empty)?;

    let mut cursor = root;
    for segment in parents {
        cursor = step_or_create(cursor, segment, path)?;
    }

    if cursor.is_null() {
        *cursor = Value::Object(Map::new());
    }
    match cursor {
        Value::Object(map) => {
            map.insert(last.as_key().into_owned(), value);
            Ok(())
        }
        Value::Array(items) => match last {
            Segment::Index(index) if *index < items.len() => {
                items[*index] = value;
                Ok(())
            }
            Segment::Index(index) if *index == items.len() => {
                items.push(value);
                Ok(())
            }
            Segment::Index(index) => Err(PathError::IndexOutOfBounds {
                path: path.to_string(),
                index: *index,
                len: items.len(),
            }),
            Segment::Key(key) => Err(PathError::KeyOnSequence {
                path: path.to_string(),
                key: key.clone(),
            }),
        },
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: last.to_string(),
        }),
    }
}

/// Remove and return the value at `path`; absent paths are a no-op.
pub fn remove(root: &mut Value, path: &Path) -> Option<Value> {
    let (last, parents) = path.segments().split_last()?;

    let mut cursor = root;
    for segment in parents {
        cursor = step_mut(cursor, segment)?;
    }

    match cursor {
        Value::Object(map) => map.remove(last.as_key().as_ref()),
        Value::Array(items) => match last {
            Segment::Index(index) if *index < items.len() => Some(items.remove(*index)),
            _ => None,
        },
        _ => None,
    }
}

fn step<'a>(cursor: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match cursor {
        Value::Object(map) => map.get(segment.as_key().as_ref()),
        Value::Array(items) => match segment {
            Segment::Index(index) => items.get(*index),
            Segment::Key(_) => None,
        },
        _ => None,
    }
}

fn step_mut<'a>(cursor: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match cursor {
        Value::Object(map) => map.get_mut(segment.as_key().as_ref()),
        Value::Array(items) => match segment {
            Segment::Index(index) => items.get_mut(*index),
            Segment::Key(_) => None,
        },
        _ => None,
    }
}

fn step_or_create<'a>(
    cursor: &'a mut Value,
    segment: &Segment,
    path: &Path,
) -> Result<&'a mut Value, PathError> {
    if cursor.is_null() {
        *cursor = Value::Object(Map::new());
    }
    match cursor {
        Value::Object(map) => {
            let entry = map
                .entry(segment.as_key().into_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            Ok(entry)
        }
        Value::Array(items) => match segment {
            Segment::Index(index) if *index < items.len() => Ok(&mut items[*index]),
            Segment::Index(index) if *index == items.len() => {
                items.push(Value::Object(Map::new()));
                let len = items.len();
                Ok(&mut items[len - 1])
            }
            Segment::Index(index) => Err(PathError::IndexOutOfBounds {
                path: path.to_string(),
                index: *index,
                len: items.len(),
            }),
            Segment::Key(key) => Err(PathError::KeyOnSequence {
                path: path.to_string(),
                key: key.clone(),
            }),
        },
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: segment.to_string(),
        }),
    }
}
