//! Path patterns used by the schema, gate, and hook tables.

use tianji_domain::Path;

/// A pattern over dotted paths. All comparisons are segment-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatcher {
    /// The path itself
    Exact(&'static str),
    /// The prefix or anything below it
    Prefix(&'static str),
    /// Strictly below the prefix
    Under(&'static str),
    /// Exactly one segment below the prefix
    ChildOf(&'static str),
    /// Last segment equals the key
    Suffix(&'static str),
    /// Strictly below the prefix and ending in the key
    UnderEndingIn(&'static str, &'static str),
}

impl PathMatcher {
    pub fn matches(&self, path: &Path) -> bool {
        match *self {
            PathMatcher::Exact(literal) => path.is(literal),
            PathMatcher::Prefix(prefix) => path.starts_with(prefix),
            PathMatcher::Under(prefix) => path.starts_with(prefix) && path.len() > depth(prefix),
            PathMatcher::ChildOf(prefix) => {
                path.starts_with(prefix) && path.len() == depth(prefix) + 1
            }
            PathMatcher::Suffix(key) => path.ends_with_key(key),
            PathMatcher::UnderEndingIn(prefix, key) => {
                path.starts_with(prefix) && path.len() > depth(prefix) + 1 && path.ends_with_key(key)
            }
        }
    }
}

fn depth(literal: &str) -> usize {
    literal.split('.').count()
}

/// True when any of `matchers` matches.
pub fn any_match(matchers: &[PathMatcher], path: &Path) -> bool {
    matchers.iter().any(|m| m.matches(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> Path {
        Path::parse(raw).unwrap()
    }

    #[test]
    fn child_of_matches_exactly_one_level() {
        let m = PathMatcher::ChildOf("relations");
        assert!(m.matches(&p("relations.Su Mei")));
        assert!(!m.matches(&p("relations")));
        assert!(!m.matches(&p("relations.Su Mei.favor")));
    }

    #[test]
    fn under_excludes_the_prefix_itself() {
        let m = PathMatcher::Under("dao.paths");
        assert!(m.matches(&p("dao.paths.Sword Dao")));
        assert!(m.matches(&p("dao.paths.Sword Dao.experience")));
        assert!(!m.matches(&p("dao.paths")));
        assert!(!m.matches(&p("dao.pathsX.a")));
    }

    #[test]
    fn under_ending_in_needs_an_intermediate_segment() {
        let m = PathMatcher::UnderEndingIn("inventory.items", "progress");
        assert!(m.matches(&p("inventory.items.tech_1.progress")));
        assert!(!m.matches(&p("inventory.items.progress")));
        assert!(!m.matches(&p("inventory.items.tech_1.quantity")));
    }
}
