use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A scheduler-assigned job id, as handed to us by the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// numeric ids sort numerically and before everything else,
// so "9" comes before "10" in generated commands.
impl Ord for JobId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for JobId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The jobs a job has to wait for.
///
/// Duplicates collapse, and iteration order is canonical regardless of the order
/// ids were given in, so equal sets always produce identical commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    ids: BTreeSet<JobId>,
}

impl DependencySet {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobId> {
        self.ids.iter()
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.ids.contains(id)
    }

    /// Comma-separated ids, for messages.
    pub fn joined(&self) -> String {
        let ids: Vec<&str> = self.ids.iter().map(JobId::as_str).collect();
        ids.join(",")
    }
}

/// Arguments may hold several whitespace-separated ids; blanks are ignored.
impl<S: AsRef<str>> FromIterator<S> for DependencySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = BTreeSet::new();
        for arg in iter {
            ids.extend(arg.as_ref().split_whitespace().map(JobId::new));
        }
        Self { ids }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_set_semantics() {
        let a: DependencySet = ["102", "101", "102"].into_iter().collect();
        let b: DependencySet = ["101", "102"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(2, a.len());
        assert_eq!("101,102", a.joined());
        assert!(a.contains(&JobId::new("101")));
        assert!(!a.contains(&JobId::new("103")));
    }

    #[test]
    fn test_numeric_order() {
        let deps: DependencySet = ["10", "9", "abc", "100"].into_iter().collect();
        assert_eq!("9,10,100,abc", deps.joined());
    }

    #[test]
    fn test_whitespace_args() {
        let deps: DependencySet = ["1 2", "", "  3\t"].into_iter().collect();
        assert_eq!("1,2,3", deps.joined());

        let empty: DependencySet = Vec::<String>::new().into_iter().collect();
        assert!(empty.is_empty());
    }
}
