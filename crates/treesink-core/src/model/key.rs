use super::Snapshot;

/// Structural identity of a snapshot's tag set.
///
/// Tags are sorted so that order does not affect identity. Context and record
/// name take part because the base name is derived from them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TagSetKey {
    context: String,
    record: String,
    tags: Vec<(String, String)>,
}

impl TagSetKey {
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut tags: Vec<(String, String)> = snapshot
            .present_tags()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        tags.sort_unstable();
        Self {
            context: snapshot.context.clone(),
            record: snapshot.name.clone(),
            tags,
        }
    }
}

/// Compact handle for an interned [`TagSetKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagSetId(pub(crate) usize);
