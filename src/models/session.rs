use crate::models::{ActionSlots, JobPath, JobStatus};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt;

/// Identifier of one session, the span between two resets.
///
/// Every reset hands out a fresh id. Channel listeners and in-flight requests
/// carry the id they were created under, which is how late work from a torn-down
/// session is recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub const FIRST: SessionId = SessionId(1);

    pub fn next(self) -> Self {
        SessionId(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Paths admitted into the current session, in first-submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRegistry {
    paths: IndexSet<JobPath>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit the paths of a batch that are not yet registered.
    ///
    /// Duplicates against the registry and within the batch itself are dropped;
    /// the returned paths keep their order of first occurrence.
    pub fn admit<I>(&mut self, batch: I) -> Vec<JobPath>
    where
        I: IntoIterator<Item = JobPath>,
    {
        batch
            .into_iter()
            .filter(|path| self.paths.insert(path.clone()))
            .collect()
    }

    pub fn contains(&self, path: &JobPath) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobPath> {
        self.paths.iter()
    }
}

/// Status and derived action slots of one registered path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEntry {
    pub status: JobStatus,
    pub actions: ActionSlots,
}

impl JobEntry {
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            actions: ActionSlots::default(),
        }
    }
}

/// Render-ready view of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobView {
    pub path: JobPath,
    pub name: String,
    pub status: JobStatus,
    pub actions: ActionSlots,
}

/// One session's registry and job map.
///
/// Never accessed directly by the rest of the crate: the
/// [`SessionController`](crate::state::SessionController) owns it behind a lock and
/// serializes every read-modify-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    registry: PathRegistry,
    jobs: IndexMap<JobPath, JobEntry>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            registry: PathRegistry::new(),
            jobs: IndexMap::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    /// Admit a batch and register every admitted path as `Processing`.
    pub fn register<I>(&mut self, batch: I) -> Vec<JobPath>
    where
        I: IntoIterator<Item = JobPath>,
    {
        let admitted = self.registry.admit(batch);
        for path in &admitted {
            self.jobs.insert(path.clone(), JobEntry::processing());
        }
        admitted
    }

    pub fn job(&self, path: &JobPath) -> Option<&JobEntry> {
        self.jobs.get(path)
    }

    pub(crate) fn job_mut(&mut self, path: &JobPath) -> Option<&mut JobEntry> {
        self.jobs.get_mut(path)
    }

    pub fn is_tracked(&self, path: &JobPath) -> bool {
        self.jobs.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn view(&self, path: &JobPath) -> Option<JobView> {
        self.jobs.get(path).map(|entry| JobView {
            path: path.clone(),
            name: path.file_name().to_string(),
            status: entry.status.clone(),
            actions: entry.actions,
        })
    }

    /// Views of all jobs in registration order.
    pub fn views(&self) -> Vec<JobView> {
        self.jobs.keys().filter_map(|path| self.view(path)).collect()
    }

    /// Returns (processing, complete, failed).
    pub fn status_counts(&self) -> (usize, usize, usize) {
        self.jobs
            .values()
            .fold((0, 0, 0), |(processing, complete, failed), entry| match entry.status {
                JobStatus::Processing => (processing + 1, complete, failed),
                JobStatus::Complete { .. } => (processing, complete + 1, failed),
                JobStatus::Failed { .. } => (processing, complete, failed + 1),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paths(raw: &[&str]) -> Vec<JobPath> {
        raw.iter().map(|p| JobPath::from(*p)).collect()
    }

    #[test]
    fn test_admit_drops_duplicates_within_batch() {
        let mut registry = PathRegistry::new();
        let admitted = registry.admit(paths(&["a.png", "b.png", "a.png"]));

        assert_eq!(admitted, paths(&["a.png", "b.png"]));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_admit_drops_already_registered() {
        let mut registry = PathRegistry::new();
        registry.admit(paths(&["a.png"]));

        let admitted = registry.admit(paths(&["c.png", "a.png", "b.png"]));
        assert_eq!(admitted, paths(&["c.png", "b.png"]));

        let order: Vec<_> = registry.iter().map(JobPath::as_str).collect();
        assert_eq!(order, vec!["a.png", "c.png", "b.png"]);
    }

    #[test]
    fn test_register_creates_processing_entries() {
        let mut session = Session::new(SessionId::FIRST);
        session.register(paths(&["/x/a.png", "/x/b.png"]));

        assert_eq!(session.status_counts(), (2, 0, 0));
        let view = session.view(&JobPath::from("/x/a.png")).unwrap();
        assert_eq!(view.name, "a.png");
        assert_eq!(view.status, JobStatus::Processing);
        assert_eq!(view.actions, ActionSlots::default());
    }

    #[test]
    fn test_views_in_registration_order() {
        let mut session = Session::new(SessionId::FIRST);
        session.register(paths(&["b.png", "a.png"]));
        session.register(paths(&["c.png"]));

        let names: Vec<_> = session.views().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["b.png", "a.png", "c.png"]);
    }

    #[test]
    fn test_session_ids_increase() {
        let first = SessionId::FIRST;
        assert!(first.next() > first);
        assert_eq!(first.next().get(), 2);
        assert_eq!(first.to_string(), "#1");
    }

    proptest! {
        #[test]
        fn prop_each_distinct_path_admitted_once(
            first in proptest::collection::vec("[a-e]\\.png", 0..12),
            second in proptest::collection::vec("[a-e]\\.png", 0..12),
        ) {
            let mut registry = PathRegistry::new();
            let mut admitted = registry.admit(first.iter().map(|p| JobPath::from(p.as_str())));
            admitted.extend(registry.admit(second.iter().map(|p| JobPath::from(p.as_str()))));

            let distinct: IndexSet<&String> = first.iter().chain(second.iter()).collect();
            prop_assert_eq!(admitted.len(), distinct.len());

            let unique: IndexSet<&JobPath> = admitted.iter().collect();
            prop_assert_eq!(unique.len(), admitted.len());
            prop_assert_eq!(registry.len(), distinct.len());
        }
    }
}
