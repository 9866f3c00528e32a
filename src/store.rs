//! Job store: the state machine behind the job list UI.
//!
//! Holds the current result page, pagination, filter/sort specification and
//! the saved/applied sets, and turns commands into queries against a
//! [`SearchProvider`]. The store is single-threaded; the only concurrency
//! hazard is a slow response arriving after a newer request has been
//! dispatched, which is handled by tagging every fetch with a monotonically
//! increasing sequence number and discarding stale completions.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{SearchError, SearchPage, SearchProvider, SearchSpec};
use crate::models::{
    ApplicationRecord, ApplicationStatus, FilterUpdate, JobFilter, JobPosting, Pagination, SortKey,
};
use crate::storage::Storage;

const JOB_STORAGE: &str = "job-storage";
const PAGE_SIZE: usize = 10;

/// User-facing fetch failure message, in the app's locale.
const FETCH_ERROR_MESSAGE: &str = "Kunde inte hämta jobbannonser. Försök igen senare.";

/// The durable subset of job store state. The job list itself is re-fetched
/// each session and never persisted.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DurableJobState {
    #[serde(default)]
    saved_jobs: HashSet<String>,
    #[serde(default)]
    applied_jobs: HashMap<String, ApplicationRecord>,
}

/// Token for one dispatched fetch. A completion whose token is no longer the
/// latest dispatched one is stale and gets dropped.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    seq: u64,
    page: usize,
}

pub struct JobStore<C: SearchProvider> {
    client: C,
    storage: Storage,

    pub jobs: Vec<JobPosting>,
    pub filter: JobFilter,
    pub sort_by: Option<SortKey>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub pagination: Pagination,

    saved_jobs: HashSet<String>,
    applied_jobs: HashMap<String, ApplicationRecord>,
    fetch_seq: u64,
}

impl<C: SearchProvider> JobStore<C> {
    /// Creates a store, loading the durable saved/applied sets from storage.
    /// A corrupt or missing blob starts the store empty rather than failing.
    pub fn new(client: C, storage: Storage) -> Self {
        let durable: DurableJobState = match storage.load(JOB_STORAGE) {
            Ok(Some(state)) => state,
            Ok(None) => DurableJobState::default(),
            Err(e) => {
                warn!(error = %e, "failed to load job storage, starting empty");
                DurableJobState::default()
            }
        };

        Self {
            client,
            storage,
            jobs: vec![],
            filter: JobFilter::default(),
            sort_by: None,
            is_loading: false,
            error: None,
            pagination: Pagination::default(),
            saved_jobs: durable.saved_jobs,
            applied_jobs: durable.applied_jobs,
            fetch_seq: 0,
        }
    }

    // --- Fetching ---

    /// The query the current filter/sort resolves to for a given page.
    fn search_spec(&self, page: usize) -> SearchSpec {
        SearchSpec {
            query: self.filter.query.clone(),
            page,
            limit: PAGE_SIZE,
            category: self.filter.category.clone(),
            location: self.filter.location.clone(),
            employment_type: self.filter.job_type.clone(),
            remote: self.filter.remote,
            sort: self.sort_by,
        }
    }

    /// First phase of a fetch: marks the store loading, clears any prior
    /// error and issues a ticket that supersedes all earlier ones.
    pub fn begin_fetch(&mut self, page: usize) -> FetchTicket {
        self.fetch_seq += 1;
        self.is_loading = true;
        self.error = None;
        FetchTicket {
            seq: self.fetch_seq,
            page,
        }
    }

    /// Second phase: applies a fetch result, unless a newer fetch has been
    /// dispatched since the ticket was issued. Last request wins.
    ///
    /// On success the job list and pagination block are replaced together; on
    /// failure the previous list stays visible and only the error is set.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: Result<SearchPage, SearchError>) {
        if ticket.seq != self.fetch_seq {
            debug!(
                ticket_seq = ticket.seq,
                latest_seq = self.fetch_seq,
                "dropping stale fetch result"
            );
            return;
        }

        self.is_loading = false;
        match result {
            Ok(page) => {
                self.pagination = Pagination::from_fetch(ticket.page, page.total_jobs, PAGE_SIZE);
                self.jobs = page.jobs;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, page = ticket.page, "fetch failed");
                self.error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// Fetches one page of results for the current filter and sort.
    pub async fn fetch_jobs(&mut self, page: usize) {
        let ticket = self.begin_fetch(page);
        let spec = self.search_spec(page);
        let result = self.client.search(&spec).await;
        self.complete_fetch(ticket, result);
    }

    /// Pull-to-refresh: re-fetch from the first page.
    pub async fn refresh_jobs(&mut self) {
        self.fetch_jobs(1).await;
    }

    /// Fetches the next page, if the last fetch said there is one.
    pub async fn next_page(&mut self) {
        if self.pagination.has_next_page {
            self.fetch_jobs(self.pagination.current_page + 1).await;
        }
    }

    pub async fn prev_page(&mut self) {
        if self.pagination.has_prev_page {
            self.fetch_jobs(self.pagination.current_page - 1).await;
        }
    }

    /// Best-effort single-job lookup for detail views.
    pub async fn fetch_job_by_id(&self, id: &str) -> Option<JobPosting> {
        self.client.fetch_by_id(id).await
    }

    // --- Filter and sort ---

    /// Merges the given fields into the filter, resets to page 1 and fetches
    /// immediately. Filter changes are never silently deferred.
    pub async fn set_filter(&mut self, update: FilterUpdate) {
        if let Some(query) = update.query {
            self.filter.query = query;
        }
        if let Some(category) = update.category {
            self.filter.category = Some(category);
        }
        if let Some(location) = update.location {
            self.filter.location = Some(location);
        }
        if let Some(job_type) = update.job_type {
            self.filter.job_type = Some(job_type);
        }
        if let Some(remote) = update.remote {
            self.filter.remote = Some(remote);
        }
        if let Some(experience) = update.experience {
            self.filter.experience = Some(experience);
        }
        if let Some(radius) = update.radius {
            self.filter.radius = Some(radius);
        }

        self.pagination.current_page = 1;
        self.fetch_jobs(1).await;
    }

    pub async fn set_sort_by(&mut self, sort: Option<SortKey>) {
        self.sort_by = sort;
        self.fetch_jobs(1).await;
    }

    /// Clears every constraint. Does not re-fetch on its own.
    pub fn reset_filter(&mut self) {
        self.filter = JobFilter::default();
    }

    // --- Saved and applied jobs ---

    /// Flips saved-set membership for a job. Calling twice restores the
    /// original state.
    pub fn toggle_save_job(&mut self, id: &str) {
        if !self.saved_jobs.remove(id) {
            self.saved_jobs.insert(id.to_string());
        }
        self.persist();
    }

    /// Records an application with status `Applied` and the current time.
    /// A second call for the same job is a no-op; the first date and status
    /// are kept.
    pub fn apply_to_job(&mut self, id: &str) {
        if self.applied_jobs.contains_key(id) {
            debug!(id, "already applied, keeping original record");
            return;
        }
        self.applied_jobs.insert(
            id.to_string(),
            ApplicationRecord {
                date: Utc::now(),
                status: ApplicationStatus::Applied,
            },
        );
        self.persist();
    }

    /// Overwrites the status of an existing application. A job that was
    /// never applied to is left untouched.
    pub fn update_application_status(&mut self, id: &str, status: ApplicationStatus) {
        let Some(record) = self.applied_jobs.get_mut(id) else {
            debug!(id, "status update for a job that was never applied to, ignoring");
            return;
        };
        record.status = status;
        self.persist();
    }

    // --- Accessors ---

    pub fn is_job_saved(&self, id: &str) -> bool {
        self.saved_jobs.contains(id)
    }

    pub fn is_job_applied(&self, id: &str) -> bool {
        self.applied_jobs.contains_key(id)
    }

    pub fn application_status(&self, id: &str) -> Option<ApplicationStatus> {
        self.applied_jobs.get(id).map(|r| r.status)
    }

    pub fn saved_job_ids(&self) -> impl Iterator<Item = &str> {
        self.saved_jobs.iter().map(String::as_str)
    }

    pub fn applications(&self) -> impl Iterator<Item = (&str, &ApplicationRecord)> {
        self.applied_jobs.iter().map(|(id, r)| (id.as_str(), r))
    }

    /// Client-side narrowing of the already-fetched page: title substring,
    /// exact category (unless "All"), exact remote flag, location substring.
    /// Distinct from the server-side filtering in the query client.
    pub fn filtered_jobs(&self) -> Vec<&JobPosting> {
        self.jobs
            .iter()
            .filter(|job| {
                if !self.filter.query.is_empty()
                    && !job.title.to_lowercase().contains(&self.filter.query.to_lowercase())
                {
                    return false;
                }
                if let Some(category) = &self.filter.category {
                    if category != crate::mapping::ALL && &job.category != category {
                        return false;
                    }
                }
                if let Some(remote) = self.filter.remote {
                    if job.remote != remote {
                        return false;
                    }
                }
                if let Some(location) = &self.filter.location {
                    if !job.location.to_lowercase().contains(&location.to_lowercase()) {
                        return false;
                    }
                }
                true
            })
            .collect()
    }

    /// Writes the durable subset. Fire-and-forget: a failure is logged and
    /// the in-memory state stays authoritative for the session.
    fn persist(&self) {
        let durable = DurableJobState {
            saved_jobs: self.saved_jobs.clone(),
            applied_jobs: self.applied_jobs.clone(),
        };
        if let Err(e) = self.storage.save(JOB_STORAGE, &durable) {
            warn!(error = %e, "failed to persist job storage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, RawJobHit};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn job(id: &str, title: &str) -> JobPosting {
        let mut posting = normalize(RawJobHit {
            id: Some(id.to_string()),
            headline: Some(title.to_string()),
            ..Default::default()
        });
        posting.location = "Stockholm".to_string();
        posting
    }

    fn page(ids: &[&str], total: usize, current: usize) -> SearchPage {
        SearchPage {
            jobs: ids.iter().map(|id| job(id, &format!("Job {id}"))).collect(),
            total_jobs: total,
            total_pages: total.div_ceil(PAGE_SIZE),
            current_page: current,
        }
    }

    /// Provider that replays a script of canned results and records every
    /// dispatched spec.
    struct ScriptedProvider {
        results: Mutex<VecDeque<Result<SearchPage, SearchError>>>,
        specs: Mutex<Vec<SearchSpec>>,
    }

    impl ScriptedProvider {
        fn new(results: Vec<Result<SearchPage, SearchError>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                specs: Mutex::new(vec![]),
            }
        }

        fn last_spec(&self) -> SearchSpec {
            self.specs.lock().unwrap().last().cloned().expect("no spec dispatched")
        }
    }

    impl SearchProvider for ScriptedProvider {
        async fn search(&self, spec: &SearchSpec) -> Result<SearchPage, SearchError> {
            self.specs.lock().unwrap().push(spec.clone());
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SearchError::Malformed("script exhausted".to_string())))
        }

        async fn fetch_by_id(&self, id: &str) -> Option<JobPosting> {
            Some(job(id, "Looked up"))
        }
    }

    fn store_with(results: Vec<Result<SearchPage, SearchError>>) -> JobStore<ScriptedProvider> {
        JobStore::new(
            ScriptedProvider::new(results),
            Storage::open_in_memory().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_fetch_replaces_jobs_and_recomputes_pagination() {
        let mut store = store_with(vec![Ok(page(&["a", "b"], 35, 2))]);
        store.fetch_jobs(2).await;

        assert_eq!(store.jobs.len(), 2);
        assert!(!store.is_loading);
        assert!(store.error.is_none());
        assert_eq!(store.pagination.current_page, 2);
        assert_eq!(store.pagination.total_pages, 4);
        assert_eq!(
            store.pagination.has_next_page,
            store.pagination.current_page < store.pagination.total_pages
        );
        assert!(store.pagination.has_prev_page);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_jobs() {
        let mut store = store_with(vec![
            Ok(page(&["a"], 1, 1)),
            Err(SearchError::Malformed("missing hits array".to_string())),
        ]);
        store.fetch_jobs(1).await;
        assert_eq!(store.jobs.len(), 1);

        store.fetch_jobs(2).await;
        // Stale-but-visible: the old list survives the failed fetch.
        assert_eq!(store.jobs.len(), 1);
        assert_eq!(store.error.as_deref(), Some(FETCH_ERROR_MESSAGE));
        assert!(!store.is_loading);
    }

    #[tokio::test]
    async fn test_error_cleared_by_next_fetch() {
        let mut store = store_with(vec![
            Err(SearchError::Malformed("boom".to_string())),
            Ok(page(&["a"], 1, 1)),
        ]);
        store.fetch_jobs(1).await;
        assert!(store.error.is_some());

        store.fetch_jobs(1).await;
        assert!(store.error.is_none());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut store = store_with(vec![]);

        // Fetch A for page 1 dispatched, then fetch B for page 2; B resolves
        // first, A arrives late.
        let ticket_a = store.begin_fetch(1);
        let ticket_b = store.begin_fetch(2);

        store.complete_fetch(ticket_b, Ok(page(&["b1", "b2"], 40, 2)));
        store.complete_fetch(ticket_a, Ok(page(&["a1"], 5, 1)));

        assert_eq!(store.pagination.current_page, 2);
        assert_eq!(store.jobs.len(), 2);
        assert_eq!(store.jobs[0].id, "b1");
        assert!(!store.is_loading);
    }

    #[test]
    fn test_stale_error_does_not_clobber_newer_result() {
        let mut store = store_with(vec![]);

        let ticket_a = store.begin_fetch(1);
        let ticket_b = store.begin_fetch(2);

        store.complete_fetch(ticket_b, Ok(page(&["b1"], 11, 2)));
        store.complete_fetch(ticket_a, Err(SearchError::Malformed("late".to_string())));

        assert!(store.error.is_none());
        assert_eq!(store.jobs[0].id, "b1");
    }

    #[tokio::test]
    async fn test_set_filter_merges_resets_page_and_fetches() {
        let mut store = store_with(vec![Ok(page(&["a"], 50, 3)), Ok(page(&["b"], 8, 1))]);
        store.fetch_jobs(3).await;
        assert_eq!(store.pagination.current_page, 3);

        store
            .set_filter(FilterUpdate {
                category: Some("IT".to_string()),
                remote: Some(true),
                ..Default::default()
            })
            .await;

        // Merge keeps untouched fields, page resets to 1.
        assert_eq!(store.filter.category.as_deref(), Some("IT"));
        assert_eq!(store.filter.remote, Some(true));
        assert!(store.filter.location.is_none());
        assert_eq!(store.pagination.current_page, 1);

        let spec = store.client.last_spec();
        assert_eq!(spec.page, 1);
        assert_eq!(spec.category.as_deref(), Some("IT"));
        assert_eq!(spec.remote, Some(true));
        assert!(spec.employment_type.is_none());
    }

    #[tokio::test]
    async fn test_set_sort_by_refetches_from_page_one() {
        let mut store = store_with(vec![Ok(page(&["a"], 5, 1))]);
        store.set_sort_by(Some(SortKey::Oldest)).await;

        let spec = store.client.last_spec();
        assert_eq!(spec.sort, Some(SortKey::Oldest));
        assert_eq!(spec.page, 1);
    }

    #[tokio::test]
    async fn test_refresh_and_prev_page_fetch_the_right_pages() {
        let mut store = store_with(vec![
            Ok(page(&["a"], 30, 2)),
            Ok(page(&["b"], 30, 1)),
            Ok(page(&["c"], 30, 1)),
        ]);

        store.fetch_jobs(2).await;
        store.prev_page().await;
        assert_eq!(store.client.last_spec().page, 1);
        assert_eq!(store.pagination.current_page, 1);

        // Already on the first page; prev_page must not fetch again.
        store.prev_page().await;
        assert_eq!(store.client.specs.lock().unwrap().len(), 2);

        store.refresh_jobs().await;
        assert_eq!(store.client.last_spec().page, 1);
        assert_eq!(store.client.specs.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_toggle_save_is_its_own_inverse() {
        let mut store = store_with(vec![]);
        assert!(!store.is_job_saved("x"));

        store.toggle_save_job("x");
        assert!(store.is_job_saved("x"));

        store.toggle_save_job("x");
        assert!(!store.is_job_saved("x"));
    }

    #[test]
    fn test_apply_once_keeps_first_record() {
        let mut store = store_with(vec![]);
        store.apply_to_job("x");
        let first = store.applied_jobs.get("x").unwrap().clone();

        store.update_application_status("x", ApplicationStatus::Interviewing);
        store.apply_to_job("x");

        let record = store.applied_jobs.get("x").unwrap();
        assert_eq!(record.date, first.date);
        assert_eq!(record.status, ApplicationStatus::Interviewing);
    }

    #[tokio::test]
    async fn test_fetch_job_by_id_delegates_to_provider() {
        let store = store_with(vec![]);
        let job = store.fetch_job_by_id("abc").await.unwrap();
        assert_eq!(job.id, "abc");
    }

    #[test]
    fn test_reset_filter_clears_every_constraint() {
        let mut store = store_with(vec![]);
        store.filter.query = "rust".to_string();
        store.filter.category = Some("IT".to_string());
        store.filter.remote = Some(true);

        store.reset_filter();
        assert!(store.filter.query.is_empty());
        assert!(store.filter.category.is_none());
        assert!(store.filter.remote.is_none());
    }

    #[test]
    fn test_status_update_for_unknown_job_is_noop() {
        let mut store = store_with(vec![]);
        store.update_application_status("ghost", ApplicationStatus::Offered);
        assert!(!store.is_job_applied("ghost"));
        assert_eq!(store.application_status("ghost"), None);
    }

    #[test]
    fn test_saved_and_applied_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platsjakt.db");

        {
            let storage = Storage::open_at(path.clone()).unwrap();
            let mut store = JobStore::new(ScriptedProvider::new(vec![]), storage);
            store.toggle_save_job("keep-me");
            store.apply_to_job("applied-to");
        }

        let storage = Storage::open_at(path).unwrap();
        let store = JobStore::new(ScriptedProvider::new(vec![]), storage);
        assert!(store.is_job_saved("keep-me"));
        assert_eq!(
            store.application_status("applied-to"),
            Some(ApplicationStatus::Applied)
        );
    }

    #[test]
    fn test_filtered_jobs_narrow_in_memory() {
        let mut store = store_with(vec![]);
        let mut remote_job = job("r", "Rust Developer");
        remote_job.remote = true;
        remote_job.category = "IT".to_string();
        let mut onsite_job = job("o", "Rust Developer");
        onsite_job.category = "IT".to_string();
        let other = job("s", "Sales Manager");
        store.jobs = vec![remote_job, onsite_job, other];

        store.filter.query = "rust".to_string();
        store.filter.remote = Some(true);
        let filtered = store.filtered_jobs();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "r");

        // "All" category does not narrow.
        store.filter.remote = None;
        store.filter.category = Some("All".to_string());
        assert_eq!(store.filtered_jobs().len(), 2);
    }

    #[tokio::test]
    async fn test_next_page_respects_pagination_flags() {
        let mut store = store_with(vec![Ok(page(&["a"], 5, 1))]);
        store.fetch_jobs(1).await;
        assert!(!store.pagination.has_next_page);

        // Only one page exists; next_page must not dispatch another fetch.
        store.next_page().await;
        assert_eq!(store.client.specs.lock().unwrap().len(), 1);
    }
}
