//! Query engine
//!
//! Turns the link collection plus the current selection (folder filter,
//! tag filter, search text, sort mode) into the ordered list to display.
//!
//! Evaluation runs in three stages:
//!
//! 1. **Structural filter**: folder and tag selection
//! 2. **Scoring**: only with a non-blank query; links scoring 0 are dropped
//! 3. **Sort**: by the active `SortMode`
//!
//! `QueryState` owns the mode-switch rule: entering a query forces
//! `Relevance`, clearing it forces `DateDesc`, anything else keeps the
//! user's choice.

pub mod score;
pub mod sort;

use tracing::debug;
use uuid::Uuid;

use crate::models::Link;
use crate::store::Store;

pub use score::{levenshtein, SearchQuery};
pub use sort::{locale_compare, ParseSortModeError, SortMode};

/// A link in the result list with its relevance score
///
/// The score is 0 when no query is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryHit<'a> {
    pub link: &'a Link,
    pub score: u32,
}

/// The four inputs of a query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    folder_filter: Option<Uuid>,
    tag_filter: Option<String>,
    query: String,
    sort: SortMode,
    /// Bumped on every change, used to invalidate cached results
    generation: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryState {
    /// No filters, no query, newest first
    pub fn new() -> Self {
        Self {
            folder_filter: None,
            tag_filter: None,
            query: String::new(),
            sort: SortMode::DateDesc,
            generation: 0,
        }
    }

    pub fn folder_filter(&self) -> Option<Uuid> {
        self.folder_filter
    }

    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the search text is non-blank
    pub fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Sort modes that may currently be selected
    pub fn available_sorts(&self) -> Vec<SortMode> {
        SortMode::ALL
            .into_iter()
            .filter(|m| *m != SortMode::Relevance || self.is_searching())
            .collect()
    }

    pub fn set_folder_filter(&mut self, folder: Option<Uuid>) {
        self.folder_filter = folder;
        self.generation += 1;
    }

    pub fn set_tag_filter(&mut self, tag: Option<String>) {
        self.tag_filter = tag;
        self.generation += 1;
    }

    /// Change the search text, switching sort mode on blank/non-blank edges
    pub fn set_query(&mut self, query: impl Into<String>) {
        let was_searching = self.is_searching();
        self.query = query.into();
        let searching = self.is_searching();

        match (was_searching, searching) {
            (false, true) => self.sort = SortMode::Relevance,
            (true, false) => self.sort = SortMode::DateDesc,
            _ => {}
        }
        self.generation += 1;
    }

    /// Choose a sort mode
    ///
    /// Returns false (and changes nothing) for `Relevance` while no query is active.
    pub fn set_sort(&mut self, mode: SortMode) -> bool {
        if mode == SortMode::Relevance && !self.is_searching() {
            return false;
        }
        self.sort = mode;
        self.generation += 1;
        true
    }

    /// Clear folder and tag filters, keeping query and sort
    pub fn clear_filters(&mut self) {
        self.set_folder_filter(None);
        self.set_tag_filter(None);
    }

    /// Drop a folder filter that points at a folder which no longer exists
    pub fn forget_folder(&mut self, folder: Uuid) {
        if self.folder_filter == Some(folder) {
            self.set_folder_filter(None);
        }
    }

    fn keeps(&self, link: &Link) -> bool {
        let folder_ok = self
            .folder_filter
            .map_or(true, |f| link.folder_id == Some(f));
        let tag_ok = self.tag_filter.as_deref().map_or(true, |t| link.has_tag(t));
        folder_ok && tag_ok
    }

    /// Evaluate against a link collection
    pub fn evaluate<'a>(&self, links: &'a [Link]) -> Vec<QueryHit<'a>> {
        self.evaluate_indexed(links)
            .into_iter()
            .map(|(index, score)| QueryHit {
                link: &links[index],
                score,
            })
            .collect()
    }

    /// Evaluate, returning positions in `links` with their scores
    fn evaluate_indexed(&self, links: &[Link]) -> Vec<(usize, u32)> {
        let filtered = links
            .iter()
            .enumerate()
            .filter(|(_, link)| self.keeps(link));

        let mut hits: Vec<(usize, QueryHit<'_>)> = match SearchQuery::parse(&self.query) {
            Some(search) => filtered
                .map(|(index, link)| {
                    let score = search.score(link);
                    (index, QueryHit { link, score })
                })
                .filter(|(_, hit)| hit.score > 0)
                .collect(),
            None => filtered
                .map(|(index, link)| (index, QueryHit { link, score: 0 }))
                .collect(),
        };

        let sort = self.sort;
        hits.sort_by(|(_, a), (_, b)| sort.compare(a, b));
        hits.into_iter().map(|(index, hit)| (index, hit.score)).collect()
    }
}

#[derive(Debug, Clone)]
struct CachedResult {
    store: Uuid,
    revision: u64,
    generation: u64,
    /// (index into the store's links, score)
    hits: Vec<(usize, u32)>,
}

/// Query state plus a memo of the last evaluation
///
/// Re-evaluates only when the store (instance or revision) or the query
/// state changed since the previous call.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    state: QueryState,
    cache: Option<CachedResult>,
    evaluations: u64,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state
    pub fn with_state(state: QueryState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// Mutable access to the query inputs
    ///
    /// Drops the memo, since the state may be changed or replaced wholesale.
    pub fn state_mut(&mut self) -> &mut QueryState {
        self.cache = None;
        &mut self.state
    }

    /// Replace all query inputs at once
    pub fn set_state(&mut self, state: QueryState) {
        self.cache = None;
        self.state = state;
    }

    /// How many times results were actually computed
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Ordered results for the current state
    pub fn results<'s>(&mut self, store: &'s Store) -> Vec<QueryHit<'s>> {
        let links = store.links();

        let fresh = self.cache.as_ref().is_some_and(|c| {
            c.store == store.instance_id()
                && c.revision == store.revision()
                && c.generation == self.state.generation
        });

        if !fresh {
            let hits = self.state.evaluate_indexed(links);
            self.evaluations += 1;
            debug!(
                results = hits.len(),
                sort = %self.state.sort,
                "Evaluated query"
            );
            self.cache = Some(CachedResult {
                store: store.instance_id(),
                revision: store.revision(),
                generation: self.state.generation,
                hits,
            });
        }

        self.cache
            .as_ref()
            .map(|c| {
                c.hits
                    .iter()
                    .filter_map(|&(index, score)| {
                        links.get(index).map(|link| QueryHit { link, score })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    use crate::models::LinkDraft;

    fn link(title: &str, tags: &[&str], folder: Option<Uuid>, age_minutes: i64) -> Link {
        let epoch = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Link {
            id: Uuid::new_v4(),
            url: format!("https://{}.example", title.to_lowercase().replace(' ', "-")),
            title: title.to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            folder_id: folder,
            created_at: epoch - Duration::minutes(age_minutes),
        }
    }

    fn titles(hits: &[QueryHit<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.link.title.clone()).collect()
    }

    #[test]
    fn test_default_state() {
        let state = QueryState::new();
        assert_eq!(state.sort(), SortMode::DateDesc);
        assert!(!state.is_searching());
        assert!(!state.available_sorts().contains(&SortMode::Relevance));
    }

    #[test]
    fn test_entering_query_forces_relevance() {
        let mut state = QueryState::new();
        assert!(state.set_sort(SortMode::TitleAsc));

        state.set_query("rust");
        assert_eq!(state.sort(), SortMode::Relevance);
        assert!(state.available_sorts().contains(&SortMode::Relevance));
    }

    #[test]
    fn test_editing_query_keeps_chosen_sort() {
        let mut state = QueryState::new();
        state.set_query("rust");
        assert!(state.set_sort(SortMode::UrlAsc));

        state.set_query("rusty");
        assert_eq!(state.sort(), SortMode::UrlAsc);
    }

    #[test]
    fn test_clearing_query_reverts_to_newest_first() {
        let mut state = QueryState::new();
        state.set_query("rust");
        state.set_sort(SortMode::TitleDesc);

        state.set_query("   ");
        assert_eq!(state.sort(), SortMode::DateDesc);
    }

    #[test]
    fn test_relevance_refused_without_query() {
        let mut state = QueryState::new();
        let generation = state.generation();

        assert!(!state.set_sort(SortMode::Relevance));
        assert_eq!(state.sort(), SortMode::DateDesc);
        assert_eq!(state.generation(), generation);
    }

    #[test]
    fn test_structural_filters() {
        let reading = Uuid::new_v4();
        let links = vec![
            link("Rust Book", &["rust", "book"], Some(reading), 0),
            link("Go Tour", &["go"], Some(reading), 1),
            link("Rust Blog", &["rust"], None, 2),
        ];

        let mut state = QueryState::new();
        state.set_folder_filter(Some(reading));
        assert_eq!(titles(&state.evaluate(&links)), vec!["Rust Book", "Go Tour"]);

        state.set_tag_filter(Some("rust".to_string()));
        assert_eq!(titles(&state.evaluate(&links)), vec!["Rust Book"]);

        state.clear_filters();
        assert_eq!(state.evaluate(&links).len(), 3);
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let links = vec![link("Rust Book", &["rustlang"], None, 0)];
        let mut state = QueryState::new();
        state.set_tag_filter(Some("rust".to_string()));
        assert!(state.evaluate(&links).is_empty());
    }

    #[test]
    fn test_query_drops_non_matches_and_ranks() {
        let mut described = link("Systems Notes", &[], None, 0);
        described.description = "All about rust ownership".to_string();
        let links = vec![
            described,
            link("Cooking Recipes", &[], None, 1),
            link("Rust Book", &[], None, 2),
        ];

        let mut state = QueryState::new();
        state.set_query("rust");
        let hits = state.evaluate(&links);

        assert_eq!(titles(&hits), vec!["Rust Book", "Systems Notes"]);
        assert!(hits.iter().all(|h| h.score > 0));
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_scores_are_zero_without_query() {
        let links = vec![link("Rust Book", &[], None, 0)];
        let hits = QueryState::new().evaluate(&links);
        assert_eq!(hits[0].score, 0);
    }

    #[test]
    fn test_date_and_title_orders() {
        let links = vec![
            link("banana", &[], None, 5),
            link("Apple", &[], None, 0),
            link("cherry", &[], None, 10),
        ];

        let mut state = QueryState::new();
        assert_eq!(titles(&state.evaluate(&links)), vec!["Apple", "banana", "cherry"]);

        state.set_sort(SortMode::DateAsc);
        assert_eq!(titles(&state.evaluate(&links)), vec!["cherry", "banana", "Apple"]);

        state.set_sort(SortMode::TitleDesc);
        assert_eq!(titles(&state.evaluate(&links)), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_order_independent_of_storage_order() {
        let twins = vec![
            link("Same", &[], None, 0),
            link("Same", &[], None, 0),
            link("Same", &[], None, 0),
        ];
        let mut reversed = twins.clone();
        reversed.reverse();

        for mode in [SortMode::DateDesc, SortMode::TitleAsc, SortMode::UrlDesc] {
            let mut state = QueryState::new();
            state.set_sort(mode);
            let a: Vec<Uuid> = state.evaluate(&twins).iter().map(|h| h.link.id).collect();
            let b: Vec<Uuid> = state.evaluate(&reversed).iter().map(|h| h.link.id).collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_forget_folder() {
        let folder = Uuid::new_v4();
        let mut state = QueryState::new();
        state.set_folder_filter(Some(folder));

        state.forget_folder(Uuid::new_v4());
        assert_eq!(state.folder_filter(), Some(folder));

        state.forget_folder(folder);
        assert_eq!(state.folder_filter(), None);
    }

    #[test]
    fn test_engine_memoizes_until_inputs_change() {
        let mut store = Store::in_memory();
        store.add_link(LinkDraft::new("https://rust-lang.org", "Rust"));
        let mut engine = QueryEngine::new();

        assert_eq!(engine.results(&store).len(), 1);
        assert_eq!(engine.results(&store).len(), 1);
        assert_eq!(engine.evaluations(), 1);

        store.add_link(LinkDraft::new("https://go.dev", "Go"));
        assert_eq!(engine.results(&store).len(), 2);
        assert_eq!(engine.evaluations(), 2);

        engine.state_mut().set_query("rust");
        let hits = engine.results(&store);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].link.title, "Rust");
        assert_eq!(engine.evaluations(), 3);
    }

    #[test]
    fn test_engine_does_not_mix_up_stores() {
        let mut first = Store::in_memory();
        first.add_link(LinkDraft::new("https://alpha.example", "Alpha"));
        let mut second = Store::in_memory();
        second.add_link(LinkDraft::new("https://beta.example", "Beta"));
        assert_eq!(first.revision(), second.revision());

        let mut engine = QueryEngine::new();
        engine.state_mut().set_query("alpha");

        assert_eq!(titles(&engine.results(&first)), vec!["Alpha"]);
        assert!(engine.results(&second).is_empty());
        assert_eq!(engine.evaluations(), 2);
    }

    #[test]
    fn test_replacing_state_invalidates_results() {
        let mut store = Store::in_memory();
        store.add_link(LinkDraft::new("https://alpha.example", "Alpha"));
        store.add_link(LinkDraft::new("https://beta.example", "Beta"));

        let mut engine = QueryEngine::new();
        engine.state_mut().set_query("alpha");
        assert_eq!(engine.results(&store).len(), 1);

        // A fresh state can carry the same generation as the old one
        let mut fresh = QueryState::new();
        fresh.set_folder_filter(None);
        *engine.state_mut() = fresh.clone();
        assert_eq!(engine.results(&store).len(), 2);

        engine.state_mut().set_query("beta");
        assert_eq!(engine.results(&store).len(), 1);
        engine.set_state(fresh);
        assert_eq!(engine.results(&store).len(), 2);
    }
}
