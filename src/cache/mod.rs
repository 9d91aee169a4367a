//! In-memory page cache for incremental regeneration
//!
//! Rendered pages are kept per route. A route can also be pending (its first
//! render is running in the background) or known to be missing. Stale pages
//! keep being served while a single refresh runs. Missing routes are
//! forgotten once they are older than the cache's `missing_ttl`, and at most
//! `missing_limit` of them are kept.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Missing routes remembered at once unless configured otherwise
pub const MISSING_LIMIT: usize = 1024;

/// Result of looking a route up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A rendered page. When `refresh` is set the page is stale and the
    /// caller now owns its re-render.
    Hit { html: String, refresh: bool },
    /// The first render is still running
    Pending,
    /// The route is known not to exist
    NotFound,
    /// Nothing is known about the route
    Miss,
}

#[derive(Debug)]
enum EntryState {
    Ready(String),
    Pending,
    NotFound,
}

#[derive(Debug)]
struct CacheEntry {
    state: EntryState,
    rendered_at: Instant,
    refreshing: bool,
}

impl CacheEntry {
    fn new(state: EntryState) -> Self {
        Self {
            state,
            rendered_at: Instant::now(),
            refreshing: false,
        }
    }

    fn is_missing(&self) -> bool {
        matches!(self.state, EntryState::NotFound)
    }

    fn is_expired_missing(&self, ttl: Duration) -> bool {
        self.is_missing() && self.rendered_at.elapsed() >= ttl
    }
}

/// Rendered pages keyed by route
#[derive(Debug)]
pub struct PageCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    missing_ttl: Duration,
    missing_limit: usize,
}

impl PageCache {
    /// A cache that remembers missing routes for `missing_ttl`
    pub fn new(missing_ttl: Duration) -> Self {
        Self {
            entries: Mutex::default(),
            missing_ttl,
            missing_limit: MISSING_LIMIT,
        }
    }

    pub fn with_missing_limit(mut self, limit: usize) -> Self {
        self.missing_limit = limit.max(1);
        self
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look a route up
    ///
    /// With `max_age` set, a page at least that old is reported with
    /// `refresh: true` to exactly one caller until it is stored again.
    pub fn get(&self, route: &str, max_age: Option<Duration>) -> Lookup {
        let mut entries = self.entries();
        if entries
            .get(route)
            .is_some_and(|e| e.is_expired_missing(self.missing_ttl))
        {
            entries.remove(route);
            return Lookup::Miss;
        }

        let Some(entry) = entries.get_mut(route) else {
            return Lookup::Miss;
        };

        match &entry.state {
            EntryState::Pending => Lookup::Pending,
            EntryState::NotFound => Lookup::NotFound,
            EntryState::Ready(html) => {
                let stale = max_age.is_some_and(|age| entry.rendered_at.elapsed() >= age);
                let refresh = stale && !entry.refreshing;
                if refresh {
                    entry.refreshing = true;
                }
                Lookup::Hit {
                    html: html.clone(),
                    refresh,
                }
            }
        }
    }

    /// Mark an unknown route as pending
    ///
    /// Returns `true` for the one caller that should run the render.
    pub fn claim(&self, route: &str) -> bool {
        let mut entries = self.entries();
        if entries
            .get(route)
            .is_some_and(|e| !e.is_expired_missing(self.missing_ttl))
        {
            return false;
        }
        entries.insert(route.to_string(), CacheEntry::new(EntryState::Pending));
        true
    }

    /// Store a rendered page
    pub fn store(&self, route: &str, html: String) {
        self.entries()
            .insert(route.to_string(), CacheEntry::new(EntryState::Ready(html)));
    }

    /// Remember that a route does not exist
    ///
    /// Expired missing routes are dropped first; past the limit the oldest
    /// ones are forgotten.
    pub fn mark_not_found(&self, route: &str) {
        let mut entries = self.entries();
        let ttl = self.missing_ttl;
        entries.retain(|_, e| !e.is_expired_missing(ttl));

        let mut missing: Vec<(Instant, String)> = entries
            .iter()
            .filter(|(r, e)| e.is_missing() && r.as_str() != route)
            .map(|(r, e)| (e.rendered_at, r.clone()))
            .collect();
        if missing.len() >= self.missing_limit {
            missing.sort();
            let excess = missing.len() + 1 - self.missing_limit;
            for (_, old) in missing.into_iter().take(excess) {
                tracing::debug!("Forgetting missing route {}", old);
                entries.remove(&old);
            }
        }

        entries.insert(route.to_string(), CacheEntry::new(EntryState::NotFound));
    }

    /// Give up on a failed render so a later request can retry
    ///
    /// A pending route is forgotten; a stale page stays and can be
    /// refreshed again.
    pub fn release(&self, route: &str) {
        let mut entries = self.entries();
        let pending = match entries.get_mut(route) {
            Some(entry) if matches!(entry.state, EntryState::Pending) => true,
            Some(entry) => {
                entry.refreshing = false;
                false
            }
            None => false,
        };
        if pending {
            entries.remove(route);
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_claim_once() {
        let cache = PageCache::new(Duration::from_secs(1800));
        assert_eq!(cache.get("/post/a", None), Lookup::Miss);
        assert!(cache.claim("/post/a"));
        assert!(!cache.claim("/post/a"));
        assert_eq!(cache.get("/post/a", None), Lookup::Pending);
    }

    #[test]
    fn test_store_makes_page_ready() {
        let cache = PageCache::new(Duration::from_secs(1800));
        cache.claim("/post/a");
        cache.store("/post/a", "<h1>A</h1>".to_string());
        assert_eq!(
            cache.get("/post/a", None),
            Lookup::Hit {
                html: "<h1>A</h1>".to_string(),
                refresh: false
            }
        );
    }

    #[test]
    fn test_stale_page_is_refreshed_by_one_caller() {
        let cache = PageCache::new(Duration::from_secs(1800));
        cache.store("/", "old".to_string());

        let stale = Some(Duration::ZERO);
        assert_eq!(
            cache.get("/", stale),
            Lookup::Hit {
                html: "old".to_string(),
                refresh: true
            }
        );
        // the refresh is already running
        assert_eq!(
            cache.get("/", stale),
            Lookup::Hit {
                html: "old".to_string(),
                refresh: false
            }
        );

        cache.store("/", "new".to_string());
        assert_eq!(
            cache.get("/", Some(Duration::from_secs(1800))),
            Lookup::Hit {
                html: "new".to_string(),
                refresh: false
            }
        );
    }

    #[test]
    fn test_release_after_failure() {
        let cache = PageCache::new(Duration::from_secs(1800));

        cache.claim("/post/a");
        cache.release("/post/a");
        assert_eq!(cache.get("/post/a", None), Lookup::Miss);

        cache.store("/", "old".to_string());
        let stale = Some(Duration::ZERO);
        assert!(matches!(cache.get("/", stale), Lookup::Hit { refresh: true, .. }));
        cache.release("/");
        assert!(matches!(cache.get("/", stale), Lookup::Hit { refresh: true, .. }));
    }

    #[test]
    fn test_not_found_is_remembered() {
        let cache = PageCache::new(Duration::from_secs(1800));
        cache.claim("/post/nope");
        cache.mark_not_found("/post/nope");
        assert_eq!(cache.get("/post/nope", None), Lookup::NotFound);
        assert!(!cache.claim("/post/nope"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_route_expires() {
        let cache = PageCache::new(Duration::ZERO);
        cache.claim("/post/depois");
        cache.mark_not_found("/post/depois");

        assert_eq!(cache.get("/post/depois", None), Lookup::Miss);
        assert!(cache.is_empty());
        assert!(cache.claim("/post/depois"));
    }

    #[test]
    fn test_expired_missing_route_can_be_claimed() {
        let cache = PageCache::new(Duration::ZERO);
        cache.mark_not_found("/post/depois");
        assert!(cache.claim("/post/depois"));
        assert_eq!(cache.get("/post/depois", None), Lookup::Pending);
    }

    #[test]
    fn test_missing_routes_are_bounded() {
        let cache = PageCache::new(Duration::from_secs(1800)).with_missing_limit(2);
        cache.store("/", "home".to_string());
        for route in ["/post/a", "/post/b", "/post/c"] {
            cache.claim(route);
            cache.mark_not_found(route);
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("/post/a", None), Lookup::Miss);
        assert_eq!(cache.get("/post/b", None), Lookup::NotFound);
        assert_eq!(cache.get("/post/c", None), Lookup::NotFound);
        assert!(matches!(cache.get("/", None), Lookup::Hit { .. }));
    }
}
