//! Per-paint tile image cache: entries survive only while paints keep asking for them.

use std::collections::{HashMap, HashSet};

#[derive(Debug)]
pub struct TileCache<T> {
    entries: HashMap<String, T>,
    requested: HashSet<String>,
}

impl<T> Default for TileCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            requested: HashSet::new(),
        }
    }
}

impl<T> TileCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets which URLs were requested; call at the start of each paint.
    pub fn begin_paint(&mut self) {
        self.requested.clear();
    }

    /// Marks `url` as requested and returns its entry, creating it with `make` if needed.
    /// Nothing is cached when `make` fails.
    pub fn get_or_create(&mut self, url: &str, make: impl FnOnce() -> Option<T>) -> Option<&T> {
        self.requested.insert(url.to_string());
        if !self.entries.contains_key(url) {
            let entry = make()?;
            self.entries.insert(url.to_string(), entry);
        }
        self.entries.get(url)
    }

    /// Removes entries not requested since `begin_paint`, passing each to `on_evict`.
    /// Returns the number removed.
    pub fn evict_unrequested(&mut self, mut on_evict: impl FnMut(&T)) -> usize {
        let before = self.entries.len();
        let requested = &self.requested;
        self.entries.retain(|url, entry| {
            let keep = requested.contains(url);
            if !keep {
                on_evict(entry);
            }
            keep
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::TileCache;

    #[test]
    fn creates_each_url_once() {
        let mut cache = TileCache::new();
        let mut made = 0;
        for _ in 0..3 {
            cache.get_or_create("a", || {
                made += 1;
                Some(made)
            });
        }
        assert_eq!(made, 1);
        assert_eq!(cache.get_or_create("a", || None), Some(&1));
    }

    #[test]
    fn failed_creation_is_not_cached() {
        let mut cache: TileCache<u32> = TileCache::new();
        assert_eq!(cache.get_or_create("a", || None), None);
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_create("a", || Some(7)), Some(&7));
    }

    #[test]
    fn evicts_what_the_last_paint_did_not_request() {
        let mut cache = TileCache::new();
        cache.begin_paint();
        for url in ["a", "b", "c"] {
            cache.get_or_create(url, || Some(url.to_string()));
        }
        assert_eq!(cache.evict_unrequested(|_| {}), 0);

        cache.begin_paint();
        cache.get_or_create("b", || None);
        cache.get_or_create("d", || Some("d".to_string()));
        let mut evicted = Vec::new();
        assert_eq!(cache.evict_unrequested(|e| evicted.push(e.clone())), 2);

        evicted.sort();
        assert_eq!(evicted, ["a", "c"]);
        assert_eq!(cache.len(), 2);
        assert!(cache.get_or_create("b", || None).is_some());
        assert!(cache.get_or_create("d", || None).is_some());
    }

    #[test]
    fn browsing_many_regions_stays_bounded() {
        let mut cache = TileCache::new();
        for region in 0..50 {
            cache.begin_paint();
            for tile in 0..12 {
                let url = format!("tile/{region}/{tile}");
                cache.get_or_create(&url, || Some(()));
            }
            cache.evict_unrequested(|_| {});
            assert_eq!(cache.len(), 12);
        }
    }
}
