use formats::RegionDataset;
use tracing::debug;

use crate::ui::UiHost;

/// Region names sorted for display, each paired with its code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    entries: Vec<(String, String)>,
}

impl SearchIndex {
    /// Derived copy of `dataset`; the dataset itself is never reordered.
    pub fn build(dataset: &RegionDataset) -> Self {
        let entries = dataset
            .sorted_by_name()
            .into_iter()
            .map(|r| (r.name.clone(), r.code.clone()))
            .collect();
        Self { entries }
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Code of the region whose name equals `text` exactly (case-sensitive).
    pub fn find(&self, text: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == text)
            .map(|(_, code)| code.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fallback search: the input is created on the first failure and only reset afterwards.
#[derive(Debug, Default)]
pub struct SearchUi {
    index: SearchIndex,
    built: bool,
}

impl SearchUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, dataset: &RegionDataset, ui: &mut dyn UiHost) {
        self.index = SearchIndex::build(dataset);
        if self.built {
            ui.reset_search_input();
        } else {
            ui.build_search(&self.index.names());
            self.built = true;
        }
        debug!(options = self.index.len(), built = self.built, "search shown");
    }

    /// Code for an input value, or `None` if it is not (yet) a full region name.
    pub fn matches(&self, text: &str) -> Option<&str> {
        if !self.built {
            return None;
        }
        self.index.find(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{SearchIndex, SearchUi};
    use crate::ui::MemoryUi;
    use formats::RegionDataset;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = include_str!("../assets/gemeenten-sample-4326.json");

    #[test]
    fn index_is_sorted_without_touching_dataset() {
        let ds = RegionDataset::from_geojson_str(SAMPLE).expect("dataset");
        let before: Vec<String> = ds.iter().map(|r| r.code.clone()).collect();

        let index = SearchIndex::build(&ds);
        assert_eq!(
            index.names(),
            vec!["'s-Gravenhage", "Ameland", "Amsterdam", "Groningen", "Rotterdam", "Utrecht"]
        );

        let after: Vec<String> = ds.iter().map(|r| r.code.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let ds = RegionDataset::from_geojson_str(SAMPLE).expect("dataset");
        let index = SearchIndex::build(&ds);
        assert_eq!(index.find("Utrecht"), Some("GM0344"));
        assert_eq!(index.find("utrecht"), None);
        assert_eq!(index.find("Utrech"), None);
        assert_eq!(index.find(""), None);
    }

    #[test]
    fn built_once_then_reset() {
        let ds = RegionDataset::from_geojson_str(SAMPLE).expect("dataset");
        let mut search = SearchUi::new();
        let mut ui = MemoryUi::new([800, 600]);
        assert_eq!(search.matches("Utrecht"), None);

        search.show(&ds, &mut ui);
        ui.search_input = "Amst".to_string();
        search.show(&ds, &mut ui);

        assert_eq!(ui.search_builds, 1);
        assert_eq!(ui.search_input, "");
        assert_eq!(search.matches("Amsterdam"), Some("GM0363"));
    }
}
