//! Clip feature resolution and the single-feature clip source.

use foundation::Aabb2;
use foundation::math::Crs;
use formats::{Boundary, RegionDataset, RegionRecord};
use runtime::{Event, EventBus, Locator};
use tracing::{debug, info, warn};

/// The region boundary currently used to mask the aerial layer, in display CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipFeature {
    pub code: String,
    pub name: String,
    pub province: String,
    pub geometry: Boundary,
    pub extent: Aabb2,
}

impl ClipFeature {
    pub fn from_record(record: &RegionRecord, from: Crs, to: Crs) -> Self {
        let geometry = record.boundary.reproject(from, to);
        let extent = geometry.bounds();
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            province: record.province.clone(),
            geometry,
            extent,
        }
    }
}

/// Why no clip feature could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// The locator carries no region code.
    NoSelection,
    /// The locator names a code that is not in the dataset.
    UnknownIdentifier(String),
}

impl NotFound {
    pub fn reason(&self) -> &'static str {
        match self {
            NotFound::NoSelection => "no-selection",
            NotFound::UnknownIdentifier(_) => "unknown-id",
        }
    }
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::NoSelection => write!(f, "no region selected"),
            NotFound::UnknownIdentifier(code) => write!(f, "unknown region code {code}"),
        }
    }
}

impl std::error::Error for NotFound {}

/// Looks `selection` up in `dataset` and reprojects its boundary into `display`.
pub fn resolve(
    selection: Option<&str>,
    dataset: &RegionDataset,
    display: Crs,
) -> Result<ClipFeature, NotFound> {
    let code = selection.ok_or(NotFound::NoSelection)?;
    let record = dataset
        .get(code)
        .ok_or_else(|| NotFound::UnknownIdentifier(code.to_string()))?;
    Ok(ClipFeature::from_record(record, dataset.crs(), display))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipEvent {
    Loaded(ClipFeature),
    LoadFailed {
        reason: NotFound,
        requested: Option<String>,
    },
}

/// Holds at most one clip feature and reports every reload through its event bus.
///
/// Each reload clears the previous feature before anything else happens, so a failed reload
/// always leaves the source empty.
#[derive(Debug)]
pub struct ClipSource {
    display: Crs,
    feature: Option<ClipFeature>,
    events: EventBus<ClipEvent>,
}

impl ClipSource {
    pub fn new(display: Crs) -> Self {
        Self {
            display,
            feature: None,
            events: EventBus::new(),
        }
    }

    pub fn feature(&self) -> Option<&ClipFeature> {
        self.feature.as_ref()
    }

    pub fn feature_count(&self) -> usize {
        usize::from(self.feature.is_some())
    }

    /// Extent of the held feature; `None` while the source is empty.
    pub fn extent(&self) -> Option<Aabb2> {
        self.feature.as_ref().map(|f| f.extent)
    }

    pub fn clear(&mut self) {
        self.feature = None;
    }

    /// Replaces the held feature with the one `selection` resolves to.
    pub fn reload(&mut self, selection: Option<&str>, dataset: &RegionDataset) -> bool {
        self.clear();
        match resolve(selection, dataset, self.display) {
            Ok(feature) => {
                info!(code = %feature.code, name = %feature.name, "clip feature loaded");
                self.feature = Some(feature.clone());
                self.events.emit(ClipEvent::Loaded(feature));
                true
            }
            Err(reason) => {
                warn!(reason = reason.reason(), requested = ?selection, "clip feature load failed");
                self.events.emit(ClipEvent::LoadFailed {
                    reason,
                    requested: selection.map(str::to_string),
                });
                false
            }
        }
    }

    /// Reads the selection under `key` from `locator`, then reloads.
    pub fn reload_from_locator(
        &mut self,
        locator: &Locator,
        key: &str,
        dataset: &RegionDataset,
    ) -> bool {
        self.reload(locator.selection(key), dataset)
    }

    pub fn drain_events(&mut self) -> Vec<Event<ClipEvent>> {
        let events = self.events.drain();
        debug!(count = events.len(), "draining clip events");
        events
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipEvent, ClipSource, NotFound, resolve};
    use foundation::math::Crs;
    use formats::RegionDataset;
    use pretty_assertions::assert_eq;
    use runtime::{Locator, SELECTION_KEY};

    const SAMPLE: &str = include_str!("../../apps/viewer_web/assets/gemeenten-sample-4326.json");

    fn dataset() -> RegionDataset {
        RegionDataset::from_geojson_str(SAMPLE).expect("load dataset")
    }

    #[test]
    fn every_code_resolves_to_its_record() {
        let ds = dataset();
        for record in ds.iter() {
            let feature = resolve(Some(&record.code), &ds, Crs::Epsg3857).expect("resolve");
            assert_eq!(feature.code, record.code);
            assert_eq!(feature.name, record.name);
            assert_eq!(feature.province, record.province);
            assert_eq!(
                feature.geometry,
                record.boundary.reproject(Crs::Epsg4326, Crs::Epsg3857)
            );
            assert_eq!(feature.extent, feature.geometry.bounds());
        }
    }

    #[test]
    fn unknown_and_missing_codes_fail() {
        let ds = dataset();
        assert_eq!(
            resolve(Some("ZZ9999"), &ds, Crs::Epsg3857),
            Err(NotFound::UnknownIdentifier("ZZ9999".to_string()))
        );
        assert_eq!(resolve(None, &ds, Crs::Epsg3857), Err(NotFound::NoSelection));
        assert_eq!(NotFound::NoSelection.reason(), "no-selection");
    }

    #[test]
    fn reload_is_replace_not_add() {
        let ds = dataset();
        let mut source = ClipSource::new(Crs::Epsg3857);
        assert!(source.reload(Some("GM0344"), &ds));
        let first = source.feature().cloned();
        assert!(source.reload(Some("GM0344"), &ds));
        assert_eq!(source.feature_count(), 1);
        assert_eq!(source.feature().cloned(), first);

        let locator = Locator::for_selection(SELECTION_KEY, "GM0344");
        assert!(source.reload_from_locator(&locator, SELECTION_KEY, &ds));
        assert_eq!(source.feature_count(), 1);

        let events = source.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1].payload, ClipEvent::Loaded(ref f) if f.code == "GM0344"));
    }

    #[test]
    fn failed_reload_clears_previous_feature() {
        let ds = dataset();
        let mut source = ClipSource::new(Crs::Epsg3857);
        source.reload(Some("GM0363"), &ds);
        assert!(!source.reload(Some("ZZ9999"), &ds));
        assert!(source.feature().is_none());
        assert!(source.extent().is_none());

        let events = source.drain_events();
        assert_eq!(
            events[1].payload,
            ClipEvent::LoadFailed {
                reason: NotFound::UnknownIdentifier("ZZ9999".to_string()),
                requested: Some("ZZ9999".to_string()),
            }
        );
        assert!(source.drain_events().is_empty());
    }
}
