//! Viewer state machine: navigation, clip reloads, view fitting and the search fallback.

use std::sync::Arc;

use foundation::Aabb2;
use foundation::math::{Crs, lon_lat_to_mercator};
use formats::RegionDataset;
use layers::{
    ClipEvent, ClipFeature, ClipMaskedRasterLayer, ClipSource, MapView, NotFound, Padding,
    PaintSurface, RasterLayer, TileGrid, tile_grid::DEFAULT_LEVELS,
};
use runtime::Locator;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::search::SearchUi;
use crate::ui::{MessageTone, UiHost};

pub const SEARCH_PROMPT: &str = "Zoek een gemeente:";

pub fn title_for(feature: &ClipFeature) -> String {
    format!(
        "Gemeente {} - {} (Provincie {})",
        feature.code, feature.name, feature.province
    )
}

pub fn unknown_code_message(code: &str) -> String {
    format!("ERROR: GEMEENTE MET CODE {code} BESTAAT NIET")
}

pub struct Viewer {
    config: ViewerConfig,
    dataset: Arc<RegionDataset>,
    clip: ClipSource,
    base: RasterLayer,
    aerial: ClipMaskedRasterLayer,
    view: MapView,
    search: SearchUi,
    locator: Locator,
}

impl Viewer {
    pub fn new(config: ViewerConfig, dataset: Arc<RegionDataset>, viewport: [u32; 2]) -> Self {
        let grid = TileGrid::web_mercator(DEFAULT_LEVELS);
        let center = lon_lat_to_mercator(config.initial_center_lon_lat);
        let view = MapView::new(center, grid.resolution_for_zoom(config.initial_zoom), viewport);
        let base = RasterLayer::new(1, config.base_layer.clone(), grid.clone());
        let aerial = ClipMaskedRasterLayer::new(RasterLayer::new(
            2,
            config.aerial_layer.clone(),
            grid,
        ));
        Self {
            config,
            dataset,
            clip: ClipSource::new(Crs::Epsg3857),
            base,
            aerial,
            view,
            search: SearchUi::new(),
            locator: Locator::default(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn dataset(&self) -> &RegionDataset {
        &self.dataset
    }

    pub fn clip(&self) -> &ClipSource {
        &self.clip
    }

    pub fn view(&self) -> &MapView {
        &self.view
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// New viewport size. A loaded region is fitted again with padding for the new size.
    pub fn resize(&mut self, viewport: [u32; 2]) {
        if self.view.size_px == viewport {
            return;
        }
        self.view.set_size(viewport);
        if let Some(feature) = self.clip.feature() {
            let extent = feature.extent;
            debug!(code = %feature.code, ?viewport, "refit after resize");
            self.fit_to(&extent);
        }
    }

    /// Handles a (possibly unchanged) locator: reloads the clip source and updates the page.
    pub fn navigate(&mut self, locator: Locator, ui: &mut dyn UiHost) -> Result<(), NotFound> {
        debug!(locator = %locator, "navigate");
        self.locator = locator;

        ui.set_map_visible(true);
        ui.set_title("");

        self.clip
            .reload_from_locator(&self.locator, &self.config.selection_key, &self.dataset);
        self.aerial.sync_extent(&self.clip);

        let mut outcome = Ok(());
        for event in self.clip.drain_events() {
            outcome = match event.payload {
                ClipEvent::Loaded(feature) => {
                    self.on_loaded(&feature, ui);
                    Ok(())
                }
                ClipEvent::LoadFailed { reason, .. } => {
                    self.on_load_failed(&reason, ui);
                    Err(reason)
                }
            };
        }
        outcome
    }

    /// Search input changed. A full region name selects that region.
    pub fn on_search_input(
        &mut self,
        text: &str,
        ui: &mut dyn UiHost,
    ) -> Option<Result<(), NotFound>> {
        let code = self.search.matches(text)?.to_string();
        let locator = Locator::for_selection(&self.config.selection_key, &code);
        ui.push_locator(&locator);
        Some(self.navigate(locator, ui))
    }

    /// Base map first, then the clipped aerial layer. Returns the number of tiles drawn.
    pub fn paint(&self, surface: &mut dyn PaintSurface) -> usize {
        let base = self.base.render(surface, &self.view);
        base + self.aerial.render(surface, &self.view, &self.clip)
    }

    fn on_loaded(&mut self, feature: &ClipFeature, ui: &mut dyn UiHost) {
        ui.set_title(&title_for(feature));
        ui.set_error_message("", MessageTone::Neutral);
        ui.show_map_panel(true);

        self.view.set_size(ui.viewport_size());
        self.fit_to(&feature.extent);
        info!(
            code = %feature.code,
            resolution = self.view.resolution,
            "view fitted to region"
        );
    }

    fn fit_to(&mut self, extent: &Aabb2) {
        let padding = Padding::proportional(self.view.size_px, self.config.padding_ratio);
        self.view
            .fit(extent, padding, self.aerial.raster().grid().min_resolution());
    }

    fn on_load_failed(&mut self, reason: &NotFound, ui: &mut dyn UiHost) {
        match reason {
            NotFound::UnknownIdentifier(code) => {
                ui.set_error_message(&unknown_code_message(code), MessageTone::Alert);
            }
            NotFound::NoSelection => {
                ui.set_error_message(SEARCH_PROMPT, MessageTone::Neutral);
                if !self.locator.is_home(&self.config.home_marker) {
                    let home = Locator::home(&self.config.home_marker);
                    ui.push_locator(&home);
                    self.locator = home;
                }
            }
        }
        self.search.show(&self.dataset, ui);
        ui.show_map_panel(false);
    }
}
