use std::cell::RefCell;
use std::sync::Arc;

use console_error_panic_hook::set_once;
use formats::RegionDataset;
use gloo_net::http::Request;
use layers::{CompositeOp, PaintSurface, PixelRect};
use runtime::Locator;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlCanvasElement, HtmlElement,
    HtmlImageElement, HtmlInputElement,
};

use crate::config::{ElementIds, ViewerConfig};
use crate::controller::Viewer;
use crate::tile_cache::TileCache;
use crate::ui::{MessageTone, UiHost};

struct WebState {
    viewer: Viewer,
    ui: DomUi,
    surface: CanvasSurface,
}

thread_local! {
    static STATE: RefCell<Option<WebState>> = const { RefCell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn html_element(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

fn set_style(doc: &Document, id: &str, property: &str, value: &str) {
    let Some(el) = html_element(doc, id) else {
        log(&format!("missing element #{id}"));
        return;
    };
    if let Err(err) = el.style().set_property(property, value) {
        log(&format!("style {property} on #{id} failed: {err:?}"));
    }
}

/// [`UiHost`] over the page DOM.
struct DomUi {
    doc: Document,
    ids: ElementIds,
}

impl DomUi {
    fn on_search_input(event: Event) {
        let Some(input) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        else {
            return;
        };
        let value = input.value();
        with_state(|state| {
            if state.viewer.on_search_input(&value, &mut state.ui).is_some() {
                paint(state);
            }
        });
    }

    fn create(&self, tag: &str) -> Result<Element, JsValue> {
        self.doc.create_element(tag)
    }

    fn try_build_search(&self, names: &[String]) -> Result<(), JsValue> {
        let container = self
            .doc
            .get_element_by_id(&self.ids.error)
            .ok_or_else(|| JsValue::from_str("missing error container"))?;

        let input = self.create("input")?;
        input.set_id(&self.ids.search_input);
        input.set_attribute("list", &self.ids.search_list)?;
        input.set_attribute("placeholder", "Start met typen...")?;

        let list = self.create("datalist")?;
        list.set_id(&self.ids.search_list);
        for name in names {
            let option = self.create("option")?;
            option.set_attribute("value", name)?;
            option.set_text_content(Some(name.as_str()));
            list.append_child(&option)?;
        }

        let handler = Closure::<dyn FnMut(Event)>::new(DomUi::on_search_input);
        input.add_event_listener_with_callback("input", handler.as_ref().unchecked_ref())?;
        handler.forget();

        container.append_child(&input)?;
        container.append_child(&list)?;
        Ok(())
    }
}

impl UiHost for DomUi {
    fn set_map_visible(&mut self, visible: bool) {
        let value = if visible { "visible" } else { "hidden" };
        set_style(&self.doc, &self.ids.map, "visibility", value);
    }

    fn show_map_panel(&mut self, show: bool) {
        let (map, error) = if show { ("block", "none") } else { ("none", "flex") };
        set_style(&self.doc, &self.ids.map, "display", map);
        set_style(&self.doc, &self.ids.error, "display", error);
    }

    fn set_title(&mut self, text: &str) {
        if let Some(el) = html_element(&self.doc, &self.ids.title) {
            el.set_inner_text(text);
        }
    }

    fn set_error_message(&mut self, text: &str, tone: MessageTone) {
        if let Some(el) = html_element(&self.doc, &self.ids.error_message) {
            el.set_inner_text(text);
        }
        set_style(&self.doc, &self.ids.error_message, "color", tone.css_color());
    }

    fn build_search(&mut self, names: &[String]) {
        if let Err(err) = self.try_build_search(names) {
            log(&format!("search ui error: {err:?}"));
        }
    }

    fn reset_search_input(&mut self) {
        if let Some(input) = self
            .doc
            .get_element_by_id(&self.ids.search_input)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value("");
        }
    }

    fn push_locator(&mut self, locator: &Locator) {
        let pushed = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|w| w.history())
            .and_then(|h| h.push_state_with_url(&JsValue::NULL, "", Some(locator.as_str())));
        if let Err(err) = pushed {
            log(&format!("history push failed: {err:?}"));
        }
    }

    fn viewport_size(&self) -> [u32; 2] {
        match html_element(&self.doc, &self.ids.map) {
            Some(el) => [el.client_width().max(0) as u32, el.client_height().max(0) as u32],
            None => [0, 0],
        }
    }
}

/// [`PaintSurface`] over a 2D canvas. Offscreen layers are extra canvases of the same size.
///
/// Tile images are cached by URL until a paint no longer asks for them. All images share
/// one `onload` handler that repaints the map.
struct CanvasSurface {
    doc: Document,
    canvas: HtmlCanvasElement,
    layers: Vec<(HtmlCanvasElement, CanvasRenderingContext2d)>,
    images: TileCache<HtmlImageElement>,
    onload: js_sys::Function,
    composite: CompositeOp,
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("not a 2d context"))
}

impl CanvasSurface {
    fn new(doc: Document, container_id: &str) -> Result<Self, JsValue> {
        let container = doc
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str("missing map container"))?;
        let canvas = doc.create_element("canvas")?.dyn_into::<HtmlCanvasElement>()?;
        container.append_child(&canvas)?;
        let ctx = context_2d(&canvas)?;
        let onload = Closure::<dyn FnMut()>::new(repaint)
            .into_js_value()
            .unchecked_into::<js_sys::Function>();
        Ok(Self {
            doc,
            layers: vec![(canvas.clone(), ctx)],
            canvas,
            images: TileCache::new(),
            onload,
            composite: CompositeOp::SourceOver,
        })
    }

    fn resize(&mut self, size: [u32; 2]) {
        self.canvas.set_width(size[0]);
        self.canvas.set_height(size[1]);
    }

    fn clear(&mut self) {
        self.layers.truncate(1);
        let [w, h] = self.size_px();
        self.ctx().clear_rect(0.0, 0.0, w as f64, h as f64);
        self.images.begin_paint();
        self.set_composite(CompositeOp::SourceOver);
    }

    /// Drops cached images the last paint did not draw. Pending loads are abandoned.
    fn evict_unrequested(&mut self) {
        let evicted = self.images.evict_unrequested(|img| img.set_onload(None));
        if evicted > 0 {
            tracing::debug!(evicted, cached = self.images.len(), "tile images evicted");
        }
    }

    fn ctx(&self) -> &CanvasRenderingContext2d {
        // The base canvas is never popped.
        &self.layers[self.layers.len() - 1].1
    }

    fn image(&mut self, url: &str) -> Option<HtmlImageElement> {
        let onload = &self.onload;
        self.images
            .get_or_create(url, || {
                let img = match HtmlImageElement::new() {
                    Ok(img) => img,
                    Err(err) => {
                        log(&format!("image element error: {err:?}"));
                        return None;
                    }
                };
                img.set_cross_origin(Some("anonymous"));
                img.set_onload(Some(onload));
                img.set_src(url);
                Some(img)
            })
            .cloned()
    }
}

impl PaintSurface for CanvasSurface {
    fn size_px(&self) -> [u32; 2] {
        [self.canvas.width(), self.canvas.height()]
    }

    fn composite(&self) -> CompositeOp {
        self.composite
    }

    fn set_composite(&mut self, op: CompositeOp) {
        self.composite = op;
        if let Err(err) = self.ctx().set_global_composite_operation(op.as_css()) {
            log(&format!("composite op failed: {err:?}"));
        }
    }

    fn push_layer(&mut self) -> bool {
        let [w, h] = self.size_px();
        let layer = self
            .doc
            .create_element("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from))
            .and_then(|canvas| {
                canvas.set_width(w);
                canvas.set_height(h);
                let ctx = context_2d(&canvas)?;
                Ok((canvas, ctx))
            });
        match layer {
            Ok(layer) => {
                self.layers.push(layer);
                self.set_composite(CompositeOp::SourceOver);
                true
            }
            Err(err) => {
                log(&format!("offscreen layer failed: {err:?}"));
                false
            }
        }
    }

    fn pop_layer(&mut self) {
        if self.layers.len() < 2 {
            return;
        }
        let Some((canvas, _)) = self.layers.pop() else {
            return;
        };
        self.set_composite(CompositeOp::SourceOver);
        if let Err(err) = self.ctx().draw_image_with_html_canvas_element(&canvas, 0.0, 0.0) {
            log(&format!("layer composite failed: {err:?}"));
        }
    }

    fn draw_tile(&mut self, url: &str, dest: PixelRect) -> bool {
        let Some(img) = self.image(url) else {
            return false;
        };
        if !img.complete() || img.natural_width() == 0 {
            return false;
        }
        self.ctx()
            .draw_image_with_html_image_element_and_dw_and_dh(&img, dest.x, dest.y, dest.w, dest.h)
            .is_ok()
    }

    fn fill_triangles(&mut self, triangles: &[[f64; 2]], color: [f32; 4]) {
        let ctx = self.ctx();
        ctx.begin_path();
        for tri in triangles.chunks_exact(3) {
            ctx.move_to(tri[0][0], tri[0][1]);
            ctx.line_to(tri[1][0], tri[1][1]);
            ctx.line_to(tri[2][0], tri[2][1]);
            ctx.close_path();
        }
        let css = format!(
            "rgba({}, {}, {}, {})",
            (color[0] * 255.0).round(),
            (color[1] * 255.0).round(),
            (color[2] * 255.0).round(),
            color[3]
        );
        ctx.set_fill_style_str(&css);
        ctx.fill();
    }
}

fn with_state(f: impl FnOnce(&mut WebState)) {
    STATE.with(|state| {
        // A handler firing while the state is borrowed would reenter; drop it.
        if let Ok(mut state) = state.try_borrow_mut() {
            if let Some(state) = state.as_mut() {
                f(state);
            }
        }
    });
}

fn paint(state: &mut WebState) {
    let size = state.ui.viewport_size();
    if state.surface.size_px() != size {
        state.surface.resize(size);
        // Refits the current region to the new viewport.
        state.viewer.resize(size);
    }
    state.surface.clear();
    state.viewer.paint(&mut state.surface);
    state.surface.evict_unrequested();
}

fn current_locator() -> Locator {
    let hash = web_sys::window()
        .map(|w| w.location())
        .and_then(|l| l.hash().ok())
        .unwrap_or_default();
    Locator::new(hash)
}

fn on_hash_change() {
    let locator = current_locator();
    with_state(|state| {
        if let Err(reason) = state.viewer.navigate(locator, &mut state.ui) {
            log(&format!("gemeente not loaded: {reason}"));
        }
        paint(state);
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Redraws the map with whatever tiles have arrived so far.
#[wasm_bindgen]
pub fn repaint() {
    with_state(paint);
}

/// Fetches the region dataset and starts following the URL fragment. `config_json` may
/// override any [`ViewerConfig`] field.
#[wasm_bindgen]
pub fn init_viewer(config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json.as_deref() {
        Some(json) => {
            ViewerConfig::from_json_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?
        }
        None => ViewerConfig::default(),
    };

    let doc = document()?;
    // Hidden until the first load, to avoid a flash of the unfitted map.
    set_style(&doc, &config.elements.map, "visibility", "hidden");

    spawn_local(async move {
        if let Err(err) = init_viewer_inner(config).await {
            log(&format!("viewer init error: {err:?}"));
        }
    });
    Ok(())
}

async fn init_viewer_inner(config: ViewerConfig) -> Result<(), JsValue> {
    let dataset = fetch_dataset(&config.dataset_url).await?;
    let doc = document()?;
    let ui = DomUi {
        doc: doc.clone(),
        ids: config.elements.clone(),
    };
    let surface = CanvasSurface::new(doc, &config.elements.map)?;
    let viewer = Viewer::new(config, Arc::new(dataset), ui.viewport_size());

    STATE.with(|state| {
        *state.borrow_mut() = Some(WebState {
            viewer,
            ui,
            surface,
        });
    });

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let listener = Closure::<dyn FnMut()>::new(on_hash_change);
    window.add_event_listener_with_callback("hashchange", listener.as_ref().unchecked_ref())?;
    listener.forget();

    let on_resize = Closure::<dyn FnMut()>::new(repaint);
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();

    on_hash_change();
    Ok(())
}

async fn fetch_dataset(url: &str) -> Result<RegionDataset, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    RegionDataset::from_geojson_str(&text).map_err(|e| JsValue::from_str(&e.to_string()))
}
