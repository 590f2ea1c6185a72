//! Page-side effects of the viewer, kept behind [`UiHost`] so the controller runs headless.

use runtime::Locator;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageTone {
    /// Red text, used when a requested region does not exist.
    Alert,
    Neutral,
}

impl MessageTone {
    pub fn css_color(self) -> &'static str {
        match self {
            MessageTone::Alert => "red",
            MessageTone::Neutral => "black",
        }
    }
}

pub trait UiHost {
    /// Hidden maps keep their layout; used while a reload is in flight.
    fn set_map_visible(&mut self, visible: bool);

    /// Shows the map container (`display`) and swaps the error panel the other way.
    fn show_map_panel(&mut self, show: bool);

    fn set_title(&mut self, text: &str);

    fn set_error_message(&mut self, text: &str, tone: MessageTone);

    /// Creates the search input and its option list. Only called once per page.
    fn build_search(&mut self, names: &[String]);

    fn reset_search_input(&mut self);

    /// Records a new history entry without triggering navigation.
    fn push_locator(&mut self, locator: &Locator);

    fn viewport_size(&self) -> [u32; 2];
}

/// In-memory [`UiHost`] recording everything the controller does to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryUi {
    pub map_visible: bool,
    pub map_panel_shown: bool,
    pub title: String,
    pub error_message: String,
    pub error_tone: MessageTone,
    pub search_options: Option<Vec<String>>,
    pub search_builds: usize,
    pub search_input: String,
    pub history: Vec<Locator>,
    pub viewport: [u32; 2],
}

impl MemoryUi {
    pub fn new(viewport: [u32; 2]) -> Self {
        Self {
            map_visible: false,
            map_panel_shown: true,
            title: String::new(),
            error_message: String::new(),
            error_tone: MessageTone::Neutral,
            search_options: None,
            search_builds: 0,
            search_input: String::new(),
            history: Vec::new(),
            viewport,
        }
    }

    /// Error panel is the inverse of the map panel.
    pub fn error_panel_shown(&self) -> bool {
        !self.map_panel_shown
    }

    pub fn last_locator(&self) -> Option<&Locator> {
        self.history.last()
    }
}

impl UiHost for MemoryUi {
    fn set_map_visible(&mut self, visible: bool) {
        self.map_visible = visible;
    }

    fn show_map_panel(&mut self, show: bool) {
        self.map_panel_shown = show;
    }

    fn set_title(&mut self, text: &str) {
        self.title = text.to_string();
    }

    fn set_error_message(&mut self, text: &str, tone: MessageTone) {
        self.error_message = text.to_string();
        self.error_tone = tone;
    }

    fn build_search(&mut self, names: &[String]) {
        self.search_options = Some(names.to_vec());
        self.search_builds += 1;
    }

    fn reset_search_input(&mut self) {
        self.search_input.clear();
    }

    fn push_locator(&mut self, locator: &Locator) {
        self.history.push(locator.clone());
    }

    fn viewport_size(&self) -> [u32; 2] {
        self.viewport
    }
}
