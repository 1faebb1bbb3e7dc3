use crate::calc::{self, parse_amount, Comparison, TaxInputs, TaxKind};
use crate::config::AppConfig;
use crate::data::{Dataset, FeatureId, ParcelProperties, Statistics};
use crate::error::LoadError;
use crate::format::{format_area, format_currency};
use crate::geo::LineString;
use crate::map::{self, ChoroplethLayer, RegionEvent, TerminalMap, Viewport};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub const PROPERTY_NOT_FOUND: &str = "Property not found. Please check the label and try again.";

/// Dataset lifecycle as seen by the UI
#[derive(Debug)]
pub enum LoadState {
    Loading,
    /// Data is drawn; the overlay stays until `overlay_until` passes
    Ready { overlay_until: Option<Instant> },
    /// Fatal for the session, holds the message shown instead of the map
    Failed(String),
}

/// Comparison form: two toggles, each gating one amount field
#[derive(Clone, Debug, PartialEq)]
pub struct Form {
    pub include_council_tax: bool,
    pub include_lbtt: bool,
    pub council_tax_input: String,
    pub lbtt_input: String,
    pub council_tax_enabled: bool,
    pub lbtt_enabled: bool,
}

impl Default for Form {
    fn default() -> Self {
        let mut form = Self {
            include_council_tax: true,
            include_lbtt: false,
            council_tax_input: String::new(),
            lbtt_input: String::new(),
            council_tax_enabled: false,
            lbtt_enabled: false,
        };
        form.update_input_states();
        form
    }
}

impl Form {
    /// Each field is enabled exactly when its toggle is on. Idempotent.
    pub fn update_input_states(&mut self) {
        self.council_tax_enabled = self.include_council_tax;
        self.lbtt_enabled = self.include_lbtt;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn inputs(&self) -> TaxInputs {
        TaxInputs {
            include_council_tax: self.include_council_tax,
            include_lbtt: self.include_lbtt,
            actual_council_tax: parse_amount(&self.council_tax_input),
            actual_lbtt: parse_amount(&self.lbtt_input),
        }
    }

    fn is_enabled(&self, field: Field) -> bool {
        match field {
            Field::CouncilTaxInput => self.council_tax_enabled,
            Field::LbttInput => self.lbtt_enabled,
            _ => true,
        }
    }

    fn input_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::CouncilTaxInput if self.council_tax_enabled => Some(&mut self.council_tax_input),
            Field::LbttInput if self.lbtt_enabled => Some(&mut self.lbtt_input),
            _ => None,
        }
    }
}

/// What the side panel shows. The three views are mutually exclusive.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelView {
    /// Nothing selected yet: the "select a property" hint
    Placeholder,
    Form,
    Results(Comparison),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    CouncilTaxToggle,
    CouncilTaxInput,
    LbttToggle,
    LbttInput,
    Calculate,
    Reset,
}

impl Field {
    const FORM_ORDER: [Field; 6] = [
        Field::CouncilTaxToggle,
        Field::CouncilTaxInput,
        Field::LbttToggle,
        Field::LbttInput,
        Field::Calculate,
        Field::Reset,
    ];
}

/// Where keyboard input goes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Map,
    Search,
    Field(Field),
}

/// Discrete user actions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    FeatureClicked(FeatureId),
    ToggleCouncilTax,
    ToggleLbtt,
    Calculate,
    Reset,
    /// Enter / space on the focused field
    Activate,
    Input(char),
    Backspace,
    FocusNext,
    FocusPrev,
    FocusMap,
    ToggleInfo,
    OpenSearch,
    SubmitSearch,
    Quit,
}

/// What the caller has to do after an action, beyond redrawing
#[derive(Clone, Debug, PartialEq)]
pub enum ViewUpdate {
    Unchanged,
    Redraw,
    /// Alert-style message; state was left untouched
    Notice(String),
    /// A parcel was selected without a click: bring it into view
    Reveal(FeatureId),
}

/// Application state. Every handler gets it by `&mut`; nothing is global.
pub struct App {
    pub map: TerminalMap,
    pub layer: Option<ChoroplethLayer>,
    /// Screen area of the map widget, inside its border. Set by the renderer.
    pub map_area: Rect,
    /// Last mouse position while the left button is held
    pub last_mouse: Option<(u16, u16)>,
    dragged: bool,
    fit_padding: (u16, u16),
    pub load: LoadState,
    pub dataset: Option<Dataset>,
    pub statistics: Option<Statistics>,
    /// Always indexes into `dataset` when set
    pub selection: Option<FeatureId>,
    /// Summary rows for the selected parcel
    pub details: Vec<(&'static str, String)>,
    pub form: Form,
    pub panel: PanelView,
    pub focus: Focus,
    pub search: String,
    pub info_open: bool,
    pub notice: Option<String>,
    pub should_quit: bool,
    loading_delay: Duration,
    min_search_length: usize,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let [lat, lon] = config.map.center;
        let viewport = Viewport::new(lon, lat, config.map.zoom, 160, 96)
            .with_zoom_limits(config.map.min_zoom, config.map.max_zoom);
        let [pad_x, pad_y] = config.map.fit_padding;
        Self {
            map: TerminalMap::new(viewport),
            layer: None,
            map_area: Rect::new(0, 0, 80, 24),
            last_mouse: None,
            dragged: false,
            fit_padding: (pad_x, pad_y),
            load: LoadState::Loading,
            dataset: None,
            statistics: None,
            selection: None,
            details: Vec::new(),
            form: Form::default(),
            panel: PanelView::Placeholder,
            focus: Focus::Map,
            search: String::new(),
            info_open: false,
            notice: None,
            should_quit: false,
            loading_delay: Duration::from_millis(config.ui.loading_delay_ms),
            min_search_length: config.ui.min_search_length,
        }
    }

    pub fn set_basemap(&mut self, lines: Vec<LineString>) {
        self.map.set_basemap(lines);
    }

    /// Take the load outcome: draw the parcels and start the overlay delay
    /// from the laid-out map, or record the failure.
    pub fn finish_load(&mut self, result: Result<Dataset, LoadError>, now: Instant) {
        match result {
            Ok(dataset) => {
                let layer = map::render(&dataset, &mut self.map, self.fit_padding);
                info!(count = dataset.len(), regions = layer.region_count(), "Properties ready");
                self.layer = Some(layer);
                self.statistics = Some(dataset.statistics());
                self.dataset = Some(dataset);
                self.load = LoadState::Ready {
                    overlay_until: Some(now + self.loading_delay),
                };
            }
            Err(e) => {
                error!(error = %e, local_origin = e.is_local_origin(), "Error loading properties");
                self.load = LoadState::Failed(e.user_message());
            }
        }
    }

    /// Advance timers. Returns true when something visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let LoadState::Ready { overlay_until } = &mut self.load {
            if overlay_until.is_some_and(|t| now >= t) {
                *overlay_until = None;
                return true;
            }
        }
        false
    }

    pub fn loading_overlay_visible(&self) -> bool {
        matches!(
            self.load,
            LoadState::Loading | LoadState::Ready { overlay_until: Some(_) }
        )
    }

    pub fn selected(&self) -> Option<&ParcelProperties> {
        let id = self.selection?;
        self.dataset.as_ref()?.get(id).map(|p| &p.properties)
    }

    /// Route an action to its transition.
    pub fn dispatch(&mut self, action: Action) -> ViewUpdate {
        self.notice = None;
        let update = match action {
            Action::FeatureClicked(id) => {
                if self.select(id) {
                    ViewUpdate::Redraw
                } else {
                    ViewUpdate::Unchanged
                }
            }
            Action::ToggleCouncilTax => self.toggle(TaxKind::CouncilTax),
            Action::ToggleLbtt => self.toggle(TaxKind::Lbtt),
            Action::Calculate => self.calculate(),
            Action::Reset => {
                self.reset();
                ViewUpdate::Redraw
            }
            Action::Activate => self.activate(),
            Action::Input(c) => self.input(c),
            Action::Backspace => self.backspace(),
            Action::FocusNext => self.cycle_focus(true),
            Action::FocusPrev => self.cycle_focus(false),
            Action::FocusMap => {
                self.focus = Focus::Map;
                ViewUpdate::Redraw
            }
            Action::ToggleInfo => {
                self.info_open = !self.info_open;
                ViewUpdate::Redraw
            }
            Action::OpenSearch => {
                self.search.clear();
                self.focus = Focus::Search;
                ViewUpdate::Redraw
            }
            Action::SubmitSearch => self.submit_search(),
            Action::Quit => {
                self.should_quit = true;
                ViewUpdate::Unchanged
            }
        };
        self.normalize_focus();
        if let ViewUpdate::Notice(ref message) = update {
            self.notice = Some(message.clone());
        }
        update
    }

    /// Make `id` the selection and show its summary with the form.
    fn select(&mut self, id: FeatureId) -> bool {
        let Some(parcel) = self.dataset.as_ref().and_then(|d| d.get(id)) else {
            return false;
        };
        let p = &parcel.properties;
        debug!(label = %p.label, "Selected property");

        self.details = vec![
            ("Property ID", p.label.clone()),
            ("Area", format_area(p.area)),
            ("Land Value", format_currency(p.land_value_combined)),
            ("Land Value per m²", format_currency(p.land_value_per_m2)),
            ("Building Value", format_currency(p.building_value_combined)),
            ("LVT (Council Tax)", format!("{}/year", format_currency(p.council_tax_amount))),
            ("LVT (LBTT)", format_currency(p.lbtt_amount)),
        ];
        self.selection = Some(id);
        self.panel = PanelView::Form;
        self.form.update_input_states();
        true
    }

    fn calculate(&mut self) -> ViewUpdate {
        match calc::calculate(self.selected(), &self.form.inputs()) {
            Ok(Some(comparison)) => {
                debug!(difference = comparison.difference, "Calculated comparison");
                self.panel = PanelView::Results(comparison);
                ViewUpdate::Redraw
            }
            Ok(None) => ViewUpdate::Unchanged,
            Err(e) => ViewUpdate::Notice(e.to_string()),
        }
    }

    /// Back to a blank form with default toggles. The selection is kept.
    fn reset(&mut self) {
        self.form.reset();
        self.panel = PanelView::Form;
        self.form.update_input_states();
    }

    fn activate(&mut self) -> ViewUpdate {
        match self.focus {
            Focus::Field(Field::CouncilTaxToggle) => self.toggle(TaxKind::CouncilTax),
            Focus::Field(Field::LbttToggle) => self.toggle(TaxKind::Lbtt),
            Focus::Field(Field::CouncilTaxInput | Field::LbttInput | Field::Calculate) => {
                self.calculate()
            }
            Focus::Field(Field::Reset) => {
                self.reset();
                ViewUpdate::Redraw
            }
            Focus::Search => self.submit_search(),
            Focus::Map => ViewUpdate::Unchanged,
        }
    }

    fn toggle(&mut self, tax: TaxKind) -> ViewUpdate {
        let flag = match tax {
            TaxKind::CouncilTax => &mut self.form.include_council_tax,
            TaxKind::Lbtt => &mut self.form.include_lbtt,
        };
        *flag = !*flag;
        self.form.update_input_states();
        ViewUpdate::Redraw
    }

    fn input(&mut self, c: char) -> ViewUpdate {
        match self.focus {
            Focus::Search => {
                self.search.push(c);
                ViewUpdate::Redraw
            }
            Focus::Field(field) => {
                let accepted = c.is_ascii_digit() || c == '.' || c == '-';
                match self.form.input_mut(field) {
                    Some(text) if accepted => {
                        text.push(c);
                        ViewUpdate::Redraw
                    }
                    _ => ViewUpdate::Unchanged,
                }
            }
            Focus::Map => ViewUpdate::Unchanged,
        }
    }

    fn backspace(&mut self) -> ViewUpdate {
        let popped = match self.focus {
            Focus::Search => self.search.pop(),
            Focus::Field(field) => self.form.input_mut(field).and_then(|t| t.pop()),
            Focus::Map => None,
        };
        if popped.is_some() {
            ViewUpdate::Redraw
        } else {
            ViewUpdate::Unchanged
        }
    }

    fn submit_search(&mut self) -> ViewUpdate {
        let query = self.search.trim().to_string();
        self.focus = Focus::Map;
        if query.chars().count() < self.min_search_length {
            return ViewUpdate::Notice(format!(
                "Please enter at least {} characters to search.",
                self.min_search_length
            ));
        }
        let found = self.dataset.as_ref().and_then(|d| d.find_by_label(&query));
        match found {
            Some(id) => {
                self.select(id);
                self.reveal(id);
                ViewUpdate::Reveal(id)
            }
            None => ViewUpdate::Notice(PROPERTY_NOT_FOUND.to_string()),
        }
    }

    /// Centre the map on a parcel without changing zoom
    fn reveal(&mut self, id: FeatureId) {
        let center = self
            .dataset
            .as_ref()
            .and_then(|d| d.get(id))
            .and_then(|p| p.bounds)
            .map(|b| b.center());
        if let Some((lon, lat)) = center {
            self.map.viewport.center_on(lon, lat);
        }
    }

    /// Screen position to a cell of the map area, if it lies inside it
    fn map_cell(&self, col: u16, row: u16) -> Option<(u16, u16)> {
        let area = self.map_area;
        let inside = col >= area.x
            && row >= area.y
            && col < area.x + area.width
            && row < area.y + area.height;
        inside.then(|| (col - area.x, row - area.y))
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.map.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.map.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.map.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((c, r)) = self.map_cell(col, row) {
            // Each terminal cell is 2 braille pixels wide, 4 tall
            self.map.viewport.zoom_in_at(c as i32 * 2, r as i32 * 4);
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((c, r)) = self.map_cell(col, row) {
            self.map.viewport.zoom_out_at(c as i32 * 2, r as i32 * 4);
        }
    }

    /// Back to the whole dataset
    pub fn fit_view(&mut self) {
        if let Some(layer) = &self.layer {
            layer.fit(&mut self.map, self.fit_padding);
        }
    }

    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan by the mouse movement since the last drag event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a press that never moved is a click
    pub fn mouse_up(&mut self, col: u16, row: u16) -> ViewUpdate {
        let pressed = self.last_mouse.take().is_some();
        if pressed && !self.dragged {
            self.click(col, row)
        } else {
            ViewUpdate::Unchanged
        }
    }

    /// Click on the map: toggles the parcel popup and selects the parcel.
    pub fn click(&mut self, col: u16, row: u16) -> ViewUpdate {
        let Some((c, r)) = self.map_cell(col, row) else {
            return ViewUpdate::Unchanged;
        };
        let Some(hit) = self.map.click(c, r) else {
            return ViewUpdate::Redraw;
        };
        let selected = self
            .layer
            .as_mut()
            .and_then(|layer| layer.handle(RegionEvent::Click(hit), &mut self.map));
        match selected {
            Some(id) => self.dispatch(Action::FeatureClicked(id)),
            None => ViewUpdate::Redraw,
        }
    }

    /// Pointer moved over the map: move the hover highlight.
    pub fn hover(&mut self, col: u16, row: u16) -> bool {
        let target = self
            .map_cell(col, row)
            .and_then(|(c, r)| self.map.region_at(c, r));
        let Some(layer) = self.layer.as_mut() else {
            return false;
        };
        let before = layer.hovered();
        layer.hover(target, &mut self.map);
        layer.hovered() != before
    }

    /// Fields reachable with Tab in the current panel view
    pub fn focusable(&self) -> Vec<Field> {
        match self.panel {
            PanelView::Placeholder => Vec::new(),
            PanelView::Form => Field::FORM_ORDER
                .into_iter()
                .filter(|&f| self.form.is_enabled(f))
                .collect(),
            PanelView::Results(_) => vec![Field::Reset],
        }
    }

    fn cycle_focus(&mut self, forward: bool) -> ViewUpdate {
        let fields = self.focusable();
        if fields.is_empty() {
            return ViewUpdate::Unchanged;
        }
        let current = match self.focus {
            Focus::Field(f) => fields.iter().position(|&x| x == f),
            _ => None,
        };
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => fields.len() - 1,
            (Some(i), true) => (i + 1) % fields.len(),
            (Some(i), false) => (i + fields.len() - 1) % fields.len(),
        };
        self.focus = Focus::Field(fields[next]);
        ViewUpdate::Redraw
    }

    /// Keep focus on something that still exists after a view change. A
    /// field disabled by its toggle keeps focus so the toggle can be flipped
    /// back with one Shift-Tab.
    fn normalize_focus(&mut self) {
        if let Focus::Field(field) = self.focus {
            let visible = match self.panel {
                PanelView::Placeholder => false,
                PanelView::Form => true,
                PanelView::Results(_) => field == Field::Reset,
            };
            if !visible {
                self.focus = match self.panel {
                    PanelView::Results(_) => Focus::Field(Field::Reset),
                    _ => Focus::Map,
                };
            }
        }
    }
}
