//! Application state for the garden map.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use garden_rs_config::{GardenConfig, MapBounds, MapConfig};
use garden_rs_core::{IconSize, MarkerView, Presenter, RecordDraft};
use garden_rs_protocol::{
    BODY_MAX_CHARS, GardenAction, GardenEvent, IconId, Position, RecordId, TITLE_MAX_CHARS,
};
use log::debug;
use ratatui::layout::Rect;
use std::time::Duration;

/// Longitude span shown at zoom 0; each zoom level halves it.
const LNG_SPAN_AT_ZOOM_0: f64 = 1440.0;
/// Share of the visible span moved by one pan step.
const PAN_FRACTION: f64 = 0.1;

/// Visible region of the world map.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub center: Position,
    pub zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    bounds: MapBounds,
}

impl Viewport {
    /// Initial view from config, clamped to its own limits.
    ///
    /// Bounds are put in order first; a config built in code skips validation.
    pub fn new(map: &MapConfig) -> Self {
        let MapBounds {
            south,
            north,
            west,
            east,
        } = map.bounds;
        let mut viewport = Self {
            center: Position::new(map.center.lat, map.center.lng),
            zoom: map.zoom,
            min_zoom: map.min_zoom.min(map.max_zoom),
            max_zoom: map.max_zoom.max(map.min_zoom),
            bounds: MapBounds {
                south: south.min(north),
                north: north.max(south),
                west: west.min(east),
                east: east.max(west),
            },
        };
        viewport.clamp();
        viewport
    }

    pub fn lng_span(&self) -> f64 {
        LNG_SPAN_AT_ZOOM_0 / 2f64.powi(i32::from(self.zoom))
    }

    /// Terminal cells are about twice as tall as wide.
    pub fn lat_span(&self) -> f64 {
        self.lng_span() / 2.0
    }

    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.lng_span() / 2.0;
        [self.center.lng - half, self.center.lng + half]
    }

    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.lat_span() / 2.0;
        [self.center.lat - half, self.center.lat + half]
    }

    /// Move the center by pan steps (east and north positive).
    pub fn pan(&mut self, east: f64, north: f64) {
        self.center.lng += east * self.lng_span() * PAN_FRACTION;
        self.center.lat += north * self.lat_span() * PAN_FRACTION;
        self.clamp();
    }

    pub fn zoom_in(&mut self) {
        self.zoom = self.zoom.saturating_add(1);
        self.clamp();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = self.zoom.saturating_sub(1);
        self.clamp();
    }

    fn clamp(&mut self) {
        self.zoom = self.zoom.clamp(self.min_zoom, self.max_zoom);
        self.center.lat = self.center.lat.clamp(self.bounds.south, self.bounds.north);
        self.center.lng = self.center.lng.clamp(self.bounds.west, self.bounds.east);
    }

    /// Map position under a terminal cell of `area`.
    pub fn position_at(&self, area: Rect, column: u16, row: u16) -> Option<Position> {
        if !contains(area, column, row) {
            return None;
        }
        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        let [west, _] = self.x_bounds();
        let [_, north] = self.y_bounds();
        Some(Position::new(
            north - fy * self.lat_span(),
            west + fx * self.lng_span(),
        ))
    }

    /// Terminal cell of `area` a position falls in, if it is in view.
    pub fn cell_of(&self, area: Rect, position: Position) -> Option<(u16, u16)> {
        let [west, _] = self.x_bounds();
        let [_, north] = self.y_bounds();
        let fx = (position.lng - west) / self.lng_span();
        let fy = (north - position.lat) / self.lat_span();
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return None;
        }
        let column = area.x + (fx * f64::from(area.width)) as u16;
        let row = area.y + (fy * f64::from(area.height)) as u16;
        contains(area, column, row).then_some((column, row))
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && row >= area.y
        && u32::from(column) < u32::from(area.x) + u32::from(area.width)
        && u32::from(row) < u32::from(area.y) + u32::from(area.height)
}

/// Focusable fields of the plant form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Body,
    Icon,
    Lat,
    Lng,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Body,
        FormField::Icon,
        FormField::Lat,
        FormField::Lng,
    ];

    fn index(self) -> usize {
        Self::ORDER
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }

    fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// What the form wants the event loop to do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Cancel,
}

/// Open "plant a memory" form.
#[derive(Debug, Clone)]
pub struct PlantForm {
    pub draft: RecordDraft,
    pub field: FormField,
    pub status: Option<String>,
    pub saving: bool,
    /// Identifies this form instance for delayed close requests.
    pub token: u64,
}

impl PlantForm {
    fn new(position: Position, token: u64) -> Self {
        Self {
            draft: RecordDraft::at(position),
            field: FormField::Title,
            status: None,
            saving: false,
            token,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter if !self.saving => return FormAction::Submit,
            KeyCode::Tab => self.field = self.field.next(),
            KeyCode::BackTab => self.field = self.field.prev(),
            KeyCode::Left | KeyCode::Up if self.field == FormField::Icon => {
                self.draft.icon = self.draft.icon.prev();
            }
            KeyCode::Right | KeyCode::Down if self.field == FormField::Icon => {
                self.draft.icon = self.draft.icon.next();
            }
            KeyCode::Char(ch) if self.field == FormField::Icon => {
                if let Some(icon) = ch
                    .to_digit(10)
                    .and_then(|digit| u8::try_from(digit).ok())
                    .and_then(IconId::from_number)
                {
                    self.draft.icon = icon;
                }
            }
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let limit = self.limit();
                if let Some(text) = self.text_mut()
                    && limit.is_none_or(|max| text.chars().count() < max)
                {
                    text.push(ch);
                }
            }
            _ => {}
        }
        FormAction::None
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Title => Some(&mut self.draft.title),
            FormField::Body => Some(&mut self.draft.body),
            FormField::Lat => Some(&mut self.draft.lat),
            FormField::Lng => Some(&mut self.draft.lng),
            FormField::Icon => None,
        }
    }

    fn limit(&self) -> Option<usize> {
        match self.field {
            FormField::Title => Some(TITLE_MAX_CHARS),
            FormField::Body => Some(BODY_MAX_CHARS),
            _ => None,
        }
    }
}

/// Top-level application state.
pub struct App {
    pub viewport: Viewport,
    /// Marker views at the last refresh, in listing order.
    pub markers: Vec<MarkerView>,
    pub selected: Option<RecordId>,
    pub popup_open: bool,
    pub form: Option<PlantForm>,
    pub status: String,
    /// Inner area of the map canvas at the last draw.
    pub map_area: Rect,
    pub close_form_after: Duration,
    presenter: Presenter,
    form_seq: u64,
}

impl App {
    pub fn new(config: &GardenConfig, presenter: Presenter) -> Self {
        Self {
            viewport: Viewport::new(&config.map),
            markers: Vec::new(),
            selected: None,
            popup_open: false,
            form: None,
            status: "idle".to_string(),
            map_area: Rect::default(),
            close_form_after: Duration::from_millis(config.ui.close_form_after_ms),
            presenter,
            form_seq: 0,
        }
    }

    pub fn push_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Replace the marker views, keeping the selection when it survives.
    pub fn set_markers(&mut self, markers: Vec<MarkerView>) {
        self.markers = markers;
        if let Some(selected) = &self.selected
            && !self.markers.iter().any(|marker| &marker.id == selected)
        {
            self.selected = None;
            self.popup_open = false;
        }
    }

    /// Markers that are still drawn; fully faded ones are hidden.
    pub fn visible_markers(&self) -> impl Iterator<Item = &MarkerView> {
        self.markers.iter().filter(|marker| marker.is_visible())
    }

    pub fn selected_marker(&self) -> Option<&MarkerView> {
        let selected = self.selected.as_ref()?;
        self.markers.iter().find(|marker| &marker.id == selected)
    }

    /// Select the next marker and open its popup.
    ///
    /// Faded markers are not drawn on the map but stay selectable from the
    /// list so they can still be watered.
    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, step: isize) {
        let ids: Vec<RecordId> = self.markers.iter().map(|marker| marker.id.clone()).collect();
        if ids.is_empty() {
            self.selected = None;
            self.popup_open = false;
            return;
        }
        let len = ids.len() as isize;
        let next = match self
            .selected
            .as_ref()
            .and_then(|selected| ids.iter().position(|id| id == selected))
        {
            Some(current) => (current as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        self.select(ids[next as usize].clone());
    }

    pub fn select(&mut self, id: RecordId) {
        debug!("marker selected (id={id})");
        self.selected = Some(id);
        self.popup_open = true;
    }

    /// Visible marker drawn at or next to a cell of the map.
    pub fn marker_at_cell(&self, column: u16, row: u16) -> Option<RecordId> {
        self.visible_markers()
            .filter_map(|marker| {
                let (x, y) = self.viewport.cell_of(self.map_area, marker.position)?;
                let distance = x.abs_diff(column) + y.abs_diff(row);
                (distance <= 1).then_some((distance, marker))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, marker)| marker.id.clone())
    }

    /// Open the plant form at a map position.
    pub fn open_form_at(&mut self, position: Position) {
        self.form_seq += 1;
        self.popup_open = false;
        self.form = Some(PlantForm::new(position, self.form_seq));
    }

    /// Close the form if it is still the instance `token` refers to.
    pub fn close_form(&mut self, token: u64) {
        if self.form.as_ref().is_some_and(|form| form.token == token) {
            self.form = None;
        }
    }

    /// Path of the picker preview for the form's current icon.
    pub fn form_icon_asset(&self) -> Option<String> {
        let form = self.form.as_ref()?;
        Some(self.presenter.icon_asset(form.draft.icon, IconSize::Large))
    }

    /// Fold a garden event into UI state.
    ///
    /// Returns the token of a form that should close after the save delay.
    pub fn apply_garden_event(&mut self, event: &GardenEvent) -> Option<u64> {
        match event {
            GardenEvent::Loaded { count, skipped } => {
                let status = if *skipped > 0 {
                    format!("Loaded {count} memories ({skipped} unreadable)")
                } else {
                    format!("Loaded {count} memories")
                };
                self.push_status(status);
                None
            }
            GardenEvent::Planted { record } => {
                self.selected = Some(record.id.clone());
                match self.form.as_mut().filter(|form| form.saving) {
                    Some(form) => {
                        form.saving = false;
                        form.status = Some("Saved!".to_string());
                        Some(form.token)
                    }
                    None => {
                        self.push_status("Memory planted");
                        None
                    }
                }
            }
            GardenEvent::Watered { .. } => {
                self.push_status("Watered.");
                None
            }
            GardenEvent::Failed { action, message } => {
                match self.form.as_mut().filter(|form| form.saving) {
                    Some(form) if *action == GardenAction::Plant => {
                        form.saving = false;
                        form.status = Some(message.clone());
                    }
                    _ => self.push_status(message.clone()),
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_rs_core::{DecayModel, Popup};
    use garden_rs_protocol::MemoryRecord;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(
            &GardenConfig::default(),
            Presenter::new(DecayModel::default(), ""),
        )
    }

    fn marker(id: &str, lat: f64, lng: f64, opacity: f64) -> MarkerView {
        MarkerView {
            id: RecordId::new(id),
            position: Position::new(lat, lng),
            icon: IconId::One,
            asset: "1.small.png".to_string(),
            opacity,
            popup: Popup {
                title: id.to_string(),
                created: String::new(),
                body: String::new(),
            },
        }
    }

    #[test]
    fn default_view_shows_whole_world() {
        let viewport = Viewport::new(&MapConfig::default());
        assert_eq!(viewport.center, Position::new(20.0, 0.0));
        assert_eq!(viewport.zoom, 2);
        assert_eq!(viewport.lng_span(), 360.0);
        assert_eq!(viewport.lat_span(), 180.0);
    }

    #[test]
    fn zoom_is_clamped_to_limits() {
        let mut viewport = Viewport::new(&MapConfig::default());
        viewport.zoom_out();
        assert_eq!(viewport.zoom, 2);
        for _ in 0..40 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom, 19);
    }

    #[test]
    fn pan_is_clamped_to_bounds() {
        let mut viewport = Viewport::new(&MapConfig::default());
        for _ in 0..100 {
            viewport.pan(1.0, 1.0);
        }
        assert_eq!(viewport.center, Position::new(90.0, 200.0));
        for _ in 0..100 {
            viewport.pan(-1.0, -1.0);
        }
        assert_eq!(viewport.center, Position::new(-90.0, -200.0));
    }

    #[test]
    fn reversed_bounds_are_reordered() {
        let map = MapConfig {
            zoom: 30,
            min_zoom: 10,
            max_zoom: 4,
            bounds: MapBounds {
                south: 45.0,
                north: 40.0,
                west: 10.0,
                east: -10.0,
            },
            ..MapConfig::default()
        };
        let mut viewport = Viewport::new(&map);
        assert_eq!(viewport.center, Position::new(40.0, 0.0));
        assert_eq!(viewport.zoom, 10);
        for _ in 0..200 {
            viewport.pan(1.0, 1.0);
        }
        assert_eq!(viewport.center, Position::new(45.0, 10.0));
    }

    #[test]
    fn cells_and_positions_agree() {
        let viewport = Viewport::new(&MapConfig::default());
        let area = Rect::new(2, 1, 80, 40);
        let position = viewport.position_at(area, 42, 21).expect("inside");
        assert_eq!(viewport.cell_of(area, position), Some((42, 21)));
        assert!(viewport.position_at(area, 1, 1).is_none());
        assert!(viewport.position_at(area, 82, 10).is_none());
        assert!(viewport.cell_of(area, Position::new(20.0, 250.0)).is_none());
    }

    #[test]
    fn form_prefills_and_edits_fields() {
        let mut app = app();
        app.open_form_at(Position::new(12.5, -7.25));
        let form = app.form.as_mut().expect("form");
        assert_eq!(form.draft.lat, "12.500000");
        assert_eq!(form.draft.lng, "-7.250000");
        assert_eq!(form.draft.icon, IconId::One);

        for ch in "Hi".chars() {
            form.handle_key(key(KeyCode::Char(ch)));
        }
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Char('b')));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Right));
        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.draft.title, "Hi");
        assert_eq!(form.draft.body, "b");
        assert_eq!(form.draft.icon, IconId::Three);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormAction::Submit);
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormAction::Cancel);
        assert_eq!(app.form_icon_asset().as_deref(), Some("3.large.png"));
    }

    #[test]
    fn title_input_stops_at_limit() {
        let mut app = app();
        app.open_form_at(Position::new(0.0, 0.0));
        let form = app.form.as_mut().expect("form");
        for _ in 0..TITLE_MAX_CHARS + 20 {
            form.handle_key(key(KeyCode::Char('t')));
        }
        assert_eq!(form.draft.title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn saved_form_requests_close_for_its_token() {
        let mut app = app();
        app.open_form_at(Position::new(1.0, 2.0));
        app.form.as_mut().expect("form").saving = true;
        let record = MemoryRecord {
            id: RecordId::new("2025-03-01T10:00:00.000Z"),
            position: Position::new(1.0, 2.0),
            title: String::new(),
            body: String::new(),
            icon: IconId::One,
            created_at: None,
            last_watered: None,
        };
        let token = app
            .apply_garden_event(&GardenEvent::Planted { record })
            .expect("close token");
        assert_eq!(
            app.form.as_ref().and_then(|form| form.status.as_deref()),
            Some("Saved!")
        );

        app.open_form_at(Position::new(3.0, 4.0));
        app.close_form(token);
        assert!(app.form.is_some());
        let current = app.form.as_ref().expect("form").token;
        app.close_form(current);
        assert!(app.form.is_none());
    }

    #[test]
    fn failed_save_shows_message_in_form() {
        let mut app = app();
        app.open_form_at(Position::new(1.0, 2.0));
        app.form.as_mut().expect("form").saving = true;
        app.apply_garden_event(&GardenEvent::Failed {
            action: GardenAction::Plant,
            message: "Save failed: x".to_string(),
        });
        let form = app.form.as_ref().expect("form");
        assert_eq!(form.status.as_deref(), Some("Save failed: x"));
        assert!(!form.saving);
    }

    #[test]
    fn selection_reaches_faded_markers() {
        let mut app = app();
        app.set_markers(vec![
            marker("a", 0.0, 0.0, 0.9),
            marker("b", 10.0, 10.0, -0.2),
            marker("c", 20.0, 20.0, 0.1),
        ]);
        assert_eq!(app.visible_markers().count(), 2);
        app.select_next();
        assert_eq!(app.selected, Some(RecordId::new("a")));
        app.select_next();
        assert_eq!(app.selected, Some(RecordId::new("b")));
        assert_eq!(
            app.selected_marker().map(|marker| marker.id.clone()),
            Some(RecordId::new("b"))
        );
        app.select_next();
        app.select_next();
        assert_eq!(app.selected, Some(RecordId::new("a")));
        app.select_prev();
        assert_eq!(app.selected, Some(RecordId::new("c")));
        assert!(app.popup_open);

        app.set_markers(vec![marker("a", 0.0, 0.0, 0.9)]);
        assert_eq!(app.selected, None);
        assert!(!app.popup_open);
    }

    #[test]
    fn click_hits_nearby_marker() {
        let mut app = app();
        app.map_area = Rect::new(0, 0, 80, 40);
        app.set_markers(vec![marker("a", 20.0, 0.0, 1.0)]);
        let (column, row) = app
            .viewport
            .cell_of(app.map_area, Position::new(20.0, 0.0))
            .expect("in view");
        assert_eq!(app.marker_at_cell(column + 1, row), Some(RecordId::new("a")));
        assert_eq!(app.marker_at_cell(column + 5, row), None);
    }
}
