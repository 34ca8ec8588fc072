//! Scripted device, matcher and recognizer for unit tests
//!
//! A [`MockScene`] holds the set of target names currently "on screen".
//! The matcher finds a target when its name is visible, clicks are mapped
//! back to names through stable per-name rectangles, and clicking a name can
//! change what is visible, optionally a few captures later.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use crate::config::Settings;
use crate::device::{Device, DeviceError};
use crate::ocr::{TextBox, TextRecognizer};
use crate::stealth::StealthConfig;
use crate::timer::ManualClock;
use crate::vision::{ImageMatcher, Locator, MatchRequest, Point, Rect, Target};

/// Tiny template for a named image target
pub fn target(name: &str) -> Target {
    Target::image(name, RgbaImage::new(10, 10))
}

#[derive(Debug, Clone, Default)]
struct Change {
    show: Vec<String>,
    hide: Vec<String>,
}

#[derive(Default)]
struct SceneState {
    visible: HashSet<String>,
    rects: HashMap<String, Rect>,
    on_click: HashMap<String, (usize, Change)>,
    on_raise: Change,
    pending: Vec<(usize, Change)>,
    captures: usize,
    failing_captures: usize,
    probes: Vec<String>,
    clicks: Vec<Point>,
    clicked: Vec<String>,
    swipes: Vec<(Point, Point)>,
    color_similar: bool,
    color_checks: usize,
    foreground: bool,
    raise_restores: bool,
    raise_calls: usize,
    running: bool,
}

impl SceneState {
    fn apply(&mut self, change: &Change) {
        for name in &change.hide {
            self.visible.remove(name);
        }
        for name in &change.show {
            self.visible.insert(name.clone());
        }
    }

    fn rect_of(&mut self, name: &str) -> Rect {
        let next = self.rects.len() as i32;
        *self
            .rects
            .entry(name.to_string())
            .or_insert_with(|| Rect::from_xywh(10 + 40 * (next % 30), 10 + 40 * (next / 30), 30, 20))
    }
}

/// Shared scripted screen
#[derive(Clone)]
pub struct MockScene(Rc<RefCell<SceneState>>);

impl MockScene {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(SceneState {
            color_similar: true,
            foreground: true,
            running: true,
            ..Default::default()
        })))
    }

    /// Default settings with humanisation off
    pub fn settings() -> Settings {
        Settings {
            stealth: StealthConfig::disabled(),
            ..Default::default()
        }
    }

    /// Locator over this scene driven by a manual clock
    pub fn locator(&self) -> (Locator, Arc<ManualClock>) {
        self.locator_with(Self::settings())
    }

    pub fn locator_with(&self, settings: Settings) -> (Locator, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let locator = Locator::new(MockDevice(self.clone()), NameMatcher(self.clone()), settings)
            .with_clock(clock.clone());
        (locator, clock)
    }

    pub fn show(&self, name: &str) {
        self.0.borrow_mut().visible.insert(name.to_string());
    }

    /// Make `name` visible from the `n`th capture on
    pub fn show_after_captures(&self, name: &str, n: usize) {
        self.0.borrow_mut().pending.push((
            n,
            Change {
                show: vec![name.to_string()],
                hide: Vec::new(),
            },
        ));
    }

    /// Clicking `button` shows and hides names immediately
    pub fn on_click(&self, button: &str, show: &[&str], hide: &[&str]) {
        self.on_click_after(button, 0, show, hide);
    }

    /// Clicking `button` shows and hides names `delay` captures later
    pub fn on_click_after(&self, button: &str, delay: usize, show: &[&str], hide: &[&str]) {
        let change = Change {
            show: show.iter().map(|s| s.to_string()).collect(),
            hide: hide.iter().map(|s| s.to_string()).collect(),
        };
        self.0
            .borrow_mut()
            .on_click
            .insert(button.to_string(), (delay, change));
    }

    /// Next `n` captures fail
    pub fn fail_captures(&self, n: usize) {
        self.0.borrow_mut().failing_captures = n;
    }

    pub fn set_color_similar(&self, similar: bool) {
        self.0.borrow_mut().color_similar = similar;
    }

    /// Window focus, and whether raising it actually brings it to the front
    pub fn set_foreground(&self, foreground: bool, raise_restores: bool) {
        let mut state = self.0.borrow_mut();
        state.foreground = foreground;
        state.raise_restores = raise_restores;
    }

    /// `name` becomes visible once the window is raised
    pub fn show_when_raised(&self, name: &str) {
        self.0.borrow_mut().on_raise.show.push(name.to_string());
    }

    pub fn set_running(&self, running: bool) {
        self.0.borrow_mut().running = running;
    }

    pub fn rect_of(&self, name: &str) -> Rect {
        self.0.borrow_mut().rect_of(name)
    }

    pub fn captures(&self) -> usize {
        self.0.borrow().captures
    }

    /// Names handed to the image matcher, in order
    pub fn probes(&self) -> Vec<String> {
        self.0.borrow().probes.clone()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.0.borrow().clicks.clone()
    }

    /// Clicked names, in order. Clicks outside every known rectangle are
    /// left out.
    pub fn clicked(&self) -> Vec<String> {
        self.0.borrow().clicked.clone()
    }

    pub fn swipes(&self) -> Vec<(Point, Point)> {
        self.0.borrow().swipes.clone()
    }

    pub fn color_checks(&self) -> usize {
        self.0.borrow().color_checks
    }

    pub fn raise_calls(&self) -> usize {
        self.0.borrow().raise_calls
    }
}

impl Default for MockScene {
    fn default() -> Self {
        Self::new()
    }
}

/// Device half of a [`MockScene`]: 1280x720, one-pixel screenshots
pub struct MockDevice(MockScene);

impl Device for MockDevice {
    fn capture(&mut self) -> Result<RgbaImage, DeviceError> {
        let mut state = self.0 .0.borrow_mut();
        state.captures += 1;

        let now = state.captures;
        let (due, waiting): (Vec<_>, Vec<_>) =
            state.pending.drain(..).partition(|(at, _)| *at <= now);
        state.pending = waiting;
        for (_, change) in &due {
            state.apply(change);
        }

        if state.failing_captures > 0 {
            state.failing_captures -= 1;
            return Err(DeviceError::CaptureFailed("screen locked".into()));
        }
        Ok(RgbaImage::new(1, 1))
    }

    fn resolution(&self) -> (u32, u32) {
        (1280, 720)
    }

    fn click(&mut self, pos: Point) -> Result<(), DeviceError> {
        let mut state = self.0 .0.borrow_mut();
        state.clicks.push(pos);

        let hit = state
            .rects
            .iter()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(name, _)| name.clone());
        if let Some(name) = hit {
            if let Some((delay, change)) = state.on_click.get(&name).cloned() {
                if delay == 0 {
                    state.apply(&change);
                } else {
                    let due = state.captures + delay;
                    state.pending.push((due, change));
                }
            }
            state.clicked.push(name);
        }
        Ok(())
    }

    fn swipe(&mut self, from: Point, to: Point, _duration: Duration) -> Result<(), DeviceError> {
        self.0 .0.borrow_mut().swipes.push((from, to));
        Ok(())
    }

    fn is_foreground(&self) -> bool {
        self.0 .0.borrow().foreground
    }

    fn bring_to_foreground(&mut self) -> Result<(), DeviceError> {
        let mut state = self.0 .0.borrow_mut();
        state.raise_calls += 1;
        if state.raise_restores {
            state.foreground = true;
            let change = state.on_raise.clone();
            state.apply(&change);
        }
        Ok(())
    }

    fn app_is_running(&self) -> bool {
        self.0 .0.borrow().running
    }
}

/// Matcher half of a [`MockScene`]: a target is found when its name is
/// visible
pub struct NameMatcher(MockScene);

impl ImageMatcher for NameMatcher {
    fn find(&self, request: &MatchRequest<'_>) -> Option<Rect> {
        let mut state = self.0 .0.borrow_mut();
        state.probes.push(request.name.to_string());
        if state.visible.contains(request.name) {
            Some(state.rect_of(request.name))
        } else {
            None
        }
    }

    fn color_similar(&self, _template: &RgbaImage, _region: &RgbaImage) -> bool {
        let mut state = self.0 .0.borrow_mut();
        state.color_checks += 1;
        state.color_similar
    }
}

/// Recognizer returning a fixed set of boxes, filtered to the crop
pub struct CannedText {
    boxes: Vec<TextBox>,
    calls: Rc<Cell<usize>>,
}

impl CannedText {
    pub fn new(boxes: Vec<TextBox>) -> Self {
        Self {
            boxes,
            calls: Rc::new(Cell::new(0)),
        }
    }

    /// Shared counter of `detect` calls
    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }
}

impl TextRecognizer for CannedText {
    fn detect(&self, _image: &RgbaImage, crop: Option<Rect>) -> Vec<TextBox> {
        self.calls.set(self.calls.get() + 1);
        self.boxes
            .iter()
            .filter(|b| crop.map_or(true, |c| c.contains(b.area.center())))
            .cloned()
            .collect()
    }
}
