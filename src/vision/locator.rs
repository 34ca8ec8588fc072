//! Polling target locator
//!
//! Repeatedly captures the screen and asks the matching collaborators for a
//! [`Target`] until it is found or the timeout expires. A covered window gets
//! one chance to be raised before the search is declared failed.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;

use super::capture::crop;
use super::{ImageMatcher, LocateError, MatchRequest, Point, ScreenGeometry, SearchScope, Target, TargetKind};
use crate::config::settings::{LocatorSettings, Settings};
use crate::device::Device;
use crate::ocr::{Ocr, TextRecognizer};
use crate::stealth::{Humanizer, StealthConfig};
use crate::timer::{Clock, SystemClock};

/// One end of a swipe
#[derive(Debug, Clone, Copy)]
pub enum SwipePoint<'a> {
    /// Locate the target first
    Target(&'a Target),
    /// Use the target's recorded area without looking
    Blind(&'a Target),
    /// Absolute screen position
    Point(Point),
}

/// Screen search engine
pub struct Locator {
    device: Box<dyn Device>,
    matcher: Box<dyn ImageMatcher>,
    ocr: Option<Ocr>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    humanizer: Humanizer,
}

impl Locator {
    /// Create a locator for image targets. Text targets additionally need
    /// [`Locator::with_recognizer`].
    pub fn new(
        device: impl Device + 'static,
        matcher: impl ImageMatcher + 'static,
        settings: Settings,
    ) -> Self {
        Self {
            device: Box::new(device),
            matcher: Box::new(matcher),
            ocr: None,
            clock: Arc::new(SystemClock),
            settings,
            humanizer: Humanizer::new(),
        }
    }

    /// Attach an OCR backend
    pub fn with_recognizer(mut self, recognizer: impl TextRecognizer + 'static) -> Self {
        self.ocr = Some(Ocr::new(recognizer, self.settings.ocr.clone()));
        self
    }

    /// Replace the clock used for every wait
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn locator_settings(&self) -> &LocatorSettings {
        &self.settings.locator
    }

    fn stealth(&self) -> &StealthConfig {
        &self.settings.stealth
    }

    pub fn ocr(&self) -> Option<&Ocr> {
        self.ocr.as_ref()
    }

    /// Layout of the current screen
    pub fn geometry(&self) -> ScreenGeometry {
        let (width, height) = self.device.resolution();
        ScreenGeometry::new(width, height, self.locator_settings().border)
    }

    /// Whether the target application is alive
    pub fn app_is_running(&self) -> bool {
        self.device.app_is_running()
    }

    /// Take a screenshot
    pub fn screenshot(&mut self) -> Result<RgbaImage, LocateError> {
        Ok(self.device.capture()?)
    }

    /// Search `screen` once
    fn probe(&self, target: &Target, screen: &RgbaImage) -> Result<Option<Point>, LocateError> {
        let geometry = self.geometry();
        let area = geometry.area(target);

        if target.is_color_sensitive()
            && !self.matcher.color_similar(target.template(), &crop(screen, area))
        {
            return Ok(None);
        }

        let region = match target.scope() {
            SearchScope::Area => Some(area),
            SearchScope::FullScreen => None,
        };

        match target.kind() {
            TargetKind::Text { keyword, mode } => {
                let ocr = self.ocr.as_ref().ok_or_else(|| {
                    LocateError::Configuration(format!(
                        "text target <{}> needs a text recognizer",
                        target.name()
                    ))
                })?;
                Ok(ocr
                    .match_keyword(screen, region, keyword, *mode)
                    .first()
                    .map(|m| m.area.center()))
            }
            TargetKind::Image => {
                let request = MatchRequest {
                    name: target.name(),
                    template: target.template(),
                    screen,
                    region,
                    scale: geometry.ratio(target),
                    threshold: target.threshold().unwrap_or(self.locator_settings().threshold),
                };
                Ok(self.matcher.find(&request).map(|r| r.center()))
            }
        }
    }

    /// Search for `target` until found or `timeout` has elapsed, sleeping
    /// `interval` between probes and calling `on_failure` after every miss.
    ///
    /// A zero timeout probes exactly once. When the timeout expires while
    /// the window is covered, the window is raised and the timeout restarts
    /// one time.
    pub fn locate(
        &mut self,
        target: &Target,
        timeout: Duration,
        interval: Duration,
        mut on_failure: Option<&mut dyn FnMut()>,
    ) -> Result<Point, LocateError> {
        let mut start = self.clock.now();
        let mut recovered = false;

        loop {
            match self.device.capture() {
                Err(e) => log::warn!("Screen is unavailable, may be locked: {}", e),
                Ok(screen) => {
                    if let Some(pos) = self.probe(target, &screen)? {
                        log::debug!(
                            "Found <{}> in {:.2}s: {}",
                            target.name(),
                            self.clock.now().saturating_duration_since(start).as_secs_f32(),
                            pos
                        );
                        return Ok(pos);
                    }
                }
            }

            if let Some(callback) = on_failure.as_deref_mut() {
                callback();
            }

            if self.clock.now().saturating_duration_since(start) >= timeout {
                if self.locator_settings().keep_foreground
                    && !recovered
                    && !self.device.is_foreground()
                {
                    self.clock.sleep(self.locator_settings().foreground_buffer());
                    log::info!("Window covered by another window, bringing to foreground...");
                    self.device.bring_to_foreground()?;
                    recovered = true;
                    start = self.clock.now();
                    continue;
                }

                log::debug!("<{}> matching failed in {:?}", target.name(), timeout);
                return Err(LocateError::TargetNotFound {
                    target: target.name().to_string(),
                    timeout,
                });
            }

            self.clock.sleep(interval);
        }
    }

    /// Position of `target` if it shows up within `timeout`
    pub fn exists(&mut self, target: &Target, timeout: Duration) -> Result<Option<Point>, LocateError> {
        let interval = self.locator_settings().poll_interval();
        match self.locate(target, timeout, interval, None) {
            Ok(pos) => Ok(Some(pos)),
            Err(LocateError::TargetNotFound { .. }) => {
                log::info!("<{}> matching failed in {:.1}s", target.name(), timeout.as_secs_f32());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for `target`, defaulting to the configured find timeout
    pub fn wait(&mut self, target: &Target, timeout: Option<Duration>) -> Result<Point, LocateError> {
        let timeout = timeout.unwrap_or_else(|| self.locator_settings().find_timeout());
        let interval = self.locator_settings().poll_interval();
        self.locate(target, timeout, interval, None)
    }

    /// Wait for `target`, calling `on_failure` after every miss
    pub fn wait_with(
        &mut self,
        target: &Target,
        timeout: Duration,
        interval: Duration,
        on_failure: &mut dyn FnMut(),
    ) -> Result<Point, LocateError> {
        self.locate(target, timeout, interval, Some(on_failure))
    }

    fn press(&mut self, pos: Point, times: u32) -> Result<(), LocateError> {
        for _ in 0..times {
            self.device.click(pos)?;
            let interval = self.locator_settings().touch_interval();
            let interval = self.humanizer.humanize_delay(interval, &self.settings.stealth);
            self.clock.sleep(interval);
        }
        Ok(())
    }

    fn humanized(&mut self, target: &Target, center: Point) -> Point {
        let (w, h) = self.geometry().scaled_size(target);
        let stealth = self.stealth().clone();
        self.humanizer.rectangle_point(center, w, h, &stealth)
    }

    fn log_click(pos: Point, times: u32, name: &str) {
        if times > 1 {
            log::info!("Click{} {} times @{}", pos, times, name);
        } else {
            log::info!("Click{} @{}", pos, name);
        }
    }

    /// Locate `target` and click a point inside it `times` times
    pub fn touch(&mut self, target: &Target, times: u32) -> Result<Point, LocateError> {
        let center = self.wait(target, None)?;
        let pos = self.humanized(target, center);
        self.press(pos, times)?;
        Self::log_click(pos, times, target.name());
        Ok(pos)
    }

    /// Click inside the target's recorded area without looking for it
    pub fn touch_blind(&mut self, target: &Target, times: u32) -> Result<Point, LocateError> {
        let center = self.geometry().area(target).center();
        let pos = self.humanized(target, center);
        self.press(pos, times)?;
        Self::log_click(pos, times, target.name());
        Ok(pos)
    }

    /// Click an absolute position
    pub fn touch_point(&mut self, pos: Point, times: u32) -> Result<Point, LocateError> {
        self.press(pos, times)?;
        if times > 1 {
            log::info!("Click{} {} times", pos, times);
        } else {
            log::info!("Click{}", pos);
        }
        Ok(pos)
    }

    /// Wait up to `timeout` for `rec` and click it, or `touch` instead when
    /// given. Returns whether `rec` appeared.
    pub fn find_click(
        &mut self,
        rec: &Target,
        touch: Option<&Target>,
        timeout: Duration,
    ) -> Result<bool, LocateError> {
        let center = match self.wait(rec, Some(timeout)) {
            Ok(pos) => pos,
            Err(LocateError::TargetNotFound { .. }) => {
                log::info!("<{}> matching failed in {:.1}s", rec.name(), timeout.as_secs_f32());
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        match touch {
            Some(other) => {
                self.touch(other, 1)?;
            }
            None => {
                let pos = self.humanized(rec, center);
                self.press(pos, 1)?;
                Self::log_click(pos, 1, rec.name());
            }
        }
        Ok(true)
    }

    fn resolve(&mut self, point: SwipePoint<'_>, timeout: Duration) -> Result<Point, LocateError> {
        match point {
            SwipePoint::Target(target) => {
                let interval = self.locator_settings().poll_interval();
                self.locate(target, timeout, interval, None)
            }
            SwipePoint::Blind(target) => Ok(self.geometry().area(target).center()),
            SwipePoint::Point(pos) => Ok(pos),
        }
    }

    /// Swipe from `from` to `to`, or from `from` along `vector`.
    ///
    /// Vector components within `[-1, 1]` are fractions of the screen size.
    pub fn swipe(
        &mut self,
        from: SwipePoint<'_>,
        to: Option<SwipePoint<'_>>,
        vector: Option<(f32, f32)>,
        duration: Duration,
    ) -> Result<(Point, Point), LocateError> {
        if to.is_none() && vector.is_none() {
            return Err(LocateError::Configuration(
                "swipe needs either an end point or a vector".into(),
            ));
        }

        let from = self.resolve(from, self.locator_settings().find_timeout())?;
        let to = match to {
            Some(to) => self.resolve(to, self.locator_settings().find_timeout_tmp())?,
            None => {
                let delta = self.geometry().scale_vector(vector.unwrap_or_default());
                from.offset(delta.x, delta.y)
            }
        };

        self.device.swipe(from, to, duration)?;
        log::info!("Swipe {} -> {}", from, to);
        Ok((from, to))
    }

    /// Read the text inside a target's area as one line
    pub fn read_text(&mut self, target: &Target) -> Result<String, LocateError> {
        let area = self.geometry().area(target);
        let screen = self.screenshot()?;
        let ocr = self.ocr.as_ref().ok_or_else(|| {
            LocateError::Configuration(format!("reading <{}> needs a text recognizer", target.name()))
        })?;
        Ok(ocr.single_line(&screen, area))
    }
}
