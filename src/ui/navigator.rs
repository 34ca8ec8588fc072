//! Page navigator
//!
//! Owns the [`Locator`], the [`PageGraph`] and the popup handlers. Every
//! decision is made from a fresh probe of the screen: the last known page
//! only decides which page is probed first.

use std::time::Duration;

use super::page::{PageGraph, PageId, Route};
use super::popup::Popups;
use super::state::{NavPhase, NavState};
use super::UiError;
use crate::config::settings::NavigationSettings;
use crate::timer::Timer;
use crate::vision::{Locator, Target};

/// Passes without a click or a popup before a navigation counts as stuck
const STUCK_PASSES: u32 = 10;

pub struct Navigator {
    locator: Locator,
    graph: PageGraph,
    popups: Popups,
    settings: NavigationSettings,
    current: Option<PageId>,
    state: NavState,
}

impl Navigator {
    /// Create a navigator using the locator's navigation settings
    pub fn new(locator: Locator, graph: PageGraph) -> Self {
        let settings = locator.settings().navigation.clone();
        Self {
            locator,
            graph,
            popups: Popups::new(),
            settings,
            current: None,
            state: NavState::new(),
        }
    }

    pub fn locator(&mut self) -> &mut Locator {
        &mut self.locator
    }

    pub fn graph(&self) -> &PageGraph {
        &self.graph
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Snapshot of the navigation state
    pub fn state(&self) -> &NavState {
        &self.state
    }

    /// Page last seen on screen, may be stale
    pub fn current(&self) -> Option<PageId> {
        self.current
    }

    /// Add a popup handler. Handlers run in registration order whenever the
    /// screen matches no expected page.
    pub fn register_popup_handler(&mut self, handler: impl FnMut(&mut Locator) -> bool + 'static) {
        self.popups.register(handler);
    }

    /// Path finding result toward `destination`
    pub fn route(&self, destination: PageId) -> Result<Route, UiError> {
        self.graph.route_to(destination)
    }

    /// Identify the page on screen.
    ///
    /// Every page with a check target is probed once per pass. The search
    /// gives up after the configured timeout and confirm count, both
    /// restarted whenever a popup handler fires.
    pub fn current_page(&mut self) -> Result<PageId, UiError> {
        let clock = self.locator.clock();
        let budget = Timer::new(clock.clone(), self.settings.goto_budget()).start();
        let mut timeout = Timer::new(clock.clone(), self.settings.current_page_timeout())
            .with_count(self.settings.current_page_confirm_count)
            .start();
        let mut app_checked = false;
        self.state.update_phase(NavPhase::Identifying);

        loop {
            if timeout.reached() {
                break;
            }
            if budget.current() >= budget.limit() {
                return Err(UiError::Timeout {
                    operation: "identifying the current page".into(),
                    budget: budget.limit(),
                });
            }

            // Known pages
            for (id, page) in self.graph.iter_from(self.current) {
                let Some(check) = page.check() else {
                    continue;
                };
                if self.locator.exists(check, Duration::ZERO)?.is_some() {
                    self.current = Some(id);
                    self.state.set_current_page(page.name());
                    return Ok(id);
                }
            }

            // Unknown page but able to handle
            if self.popups.drain(&mut self.locator) {
                timeout.reset();
                continue;
            }

            if !app_checked {
                app_checked = true;
                if !self.locator.app_is_running() {
                    log::error!("Game is not running");
                    return Err(UiError::NotRunning);
                }
            }

            clock.sleep(self.locator.settings().locator.poll_interval());
        }

        log::warn!("Unknown ui page, please switch to a known page manually");
        Err(UiError::PageUnknown)
    }

    /// Walk to `destination`, then set its switch to `switch_state` if given.
    ///
    /// A requested state is validated before anything is clicked: the
    /// destination must own a switch that knows it.
    pub fn goto(&mut self, destination: PageId, switch_state: Option<&str>) -> Result<(), UiError> {
        let page = self.graph.page(destination)?;
        if let Some(state) = switch_state {
            let switch = page.switch().ok_or_else(|| {
                UiError::Configuration(format!("Page {} has no switch", page.name()))
            })?;
            switch.state_data(state)?;
            log::debug!(">>> UI GOTO {}:{}", page.name().to_uppercase(), state.to_uppercase());
        } else {
            log::debug!(">>> UI GOTO {}", page.name().to_uppercase());
        }
        if page.check().is_none() {
            return Err(UiError::Configuration(format!(
                "Page {} cannot be recognised, it has no check target",
                page.name()
            )));
        }
        let name = page.name().to_string();

        let route = self.graph.route_to(destination)?;
        self.state.update_phase(NavPhase::Identifying);
        self.state.destination = Some(name.clone());

        let clock = self.locator.clock();
        let budget = Timer::new(clock, self.settings.goto_budget()).start();
        let mut stuck_warned = false;

        loop {
            if budget.current() >= budget.limit() {
                return Err(UiError::Timeout {
                    operation: format!("goto {}", name),
                    budget: budget.limit(),
                });
            }

            // Destination page
            let page = self.graph.page(destination)?;
            if let Some(check) = page.check() {
                if self
                    .locator
                    .exists(check, self.settings.page_probe_timeout())?
                    .is_some()
                {
                    self.current = Some(destination);
                    log::debug!("Page arrive: {}", name);
                    if let (Some(state), Some(switch)) = (switch_state, page.switch()) {
                        switch.set_state(&mut self.locator, state, &mut self.popups, &self.settings)?;
                    }
                    self.state.update_phase(NavPhase::Arrived);
                    return Ok(());
                }
            }

            // Other pages
            let mut clicked = None;
            for (id, page) in self.graph.iter_from(self.current) {
                let Some(next) = route.next_hop(id) else {
                    continue;
                };
                let (Some(check), Some(button)) = (page.check(), page.button_to(next)) else {
                    continue;
                };
                if self.locator.exists(check, Duration::ZERO)?.is_some() {
                    self.current = Some(id);
                    self.locator.touch(button, 1)?;
                    log::info!("Page switch: {} -> {}", page.name(), self.graph.name(next));
                    clicked = Some(page.name().to_string());
                    break;
                }
            }
            if let Some(from) = clicked {
                self.state.update_phase(NavPhase::Traversing);
                self.state.record_switch(&from);
                stuck_warned = false;
                continue;
            }

            // Additional
            if self.popups.drain(&mut self.locator) {
                continue;
            }
            self.state.update_phase(self.state.phase);
            if !stuck_warned && self.state.is_stuck(STUCK_PASSES) {
                log::warn!(
                    "No known page on the way to {} after {} passes",
                    name,
                    self.state.polls_in_phase
                );
                stuck_warned = true;
            }
        }
    }

    /// Go to `destination` unless already there. Returns whether the UI
    /// changed.
    pub fn ensure(&mut self, destination: PageId, switch_state: Option<&str>) -> Result<bool, UiError> {
        let current = self.current_page()?;
        if current != destination {
            self.goto(destination, switch_state)?;
            return Ok(true);
        }

        let page = self.graph.page(destination)?;
        let name = page.name().to_string();
        self.state.destination = Some(name.clone());
        let Some(state) = switch_state else {
            log::debug!("Already at {}", name);
            self.state.update_phase(NavPhase::Arrived);
            return Ok(false);
        };

        let switch = page
            .switch()
            .ok_or_else(|| UiError::Configuration(format!("Page {} has no switch", name)))?;
        switch.state_data(state)?;
        if switch.get_state(&mut self.locator)?.as_deref() == Some(state) {
            log::debug!("Arrived at {}:{}", name, state);
            self.state.update_phase(NavPhase::Arrived);
            return Ok(false);
        }
        let changed = switch.set_state(&mut self.locator, state, &mut self.popups, &self.settings)?;
        self.state.update_phase(NavPhase::Arrived);
        Ok(changed)
    }

    /// Whether the current page is `page` and its switch is visible
    pub fn switch_appear(&mut self, page: PageId) -> Result<bool, UiError> {
        if self.current_page()? != page {
            return Ok(false);
        }
        match self.graph.page(page)?.switch() {
            Some(switch) => switch.appear(&mut self.locator),
            None => Ok(false),
        }
    }

    /// State of `page`'s switch, `None` when unknown or when `page` is not
    /// the last page seen
    pub fn current_state(&mut self, page: PageId) -> Result<Option<String>, UiError> {
        let target = self.graph.page(page)?;
        let Some(switch) = target.switch() else {
            log::warn!("{} does not have a switch", target.name());
            return Ok(None);
        };
        if self.current != Some(page) {
            log::warn!(
                "{} does not have {}",
                self.current.map_or("Unknown page", |id| self.graph.name(id)),
                switch
            );
            return Ok(None);
        }
        switch.get_state(&mut self.locator)
    }

    /// Set the switch of `page`, which must be on screen
    pub fn set_state(&mut self, page: PageId, state: &str) -> Result<bool, UiError> {
        let target = self.graph.page(page)?;
        let switch = target
            .switch()
            .ok_or_else(|| UiError::Configuration(format!("Page {} has no switch", target.name())))?;
        switch.set_state(&mut self.locator, state, &mut self.popups, &self.settings)
    }

    /// For pages that share one layout and differ by an index, click
    /// `next`/`prev` until `reader` reports `index`.
    ///
    /// With `fast` the whole difference is clicked at once, `interval`
    /// apart. Otherwise one click per retry, for indices that skip values.
    pub fn ensure_index<F>(
        &mut self,
        index: i32,
        mut reader: F,
        next: &Target,
        prev: &Target,
        fast: bool,
        interval: Duration,
    ) -> Result<(), UiError>
    where
        F: FnMut(&mut Locator) -> Result<i32, UiError>,
    {
        let clock = self.locator.clock();
        let budget = Timer::new(clock.clone(), self.settings.index_budget()).start();
        let mut retry = Timer::new(clock.clone(), self.settings.index_retry_interval())
            .with_count(self.settings.index_retry_count);
        let poll = self.locator.settings().locator.poll_interval();

        loop {
            if budget.current() >= budget.limit() {
                return Err(UiError::Timeout {
                    operation: format!("ensuring index {}", index),
                    budget: budget.limit(),
                });
            }

            let current = reader(&mut self.locator)?;
            log::info!(
                "{}: Index {}",
                self.current.map_or("Unknown page", |id| self.graph.name(id)),
                current
            );

            let diff = index - current;
            if diff == 0 {
                return Ok(());
            }
            if current == 0 {
                log::warn!("ensure_index got an empty current value: {}", current);
                clock.sleep(poll);
                continue;
            }

            if retry.reached() {
                let button = if diff > 0 { next } else { prev };
                let times = if fast { diff.unsigned_abs() } else { 1 };
                for i in 0..times {
                    if i > 0 {
                        clock.sleep(interval);
                    }
                    self.locator.touch(button, 1)?;
                }
                retry.reset();
            }
            clock.sleep(poll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{target, MockScene};
    use crate::ui::Switch;

    /// Pages a <-> b <-> c, each showing its check target and its buttons
    struct World {
        scene: MockScene,
        ids: [PageId; 3],
    }

    fn items(page: &str) -> Vec<&'static str> {
        match page {
            "a" => vec!["a_check", "a_to_b"],
            "b" => vec!["b_check", "b_to_a", "b_to_c"],
            "c" => vec!["c_check", "c_to_b"],
            _ => Vec::new(),
        }
    }

    fn all_items() -> Vec<&'static str> {
        ["a", "b", "c"].iter().flat_map(|p| items(p)).collect()
    }

    impl World {
        fn new(start: &str) -> Self {
            let scene = MockScene::new();
            for item in items(start) {
                scene.show(item);
            }
            for (button, to) in [
                ("a_to_b", "b"),
                ("b_to_a", "a"),
                ("b_to_c", "c"),
                ("c_to_b", "b"),
            ] {
                scene.on_click(button, &items(to), &all_items());
            }
            Self {
                scene,
                ids: [PageId(0), PageId(1), PageId(2)],
            }
        }

        fn graph(&self, switch: Option<Switch>) -> PageGraph {
            let mut graph = PageGraph::new();
            let a = graph.add_page("a", Some(target("a_check"))).unwrap();
            let b = graph.add_page("b", Some(target("b_check"))).unwrap();
            let c = graph.add_page("c", Some(target("c_check"))).unwrap();
            graph.link(a, target("a_to_b"), b).unwrap();
            graph.link(b, target("b_to_a"), a).unwrap();
            graph.link(b, target("b_to_c"), c).unwrap();
            graph.link(c, target("c_to_b"), b).unwrap();
            if let Some(switch) = switch {
                graph.set_switch(c, switch).unwrap();
            }
            assert_eq!([a, b, c], self.ids);
            graph
        }

        fn navigator(&self, switch: Option<Switch>) -> Navigator {
            let (locator, _clock) = self.scene.locator();
            Navigator::new(locator, self.graph(switch))
        }
    }

    fn auto_switch() -> Switch {
        Switch::new("auto")
            .with_state("on", target("auto_on"), None)
            .unwrap()
            .with_state("off", target("auto_off"), None)
            .unwrap()
    }

    #[test]
    fn test_current_page() {
        let world = World::new("b");
        let mut nav = world.navigator(None);

        assert_eq!(nav.current_page().unwrap(), world.ids[1]);
        assert_eq!(nav.current(), Some(world.ids[1]));
        assert_eq!(nav.state().current_page.as_deref(), Some("b"));
    }

    #[test]
    fn test_current_page_unknown() {
        let world = World::new("nowhere");
        let (locator, clock) = world.scene.locator();
        let mut nav = Navigator::new(locator, world.graph(None));

        let err = nav.current_page().unwrap_err();
        assert!(matches!(err, UiError::PageUnknown));
        assert!(clock.elapsed() > nav.settings().current_page_timeout());
    }

    #[test]
    fn test_current_page_not_running() {
        let world = World::new("nowhere");
        world.scene.set_running(false);
        let mut nav = world.navigator(None);

        assert!(matches!(nav.current_page(), Err(UiError::NotRunning)));
    }

    #[test]
    fn test_current_page_after_popup() {
        let world = World::new("nowhere");
        world.scene.show("notice_close");
        world.scene.on_click("notice_close", &items("a"), &["notice_close"]);
        let mut nav = world.navigator(None);
        nav.register_popup_handler(|locator| {
            locator
                .find_click(&target("notice_close"), None, Duration::ZERO)
                .unwrap_or(false)
        });

        assert_eq!(nav.current_page().unwrap(), world.ids[0]);
    }

    #[test]
    fn test_goto_clicks_along_path() {
        let world = World::new("a");
        let mut nav = world.navigator(None);

        nav.goto(world.ids[2], None).unwrap();
        assert_eq!(
            world.scene.clicked(),
            vec!["a_to_b".to_string(), "b_to_c".to_string()]
        );
        assert_eq!(nav.current(), Some(world.ids[2]));
        assert_eq!(nav.state().phase, NavPhase::Arrived);
        assert_eq!(nav.state().current_page.as_deref(), Some("c"));
        assert_eq!(nav.state().page_switches, 2);
    }

    #[test]
    fn test_goto_when_already_there() {
        let world = World::new("c");
        let mut nav = world.navigator(None);

        nav.goto(world.ids[2], None).unwrap();
        assert!(world.scene.clicks().is_empty());
    }

    #[test]
    fn test_goto_drains_popup_before_clicking() {
        let world = World::new("nowhere");
        world.scene.show("reward_close");
        world.scene.on_click("reward_close", &items("a"), &["reward_close"]);
        let mut nav = world.navigator(None);

        let mut fired = false;
        nav.register_popup_handler(move |locator| {
            if fired {
                return false;
            }
            fired = locator
                .find_click(&target("reward_close"), None, Duration::ZERO)
                .unwrap_or(false);
            fired
        });

        nav.goto(world.ids[2], None).unwrap();
        assert_eq!(
            world.scene.clicked(),
            vec![
                "reward_close".to_string(),
                "a_to_b".to_string(),
                "b_to_c".to_string()
            ]
        );
    }

    #[test]
    fn test_goto_sets_switch_on_arrival() {
        let world = World::new("a");
        world.scene.show("auto_off");
        world.scene.on_click("auto_off", &["auto_on"], &["auto_off"]);
        let mut nav = world.navigator(Some(auto_switch()));

        nav.goto(world.ids[2], Some("on")).unwrap();
        assert_eq!(
            world.scene.clicked(),
            vec![
                "a_to_b".to_string(),
                "b_to_c".to_string(),
                "auto_off".to_string()
            ]
        );
    }

    #[test]
    fn test_goto_validates_switch_state_first() {
        let world = World::new("a");
        let mut nav = world.navigator(Some(auto_switch()));

        let err = nav.goto(world.ids[2], Some("maybe")).unwrap_err();
        assert!(matches!(err, UiError::InvalidSwitchState { .. }));

        let err = nav.goto(world.ids[1], Some("on")).unwrap_err();
        assert!(matches!(err, UiError::Configuration(_)));
        assert_eq!(world.scene.captures(), 0);
    }

    #[test]
    fn test_goto_gives_up_after_budget() {
        let world = World::new("nowhere");
        let mut settings = MockScene::settings();
        settings.navigation.goto_budget_ms = 5000;
        let (locator, clock) = world.scene.locator_with(settings);
        let mut nav = Navigator::new(locator, world.graph(None));

        let err = nav.goto(world.ids[2], None).unwrap_err();
        assert!(matches!(err, UiError::Timeout { .. }));
        assert!(clock.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_goto_reports_stuck_navigation() {
        let world = World::new("nowhere");
        let mut settings = MockScene::settings();
        settings.navigation.goto_budget_ms = 30_000;
        let (locator, _clock) = world.scene.locator_with(settings);
        let mut nav = Navigator::new(locator, world.graph(None));

        assert!(nav.goto(world.ids[2], None).is_err());
        assert_eq!(nav.state().phase, NavPhase::Identifying);
        assert!(nav.state().is_stuck(STUCK_PASSES));
    }

    #[test]
    fn test_goto_clicks_are_progress() {
        let world = World::new("a");
        let mut nav = world.navigator(None);

        nav.goto(world.ids[2], None).unwrap();
        assert_eq!(nav.state().polls_in_phase, 0);
        assert!(!nav.state().is_stuck(0));
    }

    #[test]
    fn test_ensure_twice_consumes_destination() {
        let world = World::new("c");
        let mut nav = world.navigator(None);

        assert!(!nav.ensure(world.ids[2], None).unwrap());
        assert!(!nav.ensure(world.ids[2], None).unwrap());
        assert_eq!(nav.state().phase, NavPhase::Arrived);
        assert_eq!(nav.state().arrivals, 2);
        assert!(nav.state().destination.is_none());
        assert_eq!(nav.state().current_page.as_deref(), Some("c"));
    }

    #[test]
    fn test_ensure() {
        let world = World::new("c");
        let mut nav = world.navigator(None);
        assert!(!nav.ensure(world.ids[2], None).unwrap());
        assert!(world.scene.clicks().is_empty());

        assert!(nav.ensure(world.ids[0], None).unwrap());
        assert_eq!(
            world.scene.clicked(),
            vec!["c_to_b".to_string(), "b_to_a".to_string()]
        );
    }

    #[test]
    fn test_ensure_only_sets_state() {
        let world = World::new("c");
        world.scene.show("auto_on");
        let mut nav = world.navigator(Some(auto_switch()));
        assert!(!nav.ensure(world.ids[2], Some("on")).unwrap());

        world.scene.on_click("auto_on", &["auto_off"], &["auto_on"]);
        assert!(nav.ensure(world.ids[2], Some("off")).unwrap());
        assert_eq!(world.scene.clicked(), vec!["auto_on".to_string()]);
    }

    #[test]
    fn test_switch_state_queries() {
        let world = World::new("c");
        world.scene.show("auto_off");
        let mut nav = world.navigator(Some(auto_switch()));
        let c = world.ids[2];

        // Not confirmed yet
        assert_eq!(nav.current_state(c).unwrap(), None);
        assert!(nav.switch_appear(c).unwrap());
        assert_eq!(nav.current_state(c).unwrap().as_deref(), Some("off"));
        assert!(!nav.switch_appear(world.ids[0]).unwrap());

        world.scene.on_click("auto_off", &["auto_on"], &["auto_off"]);
        assert!(nav.set_state(c, "on").unwrap());
        assert!(matches!(
            nav.set_state(world.ids[0], "on"),
            Err(UiError::Configuration(_))
        ));
    }

    fn index_reader(scene: &MockScene) -> impl FnMut(&mut Locator) -> Result<i32, UiError> {
        let scene = scene.clone();
        move |_: &mut Locator| {
            let clicked = scene.clicked();
            let next = clicked.iter().filter(|c| *c == "page_next").count() as i32;
            let prev = clicked.iter().filter(|c| *c == "page_prev").count() as i32;
            Ok(3 + next - prev)
        }
    }

    #[test]
    fn test_ensure_index_fast() {
        let world = World::new("a");
        world.scene.show("page_next");
        world.scene.show("page_prev");
        let mut nav = world.navigator(None);
        let reader = index_reader(&world.scene);

        nav.ensure_index(
            6,
            reader,
            &target("page_next"),
            &target("page_prev"),
            true,
            Duration::from_millis(200),
        )
        .unwrap();
        assert_eq!(world.scene.clicked(), vec!["page_next".to_string(); 3]);
    }

    #[test]
    fn test_ensure_index_one_step_at_a_time() {
        let world = World::new("a");
        world.scene.show("page_next");
        world.scene.show("page_prev");
        let mut nav = world.navigator(None);
        let reader = index_reader(&world.scene);

        nav.ensure_index(
            1,
            reader,
            &target("page_next"),
            &target("page_prev"),
            false,
            Duration::from_millis(200),
        )
        .unwrap();
        assert_eq!(world.scene.clicked(), vec!["page_prev".to_string(); 2]);
    }

    #[test]
    fn test_ensure_index_budget() {
        let world = World::new("a");
        let mut nav = world.navigator(None);

        let err = nav
            .ensure_index(
                2,
                |_: &mut Locator| Ok(0),
                &target("page_next"),
                &target("page_prev"),
                true,
                Duration::from_millis(200),
            )
            .unwrap_err();
        assert!(matches!(err, UiError::Timeout { .. }));
        assert!(world.scene.clicks().is_empty());
    }
}
