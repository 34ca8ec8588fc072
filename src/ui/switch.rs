//! Multi-state toggles
//!
//! A [`Switch`] is a control with several mutually exclusive states, each
//! recognised by its own check target. Toggles flip in place when clicked,
//! selectors are a row of options where the wanted one is clicked.

use std::fmt;
use std::time::Duration;

use super::popup::Popups;
use super::UiError;
use crate::config::settings::NavigationSettings;
use crate::timer::Timer;
use crate::vision::{Locator, Target};

/// One state of a switch
#[derive(Debug, Clone)]
pub struct SwitchState {
    pub state: String,
    /// Visible while the switch is in this state
    pub check: Target,
    /// Clicked to change the switch, see [`Switch::is_selector`]
    pub click: Target,
}

#[derive(Debug, Clone)]
pub struct Switch {
    name: String,
    selector: bool,
    states: Vec<SwitchState>,
}

impl Switch {
    /// Create a toggle that flips when clicked: `[ON] -> click -> [OFF]`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selector: false,
            states: Vec::new(),
        }
    }

    /// Create a selector where each option is clicked directly:
    /// `[Daily] | Urgent -> click -> Daily | [Urgent]`
    pub fn selector(name: impl Into<String>) -> Self {
        Self {
            selector: true,
            ..Self::new(name)
        }
    }

    /// Append a state. `click` defaults to `check`.
    pub fn add_state(
        &mut self,
        state: impl Into<String>,
        check: Target,
        click: Option<Target>,
    ) -> Result<(), UiError> {
        let state = state.into();
        if self.states.iter().any(|s| s.state == state) {
            return Err(UiError::Configuration(format!(
                "switch {} already has a state {}",
                self.name, state
            )));
        }
        let click = click.unwrap_or_else(|| check.clone());
        self.states.push(SwitchState { state, check, click });
        Ok(())
    }

    /// Builder form of [`Switch::add_state`]
    pub fn with_state(
        mut self,
        state: impl Into<String>,
        check: Target,
        click: Option<Target>,
    ) -> Result<Self, UiError> {
        self.add_state(state, check, click)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_selector(&self) -> bool {
        self.selector
    }

    pub fn states(&self) -> &[SwitchState] {
        &self.states
    }

    /// Data of one state
    pub fn state_data(&self, state: &str) -> Result<&SwitchState, UiError> {
        self.states
            .iter()
            .find(|s| s.state == state)
            .ok_or_else(|| UiError::InvalidSwitchState {
                switch: self.name.clone(),
                state: state.to_string(),
            })
    }

    /// First state whose check target is visible right now, `None` if the
    /// switch is in no known state
    pub fn get_state(&self, locator: &mut Locator) -> Result<Option<String>, UiError> {
        for data in &self.states {
            if locator.exists(&data.check, Duration::ZERO)?.is_some() {
                return Ok(Some(data.state.clone()));
            }
        }
        Ok(None)
    }

    /// Whether any state is visible
    pub fn appear(&self, locator: &mut Locator) -> Result<bool, UiError> {
        Ok(self.get_state(locator)?.is_some())
    }

    /// Click until the switch shows `state`. Returns whether anything was
    /// clicked.
    ///
    /// Clicks are rate limited. While the state is unknown popups are drained
    /// and a warning is logged now and then; the second warning gives up with
    /// [`UiError::StaleAssetSuspected`].
    pub fn set_state(
        &self,
        locator: &mut Locator,
        state: &str,
        popups: &mut Popups,
        settings: &NavigationSettings,
    ) -> Result<bool, UiError> {
        self.state_data(state)?;

        let clock = locator.clock();
        let budget = Timer::new(clock.clone(), settings.switch_budget()).start();
        let mut warning = Timer::new(clock.clone(), settings.switch_warning_interval())
            .with_count(settings.switch_warning_count)
            .start();
        let mut click = Timer::new(clock.clone(), settings.switch_click_interval())
            .with_count(settings.switch_click_count);
        let mut warned = false;
        let mut changed = false;

        loop {
            if budget.current() >= budget.limit() {
                return Err(UiError::Timeout {
                    operation: format!("setting {} to {}", self.name, state),
                    budget: budget.limit(),
                });
            }

            let current = self.get_state(locator)?;

            match current.as_deref() {
                Some(current) if current == state => {
                    log::info!("{} set to {}", self.name, state);
                    return Ok(changed);
                }
                None => {
                    if popups.drain(locator) {
                        continue;
                    }
                    if warning.reached() {
                        log::warn!("Unknown {} switch", self.name);
                        warning.reset();
                        if warned {
                            log::warn!(
                                "{} switch {} asset has evaluated to unknown too many times, asset should be re-verified",
                                self.name,
                                state
                            );
                            return Err(UiError::StaleAssetSuspected {
                                switch: self.name.clone(),
                                state: state.to_string(),
                            });
                        }
                        warned = true;
                    }
                }
                Some(current) => {
                    if click.reached() {
                        let click_state = if self.selector { state } else { current };
                        let button = &self.state_data(click_state)?.click;
                        locator.touch(button, 1)?;
                        click.reset();
                        changed = true;
                    }
                    popups.drain(locator);
                }
            }

            clock.sleep(settings.switch_poll_interval());
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl PartialEq for Switch {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
