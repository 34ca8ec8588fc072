//! Popup handlers

use std::fmt;

use crate::vision::Locator;

/// Handler for a transient screen such as a reward dialog or announcement.
/// Returns true when it dealt with something.
pub type PopupHandler = Box<dyn FnMut(&mut Locator) -> bool>;

/// Ordered list of popup handlers
#[derive(Default)]
pub struct Popups {
    handlers: Vec<PopupHandler>,
}

impl Popups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: impl FnMut(&mut Locator) -> bool + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run handlers in registration order, stopping at the first one that
    /// handled something
    pub fn drain(&mut self, locator: &mut Locator) -> bool {
        for (i, handler) in self.handlers.iter_mut().enumerate() {
            if handler(locator) {
                log::debug!("Popup handler {} handled a popup", i);
                return true;
            }
        }
        false
    }
}

impl fmt::Debug for Popups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Popups({})", self.handlers.len())
    }
}
