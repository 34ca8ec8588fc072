//! Pages and the navigation graph

use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::switch::Switch;
use super::UiError;
use crate::vision::Target;

/// Index of a page inside its [`PageGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub usize);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One distinguishable screen
#[derive(Debug, Clone)]
pub struct Page {
    name: String,
    check: Option<Target>,
    switch: Option<Switch>,
    /// Destination page and the button that leads there, in link order
    links: Vec<(PageId, Target)>,
}

impl Page {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target that identifies this page when visible
    pub fn check(&self) -> Option<&Target> {
        self.check.as_ref()
    }

    pub fn switch(&self) -> Option<&Switch> {
        self.switch.as_ref()
    }

    pub fn links(&self) -> &[(PageId, Target)] {
        &self.links
    }

    /// Button to click on this page to move to `to`
    pub fn button_to(&self, to: PageId) -> Option<&Target> {
        self.links
            .iter()
            .find(|(dest, _)| *dest == to)
            .map(|(_, button)| button)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Registry of every page a script defines
#[derive(Debug, Default)]
pub struct PageGraph {
    pages: Vec<Page>,
    by_name: HashMap<String, PageId>,
}

impl PageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page. Names must be unique.
    pub fn add_page(
        &mut self,
        name: impl Into<String>,
        check: Option<Target>,
    ) -> Result<PageId, UiError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(UiError::Configuration(format!("page {} is defined twice", name)));
        }
        let id = PageId(self.pages.len());
        self.by_name.insert(name.clone(), id);
        self.pages.push(Page {
            name,
            check,
            switch: None,
            links: Vec::new(),
        });
        Ok(id)
    }

    /// Bind a switch to a page
    pub fn set_switch(&mut self, page: PageId, switch: Switch) -> Result<(), UiError> {
        self.page_mut(page)?.switch = Some(switch);
        Ok(())
    }

    /// Clicking `button` on `from` leads to `to`. Linking the same pair again
    /// replaces the button.
    pub fn link(&mut self, from: PageId, button: Target, to: PageId) -> Result<(), UiError> {
        self.page(to)?;
        let page = self.page_mut(from)?;
        match page.links.iter_mut().find(|(dest, _)| *dest == to) {
            Some(link) => link.1 = button,
            None => page.links.push((to, button)),
        }
        Ok(())
    }

    pub fn page(&self, id: PageId) -> Result<&Page, UiError> {
        self.pages
            .get(id.0)
            .ok_or_else(|| UiError::Configuration(format!("unknown page {}", id)))
    }

    fn page_mut(&mut self, id: PageId) -> Result<&mut Page, UiError> {
        self.pages
            .get_mut(id.0)
            .ok_or_else(|| UiError::Configuration(format!("unknown page {}", id)))
    }

    /// Look up by name
    pub fn find(&self, name: &str) -> Option<PageId> {
        self.by_name.get(name).copied()
    }

    /// Name of a page, `?` for ids from another graph
    pub fn name(&self, id: PageId) -> &str {
        self.pages.get(id.0).map_or("?", |p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Every page in registration order
    pub fn iter(&self) -> impl Iterator<Item = (PageId, &Page)> {
        self.pages.iter().enumerate().map(|(i, p)| (PageId(i), p))
    }

    /// Every page, `start` first and the rest in registration order
    pub fn iter_from(&self, start: Option<PageId>) -> impl Iterator<Item = (PageId, &Page)> {
        let start = start.filter(|s| s.0 < self.pages.len());
        let first = start.map(|s| (s, &self.pages[s.0]));
        first
            .into_iter()
            .chain(self.iter().filter(move |(id, _)| Some(*id) != start))
    }

    /// Shortest paths from every page to `destination`.
    ///
    /// Walks links backwards from the destination one layer at a time, so
    /// each page gets the neighbour on a shortest path as its next hop. Ties
    /// go to the page registered first.
    pub fn route_to(&self, destination: PageId) -> Result<Route, UiError> {
        self.page(destination)?;

        let mut next_hop = HashMap::new();
        let mut frontier = VecDeque::from([destination]);
        while let Some(target) = frontier.pop_front() {
            for (id, page) in self.iter() {
                if id == destination || next_hop.contains_key(&id) {
                    continue;
                }
                if page.button_to(target).is_some() {
                    next_hop.insert(id, target);
                    frontier.push_back(id);
                }
            }
        }

        Ok(Route {
            destination,
            next_hop,
        })
    }
}

/// Next hop toward one destination for every page that can reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    destination: PageId,
    next_hop: HashMap<PageId, PageId>,
}

impl Route {
    pub fn destination(&self) -> PageId {
        self.destination
    }

    /// Page to move to from `page`, `None` at the destination or when the
    /// destination is unreachable
    pub fn next_hop(&self, page: PageId) -> Option<PageId> {
        self.next_hop.get(&page).copied()
    }

    /// Whether `page` can reach the destination
    pub fn contains(&self, page: PageId) -> bool {
        page == self.destination || self.next_hop.contains_key(&page)
    }

    /// Every page visited from `start` up to and including the destination.
    /// Empty if the destination cannot be reached.
    pub fn path_from(&self, start: PageId) -> Vec<PageId> {
        if !self.contains(start) {
            return Vec::new();
        }
        let mut path = vec![start];
        let mut current = start;
        while let Some(next) = self.next_hop(current) {
            path.push(next);
            current = next;
        }
        path
    }
}
