//! Page graph definitions
//!
//! Scripts describe their keywords, pages, links and switches in JSON. The
//! definition is turned into a [`PageGraph`] and a [`KeywordRegistry`] once at
//! startup.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::ocr::{Keyword, KeywordRegistry, MatchMode};
use crate::ui::{PageGraph, Switch};
use crate::vision::{SearchScope, Target};

fn default_true() -> bool {
    true
}

/// One template and how to search for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Template file, relative to the templates directory
    pub file: String,
    /// Target name, the file stem when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Offset of the template centre from the screen centre, in screen widths
    #[serde(default)]
    pub record_pos: (f32, f32),
    /// Resolution the template was recorded at, 1280x720 when absent
    #[serde(default)]
    pub resolution: Option<(u32, u32)>,
    /// Check colors before matching
    #[serde(default)]
    pub rgb: bool,
    /// Search only around `record_pos`
    #[serde(default = "default_true")]
    pub local_search: bool,
    #[serde(default)]
    pub threshold: Option<f32>,
    /// Keyword name, turns the target into a text target
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub mode: MatchMode,
}

impl TargetSpec {
    /// Target name
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            Path::new(&self.file)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.file.clone())
        })
    }

    fn build(&self, image: RgbaImage, keywords: &KeywordRegistry) -> Result<Target, ConfigError> {
        let (width, height) = self.resolution.unwrap_or(Target::DEFAULT_RESOLUTION);
        let scope = if self.local_search {
            SearchScope::Area
        } else {
            SearchScope::FullScreen
        };

        let mut target = Target::image(self.name(), image)
            .at(self.record_pos.0, self.record_pos.1)
            .recorded_at(width, height)
            .color_sensitive(self.rgb)
            .with_scope(scope);
        if let Some(threshold) = self.threshold {
            target = target.with_threshold(threshold);
        }
        if let Some(name) = &self.keyword {
            let keyword = keywords
                .get(name)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown keyword {}", name)))?;
            target = target.with_keyword(keyword, self.mode);
        }
        Ok(target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Destination page
    pub to: String,
    /// Button that leads there
    pub button: TargetSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchStateSpec {
    pub state: String,
    pub check: TargetSpec,
    /// Defaults to `check`
    #[serde(default)]
    pub click: Option<TargetSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchSpec {
    pub name: String,
    #[serde(default)]
    pub selector: bool,
    pub states: Vec<SwitchStateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSpec {
    pub name: String,
    #[serde(default)]
    pub check: Option<TargetSpec>,
    #[serde(default)]
    pub switch: Option<SwitchSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

/// Whole script definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Directory template files are relative to. Relative paths are resolved
    /// against the definition file.
    #[serde(default)]
    pub templates_dir: Option<PathBuf>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub pages: Vec<PageSpec>,
}

impl GraphSpec {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a definition file. A relative `templates_dir` is resolved against
    /// the file's directory, a missing one defaults to it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut spec = Self::from_json(&json)?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        spec.templates_dir = Some(match spec.templates_dir.take() {
            Some(dir) if dir.is_relative() => base.join(dir),
            Some(dir) => dir,
            None => base.to_path_buf(),
        });
        Ok(spec)
    }

    /// Build the graph, loading every template from the templates directory
    pub fn build(&self) -> Result<(PageGraph, KeywordRegistry), ConfigError> {
        let dir = self
            .templates_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        self.build_with(|spec| {
            let path = dir.join(&spec.file);
            image::open(&path)
                .map(|img| img.to_rgba8())
                .map_err(|source| ConfigError::Image { path, source })
        })
    }

    /// Build the graph with a custom template loader
    pub fn build_with<F>(&self, mut load: F) -> Result<(PageGraph, KeywordRegistry), ConfigError>
    where
        F: FnMut(&TargetSpec) -> Result<RgbaImage, ConfigError>,
    {
        let mut keywords = KeywordRegistry::new();
        for keyword in &self.keywords {
            keywords.register(keyword.clone())?;
        }

        let mut target = |spec: &TargetSpec| -> Result<Target, ConfigError> {
            let image = load(spec)?;
            spec.build(image, &keywords)
        };

        // Pages first so links can point forward
        let mut graph = PageGraph::new();
        let mut ids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let check = page.check.as_ref().map(&mut target).transpose()?;
            ids.push(graph.add_page(page.name.clone(), check)?);
        }

        for (page, &id) in self.pages.iter().zip(&ids) {
            for link in &page.links {
                let to = graph.find(&link.to).ok_or_else(|| {
                    ConfigError::Invalid(format!("page {} links to unknown page {}", page.name, link.to))
                })?;
                graph.link(id, target(&link.button)?, to)?;
            }

            if let Some(spec) = &page.switch {
                let mut switch = if spec.selector {
                    Switch::selector(spec.name.clone())
                } else {
                    Switch::new(spec.name.clone())
                };
                for state in &spec.states {
                    let check = target(&state.check)?;
                    let click = state.click.as_ref().map(&mut target).transpose()?;
                    switch.add_state(state.state.clone(), check, click)?;
                }
                graph.set_switch(id, switch)?;
            }
        }

        log::debug!(
            "Loaded {} pages and {} keywords",
            graph.len(),
            keywords.len()
        );
        Ok((graph, keywords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{KeywordError, Lang};
    use crate::ui::UiError;
    use crate::vision::TargetKind;

    const GRAPH: &str = r#"{
        "keywords": [
            {"name": "shop_title", "en": "Shop", "cn": "商店"}
        ],
        "pages": [
            {
                "name": "main",
                "check": {"file": "main_check.png", "record_pos": [0.4, -0.2]},
                "links": [{"to": "shop", "button": {"file": "goto_shop.png"}}]
            },
            {
                "name": "shop",
                "check": {"file": "shop_title.png", "keyword": "shop_title", "mode": "contains", "local_search": false},
                "links": [{"to": "main", "button": {"file": "back.png", "rgb": true}}],
                "switch": {
                    "name": "shop_tab",
                    "selector": true,
                    "states": [
                        {"state": "items", "check": {"file": "tab_items_on.png"}, "click": {"file": "tab_items_off.png"}},
                        {"state": "skins", "check": {"file": "tab_skins_on.png"}}
                    ]
                }
            }
        ]
    }"#;

    fn blank(_: &TargetSpec) -> Result<RgbaImage, ConfigError> {
        Ok(RgbaImage::new(8, 8))
    }

    #[test]
    fn test_build_graph() {
        let spec = GraphSpec::from_json(GRAPH).unwrap();
        let (graph, keywords) = spec.build_with(blank).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(keywords.get("shop_title").unwrap().text(Lang::Cn), "商店");

        let main = graph.find("main").unwrap();
        let shop = graph.find("shop").unwrap();
        let main_page = graph.page(main).unwrap();
        assert_eq!(main_page.check().unwrap().record_pos(), (0.4, -0.2));
        assert_eq!(main_page.button_to(shop).unwrap().name(), "goto_shop");

        let shop_page = graph.page(shop).unwrap();
        let check = shop_page.check().unwrap();
        assert_eq!(check.scope(), SearchScope::FullScreen);
        assert!(matches!(check.kind(), TargetKind::Text { mode: MatchMode::Contains, .. }));
        assert!(shop_page.button_to(main).unwrap().is_color_sensitive());

        let switch = shop_page.switch().unwrap();
        assert!(switch.is_selector());
        assert_eq!(switch.state_data("items").unwrap().click.name(), "tab_items_off");
        assert_eq!(switch.state_data("skins").unwrap().click.name(), "tab_skins_on");

        assert_eq!(graph.route_to(shop).unwrap().next_hop(main), Some(shop));
    }

    #[test]
    fn test_unknown_link_target() {
        let spec = GraphSpec::from_json(
            r#"{"pages": [{"name": "main", "links": [{"to": "nowhere", "button": {"file": "x.png"}}]}]}"#,
        )
        .unwrap();
        assert!(matches!(spec.build_with(blank), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_keyword() {
        let spec = GraphSpec::from_json(
            r#"{"pages": [{"name": "main", "check": {"file": "x.png", "keyword": "missing"}}]}"#,
        )
        .unwrap();
        assert!(matches!(spec.build_with(blank), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let spec = GraphSpec::from_json(r#"{"pages": [{"name": "main"}, {"name": "main"}]}"#).unwrap();
        assert!(matches!(
            spec.build_with(blank),
            Err(ConfigError::Ui(UiError::Configuration(_)))
        ));

        let spec = GraphSpec::from_json(
            r#"{"keywords": [{"name": "ok", "en": "OK"}, {"name": "ok", "en": "Fine"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            spec.build_with(blank),
            Err(ConfigError::Keyword(KeywordError::Duplicate(_)))
        ));
    }

    #[test]
    fn test_missing_template_file() {
        let spec = GraphSpec {
            templates_dir: Some(PathBuf::from("/nonexistent/templates")),
            ..GraphSpec::from_json(r#"{"pages": [{"name": "main", "check": {"file": "x.png"}}]}"#).unwrap()
        };
        assert!(matches!(spec.build(), Err(ConfigError::Image { .. })));
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            GraphSpec::open("/nonexistent/graph.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
