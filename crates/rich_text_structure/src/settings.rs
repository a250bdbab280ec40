use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dom::ElementData;
use crate::format::Attributes;

type NodePredicate = Arc<dyn Fn(&ElementData) -> bool + Send + Sync>;
type TextFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;
type AttributePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Caret marker injected by editing widgets between inline boundaries.
pub const CARET_MARKER: char = '\u{feff}';

/// Hooks consulted by the tree parser. Every hook is optional; an unset hook
/// keeps nodes, text and attributes as they are.
#[derive(Clone, Default)]
pub struct Settings {
    remove_node: Option<NodePredicate>,
    unwrap_node: Option<NodePredicate>,
    filter_text: Option<TextFilter>,
    remove_attribute: Option<AttributePredicate>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop matching elements together with their subtree.
    pub fn remove_node_when(
        mut self,
        predicate: impl Fn(&ElementData) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.remove_node = Some(Arc::new(predicate));
        self
    }

    /// Keep the children of matching elements but not the element itself.
    pub fn unwrap_node_when(
        mut self,
        predicate: impl Fn(&ElementData) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.unwrap_node = Some(Arc::new(predicate));
        self
    }

    pub fn filter_text_with(
        mut self,
        filter: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.filter_text = Some(Arc::new(filter));
        self
    }

    pub fn remove_attribute_when(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.remove_attribute = Some(Arc::new(predicate));
        self
    }

    pub fn should_remove_node(&self, element: &ElementData) -> bool {
        self.remove_node
            .as_ref()
            .is_some_and(|predicate| predicate(element))
    }

    pub fn should_unwrap_node(&self, element: &ElementData) -> bool {
        self.unwrap_node
            .as_ref()
            .is_some_and(|predicate| predicate(element))
    }

    pub fn should_remove_attribute(&self, name: &str) -> bool {
        self.remove_attribute
            .as_ref()
            .is_some_and(|predicate| predicate(name))
    }

    /// Text as it enters a record. Literal newlines are layout whitespace in
    /// the source tree and are always removed before the configured filter.
    pub fn filter_text(&self, text: &str) -> String {
        let text: String = text.chars().filter(|&ch| ch != '\n').collect();
        match &self.filter_text {
            Some(filter) => filter(&text),
            None => text,
        }
    }

    pub(crate) fn retained_attributes(&self, attributes: &Attributes) -> Attributes {
        attributes
            .iter()
            .filter(|(name, _)| !self.should_remove_attribute(name))
            .collect()
    }

    /// Settings for trees that come out of a live editing widget: bogus
    /// helper elements are dropped or unwrapped, `data-mce-*` attributes are
    /// dropped and caret markers are stripped.
    pub fn editing_surface() -> Self {
        Self::from_config(SettingsConfig::editing_surface())
    }

    pub fn from_config(config: SettingsConfig) -> Self {
        tracing::debug!(
            remove_nodes = config.remove_nodes.len(),
            unwrap_nodes = config.unwrap_nodes.len(),
            attribute_prefixes = config.remove_attribute_prefixes.len(),
            "building parser settings"
        );

        let mut settings = Settings::new();
        if !config.remove_nodes.is_empty() {
            let rules = config.remove_nodes;
            settings = settings.remove_node_when(move |el| rules.iter().any(|r| r.matches(el)));
        }
        if !config.unwrap_nodes.is_empty() {
            let rules = config.unwrap_nodes;
            settings = settings.unwrap_node_when(move |el| rules.iter().any(|r| r.matches(el)));
        }
        if !config.remove_attribute_prefixes.is_empty() {
            let prefixes = config.remove_attribute_prefixes;
            settings = settings.remove_attribute_when(move |name| {
                prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
            });
        }
        if !config.strip_characters.is_empty() {
            let strip = config.strip_characters;
            settings = settings
                .filter_text_with(move |text| text.chars().filter(|&ch| !strip.contains(ch)).collect());
        }
        settings
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("remove_node", &self.remove_node.is_some())
            .field("unwrap_node", &self.unwrap_node.is_some())
            .field("filter_text", &self.filter_text.is_some())
            .field("remove_attribute", &self.remove_attribute.is_some())
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Declarative form of [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub remove_nodes: Vec<NodeRule>,
    pub unwrap_nodes: Vec<NodeRule>,
    pub remove_attribute_prefixes: Vec<String>,
    pub strip_characters: String,
}

impl SettingsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn editing_surface() -> Self {
        Self {
            remove_nodes: vec![NodeRule::attribute_equals("data-mce-bogus", "all")],
            unwrap_nodes: vec![NodeRule::attribute("data-mce-bogus")],
            remove_attribute_prefixes: vec!["data-mce-".to_string()],
            strip_characters: CARET_MARKER.to_string(),
        }
    }
}

/// Matches elements by tag and/or attribute. With an attribute but no value
/// the attribute must be present and non-empty. A rule naming neither a tag
/// nor an attribute matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl NodeRule {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            attribute: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn attribute_equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: Some(name.into()),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, element: &ElementData) -> bool {
        if self.tag.is_none() && self.attribute.is_none() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(name) = &self.attribute {
            let Some(actual) = element.attribute(name) else {
                return false;
            };
            return match &self.value {
                Some(expected) => actual == expected,
                None => !actual.is_empty(),
            };
        }
        true
    }
}
