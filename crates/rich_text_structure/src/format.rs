use serde::{Deserialize, Serialize};

/// Element attributes in source order.
///
/// Order is significant: it is the order attributes are emitted in when a
/// format is serialized back to markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    /// Sets `name`, keeping its original position when it already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let ix = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(ix).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (k, v) in iter {
            attributes.insert(k, v);
        }
        attributes
    }
}

/// A single inline annotation.
///
/// `object` marks a void annotation (an image, an embed) that is anchored in
/// front of a character slot instead of wrapping characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Format {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Attributes>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub object: bool,
}

/// Formats active at one character slot, outermost first.
pub type FormatList = Vec<Format>;

impl Format {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: None,
            object: false,
        }
    }

    pub fn object(kind: impl Into<String>) -> Self {
        Self {
            object: true,
            ..Self::new(kind)
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(name, value);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = (!attributes.is_empty()).then_some(attributes);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.as_ref().and_then(|attrs| attrs.get(name))
    }

    pub fn is_type(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub(crate) fn attributes_or_empty(&self) -> &[(String, String)] {
        self.attributes
            .as_ref()
            .map(|attrs| attrs.0.as_slice())
            .unwrap_or(&[])
    }
}

pub(crate) fn find_type<'a>(formats: Option<&'a FormatList>, kind: &str) -> Option<&'a Format> {
    formats?.iter().find(|format| format.is_type(kind))
}
