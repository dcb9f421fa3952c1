//! Owned subtree for a single catalog item.
//!
//! Names are stored as local names (namespace prefix stripped), so every
//! lookup here is prefix-agnostic.

/// One XML element with its attributes, leading text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Leading text, trimmed; `None` when blank.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// All descendants in document order, excluding `self`.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant named `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().find(|el| el.name == name)
    }

    /// Every descendant named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |el| el.name == name)
    }

    /// Direct children named `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |el| el.name == name)
    }

    /// Trimmed text of the first descendant named `name`.
    ///
    /// Only the first match is consulted: if it is blank the result is
    /// `None` even when a later element of the same name has text.
    #[must_use]
    pub fn find_text(&self, name: &str) -> Option<String> {
        self.find(name)
            .and_then(Element::trimmed_text)
            .map(str::to_owned)
    }
}

/// Pre-order walk over an element's descendants.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}
