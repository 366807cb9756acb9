/// One element on the click's propagation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub href: Option<String>,
    pub target: Option<String>,
}

impl Element {
    pub fn anchor(href: impl Into<String>) -> Self {
        Self {
            tag: "a".to_string(),
            href: Some(href.into()),
            target: None,
        }
    }

    pub fn anchor_with_target(href: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::anchor(href)
        }
    }

    pub fn other(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            href: None,
            target: None,
        }
    }

    fn is_anchor(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a")
    }
}

/// A mouse click as seen by a document-level listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    /// 0 = primary (left) button.
    pub button: u16,
    pub meta_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    pub default_prevented: bool,
    /// The clicked element followed by its ancestors, innermost first.
    pub path: Vec<Element>,
}

impl ClickEvent {
    /// Plain left click on `path[0]`.
    pub fn left_click(path: Vec<Element>) -> Self {
        Self {
            button: 0,
            meta_key: false,
            ctrl_key: false,
            shift_key: false,
            alt_key: false,
            default_prevented: false,
            path,
        }
    }

    /// Plain left click directly on a link.
    pub fn on_link(href: impl Into<String>) -> Self {
        Self::left_click(vec![Element::anchor(href)])
    }

    pub fn has_modifier(&self) -> bool {
        self.meta_key || self.ctrl_key || self.shift_key || self.alt_key
    }

    /// The nearest anchor (the clicked element or an ancestor) whose `href`
    /// satisfies `accept`.
    pub fn closest_anchor(&self, accept: impl Fn(&str) -> bool) -> Option<&Element> {
        self.path
            .iter()
            .find(|el| el.is_anchor() && el.href.as_deref().is_some_and(&accept))
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}
