//! Reshape rules - renaming and decorating raw endpoint labels.
//!
//! A rule is keyed by the raw label as it appears on the probe series. It
//! can give the endpoint a display name, a list of attributes and a display
//! size. Display identity and decoration are looked up separately: callers
//! shape a label with [`ReshapeRules::shape`] and decorate it with
//! [`ReshapeRules::attrs_for`] / [`ReshapeRules::size_for`], always passing
//! the raw label.

use crate::DEFAULT_NODE_SIZE;

/// A single reshape rule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReshapeRule {
    /// Raw label this rule applies to.
    pub from: String,

    /// Display name. Falls back to `from`.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub to: Option<String>,

    /// Attributes shown next to the node.
    #[cfg_attr(feature = "serde", serde(default))]
    pub attrs: Vec<String>,

    /// Display size. Falls back to [`DEFAULT_NODE_SIZE`].
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub size: Option<u32>,
}

impl ReshapeRule {
    /// Create a rule for a raw label with no overrides.
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn to(mut self, name: impl Into<String>) -> Self {
        self.to = Some(name.into());
        self
    }

    /// Set the attributes.
    pub fn attrs<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs = attrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the display size.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Display name this rule produces.
    pub fn display_name(&self) -> &str {
        self.to.as_deref().unwrap_or(&self.from)
    }
}

/// Ordered reshape rule table.
///
/// When several rules share the same `from`, the first one wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ReshapeRules {
    rules: Vec<ReshapeRule>,
}

impl ReshapeRules {
    /// Create a rule table.
    pub fn new(rules: Vec<ReshapeRule>) -> Self {
        Self { rules }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn find(&self, raw: &str) -> Option<&ReshapeRule> {
        self.rules.iter().find(|rule| rule.from == raw)
    }

    /// Display identity of a raw label. Identity when no rule matches.
    pub fn shape<'a>(&'a self, raw: &'a str) -> &'a str {
        self.find(raw).map_or(raw, ReshapeRule::display_name)
    }

    /// Attributes of a raw label. Empty when no rule matches.
    pub fn attrs_for(&self, raw: &str) -> &[String] {
        self.find(raw)
            .map(|rule| rule.attrs.as_slice())
            .unwrap_or_default()
    }

    /// Display size of a raw label.
    pub fn size_for(&self, raw: &str) -> u32 {
        self.find(raw)
            .and_then(|rule| rule.size)
            .unwrap_or(DEFAULT_NODE_SIZE)
    }
}

impl From<Vec<ReshapeRule>> for ReshapeRules {
    fn from(rules: Vec<ReshapeRule>) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<ReshapeRule> for ReshapeRules {
    fn from_iter<T: IntoIterator<Item = ReshapeRule>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ReshapeRules {
        ReshapeRules::new(vec![
            ReshapeRule::new("a").to("A").attrs(["x"]).size(7),
            ReshapeRule::new("b").attrs(["edge", "dc1"]),
            ReshapeRule::new("c").to("C"),
        ])
    }

    #[test]
    fn test_shape_matched_and_unmatched() {
        let rules = rules();
        assert_eq!(rules.shape("a"), "A");
        assert_eq!(rules.shape("b"), "b");
        assert_eq!(rules.shape("zzz"), "zzz");
    }

    #[test]
    fn test_attrs_and_size_defaults() {
        let rules = rules();
        assert_eq!(rules.attrs_for("a"), ["x".to_string()]);
        assert_eq!(rules.size_for("a"), 7);

        assert_eq!(rules.attrs_for("b").len(), 2);
        assert_eq!(rules.size_for("b"), DEFAULT_NODE_SIZE);

        assert!(rules.attrs_for("c").is_empty());
        assert!(rules.attrs_for("zzz").is_empty());
        assert_eq!(rules.size_for("zzz"), DEFAULT_NODE_SIZE);
    }

    #[test]
    fn test_lookup_is_by_raw_label_only() {
        let rules = rules();
        // "A" is a display name, not a raw label
        assert_eq!(rules.shape("A"), "A");
        assert!(rules.attrs_for("A").is_empty());
        assert_eq!(rules.size_for("A"), DEFAULT_NODE_SIZE);
    }

    #[test]
    fn test_first_rule_wins() {
        let rules: ReshapeRules = vec![
            ReshapeRule::new("a").to("first").size(1),
            ReshapeRule::new("a").to("second").size(2),
        ]
        .into();
        assert_eq!(rules.shape("a"), "first");
        assert_eq!(rules.size_for("a"), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_optional_fields() {
        let rules: ReshapeRules = serde_json::from_str(
            r#"[{"from": "a", "to": "A", "attrs": ["x"], "size": 7}, {"from": "b"}]"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.shape("a"), "A");
        assert_eq!(rules.shape("b"), "b");
        assert!(rules.attrs_for("b").is_empty());
        assert_eq!(rules.size_for("b"), DEFAULT_NODE_SIZE);
    }
}
