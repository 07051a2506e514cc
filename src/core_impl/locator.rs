use super::*;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};

/// Locator strategies. JSON names follow the atom convention (`css`,
/// `linkText`, ...); the WebDriver names (`css selector`, `link text`, ...)
/// are accepted too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Css,
    Xpath,
    Id,
    Name,
    ClassName,
    LinkText,
    PartialLinkText,
    TagName,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Xpath => "xpath",
            Self::Id => "id",
            Self::Name => "name",
            Self::ClassName => "className",
            Self::LinkText => "linkText",
            Self::PartialLinkText => "partialLinkText",
            Self::TagName => "tagName",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        let strategy = match name {
            "css" | "css selector" => Self::Css,
            "xpath" => Self::Xpath,
            "id" => Self::Id,
            "name" => Self::Name,
            "className" | "class name" => Self::ClassName,
            "linkText" | "link text" => Self::LinkText,
            "partialLinkText" | "partial link text" => Self::PartialLinkText,
            "tagName" | "tag name" => Self::TagName,
            other => {
                return Err(Error::InvalidSelector(format!(
                    "Unsupported locator strategy: {other}"
                )));
            }
        };
        Ok(strategy)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy and the value to match, serialized as `{"<strategy>": "<value>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: Strategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(Strategy::Css, value)
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::Xpath, value)
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, value)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|err| Error::InvalidSelector(format!("invalid locator: {err}")))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.strategy.as_str(), &self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct LocatorVisitor;

        impl<'de> Visitor<'de> for LocatorVisitor {
            type Value = Locator;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with exactly one strategy key")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Locator, A::Error> {
                let (name, value) = map
                    .next_entry::<String, String>()?
                    .ok_or_else(|| de::Error::custom("empty locator"))?;
                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom("locator must have exactly one strategy"));
                }
                let strategy = Strategy::parse(&name).map_err(de::Error::custom)?;
                Ok(Locator::new(strategy, value))
            }
        }

        deserializer.deserialize_map(LocatorVisitor)
    }
}

/// Evaluates XPath expressions for the `xpath` strategy. No evaluator is
/// bundled; install one with [`Document::set_xpath_evaluator`].
pub trait XPathEvaluator: fmt::Debug {
    /// Element nodes selected by `expression` from `context`, in document
    /// order.
    fn evaluate(&self, doc: &Document, expression: &str, context: NodeId) -> Result<Vec<NodeId>>;
}

/// Matches locators against the elements under a root.
pub trait Resolver: fmt::Debug {
    fn resolve(&self, doc: &Document, locator: &Locator, root: NodeId) -> Result<Vec<NodeId>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve(&self, doc: &Document, locator: &Locator, root: NodeId) -> Result<Vec<NodeId>> {
        let value = locator.value.as_str();
        let descendants = || {
            let mut out = Vec::new();
            doc.dom.collect_elements_descendants_dfs(root, &mut out);
            out
        };
        let matching = |predicate: &dyn Fn(&Element) -> bool| {
            descendants()
                .into_iter()
                .filter(|node| doc.dom.element(*node).is_some_and(predicate))
                .collect::<Vec<_>>()
        };

        let found = match locator.strategy {
            Strategy::Css => doc.dom.query_selector_all_from(root, value)?,
            Strategy::Id => {
                matching(&|element| element.attrs.get("id").is_some_and(|id| id == value))
            }
            Strategy::Name => {
                matching(&|element| element.attrs.get("name").is_some_and(|name| name == value))
            }
            Strategy::ClassName => {
                let class_name = value.trim();
                if class_name.is_empty() {
                    return Err(Error::InvalidSelector("Cannot search for an empty class name".into()));
                }
                if class_name.contains(char::is_whitespace) {
                    return Err(Error::InvalidSelector("Compound class names not permitted".into()));
                }
                matching(&|element| has_class(element, class_name))
            }
            Strategy::TagName => {
                if value.trim().is_empty() {
                    return Err(Error::InvalidSelector("Cannot search for an empty tag name".into()));
                }
                matching(&|element| value == "*" || element.is_tag(value.trim()))
            }
            Strategy::LinkText | Strategy::PartialLinkText => {
                let wanted = value.trim();
                let exact = locator.strategy == Strategy::LinkText;
                descendants()
                    .into_iter()
                    .filter(|node| doc.dom.has_tag(*node, "a"))
                    .filter(|node| {
                        let text = doc.visible_text(*node);
                        if exact {
                            text.trim() == wanted
                        } else {
                            text.contains(wanted)
                        }
                    })
                    .collect()
            }
            Strategy::Xpath => {
                let evaluator = doc.xpath.as_deref().ok_or_else(|| {
                    Error::UnsupportedOperation("No XPath evaluator is installed".into())
                })?;
                evaluator
                    .evaluate(doc, value, root)?
                    .into_iter()
                    .filter(|node| doc.dom.element(*node).is_some())
                    .collect()
            }
        };
        Ok(found)
    }
}
