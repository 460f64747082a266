//! Installed resources, catalog templates and the kinds they belong to.

use serde::{Deserialize, Serialize};

use super::property::{PropertyMap, PropertyValue};

/// Kinds of resource the workflow audits.
///
/// Declaration order is the fixed processing order for detection,
/// presentation and batch deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Installed content-hub solution (package).
    Solution,
    /// Detection (analytic) rule.
    Rule,
    /// Data connector.
    Connector,
}

/// Properties compared for detection rules.
const RULE_KEYS: &[&str] = &[
    "display_name",
    "description",
    "severity",
    "tactics",
    "techniques",
    "query",
    "query_frequency",
    "query_period",
    "trigger_operator",
    "trigger_threshold",
    "enabled",
];

/// Properties compared for data connectors.
const CONNECTOR_KEYS: &[&str] = &[
    "display_name",
    "description",
    "connector_kind",
    "data_types",
    "enabled",
];

/// Properties compared for solutions.
const SOLUTION_KEYS: &[&str] = &["display_name", "description", "version", "publisher"];

impl ResourceKind {
    /// All kinds, in processing order.
    pub const ALL: [Self; 3] = [Self::Solution, Self::Rule, Self::Connector];

    /// The property keys compared for this kind.
    #[must_use]
    pub const fn comparable_keys(self) -> &'static [&'static str] {
        match self {
            Self::Solution => SOLUTION_KEYS,
            Self::Rule => RULE_KEYS,
            Self::Connector => CONNECTOR_KEYS,
        }
    }

    /// Singular lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solution => "solution",
            Self::Rule => "rule",
            Self::Connector => "connector",
        }
    }

    /// Plural lowercase name, used for file names and section headings.
    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Solution => "solutions",
            Self::Rule => "rules",
            Self::Connector => "connectors",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solution" | "solutions" => Ok(Self::Solution),
            "rule" | "rules" => Ok(Self::Rule),
            "connector" | "connectors" => Ok(Self::Connector),
            other => Err(format!(
                "unknown resource kind '{other}' (expected solution, rule or connector)"
            )),
        }
    }
}

/// A resource currently configured on the audited platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledResource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Stable platform identifier.
    pub id: String,
    /// Short resource name.
    pub name: String,
    /// Display name, when the platform exposes one.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Installed version (solutions).
    #[serde(default)]
    pub version: Option<String>,
    /// Kind-specific properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

/// A candidate definition published by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Resource kind this template produces.
    pub kind: ResourceKind,
    /// Catalog identifier.
    pub id: String,
    /// Display name used for matching.
    pub display_name: String,
    /// Published version.
    #[serde(default)]
    pub version: String,
    /// Publisher name.
    #[serde(default)]
    pub publisher: String,
    /// Kind-specific properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Lightweight reference to the installed side of a detected update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRef {
    /// Platform identifier.
    pub id: String,
    /// Name shown to operators.
    pub name: String,
    /// Installed version, if any.
    pub version: Option<String>,
}

/// Lightweight reference to the template side of a detected update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    /// Catalog identifier.
    pub id: String,
    /// Template display name.
    pub display_name: String,
    /// Published version.
    pub version: String,
    /// Publisher name.
    pub publisher: String,
}

impl InstalledResource {
    /// Creates an installed resource with no properties.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            display_name: None,
            version: None,
            properties: PropertyMap::new(),
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the installed version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// The name used to match this resource against catalog templates.
    ///
    /// Falls back to the short name when no display name is set.
    #[must_use]
    pub fn match_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Property view used for comparison, including the identity fields.
    #[must_use]
    pub fn property_view(&self) -> PropertyMap {
        let mut view = self.properties.clone();
        view.insert(String::from("display_name"), self.match_name().into());
        if let Some(version) = &self.version {
            view.insert(String::from("version"), version.as_str().into());
        }
        view
    }

    /// Reference stored on detected updates.
    #[must_use]
    pub fn to_ref(&self) -> InstalledRef {
        InstalledRef {
            id: self.id.clone(),
            name: self.match_name().to_string(),
            version: self.version.clone(),
        }
    }
}

impl Template {
    /// Creates a template with no properties.
    #[must_use]
    pub fn new(kind: ResourceKind, id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            display_name: display_name.into(),
            version: String::new(),
            publisher: String::new(),
            properties: PropertyMap::new(),
        }
    }

    /// Sets the published version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    /// Sets a property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Property view used for comparison, including the identity fields.
    #[must_use]
    pub fn property_view(&self) -> PropertyMap {
        let mut view = self.properties.clone();
        view.insert(String::from("display_name"), self.display_name.as_str().into());
        if !self.version.is_empty() {
            view.insert(String::from("version"), self.version.as_str().into());
        }
        if !self.publisher.is_empty() {
            view.insert(String::from("publisher"), self.publisher.as_str().into());
        }
        view
    }

    /// Reference stored on detected updates.
    #[must_use]
    pub fn to_ref(&self) -> TemplateRef {
        TemplateRef {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            version: self.version.clone(),
            publisher: self.publisher.clone(),
        }
    }
}
