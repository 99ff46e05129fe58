use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_true() -> bool {
    true
}

/// A single extraction job
///
/// The JSON shape keeps option keys flat (`headless`, `use_browser`,
/// `filter_type`, `threshold`, `js_scripts`, ...) so request bodies written
/// for the feed pipeline deserialize unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Absolute http(s) URL to extract from
    pub url: String,

    /// CSS selectors scoping the extraction
    #[serde(default)]
    pub selectors: Option<SelectorConfig>,

    /// Schema for structured field extraction
    #[serde(default)]
    pub extraction_schema: Option<ExtractionSchema>,

    #[serde(flatten)]
    pub browser: BrowserOptions,

    #[serde(flatten)]
    pub filter: FilterOptions,

    #[serde(flatten)]
    pub behavior: BehaviorFlags,

    /// Selectors to wait for before capturing content (browser only)
    #[serde(default)]
    pub wait_selectors: Vec<String>,

    /// Scripts evaluated in order after navigation (browser only)
    #[serde(default, rename = "js_scripts", alias = "scripts")]
    pub scripts: Vec<String>,
}

impl ExtractionRequest {
    /// Creates a request for `url` with every option at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns the base selector, if one was given and is not blank
    pub fn base_selector(&self) -> Option<&str> {
        self.selectors
            .as_ref()
            .and_then(|s| s.base_selector.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// CSS selectors used to scope an extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Element to extract; its presence routes the request to the browser
    pub base_selector: Option<String>,

    /// Elements whose content makes up the markdown (static extraction)
    pub include_selectors: Vec<String>,

    /// Elements removed before conversion (static extraction)
    pub exclude_selectors: Vec<String>,
}

/// Schema for structured data extraction
///
/// Every element matching `base_selector` yields one JSON object built from
/// `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    pub name: String,
    pub base_selector: String,
    pub fields: Vec<SchemaField>,
}

/// One named field of an extraction schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,

    /// Selector relative to the parent element; absent means the parent itself
    #[serde(default)]
    pub selector: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    /// Attribute to read when `kind` is `attribute`
    #[serde(default)]
    pub attribute: Option<String>,

    /// Sub-fields for `nested` and `list` kinds
    #[serde(default)]
    pub fields: Vec<SchemaField>,

    /// Value used when the selector matches nothing
    #[serde(default)]
    pub default: Option<Value>,
}

/// How a schema field turns matched elements into a value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Trimmed, whitespace-collapsed text content
    #[default]
    Text,
    /// Inner HTML of the element
    Html,
    /// Value of the named attribute
    Attribute,
    /// Object built from sub-fields of the first match
    Nested,
    /// Array with one entry per match
    List,
}

/// Browser configuration flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserOptions {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub viewport_width: Option<u32>,

    #[serde(default)]
    pub viewport_height: Option<u32>,

    /// Navigation and selector-wait timeout (milliseconds)
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Hide automation markers from page scripts
    #[serde(default, alias = "stealth")]
    pub stealth_mode: bool,

    /// Log the full request at debug level
    #[serde(default)]
    pub verbose: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: None,
            viewport_width: None,
            viewport_height: None,
            timeout: None,
            stealth_mode: false,
            verbose: false,
        }
    }
}

/// Content filter selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(default, rename = "filter_type")]
    pub kind: FilterKind,

    /// Pruning score cut-off in [0,1], or minimum BM25 score
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Query the BM25 filter ranks fragments against
    #[serde(default)]
    pub query: Option<String>,
}

impl FilterOptions {
    /// Returns the query if it is present and not blank
    pub fn non_empty_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}

/// Content filter families
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Pruning,
    Bm25,
}

/// Behavior switches for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorFlags {
    /// Render the page in a browser
    #[serde(default)]
    pub use_browser: bool,

    #[serde(default = "default_true")]
    pub use_cache: bool,

    #[serde(default = "default_true")]
    pub check_robots_txt: bool,

    #[serde(default = "default_true")]
    pub respect_rate_limits: bool,
}

impl Default for BehaviorFlags {
    fn default() -> Self {
        Self {
            use_browser: false,
            use_cache: true,
            check_robots_txt: true,
            respect_rate_limits: true,
        }
    }
}
