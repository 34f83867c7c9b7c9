use serde::Deserialize;

use crate::application::ports::ProcessOptions;

pub const DEFAULT_LINE_SPLITTER_TOLERANCE: f64 = 0.4;
pub const DEFAULT_LINE_SPLITTER_STRATEGY: &str = "left-priority";
pub const DEFAULT_HORIZONTAL_STRETCH_FACTOR: f64 = 1.0;
pub const DEFAULT_PAGE_SEPARATOR: &str = "<<<";
pub const DEFAULT_TAG: &str = "default";
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhispererMode {
    NativeText,
    LowCost,
    HighQuality,
    #[default]
    Form,
    Table,
}

impl WhispererMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeText => "native_text",
            Self::LowCost => "low_cost",
            Self::HighQuality => "high_quality",
            Self::Form => "form",
            Self::Table => "table",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    #[default]
    LayoutPreserving,
    Text,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LayoutPreserving => "layout_preserving",
            Self::Text => "text",
        }
    }
}

/// LLMWhisperer v2 adapter metadata, with the service defaults filled in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WhispererSettings {
    pub url: String,
    pub unstract_key: String,
    pub mode: WhispererMode,
    pub output_mode: OutputMode,
    pub line_splitter_tolerance: f64,
    pub line_splitter_strategy: String,
    pub horizontal_stretch_factor: f64,
    pub pages_to_extract: String,
    pub mark_vertical_lines: bool,
    pub mark_horizontal_lines: bool,
    #[serde(alias = "page_separator")]
    pub page_seperator: String,
    pub tag: String,
    pub use_webhook: String,
    pub webhook_metadata: Option<String>,
    pub wait_timeout: u64,
    pub median_filter_size: u32,
    pub gaussian_blur_radius: f64,
}

impl Default for WhispererSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            unstract_key: String::new(),
            mode: WhispererMode::default(),
            output_mode: OutputMode::default(),
            line_splitter_tolerance: DEFAULT_LINE_SPLITTER_TOLERANCE,
            line_splitter_strategy: DEFAULT_LINE_SPLITTER_STRATEGY.to_string(),
            horizontal_stretch_factor: DEFAULT_HORIZONTAL_STRETCH_FACTOR,
            pages_to_extract: String::new(),
            mark_vertical_lines: false,
            mark_horizontal_lines: false,
            page_seperator: DEFAULT_PAGE_SEPARATOR.to_string(),
            tag: DEFAULT_TAG.to_string(),
            use_webhook: String::new(),
            webhook_metadata: None,
            wait_timeout: DEFAULT_WAIT_TIMEOUT_SECS,
            median_filter_size: 0,
            gaussian_blur_radius: 0.0,
        }
    }
}

/// Per-call overrides for one whisper request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhispererRequestParams {
    pub enable_highlight: bool,
    pub tag: Option<String>,
}

impl From<&ProcessOptions> for WhispererRequestParams {
    fn from(options: &ProcessOptions) -> Self {
        Self {
            enable_highlight: options.enable_highlight,
            tag: options.tag.clone(),
        }
    }
}

/// Ordered query parameters for the `/whisper` endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhisperQuery(Vec<(&'static str, String)>);

impl WhisperQuery {
    fn push(&mut self, key: &'static str, value: impl ToString) {
        self.0.push((key, value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }

    pub fn wait_timeout_secs(&self) -> u64 {
        self.get("wait_timeout")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS)
    }

    pub fn wait_for_completion(&self) -> bool {
        self.get("wait_for_completion") == Some("true")
    }
}

/// Layer the caller's overrides onto the adapter's configured defaults.
pub fn build_whisper_query(
    settings: &WhispererSettings,
    params: &WhispererRequestParams,
) -> WhisperQuery {
    let mut query = WhisperQuery::default();
    query.push("mode", settings.mode.as_str());
    query.push("output_mode", settings.output_mode.as_str());
    query.push("line_splitter_tolerance", settings.line_splitter_tolerance);
    query.push("line_splitter_strategy", &settings.line_splitter_strategy);
    query.push("horizontal_stretch_factor", settings.horizontal_stretch_factor);
    query.push("pages_to_extract", &settings.pages_to_extract);
    query.push("mark_vertical_lines", settings.mark_vertical_lines);
    query.push("mark_horizontal_lines", settings.mark_horizontal_lines);
    query.push("page_seperator", &settings.page_seperator);
    query.push("add_line_nos", params.enable_highlight);
    query.push("include_line_confidence", params.enable_highlight);

    let tag = params
        .tag
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&settings.tag);
    query.push("tag", tag);

    if !settings.use_webhook.is_empty() {
        query.push("use_webhook", &settings.use_webhook);
    }
    if let Some(metadata) = settings.webhook_metadata.as_deref() {
        query.push("webhook_metadata", metadata);
    }
    query.push("wait_timeout", settings.wait_timeout);
    query.push("wait_for_completion", true);

    if settings.mode == WhispererMode::LowCost {
        query.push("median_filter_size", settings.median_filter_size);
        query.push("gaussian_blur_radius", settings.gaussian_blur_radius);
    }

    query
}
