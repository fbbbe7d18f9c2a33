//! Shared types serialized into the index artifact.
//!
//! The gallery front-end reads these straight out of `index.json`, so field
//! names are camelCase on the wire and optional fields are omitted when absent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of item kinds. Each kind selects a build strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemoType {
    WebApp,
    CodeSnippet,
    Markdown,
    Chat,
    Research,
}

impl DemoType {
    pub const ALL: [DemoType; 5] = [
        DemoType::WebApp,
        DemoType::CodeSnippet,
        DemoType::Markdown,
        DemoType::Chat,
        DemoType::Research,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DemoType::WebApp => "web-app",
            DemoType::CodeSnippet => "code-snippet",
            DemoType::Markdown => "markdown",
            DemoType::Chat => "chat",
            DemoType::Research => "research",
        }
    }
}

impl fmt::Display for DemoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDemoType(pub String);

impl fmt::Display for UnknownDemoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown demo type '{}'", self.0)
    }
}

impl std::error::Error for UnknownDemoType {}

impl FromStr for DemoType {
    type Err = UnknownDemoType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        DemoType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownDemoType(needle.to_string()))
    }
}

/// Type-specific settings. Every field is optional in every source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConfig {
    /// Web app entry document, `index.html` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    /// Replaces the configured web-app build command (whitespace-split).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    /// Language of a code snippet; inferred from the file manifest when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// File shown in the code preview page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,
    /// Document rendered for markdown, chat and research items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_doc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<String>,
}

/// The canonical, fully-populated metadata record for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    /// Directory name of the item; unique within a run.
    pub slug: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub demo_type: DemoType,
    pub tags: Vec<String>,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<TypeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_links: Option<ExternalLinks>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_type_parses_case_insensitively() {
        assert_eq!("web-app".parse::<DemoType>(), Ok(DemoType::WebApp));
        assert_eq!(" Research ".parse::<DemoType>(), Ok(DemoType::Research));
    }

    #[test]
    fn demo_type_rejects_unknown_names() {
        let err = "qa".parse::<DemoType>().unwrap_err();
        assert_eq!(err, UnknownDemoType("qa".to_string()));
    }

    #[test]
    fn demo_type_serializes_kebab_case() {
        let json = serde_json::to_string(&DemoType::CodeSnippet).unwrap();
        assert_eq!(json, "\"code-snippet\"");
    }

    #[test]
    fn resolved_metadata_uses_camel_case_and_omits_absent_fields() {
        let meta = ResolvedMetadata {
            slug: "my-demo".to_string(),
            title: "My Demo".to_string(),
            description: "My Demo Demo".to_string(),
            demo_type: DemoType::Markdown,
            tags: vec![],
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            updated_at: None,
            author: None,
            thumbnail: None,
            featured: false,
            tech_stack: Some(vec!["rust".to_string()]),
            config: None,
            external_links: None,
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["type"], "markdown");
        assert_eq!(value["createdAt"], "2024-03-01");
        assert_eq!(value["techStack"][0], "rust");
        assert!(value.get("updatedAt").is_none());
        assert!(value.get("author").is_none());
    }
}
