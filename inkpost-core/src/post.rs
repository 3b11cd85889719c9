//! The blog post record and the helpers the admin form uses to build it.
//!
//! Posts themselves live in an external datastore; this module only models the
//! record shape handed to it (camelCase on the wire) and the defaults applied
//! when a draft is saved.

use std::{str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default excerpt length in characters.
pub const DEFAULT_EXCERPT_LENGTH: usize = 160;

static SLUG_STRIP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_ ]+").expect("Invalid slug strip pattern"));

static SLUG_SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("Invalid slug space pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Technology,
    AiTools,
    Coding,
    Saas,
}

/// Display metadata for a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub id: Category,
    pub name: &'static str,
    pub description: &'static str,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Technology,
        Category::AiTools,
        Category::Coding,
        Category::Saas,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::AiTools => "ai-tools",
            Category::Coding => "coding",
            Category::Saas => "saas",
        }
    }

    pub fn info(&self) -> CategoryInfo {
        let (name, description) = match self {
            Category::Technology => ("Technology", "Latest trends and news in the tech world"),
            Category::AiTools => ("AI Tools", "Reviews and guides for the latest AI tools"),
            Category::Coding => ("Coding", "Tutorials and tips for developers"),
            Category::Saas => (
                "SaaS",
                "Comparisons and reviews of Software as a Service products",
            ),
        };
        CategoryInfo {
            id: *self,
            name,
            description,
        }
    }

    /// Parse a category id, falling back to [`Category::Technology`] for unknown ids.
    pub fn from_id_or_default(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.id() == s)
            .ok_or_else(|| ValidationError::InvalidField(format!("Unknown category: {s}")))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A post as stored in the external datastore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub slug: String,
    pub category: Category,
    pub excerpt: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub author: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_keywords: Option<String>,
}

impl Post {
    pub fn is_featured(&self) -> bool {
        self.featured.unwrap_or(false)
    }

    pub fn category_info(&self) -> CategoryInfo {
        self.category.info()
    }

    /// Publication date formatted for display.
    pub fn display_date(&self) -> String {
        format_date(self.published_at)
    }
}

/// The admin form contents before defaults are applied. Every field may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostDraft {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub category: Option<Category>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub author: Option<String>,
    pub featured: Option<bool>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<String>,
}

impl PostDraft {
    /// Build the record to save.
    ///
    /// When editing, pass the stored post as `existing`: its id and publication
    /// date carry over. New posts are published at `now`.
    pub fn into_post(self, now: DateTime<Utc>, existing: Option<&Post>) -> Post {
        let title = non_empty(self.title);
        // The slug follows the title as typed; an untitled draft gets an empty slug.
        let slug = non_empty(self.slug)
            .unwrap_or_else(|| generate_slug(title.as_deref().unwrap_or_default()));
        let title = title.unwrap_or_else(|| "Untitled Post".to_string());

        Post {
            id: existing.and_then(|post| post.id.clone()),
            slug,
            category: self.category.unwrap_or_default(),
            excerpt: self.excerpt.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            cover_image: Some(self.cover_image.unwrap_or_default()),
            author: non_empty(self.author).unwrap_or_else(|| "Anonymous".to_string()),
            published_at: existing.map_or(now, |post| post.published_at),
            featured: Some(self.featured.unwrap_or(false)),
            seo_title: Some(self.seo_title.unwrap_or_default()),
            seo_description: Some(self.seo_description.unwrap_or_default()),
            seo_keywords: Some(self.seo_keywords.unwrap_or_default()),
            title,
        }
    }
}

/// Turn a title into a URL slug.
///
/// Lowercases, drops everything but ASCII letters, digits, underscores and spaces,
/// then replaces each run of spaces with a single `-`.
pub fn generate_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP_REGEX.replace_all(&lowered, "");
    SLUG_SPACE_REGEX.replace_all(&stripped, "-").into_owned()
}

/// Shorten `content` to at most `max_len` characters, appending `...` when cut.
pub fn generate_excerpt(content: &str, max_len: usize) -> String {
    if content.chars().count() <= max_len {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_len).collect();
    format!("{}...", truncated.trim())
}

/// Format an instant as e.g. `March 5, 2024`.
pub fn format_date(instant: DateTime<Utc>) -> String {
    instant.format("%B %-d, %Y").to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
