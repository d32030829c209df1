use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Display fields of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A post as rendered by the list view.
///
/// `first_publication_date` keeps the canonical ISO-8601 value from the CMS.
/// The display form is derived with [`crate::display_date`] and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    pub data: PostData,
}

impl Post {
    /// Map a raw CMS document to the post shape, leaving the date untouched
    pub fn from_document(doc: RawDocument) -> Self {
        let field = |name: &str| doc.data.get(name).map(as_text).unwrap_or_default();

        Post {
            data: PostData {
                title: field("title"),
                subtitle: field("subtitle"),
                author: field("author"),
            },
            uid: doc.uid,
            first_publication_date: doc.first_publication_date,
        }
    }

    /// Detail route for this post, if it has a uid
    pub fn href(&self) -> Option<String> {
        self.uid.as_ref().map(|uid| format!("/post/{}", uid))
    }
}

/// Paging cursor plus the posts loaded so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPagination {
    /// Opaque URL of the next page; `None` once pagination is exhausted
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub next_page: Option<String>,
    pub results: Vec<Post>,
}

/// Props handed from the static loader to the home page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeProps {
    pub posts_pagination: PostPagination,
}

/// Document as returned by the Prismic search API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// One page of the Prismic search API.
///
/// The same shape is returned for the initial query and for every
/// `next_page` URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub results_per_page: Option<u32>,
    #[serde(default)]
    pub results_size: Option<u32>,
    #[serde(default)]
    pub total_results_size: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub next_page: Option<String>,
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub prev_page: Option<String>,
    pub results: Vec<RawDocument>,
}

impl SearchResponse {
    /// Map every document to a [`Post`], keeping the response order
    pub fn into_pagination(self) -> PostPagination {
        PostPagination {
            next_page: self.next_page,
            results: self.results.into_iter().map(Post::from_document).collect(),
        }
    }
}

/// Flatten a Prismic field to plain text.
///
/// Key text fields are plain strings. Rich text fields are arrays of blocks,
/// whose `text` values are joined with a single space.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Accept any falsy cursor (`null`, `""`, `0`, `false`) as "no next page"
fn deserialize_cursor<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}
