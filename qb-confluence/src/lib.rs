//! # qb-confluence
//!
//! A minimal Confluence REST client covering exactly what Query Bridge
//! ingestion needs: listing spaces, listing the pages of a space with
//! their storage-format bodies and attachments, and downloading
//! attachment bytes.
//!
//! Requests authenticate with basic auth (user + API token). Failures
//! surface as [`ConfluenceError`]; callers treat per-page or
//! per-attachment failures as reportable and non-fatal.
//!
//! ```rust,ignore
//! use qb_confluence::ConfluenceClient;
//!
//! let client = ConfluenceClient::new("https://wiki.example.com", "user", "token")?;
//! for space in client.list_spaces().await? {
//!     println!("{}: {}", space.key, space.name);
//! }
//! ```

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Page size used for paginated listing endpoints.
const PAGE_LIMIT: usize = 50;

/// Errors from the Confluence REST API.
#[derive(Debug, Error)]
pub enum ConfluenceError {
    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("Confluence request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("Confluence API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        message: String,
    },

    /// The configured base URL is unusable.
    #[error("invalid Confluence base URL: {0}")]
    BaseUrl(String),
}

/// A convenience result type for client operations.
pub type Result<T> = std::result::Result<T, ConfluenceError>;

/// A Confluence space: a named bucket of pages.
#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    /// The space key used in content queries.
    pub key: String,
    /// Human-readable space name.
    pub name: String,
}

/// An attachment on a page.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Attachment file name.
    pub title: String,
    /// Declared media type, when the API reports one.
    pub media_type: Option<String>,
    /// Server-relative download path.
    pub download_path: Option<String>,
}

impl Attachment {
    /// Whether this attachment is declared as a PDF.
    pub fn is_pdf(&self) -> bool {
        self.media_type.as_deref() == Some("application/pdf")
    }
}

/// A page of a space: title, storage-format body markup, attachments.
#[derive(Debug, Clone)]
pub struct Page {
    /// Content id.
    pub id: String,
    /// Page title.
    pub title: String,
    /// Body in Confluence storage format (XHTML).
    pub body_html: String,
    /// Attachments on the page.
    pub attachments: Vec<Attachment>,
}

// ── REST response shapes ───────────────────────────────────────────

#[derive(Deserialize)]
struct SpaceList {
    results: Vec<Space>,
}

#[derive(Deserialize)]
struct ContentList {
    results: Vec<ContentEntry>,
}

#[derive(Deserialize)]
struct ContentEntry {
    id: String,
    title: String,
    body: Option<Body>,
    children: Option<Children>,
}

#[derive(Deserialize)]
struct Body {
    storage: Option<Storage>,
}

#[derive(Deserialize)]
struct Storage {
    value: String,
}

#[derive(Deserialize)]
struct Children {
    attachment: Option<AttachmentList>,
}

#[derive(Deserialize)]
struct AttachmentList {
    results: Vec<AttachmentEntry>,
}

#[derive(Deserialize)]
struct AttachmentEntry {
    title: String,
    extensions: Option<Extensions>,
    #[serde(rename = "_links")]
    links: Option<Links>,
}

#[derive(Deserialize)]
struct Extensions {
    #[serde(rename = "mediaType")]
    media_type: Option<String>,
}

#[derive(Deserialize)]
struct Links {
    download: Option<String>,
}

impl From<ContentEntry> for Page {
    fn from(entry: ContentEntry) -> Self {
        let body_html =
            entry.body.and_then(|b| b.storage).map(|s| s.value).unwrap_or_default();
        let attachments = entry
            .children
            .and_then(|c| c.attachment)
            .map(|list| {
                list.results
                    .into_iter()
                    .map(|a| Attachment {
                        title: a.title,
                        media_type: a.extensions.and_then(|e| e.media_type),
                        download_path: a.links.and_then(|l| l.download),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Page { id: entry.id, title: entry.title, body_html, attachments }
    }
}

/// A client for one Confluence instance.
///
/// Cheap to clone is not a goal; construct one per process and share it.
pub struct ConfluenceClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    api_token: String,
}

impl ConfluenceClient {
    /// Create a client for the instance at `base_url` (scheme + host, no
    /// trailing slash required).
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfluenceError::BaseUrl(base_url));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user: user.into(),
            api_token: api_token.into(),
        })
    }

    async fn get(&self, url: String) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.api_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ConfluenceError::Api { status, message });
        }
        Ok(response)
    }

    /// List all spaces of the instance, following pagination.
    pub async fn list_spaces(&self) -> Result<Vec<Space>> {
        let mut spaces = Vec::new();
        let mut start = 0;

        loop {
            let url = format!(
                "{}/rest/api/space?limit={PAGE_LIMIT}&start={start}",
                self.base_url
            );
            let page: SpaceList = self.get(url).await?.json().await?;
            let fetched = page.results.len();
            spaces.extend(page.results);
            if fetched < PAGE_LIMIT {
                break;
            }
            start += fetched;
        }

        debug!(spaces = spaces.len(), "listed Confluence spaces");
        Ok(spaces)
    }

    /// List all pages of a space with bodies and attachment descriptors,
    /// following pagination.
    pub async fn list_pages(&self, space_key: &str) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        let mut start = 0;

        loop {
            let url = format!(
                "{}/rest/api/content?spaceKey={space_key}&type=page\
                 &expand=body.storage,children.attachment&limit={PAGE_LIMIT}&start={start}",
                self.base_url
            );
            let batch: ContentList = self.get(url).await?.json().await?;
            let fetched = batch.results.len();
            pages.extend(batch.results.into_iter().map(Page::from));
            if fetched < PAGE_LIMIT {
                break;
            }
            start += fetched;
        }

        debug!(space = space_key, pages = pages.len(), "listed Confluence pages");
        Ok(pages)
    }

    /// Download the raw bytes of an attachment.
    ///
    /// # Errors
    ///
    /// Fails when the attachment carries no download link or the fetch
    /// fails; callers skip the attachment and continue.
    pub async fn download_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let path = attachment.download_path.as_deref().ok_or_else(|| ConfluenceError::Api {
            status: 404,
            message: format!("attachment '{}' has no download link", attachment.title),
        })?;
        let url = format!("{}{path}", self.base_url);
        let bytes = self.get(url).await?.bytes().await?;
        debug!(attachment = %attachment.title, bytes = bytes.len(), "downloaded attachment");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_must_carry_a_scheme() {
        assert!(ConfluenceClient::new("wiki.example.com", "u", "t").is_err());
        assert!(ConfluenceClient::new("https://wiki.example.com/", "u", "t").is_ok());
    }

    #[test]
    fn content_entries_parse_and_convert_to_pages() {
        let body = r#"{
            "results": [{
                "id": "123",
                "title": "Runbook",
                "body": {"storage": {"value": "<p>restart the service</p>"}},
                "children": {"attachment": {"results": [{
                    "title": "diagram.pdf",
                    "extensions": {"mediaType": "application/pdf"},
                    "_links": {"download": "/download/attachments/123/diagram.pdf"}
                }]}}
            }]
        }"#;
        let parsed: ContentList = serde_json::from_str(body).unwrap();
        let pages: Vec<Page> = parsed.results.into_iter().map(Page::from).collect();

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title, "Runbook");
        assert_eq!(pages[0].body_html, "<p>restart the service</p>");
        assert_eq!(pages[0].attachments.len(), 1);
        assert!(pages[0].attachments[0].is_pdf());
        assert_eq!(
            pages[0].attachments[0].download_path.as_deref(),
            Some("/download/attachments/123/diagram.pdf")
        );
    }

    #[test]
    fn missing_body_and_attachments_default_to_empty() {
        let body = r#"{"results": [{"id": "9", "title": "Stub"}]}"#;
        let parsed: ContentList = serde_json::from_str(body).unwrap();
        let page = Page::from(parsed.results.into_iter().next().unwrap());
        assert!(page.body_html.is_empty());
        assert!(page.attachments.is_empty());
    }

    #[test]
    fn space_list_parses() {
        let body = r#"{"results": [{"key": "ENG", "name": "Engineering"}]}"#;
        let parsed: SpaceList = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results[0].key, "ENG");
    }
}
