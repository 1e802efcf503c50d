//! Google Drive backend (Drive API v2).
//!
//! Documents are discovered with a files query scoped to one parent folder,
//! excluding trashed items and filtered to the transcript mime type; listing
//! follows `nextPageToken` until the folder is exhausted. Content is
//! downloaded with `alt=media`. A rename is a metadata-only `PATCH` of the
//! `title` field — Drive commits it in that one call and tolerates duplicate
//! titles, so unlike [`super::LocalStore`] there is **no** collision probe
//! here.
//!
//! Authentication uses an OAuth2 bearer access token supplied by the caller
//! (for example `gcloud auth print-access-token`); the store attaches it to
//! every request and never refreshes it.

use super::{DocumentHandle, DocumentStore};
use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/drive/v2";

/// Mime type remote discovery filters on.
pub const TRANSCRIPT_MIME: &str = "application/pdf";

/// Fields requested per page of the files query.
const LIST_FIELDS: &str = "items(id,title,mimeType),nextPageToken";

const PAGE_SIZE: &str = "1000";

/// A Google Drive folder of transcript PDFs.
pub struct DriveStore {
    client: reqwest::Client,
    folder_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    items: Vec<DriveFile>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    title: String,
}

#[derive(Debug, Serialize)]
struct TitlePatch<'a> {
    title: &'a str,
}

/// Fold one page of the files listing into `handles` and answer the token
/// for the next page.
///
/// `None` ends the listing. An empty `nextPageToken` counts as absent:
/// requesting a page with an empty token would serve the first page again
/// and the loop would never terminate.
fn absorb_page(page: FileList, handles: &mut Vec<DocumentHandle>) -> Option<String> {
    handles.extend(page.items.into_iter().map(|f| DocumentHandle::Remote {
        id: f.id,
        title: f.title,
    }));
    page.next_page_token.filter(|token| !token.is_empty())
}

impl DriveStore {
    /// Create a store over one Drive folder.
    ///
    /// `token` is a ready-to-use OAuth2 access token with Drive scope;
    /// `timeout_secs` bounds every request including the content downloads.
    pub fn new(
        folder_id: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network {
                context: "building the Drive HTTP client".into(),
                source: e,
            })?;
        Ok(Self {
            client,
            folder_id: folder_id.into(),
            token: token.into(),
        })
    }

    /// The files query selecting untrashed transcript PDFs in the folder.
    fn files_query(folder_id: &str) -> String {
        format!("'{folder_id}' in parents and trashed=false and mimeType='{TRANSCRIPT_MIME}'")
    }

    fn network_error(context: &str, source: reqwest::Error) -> StoreError {
        StoreError::Network {
            context: context.to_string(),
            source,
        }
    }

    /// Check the HTTP status, turning non-2xx answers into [`StoreError::Api`]
    /// with a bounded slice of the response body as detail.
    async fn ensure_success(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let detail: String = body.chars().take(240).collect();
        Err(StoreError::Api {
            context: context.to_string(),
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl DocumentStore for DriveStore {
    async fn list(&self) -> Result<Vec<DocumentHandle>, StoreError> {
        let context = "listing the Drive folder";
        let query = Self::files_query(&self.folder_id);
        let mut handles = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{API_BASE}/files"))
                .bearer_auth(&self.token)
                .query(&[
                    ("q", query.as_str()),
                    ("fields", LIST_FIELDS),
                    ("maxResults", PAGE_SIZE),
                ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Self::network_error(context, e))?;
            let response = Self::ensure_success(response, context).await?;
            let page: FileList = response
                .json()
                .await
                .map_err(|e| Self::network_error(context, e))?;

            match absorb_page(page, &mut handles) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(folder_id = %self.folder_id, count = handles.len(), "listed Drive folder");
        Ok(handles)
    }

    async fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, StoreError> {
        let DocumentHandle::Remote { id, title } = handle else {
            return Err(StoreError::UnsupportedHandle { backend: "Drive" });
        };
        let context = format!("downloading '{title}'");

        let response = self
            .client
            .get(format!("{API_BASE}/files/{id}"))
            .query(&[("alt", "media")])
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::network_error(&context, e))?;
        let response = Self::ensure_success(response, &context).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::network_error(&context, e))?;

        debug!(id = %id, size = bytes.len(), "downloaded Drive file");
        Ok(bytes.to_vec())
    }

    async fn rename(
        &self,
        handle: &DocumentHandle,
        target_name: &str,
    ) -> Result<String, StoreError> {
        let DocumentHandle::Remote { id, title } = handle else {
            return Err(StoreError::UnsupportedHandle { backend: "Drive" });
        };
        let context = format!("renaming '{title}'");

        let response = self
            .client
            .patch(format!("{API_BASE}/files/{id}"))
            .bearer_auth(&self.token)
            .json(&TitlePatch { title: target_name })
            .send()
            .await
            .map_err(|e| Self::network_error(&context, e))?;
        Self::ensure_success(response, &context).await?;

        debug!(id = %id, title = %target_name, "updated Drive title");
        Ok(target_name.to_string())
    }

    fn location(&self) -> String {
        format!("Drive folder '{}'", self.folder_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(files: &[(&str, &str)], next: Option<&str>) -> FileList {
        FileList {
            items: files
                .iter()
                .map(|(id, title)| DriveFile {
                    id: id.to_string(),
                    title: title.to_string(),
                })
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    #[test]
    fn listing_accumulates_pages_until_the_token_runs_out() {
        let mut handles = Vec::new();

        let next = absorb_page(
            page(&[("f1", "a.pdf"), ("f2", "b.pdf")], Some("page-2")),
            &mut handles,
        );
        assert_eq!(next.as_deref(), Some("page-2"));

        let next = absorb_page(page(&[("f3", "c.pdf")], None), &mut handles);
        assert_eq!(next, None);

        let titles: Vec<String> = handles.iter().map(DocumentHandle::display_name).collect();
        assert_eq!(titles, ["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn empty_page_token_ends_the_listing() {
        let mut handles = Vec::new();
        let next = absorb_page(page(&[("f1", "a.pdf")], Some("")), &mut handles);
        assert_eq!(next, None);
        assert_eq!(handles.len(), 1);
    }

    #[test]
    fn files_query_scopes_folder_and_mime() {
        let q = DriveStore::files_query("1AbCdEf");
        assert_eq!(
            q,
            "'1AbCdEf' in parents and trashed=false and mimeType='application/pdf'"
        );
    }

    #[test]
    fn file_list_deserializes_with_and_without_next_page() {
        let page: FileList = serde_json::from_str(
            r#"{"items":[{"id":"f1","title":"Bảng điểm.pdf"},{"id":"f2","title":"scan.pdf"}],"nextPageToken":"tok"}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Bảng điểm.pdf");
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));

        let last: FileList = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(last.items.is_empty());
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn title_patch_serializes_to_the_drive_shape() {
        let body = serde_json::to_string(&TitlePatch {
            title: "2410001_Bảng điểm_Nguyễn Văn A.pdf",
        })
        .unwrap();
        assert_eq!(body, r#"{"title":"2410001_Bảng điểm_Nguyễn Văn A.pdf"}"#);
    }
}
