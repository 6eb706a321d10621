use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::{NotionError, Result};
use crate::page::extract_page_id;

const NOTION_VERSION: &str = "2022-06-28";

/// One listed entry from a page: text plus its checked state.
/// `checked` is `None` for plain paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub text: String,
    pub checked: Option<bool>,
}

/// Shared Notion REST client. Holds no token; every call authenticates
/// with the calling user's integration token.
pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check the token works at all (GET /v1/users/me).
    pub async fn validate_token(&self, token: &str) -> Result<()> {
        let resp = self
            .http
            .get(format!("{}/v1/users/me", self.base_url))
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// Resolve a page from user input: a Notion URL or a page name.
    /// Returns `(page_id, title)`.
    pub async fn resolve_page(&self, token: &str, input: &str) -> Result<(String, String)> {
        if input.starts_with("http") {
            let page_id = extract_page_id(input).ok_or(NotionError::BadPageUrl)?;
            let title = self.page_title(token, &page_id).await?;
            Ok((page_id, title))
        } else {
            self.find_page_by_name(token, input).await
        }
    }

    /// Append one unchecked to-do block to the page.
    pub async fn append_todo(&self, token: &str, page_id: &str, text: &str) -> Result<()> {
        let body = json!({
            "children": [{
                "object": "block",
                "type": "to_do",
                "to_do": {
                    "rich_text": [{
                        "type": "text",
                        "text": { "content": text }
                    }],
                    "checked": false
                }
            }]
        });
        let resp = self
            .http
            .patch(format!("{}/v1/blocks/{}/children", self.base_url, page_id))
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;
        check(resp).await?;
        debug!(page_id, "to-do appended");
        Ok(())
    }

    /// List up to `limit` child blocks as items. To-dos carry their checked
    /// state, paragraphs come back with `checked = None`, everything else
    /// is skipped.
    pub async fn list_items(
        &self,
        token: &str,
        page_id: &str,
        limit: usize,
    ) -> Result<Vec<TodoItem>> {
        let resp = self
            .http
            .get(format!("{}/v1/blocks/{}/children", self.base_url, page_id))
            .query(&[("page_size", limit.to_string())])
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;
        let body = check(resp).await?;

        let mut items = Vec::new();
        for block in body["results"].as_array().map(Vec::as_slice).unwrap_or(&[]) {
            match block["type"].as_str() {
                Some("to_do") => {
                    let text = rich_text_to_string(&block["to_do"]["rich_text"]);
                    if !text.is_empty() {
                        items.push(TodoItem {
                            text,
                            checked: Some(block["to_do"]["checked"].as_bool().unwrap_or(false)),
                        });
                    }
                }
                Some("paragraph") => {
                    let text = rich_text_to_string(&block["paragraph"]["rich_text"]);
                    if !text.is_empty() {
                        items.push(TodoItem {
                            text,
                            checked: None,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(items)
    }

    /// To-do items not yet marked complete, in page order.
    pub async fn unchecked_items(
        &self,
        token: &str,
        page_id: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let items = self.list_items(token, page_id, limit).await?;
        Ok(items
            .into_iter()
            .filter(|i| i.checked == Some(false))
            .map(|i| i.text)
            .collect())
    }

    // --- private helpers ---------------------------------------------------

    async fn page_title(&self, token: &str, page_id: &str) -> Result<String> {
        let resp = self
            .http
            .get(format!("{}/v1/pages/{}", self.base_url, page_id))
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;
        let page = check(resp).await?;
        Ok(title_of(&page))
    }

    async fn find_page_by_name(&self, token: &str, name: &str) -> Result<(String, String)> {
        let body = json!({
            "query": name,
            "filter": { "property": "object", "value": "page" }
        });
        let resp = self
            .http
            .post(format!("{}/v1/search", self.base_url))
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;
        let results = check(resp).await?;

        // First result wins, like the Notion UI's quick-find.
        let page = results["results"]
            .as_array()
            .and_then(|r| r.first())
            .ok_or_else(|| NotionError::PageNotFoundByName(name.to_string()))?;
        let page_id = page["id"]
            .as_str()
            .ok_or_else(|| NotionError::PageNotFoundByName(name.to_string()))?
            .to_string();
        Ok((page_id.clone(), title_of(page)))
    }
}

/// Map a response to its JSON body, translating HTTP failures into the
/// error taxonomy shown to interactive callers.
async fn check(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    match status.as_u16() {
        401 => Err(NotionError::Unauthorized),
        403 => Err(NotionError::PermissionDenied),
        404 => Err(NotionError::NotFound),
        _ if !status.is_success() => {
            let message = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            Err(NotionError::Api {
                status: status.as_u16(),
                message,
            })
        }
        _ => Ok(resp.json::<Value>().await?),
    }
}

/// Concatenate the plain text of a rich_text array.
fn rich_text_to_string(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or(&[])
        .iter()
        .filter_map(|seg| seg["plain_text"].as_str())
        .collect()
}

/// Extract a page's title from its properties; fall back to "Untitled".
fn title_of(page: &Value) -> String {
    let properties = page["properties"].as_object();
    if let Some(props) = properties {
        for prop in props.values() {
            if prop["type"].as_str() == Some("title") {
                let title = rich_text_to_string(&prop["title"]);
                if !title.is_empty() {
                    return title;
                }
            }
        }
    }
    "Untitled".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rich_text_concatenation() {
        let rt = json!([
            { "plain_text": "buy " },
            { "plain_text": "milk" }
        ]);
        assert_eq!(rich_text_to_string(&rt), "buy milk");
        assert_eq!(rich_text_to_string(&json!([])), "");
        assert_eq!(rich_text_to_string(&json!(null)), "");
    }

    #[test]
    fn title_from_properties() {
        let page = json!({
            "properties": {
                "Name": {
                    "type": "title",
                    "title": [{ "plain_text": "Inbox" }]
                }
            }
        });
        assert_eq!(title_of(&page), "Inbox");
    }

    #[test]
    fn title_falls_back_to_untitled() {
        assert_eq!(title_of(&json!({})), "Untitled");
        let no_title_prop = json!({
            "properties": { "Tags": { "type": "multi_select" } }
        });
        assert_eq!(title_of(&no_title_prop), "Untitled");
    }
}
