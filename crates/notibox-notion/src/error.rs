use thiserror::Error;

/// Errors from the Notion boundary. Display strings are the human-readable
/// explanations shown inline to interactive callers.
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Authorization failed, check that the integration token is still valid")]
    Unauthorized,

    #[error("Page not found, it may have been deleted or the integration lost access")]
    NotFound,

    #[error("No access to the page, make sure the integration is added to it")]
    PermissionDenied,

    #[error("Could not extract a page ID from the URL")]
    BadPageUrl,

    #[error("No page named '{0}' was found in the workspace")]
    PageNotFoundByName(String),

    #[error("Notion API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, NotionError>;
