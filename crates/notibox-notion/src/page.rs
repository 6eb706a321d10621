//! Page-ID extraction from Notion URLs.
//!
//! Notion links look like `https://www.notion.so/Page-Name-{id}` or
//! `https://{workspace}.notion.site/Page-Name-{id}`, where the ID is either
//! a dashed UUID or 32 bare hex characters at the end of the path.

/// Extract a page ID from a Notion URL, normalised to dashed UUID form.
pub fn extract_page_id(url: &str) -> Option<String> {
    if let Some(id) = find_dashed_uuid(url) {
        return Some(id);
    }

    // Fall back to 32 trailing hex chars on the last path segment.
    let last = url
        .split('?')
        .next()
        .unwrap_or("")
        .rsplit('/')
        .next()
        .unwrap_or("");
    let bytes = last.as_bytes();
    if bytes.len() >= 32 {
        let tail = &bytes[bytes.len() - 32..];
        if tail.iter().all(|b| b.is_ascii_hexdigit()) {
            // Verified ASCII hex above, so the conversion cannot fail.
            return std::str::from_utf8(tail).ok().map(hyphenate);
        }
    }

    None
}

/// Scan for a dashed UUID (8-4-4-4-12 hex) anywhere in the URL.
fn find_dashed_uuid(url: &str) -> Option<String> {
    let bytes = url.as_bytes();
    if bytes.len() < 36 {
        return None;
    }
    for i in 0..=bytes.len() - 36 {
        let window = &bytes[i..i + 36];
        if is_dashed_uuid(window) {
            return std::str::from_utf8(window).ok().map(str::to_string);
        }
    }
    None
}

fn is_dashed_uuid(bytes: &[u8]) -> bool {
    bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            8 | 13 | 18 | 23 => b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

/// Insert dashes into a 32-char hex ID: 8-4-4-4-12.
fn hyphenate(hex: &str) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        &hex[..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..]
    )
}
