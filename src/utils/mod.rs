//! Small helpers shared by the request handlers.

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Deterministic avatar for a username.
pub fn avatar_url(username: &str) -> String {
    let seed: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("{}?seed={}", AVATAR_BASE_URL, seed)
}

/// Treat absent and empty inputs alike.
pub fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
