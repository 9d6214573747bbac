use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use argon2::password_hash::SaltString;
use html_escape::{decode_html_entities, encode_double_quoted_attribute};
use rand::rngs::OsRng;
use regex::Regex;
use serde::de::DeserializeOwned;
use spin_sdk::http::Request;
use uuid::Uuid;

use crate::core::errors::ApiError;

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub fn validate_uuid(id: &str) -> bool {
    Uuid::parse_str(id).is_ok()
}

/// Rejects an identifier that is empty or not a UUID.
pub fn require_id(id: &str, what: &str) -> Result<(), ApiError> {
    if id.is_empty() || !validate_uuid(id) {
        return Err(ApiError::InvalidArgument(format!("{} ID required", what)));
    }
    Ok(())
}

/// Parses the request body, mapping malformed JSON to `InvalidArgument`.
pub fn read_json<T: DeserializeOwned>(req: &Request) -> Result<T, ApiError> {
    serde_json::from_slice(req.body())
        .map_err(|e| ApiError::InvalidArgument(format!("Invalid request body: {}", e)))
}

pub fn bearer_token(req: &Request) -> Option<&str> {
    req.header("Authorization")?
        .as_str()?
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
}

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"https?://[^\s<]+").expect("Regex should compile")
    })
}

fn linkify(text: &str) -> String {
    url_regex().replace_all(text, |caps: &regex::Captures| {
        let url = &caps[0];
        let escaped_url = encode_double_quoted_attribute(&decode_html_entities(url)).to_string();
        format!(r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#, escaped_url, url)
    }).to_string()
}

/// Byte length of the tag at the start of `html`. Attribute values are
/// double-quoted in sanitized output and may contain `>`.
fn tag_len(html: &str) -> usize {
    let mut quoted = false;
    for (i, c) in html.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '>' if !quoted => return i + 1,
            _ => {}
        }
    }
    html.len()
}

/// Sanitizes user HTML and turns bare URLs into links.
///
/// Only text outside tags and outside existing anchors is linkified.
pub fn filter_content(content: &str) -> String {
    let clean = Builder::default()
        .link_rel(Some("noopener noreferrer"))
        .clean(content)
        .to_string();

    // sanitized text escapes `<`, so every remaining `<` opens a tag
    let mut out = String::with_capacity(clean.len());
    let mut in_anchor = false;
    let mut rest = clean.as_str();
    while let Some(start) = rest.find('<') {
        let (text, tail) = rest.split_at(start);
        out.push_str(&if in_anchor { text.to_string() } else { linkify(text) });

        let (tag, after) = tail.split_at(tag_len(tail));
        if tag.starts_with("<a ") || tag == "<a>" {
            in_anchor = true;
        } else if tag.starts_with("</a") {
            in_anchor = false;
        }
        out.push_str(tag);
        rest = after;
    }
    out.push_str(&if in_anchor { rest.to_string() } else { linkify(rest) });
    out
}

/// Strips every tag, leaving plain text.
pub fn sanitize_text(text: &str) -> String {
    Builder::default()
        .tags(HashSet::new())
        .clean(text)
        .to_string()
}

/// Number of visible characters once all markup is removed.
pub fn visible_len(html: &str) -> usize {
    decode_html_entities(&sanitize_text(html)).trim().chars().count()
}
