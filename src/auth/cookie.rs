//! Set-Cookie serialization and Cookie header lookup.

use axum::http::{header::COOKIE, HeaderMap};
use time::{
    format_description::FormatItem,
    macros::{datetime, format_description},
    OffsetDateTime, UtcOffset,
};

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Effectively "never" from the browser's point of view.
pub const FAR_FUTURE: OffsetDateTime = datetime!(9999-12-31 12:00:00 UTC);

const HTTP_DATE: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("invalid cookie name {0:?}")]
    InvalidName(String),
    #[error("invalid cookie value")]
    InvalidValue,
    #[error("format expires: {0}")]
    Expires(#[from] time::error::Format),
}

#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    pub http_only: bool,
    pub same_site_lax: bool,
    pub path: Option<String>,
    pub expires: Option<OffsetDateTime>,
}

impl CookieOptions {
    /// Attributes for the session cookie handed out at signup.
    pub fn session() -> Self {
        Self {
            http_only: true,
            same_site_lax: true,
            path: Some("/".into()),
            expires: Some(FAR_FUTURE),
        }
    }
}

/// Render a `Set-Cookie` header value.
pub fn serialize(name: &str, value: &str, opts: &CookieOptions) -> Result<String, CookieError> {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(CookieError::InvalidName(name.to_owned()));
    }
    if !value.bytes().all(is_cookie_octet) {
        return Err(CookieError::InvalidValue);
    }

    let mut out = format!("{name}={value}");
    if opts.http_only {
        out.push_str("; HttpOnly");
    }
    if opts.same_site_lax {
        out.push_str("; SameSite=Lax");
    }
    if let Some(path) = &opts.path {
        if !path.bytes().all(|b| is_cookie_octet(b) || b == b' ') {
            return Err(CookieError::InvalidValue);
        }
        out.push_str("; Path=");
        out.push_str(path);
    }
    if let Some(expires) = opts.expires {
        let formatted = expires.to_offset(UtcOffset::UTC).format(HTTP_DATE)?;
        out.push_str("; Expires=");
        out.push_str(&formatted);
    }
    Ok(out)
}

/// Look up a cookie by name across all `Cookie` headers.
pub fn find(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"').to_owned())
        .filter(|v| !v.is_empty())
}

// RFC 6265 cookie-octet
fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

// RFC 7230 tchar
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
