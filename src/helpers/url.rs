//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters left alone by `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Characters left alone by `encodeURI`
const URI: &AsciiSet = &URI_COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about") // -> "https://example.com/about"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = config.base_url();
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Percent-encode a whole URL the way `encodeURI` does
pub fn encode_uri(s: &str) -> String {
    utf8_percent_encode(s, URI).to_string()
}

/// Percent-encode a URL component the way `encodeURIComponent` does
pub fn encode_uri_component(s: &str) -> String {
    utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Listing URL filtered by category
pub fn category_url(category: &str) -> String {
    format!("/blog?category={}", encode_uri_component(category))
}

/// Listing URL filtered by tag
pub fn tag_url(tag: &str) -> String {
    format!("/blog?tag={}", encode_uri_component(tag))
}
