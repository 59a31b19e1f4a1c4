//! Set-Cookie helpers over [`http::HeaderMap`].

use cookie::Cookie;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue};

/// Parse every `Set-Cookie` header on a response.
///
/// Values that do not parse as cookies are skipped.
pub fn response_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse_encoded(value).ok())
        .map(Cookie::into_owned)
        .collect()
}

/// Remove every `Set-Cookie` entry matching the exact (name, path, domain)
/// triple.
///
/// Cookies sharing a name but differing in path or domain are distinct
/// entries and survive. Values that cannot be parsed are preserved.
pub fn remove_cookie(headers: &mut HeaderMap, name: &str, path: Option<&str>, domain: Option<&str>) {
    let retained: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter(|value| {
            match value
                .to_str()
                .ok()
                .and_then(|v| Cookie::parse_encoded(v).ok())
            {
                Some(cookie) => {
                    !(cookie.name() == name && cookie.path() == path && cookie.domain() == domain)
                }
                None => true,
            }
        })
        .cloned()
        .collect();

    headers.remove(SET_COOKIE);
    for value in retained {
        headers.append(SET_COOKIE, value);
    }
}
