use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use url::{Origin, Url};

/// Cookie store for a single backend origin, clearable on session end.
///
/// Cookies are keyed by name only and are neither stored from nor sent to any
/// origin other than the backend's. Redirects to another host therefore go
/// out without the session credential.
pub struct SessionCookieJar {
    origin: Origin,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl SessionCookieJar {
    pub fn for_url(base_url: &Url) -> Self {
        Self {
            origin: base_url.origin(),
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn clear(&self) {
        let mut cookies = self.lock();
        debug!(count = cookies.len(), "clearing session cookies");
        cookies.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.cookies.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin
    }

    fn apply(&self, raw: &str) {
        let Some(cookie) = parse_set_cookie(raw) else {
            return;
        };
        let mut cookies = self.lock();
        match cookie {
            SetCookie::Store { name, value } => {
                cookies.insert(name, value);
            }
            SetCookie::Remove { name } => {
                cookies.remove(&name);
            }
        }
    }
}

impl CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if !self.same_origin(url) {
            warn!(host = ?url.host_str(), "ignoring cookies from foreign origin");
            return;
        }
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.apply(raw);
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if !self.same_origin(url) {
            return None;
        }
        let cookies = self.lock();
        if cookies.is_empty() {
            return None;
        }
        let joined = cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SetCookie {
    Store { name: String, value: String },
    Remove { name: String },
}

fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');

    let expired = parts.any(|attr| {
        let Some((key, val)) = attr.split_once('=') else {
            return false;
        };
        key.trim().eq_ignore_ascii_case("max-age")
            && val.trim().parse::<i64>().map(|age| age <= 0).unwrap_or(false)
    });

    if expired || value.is_empty() {
        Some(SetCookie::Remove {
            name: name.to_string(),
        })
    } else {
        Some(SetCookie::Store {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}
