use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    constants::MAX_COOKIE_DAYS,
    error::{LoadError, SaveError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CookieOptions {
    pub days: i64,
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: SameSite,
    pub http_only: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            days: 7,
            domain: None,
            secure: true,
            same_site: SameSite::None,
            http_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: SameSite,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: &str, value: &str, options: &CookieOptions, now: DateTime<Utc>) -> Self {
        let days = options.days.clamp(-MAX_COOKIE_DAYS, MAX_COOKIE_DAYS);
        let expires = TimeDelta::try_days(days)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now);
        Self {
            name: name.to_string(),
            value: value.to_string(),
            expires,
            domain: options.domain.clone(),
            secure: options.secure,
            same_site: options.same_site,
            http_only: options.http_only,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// `Set-Cookie` header value for this cookie.
    pub fn to_header(&self) -> String {
        let mut header = format!(
            "{}={}; Path=/; Expires={}; SameSite={}",
            self.name,
            encode_component(&self.value),
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.same_site
        );
        if self.secure {
            header.push_str("; Secure");
        }
        if let Some(domain) = &self.domain {
            header.push_str(&format!("; Domain={domain}"));
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header
    }
}

/// `Set-Cookie` value that removes `name` from a browser.
pub fn deletion_header(name: &str) -> String {
    format!("{name}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT; SameSite=None; Secure")
}

/// Read `name` out of a `Cookie` request header.
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| decode_component(value))
        .filter(|value| !value.is_empty())
}

/// Named string values with expiry, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct CookieStore {
    path: Option<PathBuf>,
    cookies: BTreeMap<String, Cookie>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the jar at `path`. A missing file is an empty jar.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let cookies = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str::<Vec<Cookie>>(&contents)?
                .into_iter()
                .map(|cookie| (cookie.name.clone(), cookie))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            cookies,
        })
    }

    /// Write the jar back to its file; in-memory jars are left alone.
    pub async fn save(&self) -> Result<(), SaveError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let now = Utc::now();
        let live: Vec<&Cookie> = self
            .cookies
            .values()
            .filter(|cookie| !cookie.is_expired(now))
            .collect();
        tokio::fs::write(path, serde_json::to_string_pretty(&live)?).await?;
        Ok(())
    }

    pub fn set(&mut self, name: &str, value: &str, options: &CookieOptions) -> &Cookie {
        self.set_at(name, value, options, Utc::now())
    }

    pub fn set_at(
        &mut self,
        name: &str,
        value: &str,
        options: &CookieOptions,
        now: DateTime<Utc>,
    ) -> &Cookie {
        tracing::debug!(%name, days = options.days, "setting cookie");
        let cookie = Cookie::new(name, value, options, now);
        self.cookies.insert(name.to_string(), cookie);
        &self.cookies[name]
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_at(name, Utc::now())
    }

    /// Expired cookies read as absent.
    pub fn get_at(&self, name: &str, now: DateTime<Utc>) -> Option<&str> {
        self.cookies
            .get(name)
            .filter(|cookie| !cookie.is_expired(now))
            .map(|cookie| cookie.value.as_str())
            .filter(|value| !value.is_empty())
    }

    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.get(name)
    }

    pub fn delete(&mut self, name: &str) -> Option<Cookie> {
        self.cookies.remove(name)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

// Same character set as JavaScript's encodeURIComponent.
fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

fn decode_component(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                decoded.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_digit(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|digit| digit as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn header_uses_defaults() {
        let cookie = Cookie::new("authToken", "abc 1/2", &CookieOptions::default(), now());
        assert_eq!(
            cookie.to_header(),
            "authToken=abc%201%2F2; Path=/; Expires=Mon, 17 Mar 2025 12:00:00 GMT; SameSite=None; Secure"
        );
    }

    #[test]
    fn header_with_all_attributes() {
        let options = CookieOptions {
            days: 1,
            domain: Some(".example.com".to_string()),
            secure: false,
            same_site: SameSite::Lax,
            http_only: true,
        };
        let cookie = Cookie::new("token", "t", &options, now());
        assert_eq!(
            cookie.to_header(),
            "token=t; Path=/; Expires=Tue, 11 Mar 2025 12:00:00 GMT; SameSite=Lax; Domain=.example.com; HttpOnly"
        );
    }

    #[test]
    fn expired_values_read_as_absent() {
        let mut store = CookieStore::new();
        let options = CookieOptions {
            days: 1,
            ..CookieOptions::default()
        };
        store.set_at("token", "abc", &options, now());
        assert_eq!(store.get_at("token", now()), Some("abc"));
        assert_eq!(store.get_at("token", now() + Duration::days(1)), None);
        assert_eq!(store.get_at("missing", now()), None);
    }

    #[test]
    fn out_of_range_lifetimes_are_clamped() {
        let forever = CookieOptions {
            days: i64::MAX,
            ..CookieOptions::default()
        };
        let cookie = Cookie::new("token", "abc", &forever, now());
        assert!(!cookie.is_expired(now()));
        assert_eq!(cookie.expires, now() + Duration::days(MAX_COOKIE_DAYS));

        let past = CookieOptions {
            days: i64::MIN,
            ..CookieOptions::default()
        };
        let cookie = Cookie::new("token", "abc", &past, now());
        assert!(cookie.is_expired(now()));
    }

    #[test]
    fn delete_removes_value() {
        let mut store = CookieStore::new();
        store.set("authToken", "abc", &CookieOptions::default());
        assert!(store.delete("authToken").is_some());
        assert_eq!(store.get("authToken"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn parses_cookie_header() {
        let header = "theme=dark; authToken=abc%201%2F2; other=x";
        assert_eq!(
            parse_cookie_header(header, "authToken").as_deref(),
            Some("abc 1/2")
        );
        assert_eq!(parse_cookie_header(header, "token"), None);
        assert_eq!(parse_cookie_header("token=", "token"), None);
        assert_eq!(parse_cookie_header("bad=%zz", "bad").as_deref(), Some("%zz"));
    }

    #[test]
    fn deletion_header_expires_in_the_past() {
        assert_eq!(
            deletion_header("authToken"),
            "authToken=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT; SameSite=None; Secure"
        );
    }

    #[tokio::test]
    async fn persists_to_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let mut store = CookieStore::open(&path).await.unwrap();
        assert!(store.is_empty());
        store.set("authToken", "abc", &CookieOptions::default());

        // Act
        let saved = store.save().await;
        let reopened = CookieStore::open(&path).await;

        // Assert
        assert!(saved.is_ok(), "Failed to save cookies: {:?}", saved.unwrap_err());
        let reopened = reopened.unwrap();
        assert_eq!(reopened.get("authToken"), Some("abc"));
        assert_eq!(reopened.cookie("authToken"), store.cookie("authToken"));
    }
}
