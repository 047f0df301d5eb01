//! URL decomposition into named parts
//!
//! Well-formed absolute URLs go through the `url` crate. Anything it
//! rejects (relative references, broken authorities) is split by hand on a
//! best-effort basis, so decomposition never fails.

use std::collections::HashMap;

use ::url::{form_urlencoded, Url};

use crate::types::{PartValue, Parts};

// =============================================================================
// Part Names
// =============================================================================

pub const HREF: &str = "href";
pub const SCHEME: &str = "scheme";
pub const PROTOCOL: &str = "protocol";
pub const AUTH: &str = "auth";
pub const HOST: &str = "host";
pub const HOSTNAME: &str = "hostname";
pub const PORT: &str = "port";
pub const PATHNAME: &str = "pathname";
pub const SEARCH: &str = "search";
pub const QUERY: &str = "query";
pub const PATH: &str = "path";
pub const HASH: &str = "hash";

/// Every part name `decompose` can produce.
pub const PART_NAMES: [&str; 12] = [
    HREF, SCHEME, PROTOCOL, AUTH, HOST, HOSTNAME, PORT, PATHNAME, SEARCH, QUERY, PATH, HASH,
];

/// Is `name` a part that `decompose` can produce?
pub fn is_known_part(name: &str) -> bool {
    PART_NAMES.contains(&name)
}

// =============================================================================
// Decomposition
// =============================================================================

/// Split a URL into named parts. Never fails.
pub fn decompose(href: &str) -> Parts {
    match Url::parse(href.trim()) {
        Ok(url) => from_url(&url),
        Err(err) => {
            log::debug!("Lenient decomposition of {:?}: {}", href, err);
            decompose_lenient(href)
        }
    }
}

fn from_url(url: &Url) -> Parts {
    let mut parts = Parts::new();
    let scheme = url.scheme();

    let auth = match (url.username(), url.password()) {
        ("", None) => None,
        (user, None) => Some(user.to_string()),
        (user, Some(password)) => Some(format!("{user}:{password}")),
    };

    let host_str = url.host_str();
    let port = url.port().map(|p| p.to_string());
    let host = host_str.map(|h| match &port {
        Some(port) => format!("{h}:{port}"),
        None => h.to_string(),
    });
    let hostname = host_str.map(|h| h.trim_start_matches('[').trim_end_matches(']').to_string());

    let pathname = url.path();
    let search = url.query().map(|q| format!("?{q}"));
    let path = format!("{}{}", pathname, search.as_deref().unwrap_or(""));

    parts.insert_text(HREF, Some(url.as_str().to_string()));
    parts.insert_text(SCHEME, Some(scheme.to_string()));
    parts.insert_text(PROTOCOL, Some(format!("{scheme}:")));
    parts.insert_text(AUTH, auth);
    parts.insert_text(HOST, host);
    parts.insert_text(HOSTNAME, hostname);
    parts.insert_text(PORT, port);
    parts.insert_text(PATHNAME, Some(pathname.to_string()));
    parts.insert(QUERY, PartValue::Nested(parse_query(url.query())));
    parts.insert_text(SEARCH, search);
    parts.insert_text(PATH, Some(path));
    parts.insert_text(HASH, url.fragment().map(|f| format!("#{f}")));
    parts
}

/// Best-effort split for input the WHATWG parser rejects.
fn decompose_lenient(href: &str) -> Parts {
    let mut parts = Parts::new();
    let href = href.trim();
    parts.insert_text(HREF, Some(href.to_string()));

    let (rest, fragment) = match href.find('#') {
        Some(pos) => (&href[..pos], Some(&href[pos..])),
        None => (href, None),
    };
    let (rest, query) = match rest.find('?') {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };

    let rest = match get_scheme_end(rest) {
        Some(colon) => {
            let scheme = rest[..colon].to_ascii_lowercase();
            parts.insert_text(PROTOCOL, Some(format!("{scheme}:")));
            parts.insert_text(SCHEME, Some(scheme));
            &rest[colon + 1..]
        }
        None => rest,
    };

    let (has_authority, pathname) = match rest.strip_prefix("//") {
        Some(after) => {
            let auth_end = after.find('/').unwrap_or(after.len());
            insert_authority(&mut parts, &after[..auth_end]);
            (true, &after[auth_end..])
        }
        None => (false, rest),
    };

    let pathname = match (pathname.is_empty(), has_authority) {
        (true, true) => Some("/"),
        (true, false) => None,
        (false, _) => Some(pathname),
    };
    let search = query.map(|q| format!("?{q}"));
    let path = match (pathname, &search) {
        (None, None) => None,
        (p, s) => Some(format!("{}{}", p.unwrap_or(""), s.as_deref().unwrap_or(""))),
    };

    parts.insert_text(PATHNAME, pathname.map(str::to_string));
    parts.insert(QUERY, PartValue::Nested(parse_query(query)));
    parts.insert_text(SEARCH, search);
    parts.insert_text(PATH, path);
    parts.insert_text(HASH, fragment.map(str::to_string));
    parts
}

/// Position of the `:` ending a scheme, if `s` starts with one.
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`.
fn get_scheme_end(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let colon = bytes.iter().position(|&b| b == b':')?;
    if colon == 0 || !bytes[0].is_ascii_alphabetic() {
        return None;
    }
    let valid = bytes[1..colon]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.');
    if valid {
        Some(colon)
    } else {
        None
    }
}

fn insert_authority(parts: &mut Parts, authority: &str) {
    // Userinfo ends at the last '@'
    let host_port = match authority.rfind('@') {
        Some(at) => {
            parts.insert_text(AUTH, Some(authority[..at].to_string()));
            &authority[at + 1..]
        }
        None => authority,
    };

    let (hostname, port) = split_host_port(host_port);
    let hostname = hostname.to_ascii_lowercase();
    let host = match port {
        Some(port) => format!("{}:{}", host_port[..host_port.len() - port.len() - 1].to_ascii_lowercase(), port),
        None => host_port.to_ascii_lowercase(),
    };

    if !host.is_empty() {
        parts.insert_text(HOST, Some(host));
    }
    if !hostname.is_empty() {
        parts.insert_text(HOSTNAME, Some(hostname));
    }
    parts.insert_text(PORT, port.map(str::to_string));
}

/// Split `host[:port]`, keeping IPv6 literals intact. Brackets are dropped
/// from the returned hostname.
fn split_host_port(host_port: &str) -> (&str, Option<&str>) {
    if let Some(inner) = host_port.strip_prefix('[') {
        return match inner.find(']') {
            Some(close) => {
                let port = inner[close + 1..].strip_prefix(':').filter(|p| !p.is_empty());
                (&inner[..close], port)
            }
            None => (inner, None),
        };
    }
    match host_port.rfind(':') {
        Some(colon) if colon + 1 < host_port.len() => (&host_port[..colon], Some(&host_port[colon + 1..])),
        Some(colon) => (&host_port[..colon], None),
        None => (host_port, None),
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Parse a query string into a nested part map.
///
/// A key without `=` maps to the empty string. A key supplied more than
/// once maps to `PartValue::Repeated`.
pub fn parse_query(query: Option<&str>) -> Parts {
    let mut params = Parts::new();
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => return params,
    };

    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        grouped.entry(key.into_owned()).or_default().push(value.into_owned());
    }

    for (key, mut values) in grouped {
        let value = if values.len() == 1 {
            PartValue::Text(values.remove(0))
        } else {
            PartValue::Repeated(values)
        };
        params.insert(key, value);
    }
    params
}
