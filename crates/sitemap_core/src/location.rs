use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::LocationError;

/// An absolute or relative URI reference as written in a sitemap.
///
/// Unlike [`Url`], a `Location` can hold host-relative (`/page`) and
/// scheme-relative (`example.com/page`) references, and it keeps the text it was
/// parsed from verbatim (no percent-encoding of non-ASCII query characters).
/// [`crate::normalize_location`] fills in the missing parts from the response URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    scheme: Option<String>,
    userinfo: Option<String>,
    host: Option<String>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        if input.is_empty() {
            return Err(LocationError::Empty);
        }
        if let Some(c) = input.chars().find(|c| c.is_control() || *c == ' ') {
            return Err(LocationError::ForbiddenChar(c));
        }

        let (rest, fragment) = split_off(input, '#');
        let (rest, query) = split_off(rest, '?');
        check_escapes(rest)?;

        let (scheme, rest) = split_scheme(rest)?;
        let (authority, path) = split_authority(rest, scheme.is_some());
        let (userinfo, host) = match authority {
            Some(authority) => parse_authority(authority)?,
            None => (None, None),
        };

        // Absolute references must also satisfy the URL parser used for fetching.
        if scheme.is_some() && host.is_some() {
            Url::parse(input)?;
        }

        Ok(Self {
            scheme: scheme.map(str::to_ascii_lowercase),
            userinfo,
            host,
            path: path.to_string(),
            query,
            fragment,
        })
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Host as written, including the port when one is present.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn set_scheme(&mut self, scheme: &str) {
        self.scheme = Some(scheme.to_ascii_lowercase());
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = (!host.is_empty()).then(|| host.to_string());
    }

    /// Converts to a fully parsed [`Url`], e.g. for fetching a nested sitemap.
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.to_string())
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{scheme}:")?;
        }
        if self.host.is_some() || self.userinfo.is_some() {
            f.write_str("//")?;
            if let Some(userinfo) = &self.userinfo {
                write!(f, "{userinfo}@")?;
            }
            if let Some(host) = &self.host {
                f.write_str(host)?;
            }
            if !self.path.is_empty() && !self.path.starts_with('/') {
                f.write_str("/")?;
            }
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

fn split_off(input: &str, delimiter: char) -> (&str, Option<String>) {
    match input.split_once(delimiter) {
        Some((head, tail)) => (head, Some(tail.to_string())),
        None => (input, None),
    }
}

fn check_escapes(input: &str) -> Result<(), LocationError> {
    let bytes = input.as_bytes();
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte != b'%' {
            continue;
        }
        let valid = bytes
            .get(idx + 1..idx + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(LocationError::InvalidEscape(input.to_string()));
        }
    }
    Ok(())
}

fn split_scheme(input: &str) -> Result<(Option<&str>, &str), LocationError> {
    let Some((candidate, after)) = input.split_once(':') else {
        return Ok((None, input));
    };
    // A colon after the first slash belongs to the path.
    if candidate.contains('/') {
        return Ok((None, input));
    }
    // `localhost:8080/page` is a host with a port, not a scheme.
    if is_port_prefix(after) {
        return Ok((None, input));
    }
    if !is_scheme(candidate) {
        return Err(LocationError::InvalidScheme(candidate.to_string()));
    }
    Ok((Some(candidate), after))
}

fn is_port_prefix(input: &str) -> bool {
    let port = input.find('/').map_or(input, |end| &input[..end]);
    !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
}

fn is_scheme(candidate: &str) -> bool {
    let mut bytes = candidate.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        }
        _ => false,
    }
}

fn split_authority(input: &str, has_scheme: bool) -> (Option<&str>, &str) {
    if let Some(after) = input.strip_prefix("//") {
        let end = after.find('/').unwrap_or(after.len());
        return (Some(&after[..end]), &after[end..]);
    }
    if has_scheme || input.starts_with('/') {
        return (None, input);
    }
    // Schemeless reference such as `example.com/page` or `localhost:8080`.
    match input.find('/') {
        Some(end) if looks_like_host(&input[..end]) => (Some(&input[..end]), &input[end..]),
        None if input.contains(':') && looks_like_host(input) => (Some(input), ""),
        _ => (None, input),
    }
}

fn looks_like_host(segment: &str) -> bool {
    let name = segment.rsplit_once(':').map_or(segment, |(name, _)| name);
    if name.eq_ignore_ascii_case("localhost") {
        return true;
    }
    name.contains('.')
        && !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
}

type Authority = (Option<String>, Option<String>);

fn parse_authority(authority: &str) -> Result<Authority, LocationError> {
    let (userinfo, host) = match authority.rsplit_once('@') {
        Some((userinfo, host)) => (Some(userinfo.to_string()), host),
        None => (None, authority),
    };

    let port = if let Some(bracketed) = host.strip_prefix('[') {
        match bracketed.split_once(']') {
            Some((_, after)) => after.strip_prefix(':'),
            None => return Err(LocationError::InvalidPort(host.to_string())),
        }
    } else {
        host.rsplit_once(':').map(|(_, port)| port)
    };
    if let Some(port) = port {
        if !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LocationError::InvalidPort(port.to_string()));
        }
    }

    let host = (!host.is_empty()).then(|| host.to_string());
    Ok((userinfo, host))
}
