use url::Url;

use crate::Location;

/// Repair a host-relative or scheme-relative location using the URL of the
/// response it was found in. Path and query are never touched.
pub fn normalize_location(location: &mut Location, base: &Url) {
    let needs_host = location
        .host()
        .map_or(true, |host| host.is_empty() || host.eq_ignore_ascii_case("localhost"));
    if needs_host {
        if let Some(host) = base_host(base) {
            location.set_host(&host);
        }
    }
    if location.scheme().is_none() {
        location.set_scheme(base.scheme());
    }
}

/// Host of `base` with its explicit port, if any.
fn base_host(base: &Url) -> Option<String> {
    let host = base.host_str()?;
    Some(match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
