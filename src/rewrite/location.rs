//! Redirect `Location` rewriting.
//!
//! Origin-absolute redirects are pointed back at the mirror so clients never
//! leave it. Redirects to third-party hosts are left alone.

use url::Url;

/// Rewrite a `Location` header value for the mirror.
///
/// Returns `None` when `location` is empty or the mirror's own
/// `request_scheme://request_host` does not form a valid URL. Callers then
/// forward the origin's value unmodified rather than fail the request.
pub fn fix_redirect_location(
    location: &str,
    request_scheme: &str,
    request_host: &str,
    origin_scheme: &str,
    origin_host: &str,
) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    let mirror = format!("{}://{}", request_scheme, request_host);
    let parsed = Url::parse(&mirror).ok()?;
    if parsed.host_str().is_none() || !parsed.path().trim_start_matches('/').is_empty() {
        return None;
    }

    if let Some((prefix_len, authority)) = split_authority(location) {
        if same_authority(authority, origin_scheme, origin_host) {
            return Some(format!("{}{}", mirror, &location[prefix_len..]));
        }
        return Some(location.to_string());
    }

    if location.starts_with('/') {
        Some(format!("{}{}", mirror, location))
    } else {
        Some(format!("{}/{}", mirror, location))
    }
}

/// For absolute (`http(s)://`) or protocol-relative (`//`) URLs, the byte
/// length of `scheme://authority` and the authority itself.
fn split_authority(location: &str) -> Option<(usize, &str)> {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    let start = if lower.starts_with("https://") {
        8
    } else if lower.starts_with("http://") {
        7
    } else if location.starts_with("//") {
        2
    } else {
        return None;
    };

    let rest = &location[start..];
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some((start + end, &rest[..end]))
}

fn same_authority(authority: &str, origin_scheme: &str, origin_host: &str) -> bool {
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    if authority.eq_ignore_ascii_case(origin_host) {
        return true;
    }
    // An explicit default port still names the origin.
    let default_port = match origin_scheme {
        "https" => "443",
        _ => "80",
    };
    match authority.rsplit_once(':') {
        Some((host, port)) => port == default_port && host.eq_ignore_ascii_case(origin_host),
        None => false,
    }
}
