//! URI parsing and canonicalization (§4.1, §6).
//!
//! Input URIs with scheme `file` or no scheme are accepted; any other
//! scheme is rejected (treated as empty/fallback). Canonicalization is:
//! percent-decode, make absolute, clean (resolve `.`/`..` components
//! lexically — no filesystem access, the path need not exist), re-slash
//! with `/`, then re-encode as `file://`.

use std::path::{Component, Path, PathBuf};

use lsp_types::Uri;

fn fallback_uri() -> Uri {
    for candidate in ["file:///unknown", "file:///", "about:blank", "urn:sg-lsp:unknown"] {
        if let Ok(uri) = candidate.parse::<Uri>() {
            return uri;
        }
    }

    // Last-resort fallback that avoids panicking if URI parser behavior changes unexpectedly.
    let mut suffix = 0usize;
    loop {
        let candidate = format!("http://localhost/{suffix}");
        if let Ok(uri) = candidate.parse::<Uri>() {
            return uri;
        }
        suffix = suffix.saturating_add(1);
    }
}

/// Parse a URI string into an `lsp_types::Uri`. Falls back to a valid
/// placeholder URI if parsing fails.
pub fn parse_uri(s: &str) -> Uri {
    match s.parse::<Uri>() {
        Ok(uri) => uri,
        Err(_) => fallback_uri(),
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn percent_encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' | b':' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// Lexically clean a path: resolve `.` and `..` components without
/// touching the filesystem.
fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Canonicalize a `file://...` (or bare-path) URI string into an
/// absolute, cleaned, forward-slashed `file://` URI string. Returns
/// `None` for any other scheme (§6: "others are rejected, treated as
/// empty").
pub fn canonicalize_uri_str(raw: &str) -> Option<String> {
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, raw),
    };
    if let Some(scheme) = scheme {
        if scheme != "file" {
            return None;
        }
    }

    let decoded = percent_decode(rest);
    let path = Path::new(&decoded);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        // No filesystem access: treat a relative path as rooted at `/`.
        Path::new("/").join(path)
    };
    let cleaned = clean_path(&absolute);
    let as_str = cleaned.to_string_lossy().replace('\\', "/");
    let encoded = percent_encode_path(&as_str);
    Some(format!("file://{encoded}"))
}

/// The canonical filesystem path for a `file://` URI (decoded, no
/// re-encoding), or `None` for a non-`file` scheme.
pub fn uri_to_path(raw: &str) -> Option<PathBuf> {
    let canonical = canonicalize_uri_str(raw)?;
    let path_part = canonical.strip_prefix("file://")?;
    Some(PathBuf::from(percent_decode(path_part)))
}

/// The inverse of `uri_to_path`: a canonical filesystem path (already
/// absolute) to a `file://` URI, for locations the routers hand back to
/// the client (§4.5.2).
pub fn path_to_uri(path: &Path) -> Option<Uri> {
    let as_str = path.to_string_lossy().replace('\\', "/");
    let encoded = percent_encode_path(&as_str);
    format!("file://{encoded}").parse::<Uri>().ok()
}
