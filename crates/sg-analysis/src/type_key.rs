//! Canonical string type keys (§4.5.6).
//!
//! Each type has a canonical string key, computed once during symbol
//! collection and compared cheaply at query time without re-running
//! type inference.

/// Returns the family key (`int`/`uint`/`float`) for a primitive width,
/// or `None` if `key` isn't a recognized primitive.
pub fn primitive_family(key: &str) -> Option<&'static str> {
    match key {
        "i8" | "i16" | "i32" | "i64" | "isize" | "int" => Some("int"),
        "u8" | "u16" | "u32" | "u64" | "usize" | "uint" => Some("uint"),
        "f32" | "f64" | "float" => Some("float"),
        _ => None,
    }
}

/// Strips reference/ownership/pointer prefixes (`&`, `&mut `, `*`, `own `)
/// from a canonical key, returning the base key.
pub fn strip_wrappers(key: &str) -> &str {
    let mut k = key;
    loop {
        if let Some(rest) = k.strip_prefix("&mut ") {
            k = rest;
        } else if let Some(rest) = k.strip_prefix('&') {
            k = rest;
        } else if let Some(rest) = k.strip_prefix('*') {
            k = rest;
        } else if let Some(rest) = k.strip_prefix("own ") {
            k = rest;
        } else {
            break;
        }
    }
    k
}

/// Parses a generic key of the form `Name<arg1,...,argN>` into
/// `(Name, arity)`, or `None` if `key` isn't generic.
pub fn parse_generic(key: &str) -> Option<(&str, usize)> {
    let open = key.find('<')?;
    if !key.ends_with('>') {
        return None;
    }
    let name = &key[..open];
    let args = &key[open + 1..key.len() - 1];
    if args.is_empty() {
        return Some((name, 0));
    }
    // Split on top-level commas only (depth-aware, for nested generics).
    let mut depth = 0i32;
    let mut arity = 1usize;
    for c in args.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => arity += 1,
            _ => {}
        }
    }
    Some((name, arity))
}

/// The generic struct base of a key (`Name<...>` → `Name`), or the key
/// itself if it isn't generic.
pub fn generic_base(key: &str) -> &str {
    parse_generic(key).map(|(name, _)| name).unwrap_or(key)
}

/// The element key of a fixed or dynamic array type (`[T; N]` or `[T]`),
/// or `None` if `key` isn't an array.
pub fn array_inner(key: &str) -> Option<&str> {
    let inner = key.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.split(';').next().unwrap_or(inner).trim())
}

/// Two canonical keys match (§4.5.6): either they are equal after
/// stripping wrapper prefixes, or both are generic with the same name
/// and arity.
pub fn keys_match(a: &str, b: &str) -> bool {
    let (a, b) = (strip_wrappers(a), strip_wrappers(b));
    if a == b {
        return true;
    }
    match (parse_generic(a), parse_generic(b)) {
        (Some((na, aa)), Some((nb, ab))) => na == nb && aa == ab,
        _ => false,
    }
}

/// The full candidate key set for a receiver type, used by method lookup
/// and signature scoring (§4.5.6): the type's own key, its dereferenced/
/// aliased base, its generic struct base, an array-inner key, and (for
/// primitives) a family key.
pub fn candidate_keys(receiver_key: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let base = strip_wrappers(receiver_key);
    keys.push(receiver_key.to_string());
    if base != receiver_key {
        keys.push(base.to_string());
    }
    let generic = generic_base(base);
    if generic != base {
        keys.push(generic.to_string());
    }
    if let Some(inner) = array_inner(base) {
        keys.push(inner.to_string());
    }
    if let Some(family) = primitive_family(base) {
        keys.push(family.to_string());
    }
    keys.dedup();
    keys
}
