use super::error::{UrlError, UrlResult};
use super::meta::UrlMeta;

/// Collapses consecutive empty segments (produced by `//` runs) down to a
/// single representative, keeping one trailing empty if the run ends there.
pub fn filter_useless_part(parts: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(parts.len());
    let mut prev_empty = false;

    for p in parts {
        if p.is_empty() {
            if prev_empty {
                continue;
            }
            prev_empty = true;
        } else {
            prev_empty = false;
        }
        out.push(p.clone());
    }

    out
}

/// Rejects an empty query string and adjacent `&` separators; otherwise
/// splits into parallel key/value sequences, in encounter order.
pub fn parse_query_string(q: &str) -> UrlResult<(Vec<String>, Vec<String>)> {
    if q.is_empty() {
        return Err(UrlError::IrregularUrl {
            url: q.to_string(),
            reason: "empty query string".to_string(),
        });
    }

    let mut keys = Vec::new();
    let mut values = Vec::new();

    for pair in q.split('&') {
        if pair.is_empty() {
            return Err(UrlError::IrregularUrl {
                url: q.to_string(),
                reason: "adjacent '&' separators".to_string(),
            });
        }
        match pair.split_once('=') {
            Some((k, v)) => {
                keys.push(k.to_string());
                values.push(v.to_string());
            }
            None => {
                keys.push(pair.to_string());
                values.push(String::new());
            }
        }
    }

    Ok((keys, values))
}

/// Parses `scheme://host/<path>[?<query>][#<fragment>]` into a `UrlMeta` plus
/// the ordered pieces: path segments, then query values in key order, then
/// the fragment if present. Scheme and host are discarded; they carry no
/// structural information the clustering engine needs.
#[tracing::instrument(level = "trace", fields(url = %url))]
pub fn parse_url(url: &str) -> UrlResult<(UrlMeta, Vec<String>)> {
    let (_scheme, rest) = url.split_once("://").ok_or_else(|| UrlError::IrregularUrl {
        url: url.to_string(),
        reason: "missing scheme separator '://'".to_string(),
    })?;

    let path_start = rest.find('/').ok_or_else(|| UrlError::IrregularUrl {
        url: url.to_string(),
        reason: "empty path".to_string(),
    })?;
    let after_host = &rest[path_start..];

    let (before_fragment, fragment) = match after_host.split_once('#') {
        Some((b, f)) => (b, Some(f.to_string())),
        None => (after_host, None),
    };

    let (path_part, query_part) = match before_fragment.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (before_fragment, None),
    };

    if path_part.len() <= 1 {
        // just "/" or nothing: no real path segments
        return Err(UrlError::IrregularUrl {
            url: url.to_string(),
            reason: "empty path".to_string(),
        });
    }

    let raw_segments: Vec<String> = path_part
        .split('/')
        .skip(1)
        .map(|s| s.to_string())
        .collect();
    let segments = filter_useless_part(&raw_segments);

    let (query_keys, query_values) = match query_part {
        Some(q) => parse_query_string(q)?,
        None => (Vec::new(), Vec::new()),
    };

    let has_fragment = fragment.is_some();
    let meta = UrlMeta::new(segments.len(), query_keys, has_fragment);

    let mut pieces = segments;
    pieces.extend(query_values);
    if let Some(f) = fragment {
        pieces.push(f);
    }

    Ok((meta, pieces))
}

/// Lossless recomposition of the path/query/fragment portion of a URL from
/// a `UrlMeta` and its matching pieces (scheme/host are not modeled here,
/// see [`parse_url`]).
pub fn pack(meta: &UrlMeta, pieces: &[String]) -> String {
    let mut out = String::from("/");
    out.push_str(&pieces[..meta.path_depth].join("/"));

    if !meta.query_keys.is_empty() {
        let values = &pieces[meta.path_depth..meta.path_depth + meta.query_keys.len()];
        let pairs: Vec<String> = meta
            .query_keys
            .iter()
            .zip(values.iter())
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        out.push('?');
        out.push_str(&pairs.join("&"));
    }

    if meta.has_fragment {
        out.push('#');
        out.push_str(pieces.last().expect("fragment piece present"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_path() {
        let (meta, pieces) = parse_url("http://x.y/u/1/p").unwrap();
        assert_eq!(meta.path_depth, 3);
        assert_eq!(pieces, vec!["u", "1", "p"]);
        assert!(!meta.has_fragment);
        assert!(meta.query_keys.is_empty());
    }

    #[test]
    fn parses_query_and_fragment() {
        let (meta, pieces) = parse_url("http://x.y/a?b=1&c=2#frag").unwrap();
        assert_eq!(meta.path_depth, 1);
        assert_eq!(meta.query_keys, vec!["b", "c"]);
        assert!(meta.has_fragment);
        assert_eq!(pieces, vec!["a", "1", "2", "frag"]);
    }

    #[test]
    fn rejects_empty_path() {
        assert!(parse_url("http://x.y").is_err());
        assert!(parse_url("http://x.y/").is_err());
    }

    #[test]
    fn rejects_adjacent_ampersands() {
        assert!(parse_query_string("a=1&&b=2").is_err());
    }

    #[test]
    fn collapses_double_slash_runs() {
        let (meta, pieces) = parse_url("http://x.y/a//b").unwrap();
        assert_eq!(meta.path_depth, 3);
        assert_eq!(pieces, vec!["a", "", "b"]);
    }

    #[test]
    fn round_trips_path_query_fragment() {
        let (meta, pieces) = parse_url("http://x.y/a/b?k=v#frag").unwrap();
        assert_eq!(pack(&meta, &pieces), "/a/b?k=v#frag");
    }
}
