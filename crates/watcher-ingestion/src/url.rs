/// Normalizes a tracked-item URL into the canonical form used as the
/// `products.canonical_url` dedup key: lowercased scheme, trailing slash
/// stripped (unless the path is just `/`), and the scheme's default port
/// removed.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();

    let Some(scheme_end) = trimmed.find("://") else {
        return strip_trailing_slash(trimmed).to_string();
    };

    let scheme = trimmed[..scheme_end].to_ascii_lowercase();
    let rest = &trimmed[scheme_end + 3..];

    let default_port = match scheme.as_str() {
        "http" => Some(":80"),
        "https" => Some(":443"),
        _ => None,
    };

    let (authority_and_path, fragment_and_query) = match rest.find(['?', '#']) {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    let without_default_port = match default_port {
        Some(port) => match authority_and_path.find('/') {
            Some(path_start) => {
                let authority = &authority_and_path[..path_start];
                let path = &authority_and_path[path_start..];
                if authority.ends_with(port) {
                    format!("{}{}", &authority[..authority.len() - port.len()], path)
                } else {
                    authority_and_path.to_string()
                }
            }
            None => authority_and_path.trim_end_matches(port).to_string(),
        },
        None => authority_and_path.to_string(),
    };

    let normalized_path = strip_trailing_slash(&without_default_port);

    format!("{scheme}://{normalized_path}{fragment_and_query}")
}

fn strip_trailing_slash(s: &str) -> &str {
    if s.len() > 1 {
        s.trim_end_matches('/')
    } else {
        s
    }
}
