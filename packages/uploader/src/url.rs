/// Public URL for a stored object.
///
/// Exactly one `/` separates the domain from the key, whether the stored key
/// starts with a separator or the domain ends with one. A domain that already
/// carries a scheme keeps it; otherwise `https://` is used.
pub fn public_url(access_domain: &str, stored_key: &str) -> String {
    let domain = access_domain.trim();
    let base = if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    };

    match (base.ends_with('/'), stored_key.starts_with('/')) {
        (true, true) => format!("{base}{}", &stored_key[1..]),
        (false, false) => format!("{base}/{stored_key}"),
        _ => format!("{base}{stored_key}"),
    }
}
