/// Prepended to the final path segment so the basename is never empty.
const SENTINEL: char = 'a';

/// Result of sanitizing an untrusted upload name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedName {
    /// Final path segment with quotes and angle brackets removed.
    pub base_name: String,
    /// Lowercased extension, or empty when the basename has no dot.
    pub extension: String,
}

/// Reduce an untrusted file name to a basename and a lowercase extension.
///
/// Directory components are discarded, so `../../evil.php` yields the
/// basename `evil.php`. The basename is what gets recorded as the upload's
/// name; storage keys always use a generated name.
pub fn sanitize_name(raw: &str) -> SanitizedName {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '<' | '>'))
        .map(|c| if c == '\\' { '/' } else { c })
        .collect();

    let marked = match cleaned.rfind('/') {
        Some(pos) => format!("{}{SENTINEL}{}", &cleaned[..=pos], &cleaned[pos + 1..]),
        None => format!("{SENTINEL}{cleaned}"),
    };

    let basename = match marked.rfind('/') {
        Some(pos) => &marked[pos + 1..],
        None => marked.as_str(),
    };

    let extension = basename
        .rfind('.')
        .map(|pos| basename[pos + 1..].to_lowercase())
        .unwrap_or_default();

    SanitizedName {
        base_name: basename[SENTINEL.len_utf8()..].to_string(),
        extension,
    }
}

/// Check an extension against the allow-list. Empty extensions never pass.
pub fn is_allowed_type(extension: &str, allowed: &[String]) -> bool {
    !extension.is_empty() && allowed.iter().any(|t| t.eq_ignore_ascii_case(extension))
}
