//! URL path helpers.

use url::Url;

/// Join URL parts with exactly one `/` between non-empty neighbours.
///
/// A trailing slash on the left part and a leading slash on the right part
/// collapse into one separator; an empty part leaves the other untouched.
pub fn concat_url_paths(parts: &[&str]) -> String {
    parts.iter().fold(String::new(), |joined, part| {
        if joined.is_empty() || part.is_empty() {
            return joined + part;
        }
        format!(
            "{}/{}",
            joined.strip_suffix('/').unwrap_or(&joined),
            part.strip_prefix('/').unwrap_or(part)
        )
    })
}

/// Expand `{name}` placeholders in one left-to-right pass.
///
/// Substituted values are copied verbatim and never rescanned, so a value that
/// itself looks like `{other}` stays as is. Returns the first placeholder name
/// `lookup` has no value for. An unclosed `{` is literal text.
pub fn expand_path_template<'a>(
    template: &'a str,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> Result<String, &'a str> {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|offset| open + offset) else {
            break;
        };
        let name = &rest[open + 1..close];
        expanded.push_str(&rest[..open]);
        expanded.push_str(&lookup(name).ok_or(name)?);
        rest = &rest[close + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Set a query entry the way `URLSearchParams::set` does.
///
/// The first entry with this name gets the new value and later duplicates are
/// dropped; a missing name is appended.
pub fn set_query_pair(url: &mut Url, name: &str, value: &str) {
    let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let mut replaced = false;
    pairs.retain_mut(|(key, existing)| {
        if key != name {
            return true;
        }
        if replaced {
            return false;
        }
        *existing = value.to_string();
        replaced = true;
        true
    });
    if !replaced {
        pairs.push((name.to_string(), value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
}
