/// Derive the local file name for a resource URL.
///
/// Takes the last `/`-separated segment (ignoring trailing slashes) and strips
/// all whitespace from it. Query strings are kept as part of the name.
/// Example: `"https://cdn.test/media/red shoe.jpg"` → `"redshoe.jpg"`
pub fn derive_local_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let basename = trimmed.rsplit('/').next().unwrap_or(trimmed);
    basename.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split a delimited field value into its distinct tokens.
///
/// Keeps the first occurrence of each token, in order. Empty tokens are kept
/// (once) so the joined value keeps its shape.
pub fn split_distinct(value: &str, delimiter: char) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    value
        .split(delimiter)
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}
