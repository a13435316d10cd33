/// Tag hints from an image's display name
///
/// Lowercase, split on anything that is not alphanumeric, drop tokens of
/// two characters or fewer. Order of first appearance is kept.
pub fn derive_tag_hints(display_name: &str) -> Vec<String> {
    let mut hints: Vec<String> = Vec::new();
    for token in display_name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
    {
        if !hints.iter().any(|h| h == token) {
            hints.push(token.to_string());
        }
    }
    hints
}
