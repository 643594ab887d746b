//! Make an arbitrary string safe as a single path component.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Replaces separators, NUL, control characters and whitespace with `_`
/// (collapsing runs), strips leading/trailing dots and underscores and caps
/// the length at 255 bytes. May return an empty string.
pub fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = c == '/' || c == '\\' || c == '\0' || c.is_control() || c.is_whitespace();
        if unsafe_char {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut take = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}
