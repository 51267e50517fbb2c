/// Lower-case `text` and collapse every run of non-alphanumeric characters
/// into a single underscore, trimming underscores at both ends.
///
/// `"Heat Pump Flow Temperature"` becomes `"heat_pump_flow_temperature"`.
/// Only ASCII letters and digits survive; everything else is a separator.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;

    for ch in text.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    slug
}
