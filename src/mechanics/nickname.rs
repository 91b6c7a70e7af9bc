/// Builds the next display name from `base` and a sequence value.
///
/// Spaces are dropped and the last `-`-delimited segment is replaced, so repeated
/// calls keep exactly one trailing `-<value>` suffix.
pub fn derive_nickname(base: &str, value: u64) -> String {
    let compact: String = base.trim().chars().filter(|ch| *ch != ' ').collect();

    let stem = match compact.rsplit_once('-') {
        Some((head, _suffix)) => head,
        None => compact.as_str(),
    };

    format!("{stem}-{value}")
}
