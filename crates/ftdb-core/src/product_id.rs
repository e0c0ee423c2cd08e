/// Maximum length of the name-derived prefix of a generated product id.
const NAME_PREFIX_MAX: usize = 20;

/// Derive a product id from a product name and its 1-based position in a batch.
///
/// The name is lowercased, spaces become underscores, and the result is
/// truncated to 20 characters before a 4-digit zero-padded row number is
/// appended. The derivation is pure: the same name and position always yield
/// the same id, with no dependency on previously generated ids.
///
/// `"Air Max 270"` at row 5 becomes `"air_max_270_0005"`.
#[must_use]
pub fn derive_product_id(name: &str, row_number: usize) -> String {
    let prefix: String = name
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .take(NAME_PREFIX_MAX)
        .collect();

    format!("{prefix}_{row_number:04}")
}
