/// Keeps only ASCII digits and `.` from a displayed price
///
/// `"1 234,56 ₽"` becomes `"123456"`. Scrubbing an already scrubbed string
/// returns it unchanged.
pub fn scrub_price(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}
