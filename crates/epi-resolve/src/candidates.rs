//! Surface-form expansion for disease identifiers.

/// Every spelling a disease identifier may be stored under.
///
/// The raw trimmed value comes first, then its upper and lower case forms.
/// Numeric input (`1`, `01`) and `d<digits>` input additionally produce the
/// zero-padded `D01` / `d01` forms. Order is stable and duplicates are
/// removed, so earlier candidates win when several match.
pub fn disease_code_candidates(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let mut candidates = Vec::new();
    if trimmed.is_empty() {
        return candidates;
    }

    push_unique(&mut candidates, trimmed.to_string());
    push_unique(&mut candidates, trimmed.to_uppercase());
    push_unique(&mut candidates, trimmed.to_lowercase());

    if let Some(number) = numeric_part(trimmed) {
        let padded = format!("{number:02}");
        push_unique(&mut candidates, format!("D{padded}"));
        push_unique(&mut candidates, format!("d{padded}"));
    }
    candidates
}

/// The number in `12`, `012`, `d12` or `D012`.
fn numeric_part(value: &str) -> Option<u64> {
    let digits = value.strip_prefix(['d', 'D']).unwrap_or(value);
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn push_unique(candidates: &mut Vec<String>, value: String) {
    if !candidates.contains(&value) {
        candidates.push(value);
    }
}
