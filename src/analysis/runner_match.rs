use crate::models::HorseFacts;

/// Shortest fragment accepted for a partial name match.
const MIN_PARTIAL_LEN: usize = 4;

/// Resolve a predicted winner name to a runner on the card.
///
/// Exact match on the normalised name wins; otherwise a single runner whose
/// name contains (or is contained in) the prediction. Ambiguity resolves to None.
pub fn resolve_runner<'a>(winner_name: &str, horses: &'a [HorseFacts]) -> Option<&'a HorseFacts> {
    let wanted = normalize(winner_name);
    if wanted.is_empty() {
        return None;
    }

    if let Some(horse) = horses.iter().find(|h| normalize(&h.name) == wanted) {
        return Some(horse);
    }

    let mut partial = horses.iter().filter(|h| {
        let name = normalize(&h.name);
        let (short, long) = if name.len() < wanted.len() {
            (&name, &wanted)
        } else {
            (&wanted, &name)
        };
        short.len() >= MIN_PARTIAL_LEN && long.contains(short.as_str())
    });

    match (partial.next(), partial.next()) {
        (Some(horse), None) => Some(horse),
        _ => None,
    }
}

/// Lowercase alphanumerics only, so "O'Brien's Pride" becomes "obrienspride".
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
