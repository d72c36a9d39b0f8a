use crate::contracts::types::{StatementLine, SuggestedParty, UnmatchedLine};
use crate::parties::Party;

pub const DEFAULT_FRAGMENT_CHARS: usize = 20;
const MIN_WORD_CHARS: usize = 3;

/// Best fuzzy party match for a bank description, if any clears `threshold`.
pub fn suggest_party(
    description: &str,
    parties: &[Party],
    threshold: f64,
) -> Option<SuggestedParty> {
    let normalized = normalize(description);
    if normalized.is_empty() {
        return None;
    }
    let fragments = salient_fragments(&normalized, DEFAULT_FRAGMENT_CHARS);

    let mut best: Option<(f64, &Party)> = None;
    for party in parties {
        let name = normalize(&party.name);
        if name.is_empty() {
            continue;
        }

        let score = if normalized.contains(&name) {
            1.0
        } else {
            fragments
                .iter()
                .map(|fragment| similarity(fragment, &name))
                .fold(0.0_f64, f64::max)
        };

        if score + 1e-9 < threshold {
            continue;
        }

        let better = match best {
            Some((best_score, best_party)) => {
                score > best_score || (score == best_score && party.id < best_party.id)
            }
            None => true,
        };
        if better {
            best = Some((score, party));
        }
    }

    best.map(|(score, party)| SuggestedParty {
        party_id: party.id,
        name: party.name.clone(),
        similarity: (score * 1000.0).round() / 1000.0,
    })
}

/// Summary of a line still awaiting reconciliation, with its party hint.
pub(crate) fn unmatched_line(
    line: &StatementLine,
    parties: &[Party],
    threshold: f64,
) -> UnmatchedLine {
    UnmatchedLine {
        line_id: line.line_id.clone(),
        line_no: line.line_no,
        date: line.transaction_date.clone(),
        description: line.description.clone(),
        amount: line.amount,
        direction: line.direction.clone(),
        suggested_party: suggest_party(&line.description, parties, threshold),
    }
}

/// Lowercase alphanumerics with single spaces between words.
pub(crate) fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

pub(crate) fn salient_fragments(normalized: &str, fragment_chars: usize) -> Vec<String> {
    let chars = normalized.chars().collect::<Vec<char>>();
    let mut fragments = Vec::new();

    let head = chars.iter().take(fragment_chars).collect::<String>();
    let tail = chars
        .iter()
        .skip(chars.len().saturating_sub(fragment_chars))
        .collect::<String>();
    fragments.push(head.trim().to_string());
    if tail.trim() != fragments[0] {
        fragments.push(tail.trim().to_string());
    }

    let mut run = String::new();
    for ch in chars.iter().chain(std::iter::once(&' ')) {
        if ch.is_alphabetic() {
            run.push(*ch);
            continue;
        }
        if run.chars().count() >= MIN_WORD_CHARS && !fragments.contains(&run) {
            fragments.push(run.clone());
        }
        run.clear();
    }

    fragments.retain(|fragment| !fragment.is_empty());
    fragments
}

/// Normalized Levenshtein similarity in [0, 1].
pub(crate) fn similarity(left: &str, right: &str) -> f64 {
    let max_len = left.chars().count().max(right.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(left, right) as f64 / max_len as f64
}

fn levenshtein_distance(left: &str, right: &str) -> usize {
    if left == right {
        return 0;
    }

    if left.is_empty() {
        return right.chars().count();
    }

    if right.is_empty() {
        return left.chars().count();
    }

    let right_chars = right.chars().collect::<Vec<char>>();
    let mut previous = (0..=right_chars.len()).collect::<Vec<usize>>();

    for (left_index, left_char) in left.chars().enumerate() {
        let mut current = vec![left_index + 1];

        for (right_index, right_char) in right_chars.iter().enumerate() {
            let insertion = current[right_index] + 1;
            let deletion = previous[right_index + 1] + 1;
            let substitution = previous[right_index] + usize::from(left_char != *right_char);
            current.push(insertion.min(deletion).min(substitution));
        }

        previous = current;
    }

    previous[right_chars.len()]
}
