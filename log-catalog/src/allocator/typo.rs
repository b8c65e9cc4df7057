//! Near-duplicate message detection

/// A known message that a new one closely resembles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypoMatch {
    pub id: u32,
    pub text: String,
    pub distance: usize,
}

/// Levenshtein distance over characters
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != *cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[b.len()]
}

/// Find the candidate closest to `key` within `threshold` edits
///
/// `candidates` are `(id, key, text)` triples; ties go to the lowest ID.
pub fn closest<'a, I>(key: &str, candidates: I, threshold: usize) -> Option<TypoMatch>
where
    I: IntoIterator<Item = (u32, &'a str, &'a str)>,
{
    let len = key.chars().count();
    let mut best: Option<TypoMatch> = None;

    for (id, candidate, text) in candidates {
        if candidate.chars().count().abs_diff(len) > threshold {
            continue;
        }
        let distance = levenshtein(key, candidate);
        if distance > threshold {
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => (distance, id) < (b.distance, b.id),
        };
        if better {
            best = Some(TypoMatch {
                id,
                text: text.to_string(),
                distance,
            });
        }
    }

    best
}
