//! Fuzzy company-name matching.
//!
//! The vision model free-text brand names rarely match catalog rows
//! byte-for-byte ("Nestlé S.A." vs "nestle"). Names are normalized
//! (case, accents, corporate suffixes) and compared with an edit-distance
//! ratio, with a floor for containment.

/// Minimum similarity for two names to count as the same company.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Corporate suffixes and filler words dropped during normalization.
const SUFFIX_WORDS: &[&str] = &[
    "inc", "corp", "corporation", "company", "co", "ltd", "limited", "llc", "plc", "sa", "ag",
    "gmbh", "bv", "nv", "spa", "srl", "the", "group", "international", "global", "worldwide",
];

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Lowercase, fold common accents, drop punctuation and corporate suffix
/// words, collapse whitespace.
pub fn normalize(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded
        .split_whitespace()
        .filter(|w| !SUFFIX_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Similarity between two company names in `[0.0, 1.0]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a == norm_b {
        return 1.0;
    }
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }

    let max_len = norm_a.chars().count().max(norm_b.chars().count());
    let mut score = 1.0 - levenshtein(&norm_a, &norm_b) as f64 / max_len as f64;

    // Partial matches ("kitkat" in "nestle kitkat") get a floor.
    if norm_a.contains(&norm_b) || norm_b.contains(&norm_a) {
        score = score.max(0.8);
    }

    score
}

pub fn is_match(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) >= threshold
}
