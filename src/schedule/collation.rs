use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;

/// Polish alphabet in collation order, lowercase
const POLISH_ALPHABET: [char; 35] = [
    'a', 'ą', 'b', 'c', 'ć', 'd', 'e', 'ę', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'ł', 'm', 'n', 'ń',
    'o', 'ó', 'p', 'q', 'r', 's', 'ś', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ź', 'ż',
];

/// Primary collation weight of one element.
/// Variant order is the sort order: whitespace < punctuation < digits < letters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Weight {
    Space,
    Punct(char),
    // (significant digit count, digits)
    Number(usize, String),
    Letter(usize),
    Other(char),
}

/// Comparator following Polish alphabet rules.
///
/// `numeric` compares digit runs by value ("2A" < "10A").
/// Letters outside the Polish alphabet sort with their base letter ("é" as
/// "e"); accents only break primary ties, unaccented first.
/// `case_level` breaks the remaining ties with lowercase before uppercase,
/// then by code point, so distinct strings never compare equal.
#[derive(Debug, Clone, Copy)]
pub struct PolishCollator {
    numeric: bool,
    case_level: bool,
}

impl PolishCollator {
    /// Numeric-aware, case-insensitive comparison for class names
    pub fn numeric() -> Self {
        PolishCollator { numeric: true, case_level: false }
    }

    /// Alphabetic comparison for personal names
    pub fn alphabetic() -> Self {
        PolishCollator { numeric: false, case_level: true }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let (primary_a, accents_a) = self.weights(a);
        let (primary_b, accents_b) = self.weights(b);
        let ordering = primary_a.cmp(&primary_b).then_with(|| accents_a.cmp(&accents_b));
        if ordering != Ordering::Equal || !self.case_level {
            return ordering;
        }
        case_pattern(a).cmp(&case_pattern(b)).then_with(|| a.nfc().cmp(b.nfc()))
    }

    /// Primary weights plus the combining marks stripped from foreign letters
    fn weights(&self, text: &str) -> (Vec<Weight>, Vec<char>) {
        let mut weights = Vec::new();
        let mut accents = Vec::new();
        let composed: Vec<char> = text.nfc().collect();
        let mut chars = composed.into_iter().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                let mut digits = c.to_string();
                if self.numeric {
                    while let Some(next) = chars.peek().copied().filter(|d| d.is_ascii_digit()) {
                        digits.push(next);
                        chars.next();
                    }
                }
                let significant = digits.trim_start_matches('0');
                let significant = if significant.is_empty() { "0" } else { significant };
                weights.push(Weight::Number(significant.len(), significant.to_string()));
            } else if c.is_whitespace() {
                weights.push(Weight::Space);
            } else if c.is_alphabetic() {
                let lower = c.to_lowercase().next().unwrap_or(c);
                weights.push(letter_weight(lower, &mut accents));
            } else {
                weights.push(Weight::Punct(c));
            }
        }

        (weights, accents)
    }
}

fn alphabet_rank(letter: char) -> Option<usize> {
    POLISH_ALPHABET.iter().position(|&l| l == letter)
}

/// Polish letters keep their own rank; other letters fall back to the rank
/// of their canonical base, with the stripped marks pushed to `accents`
fn letter_weight(lower: char, accents: &mut Vec<char>) -> Weight {
    if let Some(rank) = alphabet_rank(lower) {
        return Weight::Letter(rank);
    }

    let mut decomposed = std::iter::once(lower).nfd();
    let base = decomposed.next().unwrap_or(lower);
    accents.extend(decomposed);

    match alphabet_rank(base) {
        Some(rank) => Weight::Letter(rank),
        None => Weight::Other(base),
    }
}

/// Uppercase flags of the letters, compared when the primary weights tie
fn case_pattern(text: &str) -> Vec<bool> {
    text.nfc()
        .filter(|c| c.is_alphabetic())
        .map(|c| c.is_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(collator: PolishCollator, input: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        items.sort_by(|a, b| collator.compare(a, b));
        items
    }

    #[test]
    fn test_numeric_class_order() {
        assert_eq!(
            sorted(PolishCollator::numeric(), &["2A", "1B", "10A"]),
            vec!["1B", "2A", "10A"]
        );
        assert_eq!(
            sorted(PolishCollator::numeric(), &["3B", "3A", "12C", "1A"]),
            vec!["1A", "3A", "3B", "12C"]
        );
    }

    #[test]
    fn test_numeric_is_case_insensitive() {
        let collator = PolishCollator::numeric();
        assert_eq!(collator.compare("1a", "1A"), Ordering::Equal);
    }

    #[test]
    fn test_leading_zeros_compare_by_value() {
        let collator = PolishCollator::numeric();
        assert_eq!(collator.compare("02A", "2A"), Ordering::Equal);
        assert_eq!(collator.compare("09A", "10A"), Ordering::Less);
    }

    #[test]
    fn test_polish_letters_follow_their_base() {
        assert_eq!(
            sorted(
                PolishCollator::alphabetic(),
                &["Żak", "Zieliński", "Łukasz", "Lis", "Ćwik", "Cichy", "Mazur"]
            ),
            vec!["Cichy", "Ćwik", "Lis", "Łukasz", "Mazur", "Zieliński", "Żak"]
        );
    }

    #[test]
    fn test_foreign_accents_sort_with_base_letter() {
        assert_eq!(
            sorted(PolishCollator::alphabetic(), &["Zofia", "Émile", "Żak", "Özil", "Ewa", "Pawlak"]),
            vec!["Émile", "Ewa", "Özil", "Pawlak", "Zofia", "Żak"]
        );
    }

    #[test]
    fn test_accent_breaks_tie_after_base() {
        let collator = PolishCollator::alphabetic();
        assert_eq!(collator.compare("Emile", "Émile"), Ordering::Less);
        assert_eq!(collator.compare("Émile", "Zofia"), Ordering::Less);
        // Polish "ó" stays a letter of its own, after every "o"
        assert_eq!(collator.compare("Özil", "Ór"), Ordering::Less);
    }

    #[test]
    fn test_decomposed_input_matches_composed() {
        let collator = PolishCollator::alphabetic();
        assert_eq!(collator.compare("Z\u{0307}ak", "Żak"), Ordering::Equal);
    }

    #[test]
    fn test_alphabetic_is_not_numeric() {
        assert_eq!(
            sorted(PolishCollator::alphabetic(), &["2A", "10A"]),
            vec!["10A", "2A"]
        );
    }

    #[test]
    fn test_lowercase_before_uppercase_on_tie() {
        let collator = PolishCollator::alphabetic();
        assert_eq!(collator.compare("nowak", "Nowak"), Ordering::Less);
        assert_eq!(collator.compare("Nowak", "nowak"), Ordering::Greater);
    }

    #[test]
    fn test_shorter_prefix_first() {
        let collator = PolishCollator::alphabetic();
        assert_eq!(collator.compare("Nowak", "Nowakowska"), Ordering::Less);
        assert_eq!(collator.compare("Anna Nowak", "Anna Nowakowska"), Ordering::Less);
    }
}
