//! Lightweight SMILES validation and normalization.
//!
//! The pipeline needs a fallible normalization usable as a deduplication
//! key: syntactic validation plus deterministic fragment ordering. Full
//! canonicalization (aromaticity perception, canonical atom ranking) is
//! the chemistry toolkit's job and is not reimplemented here; a string
//! this module rejects would not survive the toolkit either.

/// Normalize a raw SMILES string into a deduplication key.
///
/// Returns `None` when the string is not syntactically valid SMILES.
/// `.`-separated fragments are reordered deterministically (longest
/// first, ties lexicographic) so that salt forms written in either order
/// map to the same key.
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut fragments: Vec<&str> = trimmed.split('.').collect();
    if fragments.iter().any(|f| !is_valid_fragment(f)) {
        return None;
    }

    fragments.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    Some(fragments.join("."))
}

/// Validate a single dot-free SMILES fragment.
///
/// Checks: balanced brackets and parentheses, paired ring-closure digits
/// (including `%nn` labels), the organic-subset alphabet outside
/// brackets, non-empty bracket atoms, and at least one atom overall.
fn is_valid_fragment(frag: &str) -> bool {
    if frag.is_empty() {
        return false;
    }

    let bytes = frag.as_bytes();
    let mut i = 0;
    let mut paren_depth: i32 = 0;
    let mut ring_open = [false; 100];
    let mut has_atom = false;

    while i < bytes.len() {
        match bytes[i] as char {
            '[' => {
                let Some(rel) = frag[i + 1..].find(']') else {
                    return false;
                };
                let inner = &frag[i + 1..i + 1 + rel];
                let charset_ok = inner
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '+' | '-' | '*'));
                let has_symbol = inner.chars().any(|c| c.is_ascii_alphabetic() || c == '*');
                if inner.is_empty() || !charset_ok || !has_symbol {
                    return false;
                }
                has_atom = true;
                i += rel + 2;
            }
            ']' => return false,
            '(' => {
                paren_depth += 1;
                i += 1;
            }
            ')' => {
                paren_depth -= 1;
                if paren_depth < 0 {
                    return false;
                }
                i += 1;
            }
            '%' => {
                // Two-digit ring-closure label
                if i + 2 >= bytes.len()
                    || !bytes[i + 1].is_ascii_digit()
                    || !bytes[i + 2].is_ascii_digit()
                {
                    return false;
                }
                let label = (bytes[i + 1] - b'0') as usize * 10 + (bytes[i + 2] - b'0') as usize;
                ring_open[label] = !ring_open[label];
                i += 3;
            }
            c @ '0'..='9' => {
                let label = c as usize - '0' as usize;
                ring_open[label] = !ring_open[label];
                i += 1;
            }
            '=' | '#' | '-' | '/' | '\\' | ':' => {
                i += 1;
            }
            c @ 'A'..='Z' => {
                // Organic subset; Cl and Br are the only two-letter symbols
                let next = bytes.get(i + 1).copied();
                if (c == 'C' && next == Some(b'l')) || (c == 'B' && next == Some(b'r')) {
                    i += 2;
                } else if matches!(c, 'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I') {
                    i += 1;
                } else {
                    return false;
                }
                has_atom = true;
            }
            'b' | 'c' | 'n' | 'o' | 'p' | 's' => {
                has_atom = true;
                i += 1;
            }
            _ => return false,
        }
    }

    paren_depth == 0 && has_atom && ring_open.iter().all(|open| !open)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_chains_and_rings() {
        assert_eq!(normalize("CCO"), Some("CCO".to_string()));
        assert_eq!(normalize("c1ccccc1"), Some("c1ccccc1".to_string()));
        // Aspirin
        assert_eq!(
            normalize("CC(=O)OC1=CC=CC=C1C(=O)O"),
            Some("CC(=O)OC1=CC=CC=C1C(=O)O".to_string())
        );
    }

    #[test]
    fn test_bracket_atoms() {
        assert_eq!(normalize("[NH4+]"), Some("[NH4+]".to_string()));
        assert_eq!(normalize("C[C@@H](N)C(=O)O"), Some("C[C@@H](N)C(=O)O".to_string()));
        assert_eq!(normalize("[]"), None);
        assert_eq!(normalize("C[unclosed"), None);
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("not a smiles"), None);
        assert_eq!(normalize("C1CC"), None); // unpaired ring closure
        assert_eq!(normalize("C(C"), None); // unbalanced parenthesis
        assert_eq!(normalize("CC)"), None);
        assert_eq!(normalize("Xx"), None); // not an organic-subset symbol
    }

    #[test]
    fn test_two_letter_symbols() {
        assert_eq!(normalize("CCl"), Some("CCl".to_string()));
        assert_eq!(normalize("BrCCBr"), Some("BrCCBr".to_string()));
    }

    #[test]
    fn test_percent_ring_closures() {
        assert_eq!(normalize("C%12CCCCC%12"), Some("C%12CCCCC%12".to_string()));
        assert_eq!(normalize("C%12CCCCC"), None);
    }

    #[test]
    fn test_fragment_order_is_deterministic() {
        // Salt forms written in either order normalize identically
        let a = normalize("CC(=O)[O-].[Na+]").unwrap();
        let b = normalize("[Na+].CC(=O)[O-]").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "CC(=O)[O-].[Na+]");
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(normalize("  CCO  "), Some("CCO".to_string()));
    }
}
