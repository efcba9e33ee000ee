//! Page selection.
//!
//! Turns a user-entered range expression like `"1,3,5-7"` into the set of
//! zero-based page indices to operate on. Parsing is deliberately lenient:
//! tokens that are malformed, reversed, or out of bounds contribute nothing
//! instead of failing the whole request. Only an empty result is an error.

use std::collections::BTreeSet;

use crate::error::PdfOpError;

/// Parse a comma-separated page expression against a document's page count.
///
/// Each token is either a single 1-based page number or an inclusive range
/// (`"5-7"`); whitespace around tokens and range bounds is tolerated. The
/// result is strictly ascending, deduplicated, and every index satisfies
/// `index < total_pages`. Returns [`PdfOpError::NoValidPages`] when no token
/// survives validation.
pub fn select_pages(expr: &str, total_pages: u32) -> Result<Vec<u32>, PdfOpError> {
    let mut picked = BTreeSet::new();

    for token in expr.split(',') {
        let token = token.trim();
        if let Some((start, end)) = token.split_once('-') {
            // Both bounds must parse and be in range; a reversed range is
            // dropped whole, never partially applied.
            let (Some(start), Some(end)) = (page_index(start, total_pages), page_index(end, total_pages))
            else {
                continue;
            };
            if start <= end {
                picked.extend(start..=end);
            }
        } else if let Some(index) = page_index(token, total_pages) {
            picked.insert(index);
        }
    }

    if picked.is_empty() {
        return Err(PdfOpError::NoValidPages);
    }
    Ok(picked.into_iter().collect())
}

/// Convert a 1-based page token to a zero-based index, or `None` when the
/// token does not name a page of this document.
fn page_index(token: &str, total_pages: u32) -> Option<u32> {
    let number: u32 = token.trim().parse().ok()?;
    if number >= 1 && number <= total_pages {
        Some(number - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_page() {
        assert_eq!(select_pages("3", 10).unwrap(), vec![2]);
    }

    #[test]
    fn single_range() {
        assert_eq!(select_pages("5-7", 10).unwrap(), vec![4, 5, 6]);
    }

    #[test]
    fn mixed_tokens_sort_ascending() {
        assert_eq!(select_pages("5-7,1,3", 10).unwrap(), vec![0, 2, 4, 5, 6]);
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(select_pages("1,1,1-3", 10).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn whitespace_tolerated() {
        assert_eq!(select_pages(" 5 - 7 ", 10).unwrap(), vec![4, 5, 6]);
        assert_eq!(select_pages(" 2 , 4 ", 10).unwrap(), vec![1, 3]);
    }

    #[test]
    fn malformed_tokens_dropped() {
        assert_eq!(select_pages("a,2,b-c,4", 10).unwrap(), vec![1, 3]);
        assert_eq!(select_pages("5-,3", 10).unwrap(), vec![2]);
        assert_eq!(select_pages("a-7,2", 10).unwrap(), vec![1]);
    }

    #[test]
    fn reversed_range_dropped() {
        assert!(matches!(
            select_pages("9-2", 10),
            Err(PdfOpError::NoValidPages)
        ));
        assert_eq!(select_pages("9-2,1", 10).unwrap(), vec![0]);
    }

    #[test]
    fn out_of_range_pages_dropped() {
        assert!(matches!(
            select_pages("0,11", 10),
            Err(PdfOpError::NoValidPages)
        ));
        assert_eq!(select_pages("0,10", 10).unwrap(), vec![9]);
    }

    #[test]
    fn empty_expression_is_no_valid_pages() {
        assert!(matches!(select_pages("", 10), Err(PdfOpError::NoValidPages)));
        assert!(matches!(
            select_pages(",,", 10),
            Err(PdfOpError::NoValidPages)
        ));
    }

    #[test]
    fn default_expression_selects_first_page() {
        // Callers substitute "1" for an absent expression.
        assert_eq!(select_pages("1", 1).unwrap(), vec![0]);
    }

    #[test]
    fn full_span_range() {
        assert_eq!(
            select_pages("1-10", 10).unwrap(),
            (0..10).collect::<Vec<_>>()
        );
    }

    proptest! {
        #[test]
        fn valid_single_token_yields_that_index(n in 1u32..=25) {
            let result = select_pages(&n.to_string(), 25).unwrap();
            prop_assert_eq!(result, vec![n - 1]);
        }

        #[test]
        fn valid_range_expands_inclusively(a in 1u32..=20, len in 0u32..5) {
            let b = (a + len).min(20);
            let result = select_pages(&format!("{a}-{b}"), 20).unwrap();
            prop_assert_eq!(result, (a - 1..b).collect::<Vec<_>>());
        }

        #[test]
        fn output_is_strictly_ascending_and_in_bounds(
            expr in "[0-9, -]{0,30}",
            total in 1u32..50,
        ) {
            if let Ok(pages) = select_pages(&expr, total) {
                prop_assert!(!pages.is_empty());
                prop_assert!(pages.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(pages.iter().all(|&p| p < total));
            }
        }

        #[test]
        fn parsing_is_idempotent(expr in "[0-9a-z, -]{0,30}", total in 1u32..50) {
            match (select_pages(&expr, total), select_pages(&expr, total)) {
                (Ok(first), Ok(second)) => prop_assert_eq!(first, second),
                (Err(_), Err(_)) => {}
                _ => prop_assert!(false, "parsing the same input twice disagreed"),
            }
        }

        #[test]
        fn arbitrary_input_never_panics(expr in ".{0,40}", total in 1u32..100) {
            let _ = select_pages(&expr, total);
        }
    }
}
