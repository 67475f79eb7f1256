//! Parsing of the free-text page selector ("1,3,5").
//!
//! Two grammars share one tokenizer: split on commas, trim each token, skip
//! empty tokens. They differ only in what happens to a token that is not a
//! positive decimal integer.
//!
//! * [`parse_page_selection`] drops it silently, and if nothing survives the
//!   whole selection becomes `None`, which means every page is processed.
//! * [`parse_page_selection_strict`] reports it.
//!
//! Which one the workflow uses is chosen by
//! [`crate::config::PageSelectionPolicy`].

use thiserror::Error;

/// A token the strict parser refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{token}' is not a positive page number")]
pub struct PageSelectionError {
    pub token: String,
}

/// Fail-open parser: `None` means "all pages".
///
/// Order is preserved and duplicates are kept; de-duplication happens when the
/// engine maps the selection onto the document.
pub fn parse_page_selection(text: &str) -> Option<Vec<usize>> {
    if text.trim().is_empty() {
        return None;
    }

    let mut pages = Vec::new();
    for token in tokens(text) {
        if !is_decimal(token) {
            continue;
        }
        // Digits only, so the sole failure left is overflow.
        match token.parse::<usize>() {
            Ok(0) => continue,
            Ok(page) => pages.push(page),
            Err(_) => return None,
        }
    }

    if pages.is_empty() {
        None
    } else {
        Some(pages)
    }
}

/// Strict parser: every non-empty token must be a positive page number.
///
/// Empty input is still `Ok(None)`.
pub fn parse_page_selection_strict(text: &str) -> Result<Option<Vec<usize>>, PageSelectionError> {
    let mut pages = Vec::new();
    for token in tokens(text) {
        let page = is_decimal(token)
            .then(|| token.parse::<usize>().ok())
            .flatten()
            .filter(|&p| p >= 1)
            .ok_or_else(|| PageSelectionError {
                token: token.to_string(),
            })?;
        pages.push(page);
    }

    Ok(if pages.is_empty() { None } else { Some(pages) })
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn is_decimal(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_non_numeric_mean_all_pages() {
        assert_eq!(parse_page_selection(""), None);
        assert_eq!(parse_page_selection("   "), None);
        assert_eq!(parse_page_selection("a,b,c"), None);
        assert_eq!(parse_page_selection(",,,"), None);
    }

    #[test]
    fn numeric_tokens_keep_input_order() {
        assert_eq!(parse_page_selection("1,3,5"), Some(vec![1, 3, 5]));
        assert_eq!(parse_page_selection(" 2 , x, 4 "), Some(vec![2, 4]));
        assert_eq!(parse_page_selection("5,1,5"), Some(vec![5, 1, 5]));
    }

    #[test]
    fn signs_ranges_and_zero_are_dropped() {
        assert_eq!(parse_page_selection("-1,+2,3-4,0,7"), Some(vec![7]));
        assert_eq!(parse_page_selection("0"), None);
        assert_eq!(parse_page_selection("1.5, 2"), Some(vec![2]));
    }

    #[test]
    fn non_ascii_digits_are_not_decimal() {
        assert_eq!(parse_page_selection("²,٣"), None);
    }

    #[test]
    fn overflow_degrades_to_all_pages() {
        assert_eq!(parse_page_selection("1,99999999999999999999999999"), None);
    }

    #[test]
    fn strict_accepts_clean_lists() {
        assert_eq!(parse_page_selection_strict(""), Ok(None));
        assert_eq!(parse_page_selection_strict(" 1, 3 ,5,"), Ok(Some(vec![1, 3, 5])));
    }

    #[test]
    fn strict_reports_the_first_bad_token() {
        let err = parse_page_selection_strict("1, two, 3").unwrap_err();
        assert_eq!(err.token, "two");
        assert!(parse_page_selection_strict("0").is_err());
        assert!(parse_page_selection_strict("3-5").is_err());
    }
}
