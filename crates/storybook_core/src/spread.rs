//! Spread and page arithmetic.
//!
//! Pages are 1-based everywhere: spread `n` (1..=14) is made of the left
//! page `2n-1` and the right page `2n`.

/// Spreads in every generated script.
pub const SPREAD_COUNT: usize = 14;

/// Pages in every generated storybook.
pub const PAGE_COUNT: usize = SPREAD_COUNT * 2;

/// Acts in every story arc.
pub const ACT_COUNT: usize = 3;

/// Left and right page numbers of a spread.
///
/// ```
/// use storybook_core::spread_pages;
///
/// assert_eq!(spread_pages(1), (1, 2));
/// assert_eq!(spread_pages(14), (27, 28));
/// ```
pub fn spread_pages(spread: i32) -> (i32, i32) {
    let left = 2 * spread - 1;
    (left, left + 1)
}

/// Spread a page belongs to.
///
/// ```
/// use storybook_core::page_spread;
///
/// assert_eq!(page_spread(1), 1);
/// assert_eq!(page_spread(2), 1);
/// assert_eq!(page_spread(27), 14);
/// ```
pub fn page_spread(page: i32) -> i32 {
    (page + 1) / 2
}
