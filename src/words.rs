//! Number to words – spells out a whole rupee amount using the Indian
//! numbering system (lakh / thousand / hundred).

const ONES: [&str; 10] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const TEENS: [&str; 10] = [
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Convert a non-negative integer to English words with Indian grouping.
///
/// ```
/// use invoice_forge::words::to_words;
/// assert_eq!(to_words(105), "One Hundred Five");
/// assert_eq!(to_words(100_000), "One Lakh");
/// ```
pub fn to_words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }
    grouped_words(n).join(" ")
}

/// Words for `n > 0`, one entry per word.
fn grouped_words(n: u64) -> Vec<&'static str> {
    let lakhs = n / LAKH;
    let thousands = (n % LAKH) / THOUSAND;
    let hundreds = n % THOUSAND;

    let mut words = Vec::new();
    if lakhs > 0 {
        // Counts beyond 999 lakh reuse the same grouping ("One Thousand Lakh").
        if lakhs >= THOUSAND {
            words.extend(grouped_words(lakhs));
        } else {
            words.extend(below_thousand(lakhs));
        }
        words.push("Lakh");
    }
    if thousands > 0 {
        words.extend(below_thousand(thousands));
        words.push("Thousand");
    }
    if hundreds > 0 {
        words.extend(below_thousand(hundreds));
    }
    words
}

/// Words for `0..=999`; empty for zero.
fn below_thousand(n: u64) -> Vec<&'static str> {
    debug_assert!(n < THOUSAND);
    let mut words = Vec::with_capacity(4);
    let mut rest = n as usize;

    if rest >= 100 {
        words.push(ONES[rest / 100]);
        words.push("Hundred");
        rest %= 100;
    }

    match rest {
        10..=19 => words.push(TEENS[rest - 10]),
        20.. => {
            words.push(TENS[rest / 10]);
            if rest % 10 > 0 {
                words.push(ONES[rest % 10]);
            }
        }
        1..=9 => words.push(ONES[rest]),
        _ => {}
    }
    words
}
