//! Splitting collapsed Facebook comment digits.
//!
//! Facebook renders a comment as name, amount, age and action links in
//! separate elements. Scraped `textContent` drops the separators, so
//! "Jane Doe / 380 / 2h / Like" arrives as `JaneDoe3802hLike`. The digit
//! run `3802` has to be split back into an amount and an age.

use opal_core::Amount;

/// Smallest amount a split may produce.
const MIN_SPLIT_AMOUNT: Amount = 10.0;
/// Largest amount a split may produce.
const MAX_SPLIT_AMOUNT: Amount = 1000.0;

/// A digit run split into amount and age.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeSplit {
    /// Parsed amount.
    pub amount: Amount,
    /// Digits of the amount as they appear in the run.
    pub amount_text: String,
    /// Age value (the "2" in "2h").
    pub age: u32,
    /// Age unit letter.
    pub unit: char,
}

/// Largest believable age for a time unit.
fn max_age(unit: char) -> Option<u32> {
    match unit {
        'm' => Some(59),
        'h' => Some(23),
        'd' => Some(6),
        'w' => Some(52),
        'y' => Some(99),
        _ => None,
    }
}

fn plausible_age(digits: &str, unit: char) -> Option<u32> {
    if digits.is_empty() || digits.len() > 2 || digits.starts_with('0') {
        return None;
    }
    let age: u32 = digits.parse().ok()?;
    (age <= max_age(unit)?).then_some(age)
}

fn plausible_amount(digits: &str) -> Option<Amount> {
    if digits.starts_with('0') {
        return None;
    }
    let amount: Amount = digits.parse().ok()?;
    (MIN_SPLIT_AMOUNT..=MAX_SPLIT_AMOUNT)
        .contains(&amount)
        .then_some(amount)
}

/// Split a digit run that was followed by `unit`.
///
/// Integer runs try amounts of 4, 3, then 2 digits and keep the first
/// (longest) one whose remainder is a plausible age for the unit. Decimal
/// runs keep two fraction digits for the amount and read the rest as the
/// age. Returns `None` when no split is plausible.
pub fn split_amount_and_age(run: &str, unit: char) -> Option<AgeSplit> {
    max_age(unit)?;

    if let Some((int_part, fraction)) = run.split_once('.') {
        if int_part.is_empty()
            || int_part.len() > 4
            || !(3..=4).contains(&fraction.len())
            || !run.chars().all(|c| c.is_ascii_digit() || c == '.')
        {
            return None;
        }
        let amount_text = format!("{}.{}", int_part, &fraction[..2]);
        let age = plausible_age(&fraction[2..], unit)?;
        let amount = plausible_amount(&amount_text)?;
        return Some(AgeSplit {
            amount,
            amount_text,
            age,
            unit,
        });
    }

    if !run.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    for amount_len in [4, 3, 2] {
        if amount_len >= run.len() {
            continue;
        }
        let (amount_digits, age_digits) = run.split_at(amount_len);
        let Some(age) = plausible_age(age_digits, unit) else {
            continue;
        };
        let Some(amount) = plausible_amount(amount_digits) else {
            continue;
        };
        return Some(AgeSplit {
            amount,
            amount_text: amount_digits.to_string(),
            age,
            unit,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_digit_amount_one_digit_age() {
        let split = split_amount_and_age("3802", 'h').unwrap();
        assert_eq!(split.amount, 380.0);
        assert_eq!(split.amount_text, "380");
        assert_eq!(split.age, 2);
        assert_eq!(split.unit, 'h');
    }

    #[test]
    fn test_longest_plausible_amount_wins() {
        // 4253 is out of range, 425 + 32m is plausible.
        let split = split_amount_and_age("42532", 'm').unwrap();
        assert_eq!(split.amount, 425.0);
        assert_eq!(split.age, 32);

        let split = split_amount_and_age("10001", 'w').unwrap();
        assert_eq!(split.amount, 1000.0);
        assert_eq!(split.age, 1);
    }

    #[test]
    fn test_unit_bounds_age() {
        // 453 + 0d starts with zero, 45 + 30d is not a plausible age.
        assert!(split_amount_and_age("4530", 'd').is_none());
        let split = split_amount_and_age("4530", 'm').unwrap();
        assert_eq!((split.amount, split.age), (45.0, 30));
        assert_eq!(split_amount_and_age("4512", 'h').unwrap().amount, 451.0);
    }

    #[test]
    fn test_two_digit_amount() {
        let split = split_amount_and_age("4512", 'y').unwrap();
        assert_eq!(split.amount, 451.0);

        let split = split_amount_and_age("5523", 'h').unwrap();
        assert_eq!(split.amount, 552.0);

        let split = split_amount_and_age("553", 'd').unwrap();
        assert_eq!(split.amount, 55.0);
        assert_eq!(split.age, 3);
    }

    #[test]
    fn test_decimal_run() {
        let split = split_amount_and_age("45.502", 'h').unwrap();
        assert_eq!(split.amount_text, "45.50");
        assert_eq!(split.amount, 45.5);
        assert_eq!(split.age, 2);

        assert!(split_amount_and_age("45.50", 'h').is_none());
    }

    #[test]
    fn test_unsplittable_runs() {
        assert!(split_amount_and_age("45", 'h').is_none());
        assert!(split_amount_and_age("0452", 'h').is_none());
        assert!(split_amount_and_age("3802", 'x').is_none());
        assert!(split_amount_and_age("99999999", 'h').is_none());
    }
}
