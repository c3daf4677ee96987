//! ISO/IEC 7812-1 (Luhn) check digit arithmetic.
//!
//! Digits are plain `u8` values in `0..=9`, leftmost digit first.

/// Luhn sum of `digits` modulo 10.
pub fn checksum(digits: &[u8]) -> u8 {
    let mut sum = 0u32;
    for (position, &digit) in digits.iter().rev().enumerate() {
        let digit = u32::from(digit);
        if position % 2 == 0 {
            sum += digit;
        } else {
            let doubled = digit * 2;
            sum += if doubled > 9 { doubled - 9 } else { doubled };
        }
    }
    (sum % 10) as u8
}

pub fn is_valid(digits: &[u8]) -> bool {
    checksum(digits) == 0
}

/// First candidate in `0..=9` that makes `partial` followed by it valid.
pub fn check_digit(partial: &[u8]) -> u8 {
    let mut candidate = Vec::with_capacity(partial.len() + 1);
    candidate.extend_from_slice(partial);
    candidate.push(0);
    let last = candidate.len() - 1;
    (0..=9)
        .find(|&digit| {
            candidate[last] = digit;
            is_valid(&candidate)
        })
        .unwrap_or_else(|| {
            candidate[last] = 0;
            (10 - checksum(&candidate)) % 10
        })
}

/// Parse an ASCII digit string into digit values.
pub fn digits_of(value: &str) -> Option<Vec<u8>> {
    value
        .bytes()
        .map(|byte| byte.is_ascii_digit().then(|| byte - b'0'))
        .collect()
}
