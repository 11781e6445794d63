use crate::models::{Assembly, CardNetwork, CardReading};

/// Number of digits on a supported card.
pub const CARD_DIGITS: usize = 16;

/// Turn the recognized digit sequence of one frame into a card reading.
///
/// Anything but exactly 16 digits is `NotFound`. A full number whose leading
/// digit maps to no known network is kept as `UnrecognizedNetwork`.
pub fn assemble(digits: &[char]) -> Assembly {
    if digits.len() != CARD_DIGITS {
        return Assembly::NotFound;
    }

    let number: String = digits.iter().collect();
    let leading = digits[0];
    match CardNetwork::from_leading_digit(leading) {
        Some(network) => Assembly::Recognized(CardReading { network, digits: number }),
        None => Assembly::UnrecognizedNetwork { digits: number, leading },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_wrong_length_is_not_found() {
        for len in [0, 1, 4, 12, 15, 17, 20] {
            let digits = vec!['4'; len];
            assert_eq!(assemble(&digits), Assembly::NotFound, "length {}", len);
        }
    }

    #[test]
    fn test_known_prefixes() {
        let cases = [
            ('3', "American Express"),
            ('4', "Visa"),
            ('5', "MasterCard"),
            ('6', "Discover Card"),
        ];
        for (leading, label) in cases {
            let number = format!("{}123456789012345", leading);
            let assembly = assemble(&chars(&number));
            assert!(assembly.found());
            assert_eq!(assembly.network_label(), Some(label));
            assert_eq!(assembly.digits(), Some(number.as_str()));
        }
    }

    #[test]
    fn test_unknown_prefix_keeps_digits() {
        for leading in ['0', '1', '2', '7', '8', '9'] {
            let number = format!("{}000111122223333", leading);
            let assembly = assemble(&chars(&number));
            assert_eq!(
                assembly,
                Assembly::UnrecognizedNetwork { digits: number.clone(), leading }
            );
            assert_eq!(assembly.network_label(), None);
        }
    }
}
