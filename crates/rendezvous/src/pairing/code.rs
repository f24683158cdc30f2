//! Pairing code generation.

use rendezvous_protocol::PairingCode;

/// Number of characters in a pairing code.
pub const CODE_LENGTH: usize = 6;

/// Characters a pairing code is drawn from.
pub const CODE_ALPHABET: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Source of candidate pairing codes.
///
/// Implementations only produce codes; whether a code is free is decided by
/// the caller against the registry.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> PairingCode;
}

/// Uniformly random six digit codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> PairingCode {
        PairingCode::from(nanoid::nanoid!(CODE_LENGTH, &CODE_ALPHABET))
    }
}

/// Whether `code` has the shape of a generated code.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.chars().all(|c| CODE_ALPHABET.contains(&c))
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedCodes;
    use super::*;

    #[test]
    fn test_random_codes_are_six_digits() {
        let generator = RandomCodeGenerator;
        for _ in 0..1000 {
            let code = generator.generate();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()), "{code}");
            assert!(is_well_formed(code.as_str()));
        }
    }

    #[test]
    fn test_random_codes_vary() {
        let generator = RandomCodeGenerator;
        let codes: std::collections::HashSet<_> = (0..50).map(|_| generator.generate()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("000000"));
        assert!(is_well_formed("482913"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("48291"));
        assert!(!is_well_formed("4829134"));
        assert!(!is_well_formed("48a913"));
    }

    #[test]
    fn test_scripted_codes_repeat_last() {
        let codes = ScriptedCodes::new(&["111111", "222222"]);
        assert_eq!(codes.generate().as_str(), "111111");
        assert_eq!(codes.generate().as_str(), "222222");
        assert_eq!(codes.generate().as_str(), "222222");
    }
}
