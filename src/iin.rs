//! Structural validation of national ID numbers (IIN).
//!
//! The gateway checks the shape of an IIN; the checksum itself belongs
//! to an external validator plugged in behind [`IinValidator`].

/// Validates candidate IINs at signup time.
pub trait IinValidator: Send + Sync {
    fn is_valid(&self, iin: &str) -> bool;
}

/// Shape-only validation: 12 ASCII digits with a plausible century/sex
/// digit in position seven.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicIinValidator;

impl IinValidator for BasicIinValidator {
    fn is_valid(&self, iin: &str) -> bool {
        let bytes = iin.as_bytes();
        if bytes.len() != 12 {
            return false;
        }
        if !bytes.iter().all(u8::is_ascii_digit) {
            return false;
        }
        // Digit seven encodes century and sex; zero and 7-9 are not assigned.
        (b'1'..=b'6').contains(&bytes[6])
    }
}
