//! Emailed numeric one-time passwords.

use rand::Rng;

/// Number of digits in an emailed OTP.
pub const OTP_DIGITS: usize = 6;

/// Generate a 6-digit numeric OTP, uniformly sampled from `[100000, 999999]`.
///
/// The leading digit is never zero, so the code survives clients that
/// round-trip it through a number type.
pub fn generate_numeric_otp() -> String {
    let mut rng = rand::rngs::OsRng;
    rng.gen_range(100_000..=999_999).to_string()
}
