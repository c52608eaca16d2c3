use rand::{distributions::Uniform, Rng};

pub const OTP_LEN: usize = 6;

/// Random decimal code of `len` digits; leading zeros are kept.
pub fn generate_otp(len: usize) -> String {
    let digits = Uniform::from(0..10u8);
    rand::thread_rng()
        .sample_iter(digits)
        .take(len)
        .map(|d| char::from(b'0' + d))
        .collect()
}

/// A submitted code matches only a non-empty stored code. The stored code is
/// cleared after verification, so an empty submission never verifies.
pub fn otp_matches(stored: &str, submitted: &str) -> bool {
    !stored.is_empty() && stored == submitted.trim()
}
