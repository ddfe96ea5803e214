//! Single-use backup codes for account recovery.

/// A batch of backup codes, shown to the user exactly once at 2FA setup.
#[derive(Clone, Debug)]
pub struct BackupCodes {
    pub codes: Vec<String>,
}

impl BackupCodes {
    /// Format codes for display (grouped for readability).
    pub fn display_codes(&self) -> Vec<String> {
        self.codes
            .iter()
            .map(|c| {
                if c.len() >= 8 {
                    format!("{}-{}", &c[..4], &c[4..])
                } else {
                    c.clone()
                }
            })
            .collect()
    }
}

/// Generates cryptographically secure backup codes.
#[derive(Clone, Debug)]
pub struct BackupCodeGenerator {
    /// Number of codes per batch (default: 8).
    pub count: usize,
    /// Length of each code (default: 8).
    pub length: usize,
}

impl Default for BackupCodeGenerator {
    fn default() -> Self {
        Self { count: 8, length: 8 }
    }
}

impl BackupCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Generate a new batch of backup codes.
    pub fn generate(&self) -> BackupCodes {
        use rand::Rng;

        // No 0, O, 1, I to avoid confusion
        const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

        let mut rng = rand::rngs::OsRng;
        let codes = (0..self.count)
            .map(|_| {
                (0..self.length)
                    .map(|_| {
                        let idx = rng.gen_range(0..CHARSET.len());
                        CHARSET[idx] as char
                    })
                    .collect()
            })
            .collect();

        BackupCodes { codes }
    }

    /// Verify a submitted code against the user's remaining codes.
    ///
    /// Returns the index of the matched code so the caller can remove it;
    /// each code is valid exactly once.
    pub fn verify(code: &str, valid_codes: &[String]) -> Option<usize> {
        // Normalize: remove dashes, uppercase
        let normalized = code.replace('-', "").to_uppercase();

        valid_codes
            .iter()
            .position(|c| constant_time_compare(c, &normalized))
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_batch_of_eight() {
        let codes = BackupCodeGenerator::new().generate();

        assert_eq!(codes.codes.len(), 8);
        assert!(codes.codes.iter().all(|c| c.len() == 8));
    }

    #[test]
    fn test_verify_returns_match_index() {
        let codes = BackupCodeGenerator::new().generate();

        assert_eq!(BackupCodeGenerator::verify(&codes.codes[2], &codes.codes), Some(2));

        // Dashed form as displayed to the user
        let dashed = format!("{}-{}", &codes.codes[0][..4], &codes.codes[0][4..]);
        assert_eq!(BackupCodeGenerator::verify(&dashed, &codes.codes), Some(0));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let codes = BackupCodeGenerator::new().generate();
        // 0 and 1 never appear in generated codes
        assert_eq!(BackupCodeGenerator::verify("00000000", &codes.codes), None);
    }

    #[test]
    fn test_case_insensitive() {
        let codes = BackupCodeGenerator::new().generate();
        let lowercase = codes.codes[0].to_lowercase();
        assert_eq!(BackupCodeGenerator::verify(&lowercase, &codes.codes), Some(0));
    }

    #[test]
    fn test_display_codes_grouped() {
        let codes = BackupCodes {
            codes: vec!["ABCD2345".to_string()],
        };
        assert_eq!(codes.display_codes(), vec!["ABCD-2345"]);
    }
}
