//! SHA-256 checksum utility for change detection.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}

/// Checksum of a migration script.
///
/// Leading whitespace is not part of the script identity, so editors that add
/// or strip blank lines at the top of a file do not trigger drift detection.
pub fn script_checksum(content: &str) -> String {
    compute_checksum(content.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_deterministic() {
        let sql = "CREATE TABLE t (id BIGINT PRIMARY KEY);";
        assert_eq!(compute_checksum(sql), compute_checksum(sql));
        assert_eq!(compute_checksum(sql).len(), 64);
    }

    #[test]
    fn test_script_checksum_ignores_leading_whitespace() {
        let sql = "CREATE TABLE t (id BIGINT PRIMARY KEY);\n";
        assert_eq!(script_checksum(sql), script_checksum(&format!("\n\n  \t{sql}")));
    }

    #[test]
    fn test_script_checksum_keeps_trailing_content() {
        let a = script_checksum("SELECT 1;");
        let b = script_checksum("SELECT 1;\n");
        assert_ne!(a, b);
    }
}
