//! Utility functions for the image upload service

/// Size formatting utilities
pub mod size {
    /// Format bytes into a human-readable string using decimal units
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

        if bytes == 0 {
            return "0 B".to_string();
        }

        let unit_index = (bytes as f64).log10() as usize / 3;
        let unit_index = unit_index.min(UNITS.len() - 1);

        let size = bytes as f64 / 1000_f64.powi(unit_index as i32);

        if unit_index == 0 || size.fract() == 0.0 {
            format!("{:.0} {}", size, UNITS[unit_index])
        } else if size >= 100.0 {
            format!("{:.0} {}", size, UNITS[unit_index])
        } else if size >= 10.0 {
            format!("{:.1} {}", size, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Format bytes without rounding.
    ///
    /// Uses the largest decimal unit that divides the value evenly and falls
    /// back to the plain byte count otherwise, so the text always names the
    /// exact value.
    pub fn format_bytes_exact(bytes: u64) -> String {
        const UNITS: &[&str] = &["KB", "MB", "GB", "TB", "PB"];

        let mut exact = None;
        let mut divisor: u64 = 1;
        for unit in UNITS {
            divisor *= 1000;
            if bytes >= divisor && bytes % divisor == 0 {
                exact = Some(format!("{} {}", bytes / divisor, unit));
            } else {
                break;
            }
        }

        exact.unwrap_or_else(|| format!("{} bytes", bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_formatting() {
        assert_eq!(size::format_bytes(0), "0 B");
        assert_eq!(size::format_bytes(512), "512 B");
        assert_eq!(size::format_bytes(1024), "1.02 KB");
        assert_eq!(size::format_bytes(500_000), "500 KB");
        assert_eq!(size::format_bytes(2_000_000), "2 MB");
        assert_eq!(size::format_bytes(1_500_000), "1.50 MB");
        assert_eq!(size::format_bytes(12_345_678), "12.3 MB");
    }

    #[test]
    fn test_exact_size_formatting() {
        assert_eq!(size::format_bytes_exact(500_000), "500 KB");
        assert_eq!(size::format_bytes_exact(2_000_000), "2 MB");
        assert_eq!(size::format_bytes_exact(1_500_000), "1500 KB");
        assert_eq!(size::format_bytes_exact(499_999), "499999 bytes");
        assert_eq!(size::format_bytes_exact(500_400), "500400 bytes");
        assert_eq!(size::format_bytes_exact(1_499), "1499 bytes");
        assert_eq!(size::format_bytes_exact(512), "512 bytes");
        assert_eq!(size::format_bytes_exact(0), "0 bytes");
    }
}
