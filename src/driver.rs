use std::fmt;

use glob::{MatchOptions, Pattern};
use serde::Serialize;

use crate::catalog::{self, Catalog};

// fnmatch(3) with no flags
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Recognized InfiniBand driver variants, in resolution priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Mlx4,
    Mlx5,
}

impl Driver {
    pub const ALL: [Driver; 2] = [Driver::Mlx4, Driver::Mlx5];

    /// Shell glob that a device directory name must match to be handled by
    /// this driver's catalog.
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Mlx4 => "mlx4_*",
            Self::Mlx5 => "mlx5_*",
        }
    }

    pub fn catalog(self) -> &'static Catalog {
        match self {
            Self::Mlx4 => &catalog::MLX4,
            Self::Mlx5 => &catalog::MLX5,
        }
    }

    /// Classify a device directory name. The first driver whose pattern
    /// matches wins.
    pub fn resolve(device: &str) -> Option<Driver> {
        Self::ALL
            .into_iter()
            .find(|driver| matches(driver.pattern(), device))
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mlx4 => f.write_str("mlx4"),
            Self::Mlx5 => f.write_str("mlx5"),
        }
    }
}

fn matches(pattern: &str, name: &str) -> bool {
    Pattern::new(pattern)
        .map(|p| p.matches_with(name, MATCH_OPTIONS))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_drivers() {
        assert_eq!(Driver::resolve("mlx4_0"), Some(Driver::Mlx4));
        assert_eq!(Driver::resolve("mlx5_0"), Some(Driver::Mlx5));
        assert_eq!(Driver::resolve("mlx5_17"), Some(Driver::Mlx5));
        assert_eq!(Driver::resolve("mlx5_"), Some(Driver::Mlx5));
    }

    #[test]
    fn unknown_devices_do_not_resolve() {
        assert_eq!(Driver::resolve("hfi1_0"), None);
        assert_eq!(Driver::resolve("qib0"), None);
        assert_eq!(Driver::resolve("mlx5"), None);
        assert_eq!(Driver::resolve("xmlx5_0"), None);
        assert_eq!(Driver::resolve(""), None);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(Driver::resolve("MLX5_0"), None);
        assert_eq!(Driver::resolve("Mlx4_0"), None);
    }

    #[test]
    fn glob_semantics_not_regex() {
        assert!(matches("mlx?_[0-9]", "mlx5_3"));
        assert!(!matches("mlx?_[0-9]", "mlx5_a"));
        // `.` is literal in a glob
        assert!(!matches("mlx5.0", "mlx5_0"));
    }

    #[test]
    fn catalogs_are_bound_per_driver() {
        assert!(std::ptr::eq(Driver::Mlx4.catalog(), &catalog::MLX4));
        assert!(std::ptr::eq(Driver::Mlx5.catalog(), &catalog::MLX5));
    }
}
