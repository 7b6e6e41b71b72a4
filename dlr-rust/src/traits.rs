//! Statistics types shared across the crate

/// Particle statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistics {
    Fermionic,
    Bosonic,
}

impl Statistics {
    /// Check if this statistics type is fermionic
    pub fn is_fermionic(self) -> bool {
        matches!(self, Statistics::Fermionic)
    }

    /// Check if this statistics type is bosonic
    pub fn is_bosonic(self) -> bool {
        matches!(self, Statistics::Bosonic)
    }

    /// Statistical sign ξ: −1 for fermions, +1 for bosons
    pub fn xi(self) -> f64 {
        match self {
            Statistics::Fermionic => -1.0,
            Statistics::Bosonic => 1.0,
        }
    }

    /// Matsubara offset ζ: frequencies are ν_n = (2n + ζ)π/β
    pub fn zeta(self) -> i64 {
        match self {
            Statistics::Fermionic => 1,
            Statistics::Bosonic => 0,
        }
    }

    /// Get the string representation of the statistics
    pub fn as_str(self) -> &'static str {
        match self {
            Statistics::Fermionic => "fermionic",
            Statistics::Bosonic => "bosonic",
        }
    }
}

/// Statistics type trait for compile-time type-level distinction
pub trait StatisticsType: Copy + 'static {
    const STATISTICS: Statistics;
}

/// Fermionic statistics marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fermionic;

impl StatisticsType for Fermionic {
    const STATISTICS: Statistics = Statistics::Fermionic;
}

/// Bosonic statistics marker type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bosonic;

impl StatisticsType for Bosonic {
    const STATISTICS: Statistics = Statistics::Bosonic;
}
