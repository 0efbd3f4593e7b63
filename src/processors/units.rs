//! Impedance unit normalization to kilohms.

use crate::config::{UnitPolicy, CANONICAL_UNIT};

use super::extractor::RawRecord;

/// Impedance units the instrument reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Ohm,
    KiloOhm,
    MegaOhm,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Ohm, Unit::KiloOhm, Unit::MegaOhm];

    /// Tag as printed by the instrument.
    pub fn tag(self) -> &'static str {
        match self {
            Unit::Ohm => "Ohm",
            Unit::KiloOhm => CANONICAL_UNIT,
            Unit::MegaOhm => "Mohm",
        }
    }

    /// Match an instrument unit tag exactly (case-sensitive).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|unit| unit.tag() == tag)
    }

    /// Convert `value` in this unit to kilohms.
    #[inline]
    pub fn to_kohm(self, value: f64) -> f64 {
        match self {
            Unit::Ohm => value / 1000.0,
            Unit::KiloOhm => value,
            Unit::MegaOhm => value * 1000.0,
        }
    }
}

/// Convert one (value, tag) pair to kilohms under `policy`.
pub fn normalize(value: f64, tag: &str, policy: UnitPolicy) -> Option<f64> {
    match (Unit::from_tag(tag), policy) {
        (Some(unit), _) => Some(unit.to_kohm(value)),
        (None, UnitPolicy::Lenient) => Some(value),
        (None, UnitPolicy::Strict) => None,
    }
}

/// Normalize both values of a record, or reject it.
///
/// Returns `(frequency, primary_kohm, secondary_kohm)`.
pub fn normalize_record(record: &RawRecord<'_>, policy: UnitPolicy) -> Option<(f64, f64, f64)> {
    let primary = normalize(record.primary, record.primary_unit, policy)?;
    let secondary = normalize(record.secondary, record.secondary_unit, policy)?;
    Some((record.frequency, primary, secondary))
}
