//! Internal unit system.
//!
//! Length in µm, time in s, concentration in mol/µm³. Values entering the
//! engine are converted once at the boundary with the helpers below.

/// 1 mol/L expressed in mol/µm³ (1 L = 10¹⁵ µm³).
pub const MOLE_PER_LITRE: f64 = 1e-15;

/// 1 µm³ expressed in litres.
pub const CUBIC_MICROMETRE_IN_LITRES: f64 = 1e-15;

/// Centimetres to micrometres.
pub const CM_TO_UM: f64 = 1e4;

/// Convert a concentration in mol/L into mol/µm³.
#[inline]
pub fn molar_to_internal(concentration_M: f64) -> f64 {
    concentration_M * MOLE_PER_LITRE
}

/// Convert a concentration in mol/µm³ into mol/L.
#[inline]
pub fn internal_to_molar(concentration: f64) -> f64 {
    concentration / MOLE_PER_LITRE
}

/// Convert a rate given per minute into per second.
#[inline]
pub fn per_minute_to_per_second(rate_per_min: f64) -> f64 {
    rate_per_min / 60.0
}
