//! Pure numeric conversions between concentration representations.
//!
//! None of these functions fail: out-of-window inputs are clamped and `NaN`
//! bounds (meaning "not applicable") are carried through `convert_range`.
//!
//! Stored units: log10 activity for the activity, pH, pe and log P families,
//! volts for Eh, mol/L for total concentrations and log10(mol/L) for
//! `LogTotalVaried`.
use super::concentration_types::ValueFamily;

/// gas constant, J/(K mol)
pub const R: f64 = 8.31451;
/// Faraday constant, C/mol
pub const FARADAY: f64 = 96485.309;
pub const ZERO_CELSIUS: f64 = 273.15;

/// log10 of totals below this are not representable as f64 concentrations
const MIN_LOG_TOTAL: f64 = -300.0;
const MAX_LOG_TOTAL: f64 = 307.0;
const MIN_TOTAL: f64 = 1e-51;
const LOW_LOG_FLOOR: f64 = -50.0;
const HIGH_LOG_FLOOR: f64 = -45.0;

/// Nernst factor F(T) = R ln(10) (T + 273.15) / Faraday, T in °C. 0.05916 V at 25 °C
pub fn nernst_factor(t_celsius: f64) -> f64 {
    R * std::f64::consts::LN_10 * (t_celsius + ZERO_CELSIUS) / FARADAY
}

/// pH = -log a(H+); involutive
pub fn activity_to_ph(x: f64) -> f64 {
    -x
}
pub fn ph_to_activity(x: f64) -> f64 {
    -x
}

/// pe = -log a(e-); involutive
pub fn activity_to_pe(x: f64) -> f64 {
    -x
}
pub fn pe_to_activity(x: f64) -> f64 {
    -x
}

/// log a(e-) to Eh in volts
pub fn pe_to_eh(x: f64, t_celsius: f64) -> f64 {
    -x * nernst_factor(t_celsius)
}

/// Eh in volts to log a(e-)
pub fn eh_to_pe(x: f64, t_celsius: f64) -> f64 {
    -x / nernst_factor(t_celsius)
}

pub fn log_total_to_total(x: f64) -> f64 {
    if x.is_nan() || x < MIN_LOG_TOTAL {
        0.0
    } else if x > MAX_LOG_TOTAL {
        1e307
    } else {
        10f64.powf(x)
    }
}

fn floored_log10(x: f64, floor: f64) -> f64 {
    MIN_TOTAL.max(x.abs()).log10().max(floor)
}

/// log10 of a total-concentration range; the low bound is floored at -50 and the high at -45
pub fn total_to_log_total(low: f64, high: f64) -> (f64, f64) {
    (
        floored_log10(low, LOW_LOG_FLOOR),
        floored_log10(high, HIGH_LOG_FLOOR),
    )
}

fn convert_value(x: f64, t_celsius: f64, from: ValueFamily, to: ValueFamily, is_low: bool) -> Option<f64> {
    use ValueFamily::{Eh, LinearTotal, LogActivity, LogTotal};
    match (from, to) {
        (a, b) if a == b => Some(x),
        (LinearTotal, LogTotal) => {
            let (low, high) = total_to_log_total(x, x);
            Some(if is_low { low } else { high })
        }
        (LogTotal, LinearTotal) => Some(log_total_to_total(x)),
        (LogActivity, Eh) => Some(pe_to_eh(x, t_celsius)),
        (Eh, LogActivity) => Some(eh_to_pe(x, t_celsius)),
        _ => None,
    }
}

/// converts a stored (low, high) pair between value families.
/// `None` when the families are not numerically related (a total concentration
/// says nothing about an activity); a `NaN` high bound stays `NaN`.
pub fn convert_range(
    low: f64,
    high: f64,
    t_celsius: f64,
    from: ValueFamily,
    to: ValueFamily,
) -> Option<(f64, f64)> {
    let new_low = convert_value(low, t_celsius, from, to, true)?;
    let new_high = if high.is_nan() {
        f64::NAN
    } else {
        convert_value(high, t_celsius, from, to, false)?
    };
    Some((new_low, new_high))
}

/// repair of a varied range with `low == high`. `low` is kept and `high`
/// moves by `0.001·|low|` (to 0.01 when `low` is zero): upward when ranges
/// must ascend, in the direction of the sign of `low` when reversed ranges
/// are allowed.
pub fn repair_degenerate(low: f64, high: f64, allow_reversed: bool) -> (f64, f64) {
    if low != high {
        return (low, high);
    }
    if low == 0.0 {
        (low, 0.01)
    } else if allow_reversed {
        (low, low + 0.001 * low)
    } else {
        (low, low + 0.001 * low.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nernst_factor_at_25() {
        assert_relative_eq!(nernst_factor(25.0), 0.0591597, epsilon = 1e-6);
    }

    #[test]
    fn test_ph_pe_involutive() {
        for x in [-14.0, -7.0, 0.0, 3.5] {
            assert_eq!(ph_to_activity(activity_to_ph(x)), x);
            assert_eq!(pe_to_activity(activity_to_pe(x)), x);
        }
    }

    #[test]
    fn test_nernst_round_trip() {
        let mut t = -50.0;
        while t <= 400.0 {
            let mut pe = -17.0;
            while pe <= 17.0 {
                let back = eh_to_pe(pe_to_eh(pe, t), t);
                assert_relative_eq!(back, pe, epsilon = 1e-9);
                pe += 0.5;
            }
            t += 25.0;
        }
    }

    #[test]
    fn test_log_total_round_trip() {
        let mut x = -50.0;
        while x <= 50.0 {
            let (low, _) = total_to_log_total(log_total_to_total(x), 1.0);
            assert_relative_eq!(low, x, epsilon = 1e-9);
            if x >= -45.0 {
                let (_, high) = total_to_log_total(1.0, log_total_to_total(x));
                assert_relative_eq!(high, x, epsilon = 1e-9);
            }
            x += 0.25;
        }
    }

    #[test]
    fn test_clamps_are_idempotent() {
        let (low, high) = total_to_log_total(0.0, 1e-60);
        assert_eq!((low, high), (-50.0, -45.0));
        let again = total_to_log_total(log_total_to_total(low), log_total_to_total(high));
        assert_eq!(again, (low, high));
        assert_eq!(log_total_to_total(f64::NAN), 0.0);
        assert_eq!(log_total_to_total(-301.0), 0.0);
        assert_eq!(log_total_to_total(400.0), 1e307);
    }

    #[test]
    fn test_convert_range_keeps_nan_high() {
        let (low, high) =
            convert_range(-3.0, f64::NAN, 25.0, ValueFamily::LogTotal, ValueFamily::LinearTotal)
                .unwrap();
        assert_relative_eq!(low, 1e-3, epsilon = 1e-15);
        assert!(high.is_nan());
        assert!(
            convert_range(1e-3, f64::NAN, 25.0, ValueFamily::LinearTotal, ValueFamily::LogActivity)
                .is_none()
        );
    }

    #[test]
    fn test_repair_degenerate() {
        for v in [-5.0, -0.3, 2.0, 1e-3] {
            let (low, high) = repair_degenerate(v, v, true);
            assert_eq!(low, v);
            assert!(high != low);
            assert_eq!((high - low).signum(), v.signum());
        }
        assert_eq!(repair_degenerate(0.0, 0.0, true), (0.0, 0.01));
        assert_eq!(repair_degenerate(1.0, 2.0, true), (1.0, 2.0));
    }

    #[test]
    fn test_repair_degenerate_ascending() {
        for v in [-5.0, -0.3, 2.0, 1e-3] {
            let (low, high) = repair_degenerate(v, v, false);
            assert_eq!(low, v);
            assert!(high > low);
            assert_relative_eq!(high - low, 0.001 * v.abs(), epsilon = 1e-12);
        }
        assert_eq!(repair_degenerate(0.0, 0.0, false), (0.0, 0.01));
        assert_eq!(repair_degenerate(3.0, 1.0, false), (3.0, 1.0));
    }
}
