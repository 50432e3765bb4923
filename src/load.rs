//! Session training load from perceived exertion and duration
//!
//! Each RPE level maps to a base load for a 60-minute reference session;
//! the session load scales that base linearly with duration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ValidationError;
use crate::models::Rpe;

/// Duration of the reference session the base loads are defined for
pub const REFERENCE_MINUTES: Decimal = dec!(60);

/// Base load of a 60-minute session at the given RPE
pub fn base_load(rpe: Rpe) -> Decimal {
    match rpe.value() {
        1 => dec!(20),
        2 => dec!(30),
        3 => dec!(40),
        4 => dec!(50),
        5 => dec!(60),
        6 => dec!(70),
        7 => dec!(80),
        8 => dec!(100),
        9 => dec!(120),
        _ => dec!(140),
    }
}

/// Training load of a session: `base(rpe) × duration / 60`.
///
/// A zero duration yields zero load. Negative durations are rejected, as are
/// durations whose load would not fit in a `Decimal`.
pub fn training_load(rpe: Rpe, duration_minutes: Decimal) -> Result<Decimal, ValidationError> {
    if duration_minutes < Decimal::ZERO {
        return Err(ValidationError::NegativeDuration {
            minutes: duration_minutes,
        });
    }
    scaled_load(rpe, duration_minutes).ok_or(ValidationError::LoadOverflow {
        minutes: duration_minutes,
    })
}

fn scaled_load(rpe: Rpe, duration_minutes: Decimal) -> Option<Decimal> {
    base_load(rpe)
        .checked_mul(duration_minutes)?
        .checked_div(REFERENCE_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpe(value: i64) -> Rpe {
        Rpe::new(value).unwrap()
    }

    #[test]
    fn test_reference_session_equals_base() {
        let expected = [20, 30, 40, 50, 60, 70, 80, 100, 120, 140];
        for (rpe, base) in Rpe::all().zip(expected) {
            assert_eq!(training_load(rpe, dec!(60)).unwrap(), Decimal::from(base));
        }
    }

    #[test]
    fn test_zero_duration_is_zero_load() {
        for rpe in Rpe::all() {
            assert_eq!(training_load(rpe, Decimal::ZERO).unwrap(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_duration_scaling() {
        // 90 minutes at RPE 8: 100 × 1.5
        assert_eq!(training_load(rpe(8), dec!(90)).unwrap(), dec!(150));
        // 45 minutes at RPE 3: 40 × 0.75
        assert_eq!(training_load(rpe(3), dec!(45)).unwrap(), dec!(30));
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert_eq!(
            training_load(rpe(5), dec!(-1)),
            Err(ValidationError::NegativeDuration { minutes: dec!(-1) })
        );
    }

    #[test]
    fn test_overflowing_duration_rejected() {
        let minutes = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        assert_eq!(
            training_load(rpe(10), minutes),
            Err(ValidationError::LoadOverflow { minutes })
        );
        assert_eq!(
            training_load(rpe(10), Decimal::MAX),
            Err(ValidationError::LoadOverflow {
                minutes: Decimal::MAX
            })
        );
    }

    #[test]
    fn test_monotonic_in_rpe() {
        let loads: Vec<Decimal> = Rpe::all()
            .map(|r| training_load(r, dec!(37)).unwrap())
            .collect();
        assert!(loads.windows(2).all(|w| w[0] <= w[1]));
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_load_properties(
            low in 1i64..=10,
            high in 1i64..=10,
            minutes in 0u32..600u32,
            extra in 0u32..120u32
        ) {
            let (low, high) = (rpe(low.min(high)), rpe(low.max(high)));
            let duration = Decimal::from(minutes);

            let load = training_load(low, duration).unwrap();

            prop_assert!(load >= Decimal::ZERO);
            prop_assert!(training_load(high, duration).unwrap() >= load);
            prop_assert!(training_load(low, duration + Decimal::from(extra)).unwrap() >= load);
        }
    }
}
