//! Collapse a sample window into one scalar

use crate::error::{NimbusError, NimbusResult};
use crate::types::Statistic;

/// Reduces provider samples for a single statistic.
///
/// Contract: `Sum` and `SampleCount` of nothing are zero. `Average`,
/// `Minimum` and `Maximum` of nothing fail with [`NimbusError::EmptyInput`];
/// the collector never calls them with an empty slice, so reaching that
/// branch is a caller bug.
pub struct StatReducer;

impl StatReducer {
    pub fn reduce(statistic: Statistic, samples: &[f64]) -> NimbusResult<f64> {
        match statistic {
            Statistic::Sum | Statistic::SampleCount => Ok(samples.iter().sum()),
            Statistic::Average => {
                if samples.is_empty() {
                    return Err(NimbusError::empty_input(statistic));
                }
                Ok(samples.iter().sum::<f64>() / samples.len() as f64)
            }
            Statistic::Minimum => samples
                .iter()
                .copied()
                .reduce(f64::min)
                .ok_or_else(|| NimbusError::empty_input(statistic)),
            Statistic::Maximum => samples
                .iter()
                .copied()
                .reduce(f64::max)
                .ok_or_else(|| NimbusError::empty_input(statistic)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f64; 5] = [4.0, -1.5, 10.0, 2.5, 0.0];

    #[test]
    fn test_average_is_mean() {
        let avg = StatReducer::reduce(Statistic::Average, &SAMPLES).unwrap();
        assert!((avg - 15.0 / 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sum_and_count_add_up() {
        assert_eq!(StatReducer::reduce(Statistic::Sum, &SAMPLES).unwrap(), 15.0);
        assert_eq!(
            StatReducer::reduce(Statistic::SampleCount, &[60.0, 60.0, 59.0]).unwrap(),
            179.0
        );
    }

    #[test]
    fn test_min_max_bound_every_element() {
        let min = StatReducer::reduce(Statistic::Minimum, &SAMPLES).unwrap();
        let max = StatReducer::reduce(Statistic::Maximum, &SAMPLES).unwrap();
        assert_eq!(min, -1.5);
        assert_eq!(max, 10.0);
        assert!(SAMPLES.iter().all(|v| *v >= min && *v <= max));
    }

    #[test]
    fn test_empty_input_contract() {
        assert_eq!(StatReducer::reduce(Statistic::Sum, &[]).unwrap(), 0.0);
        assert_eq!(StatReducer::reduce(Statistic::SampleCount, &[]).unwrap(), 0.0);

        for stat in [Statistic::Minimum, Statistic::Maximum, Statistic::Average] {
            let err = StatReducer::reduce(stat, &[]).unwrap_err();
            assert!(matches!(err, NimbusError::EmptyInput { .. }), "{stat}");
        }
    }

    #[test]
    fn test_single_sample() {
        for stat in Statistic::ALL {
            assert_eq!(StatReducer::reduce(stat, &[7.0]).unwrap(), 7.0);
        }
    }
}
