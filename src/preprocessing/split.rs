//! Seeded train/evaluation split

use crate::error::{HappinessError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row partition produced by [`train_test_split`]
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Source row of each training sample
    pub train_indices: Vec<usize>,
    /// Source row of each evaluation sample
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Shuffle rows with a seeded ChaCha8 generator and cut off the evaluation
/// partition.
///
/// The evaluation partition holds `ceil(test_fraction * n)` rows and is taken
/// from the front of the shuffled order; the remainder is the training
/// partition. The same input and seed always give the same partition.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    let n = x.nrows();

    if n != y.len() {
        return Err(HappinessError::ShapeError {
            expected: format!("y length = {}", n),
            actual: format!("y length = {}", y.len()),
        });
    }

    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(HappinessError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(HappinessError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: format!(
                "leaves an empty partition for {} rows ({} evaluation)",
                n, n_test
            ),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(r, c)| (r * 10 + c) as f64);
        let y = Array1::from_shape_fn(n, |r| r as f64);
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = data(10);
        let split = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(split.n_train(), 8);
        assert_eq!(split.n_test(), 2);
        assert_eq!(split.x_train.nrows(), 8);
        assert_eq!(split.y_test.len(), 2);
    }

    #[test]
    fn test_split_rounds_evaluation_up() {
        let (x, y) = data(11);
        let split = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(split.n_test(), 3);
        assert_eq!(split.n_train(), 8);
    }

    #[test]
    fn test_split_is_disjoint_and_aligned() {
        let (x, y) = data(25);
        let split = train_test_split(&x, &y, 0.2, 7).unwrap();

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());

        for (k, &row) in split.train_indices.iter().enumerate() {
            assert_eq!(split.y_train[k], row as f64);
            assert_eq!(split.x_train[[k, 1]], (row * 10 + 1) as f64);
        }
        for (k, &row) in split.test_indices.iter().enumerate() {
            assert_eq!(split.y_test[k], row as f64);
        }
    }

    #[test]
    fn test_split_deterministic() {
        let (x, y) = data(40);
        let a = train_test_split(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.test_indices, b.test_indices);
        assert_eq!(a.x_train, b.x_train);

        let c = train_test_split(&x, &y, 0.2, 43).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let (x, y) = data(10);
        assert!(train_test_split(&x, &y, 0.0, 42).is_err());
        assert!(train_test_split(&x, &y, 1.0, 42).is_err());
        assert!(train_test_split(&x, &y, f64::NAN, 42).is_err());
    }

    #[test]
    fn test_split_rejects_tiny_input() {
        let (x, y) = data(1);
        assert!(train_test_split(&x, &y, 0.2, 42).is_err());
    }

    #[test]
    fn test_split_rejects_misaligned_target() {
        let (x, _) = data(10);
        let y = Array1::zeros(9);
        assert!(matches!(
            train_test_split(&x, &y, 0.2, 42),
            Err(HappinessError::ShapeError { .. })
        ));
    }
}
