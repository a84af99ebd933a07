//! Closed-form linear regression over the fixed feature layout.
//!
//! Fitting standardizes each feature into an `ndarray` design matrix, solves
//! the ridge normal equations `(XᵀX + λI) w = Xᵀy` by Gaussian elimination
//! with partial pivoting, and folds the scaling back into raw-space
//! coefficients. A feature that is constant over the training rows carries
//! no signal and gets a zero coefficient.

use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{TrainError, TrainResult};

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 3;

/// Input order shared by training and serving.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["mileage", "transmission_code", "location_code"];

const CONSTANT_COLUMN_EPS: f64 = 1e-12;
const PIVOT_EPS: f64 = 1e-12;

/// `[mileage, transmission_code, location_code]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(mileage: f64, transmission_code: u32, location_code: u32) -> Self {
        Self([mileage, transmission_code as f64, location_code as f64])
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

/// Fitted coefficients in raw feature units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegression {
    /// Fit on `features` -> `targets` with ridge damping `l2`.
    pub fn fit(features: &[FeatureVector], targets: &[f64], l2: f64) -> TrainResult<Self> {
        if features.len() != targets.len() {
            return Err(TrainError::Config {
                reason: format!(
                    "{} feature rows but {} targets",
                    features.len(),
                    targets.len()
                ),
            });
        }
        if features.is_empty() {
            return Err(TrainError::InsufficientRows { needed: 1, got: 0 });
        }

        let x = Array2::from_shape_fn((features.len(), FEATURE_COUNT), |(i, j)| features[i].0[j]);
        let y = Array1::from(targets.to_vec());
        let means = x
            .mean_axis(Axis(0))
            .ok_or(TrainError::InsufficientRows { needed: 1, got: 0 })?;
        let scales = x.std_axis(Axis(0), 0.0);
        let y_mean = y.mean().unwrap_or(0.0);

        let active: Vec<usize> = (0..FEATURE_COUNT)
            .filter(|&j| scales[j] > CONSTANT_COLUMN_EPS)
            .collect();

        let z = Array2::from_shape_fn((features.len(), active.len()), |(i, c)| {
            let j = active[c];
            (x[[i, j]] - means[j]) / scales[j]
        });
        let (xtx, xty) = normal_equations(&z, &(&y - y_mean), l2);
        let standardized = solve(xtx, xty)?;

        let mut coefficients = vec![0.0; FEATURE_COUNT];
        for (&j, w) in active.iter().zip(standardized.iter()) {
            coefficients[j] = w / scales[j];
        }
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(means.iter())
                .map(|(c, m)| c * m)
                .sum::<f64>();

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict(&self, x: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x.values())
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn predict_many(&self, xs: &[FeatureVector]) -> Vec<f64> {
        xs.iter().map(|x| self.predict(x)).collect()
    }
}

/// `(ZᵀZ + λI, Zᵀy)` for a standardized design `z` and centered targets.
fn normal_equations(z: &Array2<f64>, yc: &Array1<f64>, l2: f64) -> (Array2<f64>, Array1<f64>) {
    let xtx = z.t().dot(z) + Array2::<f64>::eye(z.ncols()) * l2;
    let xty = z.t().dot(yc);
    (xtx, xty)
}

/// Solve `a w = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> TrainResult<Array1<f64>> {
    let k = b.len();

    for col in 0..k {
        let pivot = (col..k)
            .max_by(|&p, &q| a[[p, col]].abs().total_cmp(&a[[q, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < PIVOT_EPS {
            return Err(TrainError::SingularSystem);
        }
        if pivot != col {
            for c in 0..k {
                a.swap((col, c), (pivot, c));
            }
            b.swap(col, pivot);
        }

        let pivot_row = a.row(col).to_owned();
        for row in (col + 1)..k {
            let factor = a[[row, col]] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            a.row_mut(row).scaled_add(-factor, &pivot_row);
            b[row] -= factor * b[col];
        }
    }

    let mut solution = Array1::<f64>::zeros(k);
    for row in (0..k).rev() {
        let tail = a.slice(s![row, row + 1..]).dot(&solution.slice(s![row + 1..]));
        solution[row] = (b[row] - tail) / a[[row, row]];
    }

    if solution.iter().all(|w| w.is_finite()) {
        Ok(solution)
    } else {
        Err(TrainError::SingularSystem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn recovers_exact_linear_relationship() {
        let features: Vec<FeatureVector> = (0..60)
            .map(|i| FeatureVector::new(i as f64 * 1000.0, (i % 2) as u32, (i % 5) as u32))
            .collect();
        let targets: Vec<f64> = features
            .iter()
            .map(|x| 20_000.0 - 0.05 * x.0[0] + 3_000.0 * x.0[1] + 250.0 * x.0[2])
            .collect();

        let model = LinearRegression::fit(&features, &targets, 1e-9).unwrap();

        assert_close(model.intercept, 20_000.0, 1e-3);
        assert_close(model.coefficients[0], -0.05, 1e-8);
        assert_close(model.coefficients[1], 3_000.0, 1e-3);
        assert_close(model.coefficients[2], 250.0, 1e-3);
        assert_close(
            model.predict(&FeatureVector::new(12_345.0, 1, 3)),
            20_000.0 - 617.25 + 3_000.0 + 750.0,
            1e-3,
        );
    }

    #[test]
    fn constant_feature_gets_zero_coefficient() {
        let features: Vec<FeatureVector> = (0..10)
            .map(|i| FeatureVector::new(i as f64, 1, 0))
            .collect();
        let targets: Vec<f64> = (0..10).map(|i| 5.0 + 2.0 * i as f64).collect();

        let model = LinearRegression::fit(&features, &targets, 0.0).unwrap();

        assert_eq!(model.coefficients[1], 0.0);
        assert_eq!(model.coefficients[2], 0.0);
        assert_close(model.coefficients[0], 2.0, 1e-9);
        assert_close(model.intercept, 5.0, 1e-9);
    }

    #[test]
    fn all_constant_features_predict_the_mean() {
        let features = vec![FeatureVector::new(1.0, 0, 0); 4];
        let targets = vec![10.0, 20.0, 30.0, 40.0];

        let model = LinearRegression::fit(&features, &targets, 0.0).unwrap();

        assert_close(model.predict(&FeatureVector::new(99.0, 1, 2)), 25.0, 1e-12);
    }

    #[test]
    fn collinear_features_without_damping_are_singular() {
        // location code always equals transmission code
        let features: Vec<FeatureVector> = (0..8)
            .map(|i| FeatureVector::new(i as f64, (i % 2) as u32, (i % 2) as u32))
            .collect();
        let targets: Vec<f64> = (0..8).map(|i| i as f64).collect();

        let err = LinearRegression::fit(&features, &targets, 0.0).unwrap_err();
        assert!(matches!(err, TrainError::SingularSystem));

        // ridge damping resolves it
        assert!(LinearRegression::fit(&features, &targets, 1e-3).is_ok());
    }

    #[test]
    fn normal_equations_add_damping_to_the_diagonal() {
        let z = ndarray::arr2(&[[1.0, 0.0], [-1.0, 2.0], [0.0, -2.0]]);
        let yc = ndarray::arr1(&[1.0, -1.0, 0.0]);

        let (xtx, xty) = normal_equations(&z, &yc, 0.5);

        assert_eq!(xtx, ndarray::arr2(&[[2.5, -2.0], [-2.0, 8.5]]));
        assert_eq!(xty, ndarray::arr1(&[2.0, -2.0]));
    }

    #[test]
    fn solve_pivots_past_a_zero_leading_entry() {
        let a = ndarray::arr2(&[[0.0, 2.0], [3.0, 1.0]]);
        let b = ndarray::arr1(&[4.0, 5.0]);

        let w = solve(a, b).unwrap();

        assert_close(w[0], 1.0, 1e-12);
        assert_close(w[1], 2.0, 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = LinearRegression::fit(&[FeatureVector::new(1.0, 0, 0)], &[], 0.0).unwrap_err();
        assert!(matches!(err, TrainError::Config { .. }));
    }
}
