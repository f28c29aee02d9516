use qtris_engine::{Action, PieceKind, Rotation};
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::{action_values::ActionValues, config::RadarConfig, state::StateKey};

use super::ValueFunction;

/// How a [`StateKey`] is flattened into the regressor's input vector.
///
/// Inputs, in order: piece kind (one-hot), rotation (one-hot), block offsets
/// (scaled to `[0, 1]`), radar bits, column offset and anchor row (both
/// scaled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub radar: RadarConfig,
    pub board_height: usize,
}

const OFFSET_INPUTS: usize = 8;

impl FeatureLayout {
    #[must_use]
    pub fn new(radar: RadarConfig, board_height: usize) -> Self {
        Self {
            radar,
            board_height,
        }
    }

    #[must_use]
    pub fn input_len(&self) -> usize {
        PieceKind::LEN + Rotation::ALL.len() + OFFSET_INPUTS + self.radar.width * self.radar.depth + 2
    }

    #[must_use]
    pub fn features(&self, state: &StateKey) -> Vec<f64> {
        let mut x = Vec::with_capacity(self.input_len());
        x.extend(PieceKind::ALL.map(|k| one_hot(k == state.kind)));
        x.extend(Rotation::ALL.map(|r| one_hot(r == state.rotation)));
        for offset in state.offsets {
            x.push(f64::from(offset.dx) / 3.0);
            x.push(f64::from(offset.dy) / 3.0);
        }
        for d in 0..self.radar.depth {
            let mask = state.radar.get(d).copied().unwrap_or(0);
            x.extend((0..self.radar.width).map(|i| one_hot(mask & (1 << i) != 0)));
        }
        x.push(f64::from(state.column_offset) / to_f64(self.radar.width));
        x.push(f64::from(state.anchor_row) / to_f64(self.board_height.max(1)));
        x
    }
}

fn one_hot(on: bool) -> f64 {
    if on { 1.0 } else { 0.0 }
}

#[expect(clippy::cast_precision_loss)]
fn to_f64(n: usize) -> f64 {
    n as f64
}

/// A stored layer whose dimensions disagree with the network around it.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("{layer} layer has {found} {part}, expected {expected}")]
pub struct ShapeError {
    pub layer: &'static str,
    pub part: &'static str,
    pub expected: usize,
    pub found: usize,
}

/// Fully connected layer stored row-major: `weights[out * inputs + in]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Layer {
    inputs: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Layer {
    fn random<R>(inputs: usize, outputs: usize, std_dev: f64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let normal = Normal::new(0.0, std_dev).unwrap();
        Self {
            inputs,
            weights: (0..inputs * outputs).map(|_| rng.sample(normal)).collect(),
            biases: vec![0.0; outputs],
        }
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .chunks_exact(self.inputs)
            .zip(&self.biases)
            .map(|(row, b)| row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + b)
            .collect()
    }

    fn len(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn check_shape(
        &self,
        layer: &'static str,
        inputs: usize,
        outputs: usize,
    ) -> Result<(), ShapeError> {
        let parts = [
            ("inputs", inputs, self.inputs),
            ("biases", outputs, self.biases.len()),
            ("weights", inputs * outputs, self.weights.len()),
        ];
        match parts.into_iter().find(|(_, expected, found)| expected != found) {
            Some((part, expected, found)) => Err(ShapeError {
                layer,
                part,
                expected,
                found,
            }),
            None => Ok(()),
        }
    }
}

/// Action values approximated by a network with one hidden ReLU layer.
///
/// Trained by stochastic gradient descent on the squared error of the single
/// action being updated; the other outputs only move through shared weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpRegressor {
    layout: FeatureLayout,
    hidden: Layer,
    output: Layer,
}

impl MlpRegressor {
    /// Creates a network with He-initialized hidden weights and zero biases.
    pub fn new<R>(layout: FeatureLayout, hidden_units: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let inputs = layout.input_len();
        let hidden = Layer::random(inputs, hidden_units, (2.0 / to_f64(inputs)).sqrt(), rng);
        let output = Layer::random(
            hidden_units,
            Action::LEN,
            (1.0 / to_f64(hidden_units.max(1))).sqrt(),
            rng,
        );
        Self {
            layout,
            hidden,
            output,
        }
    }

    #[must_use]
    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    #[must_use]
    pub fn hidden_units(&self) -> usize {
        self.hidden.biases.len()
    }

    /// Checks that both layers fit the input layout and each other.
    ///
    /// A network built by [`MlpRegressor::new`] always passes; a deserialized
    /// one may not.
    pub fn validate(&self) -> Result<(), ShapeError> {
        let hidden_units = self.hidden_units();
        self.hidden
            .check_shape("hidden", self.layout.input_len(), hidden_units)?;
        self.output.check_shape("output", hidden_units, Action::LEN)
    }

    fn activations(&self, x: &[f64]) -> Vec<f64> {
        let mut h = self.hidden.forward(x);
        for v in &mut h {
            *v = v.max(0.0);
        }
        h
    }
}

impl ValueFunction for MlpRegressor {
    fn predict(&self, state: &StateKey) -> ActionValues {
        let x = self.layout.features(state);
        let y = self.output.forward(&self.activations(&x));
        let mut values = [0.0; Action::LEN];
        for (v, y) in values.iter_mut().zip(y) {
            *v = y;
        }
        ActionValues::new(values)
    }

    fn update(&mut self, state: &StateKey, action: Action, target: f64, learning_rate: f64) {
        let x = self.layout.features(state);
        let h = self.activations(&x);
        let a = action.index();
        let out_row = &mut self.output.weights[a * self.output.inputs..][..self.output.inputs];
        let prediction: f64 = out_row.iter().zip(&h).map(|(w, hj)| w * hj).sum::<f64>()
            + self.output.biases[a];
        let error = prediction - target;

        // gradient of the hidden layer uses the output weights before this step
        let hidden_grads: Vec<f64> = out_row
            .iter()
            .zip(&h)
            .map(|(w, hj)| if *hj > 0.0 { error * w } else { 0.0 })
            .collect();

        for (w, hj) in out_row.iter_mut().zip(&h) {
            *w -= learning_rate * error * hj;
        }
        self.output.biases[a] -= learning_rate * error;

        let inputs = self.hidden.inputs;
        for (j, grad) in hidden_grads.into_iter().enumerate() {
            if grad == 0.0 {
                continue;
            }
            let row = &mut self.hidden.weights[j * inputs..][..inputs];
            for (w, xi) in row.iter_mut().zip(&x) {
                *w -= learning_rate * grad * xi;
            }
            self.hidden.biases[j] -= learning_rate * grad;
        }
    }

    fn len(&self) -> usize {
        self.hidden.len() + self.output.len()
    }
}

#[cfg(test)]
mod tests {
    use qtris_engine::PieceCatalog;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn layout() -> FeatureLayout {
        FeatureLayout::new(RadarConfig { width: 4, depth: 2 }, 20)
    }

    fn key(kind: PieceKind, radar: Vec<u64>) -> StateKey {
        StateKey {
            kind,
            rotation: Rotation::Deg90,
            offsets: *PieceCatalog::standard().shape(kind, Rotation::Deg90),
            radar,
            column_offset: 1,
            anchor_row: 10,
        }
    }

    #[test]
    fn test_feature_vector() {
        let layout = layout();
        let x = layout.features(&key(PieceKind::S, vec![0b1001, 0b0110]));
        assert_eq!(x.len(), layout.input_len());
        assert_eq!(x.len(), 7 + 4 + 8 + 8 + 2);
        assert_eq!(&x[..7], &[0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&x[7..11], &[0.0, 1.0, 0.0, 0.0]);
        assert_eq!(&x[19..27], &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
        assert!((x[27] - 0.25).abs() < f64::EPSILON);
        assert!((x[28] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_prediction_moves_toward_target() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut model = MlpRegressor::new(layout(), 16, &mut rng);
        let state = key(PieceKind::T, vec![0b0011, 0]);
        let target = 5.0;

        let initial = (model.predict(&state).get(Action::Rotate) - target).abs();
        for _ in 0..500 {
            model.update(&state, Action::Rotate, target, 0.01);
        }
        let trained = (model.predict(&state).get(Action::Rotate) - target).abs();
        assert!(trained < initial);
        assert!(trained < 0.1, "error after training: {trained}");
    }

    #[test]
    fn test_parameter_count() {
        let mut rng = Pcg32::seed_from_u64(0);
        let model = MlpRegressor::new(layout(), 5, &mut rng);
        let inputs = layout().input_len();
        assert_eq!(model.len(), inputs * 5 + 5 + 5 * 4 + 4);
        assert_eq!(model.hidden_units(), 5);
    }

    #[test]
    fn test_json_roundtrip_is_exact() {
        let mut rng = Pcg32::seed_from_u64(11);
        let model = MlpRegressor::new(layout(), 4, &mut rng);
        let json = serde_json::to_string(&model).unwrap();
        let back: MlpRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
        let state = key(PieceKind::L, vec![1, 2]);
        assert_eq!(back.predict(&state), model.predict(&state));
    }

    #[test]
    fn test_validate_reports_mismatched_layers() {
        let mut rng = Pcg32::seed_from_u64(12);
        let model = MlpRegressor::new(layout(), 3, &mut rng);
        assert_eq!(model.validate(), Ok(()));

        let mut truncated = model.clone();
        truncated.output.weights.truncate(2);
        assert_eq!(
            truncated.validate(),
            Err(ShapeError {
                layer: "output",
                part: "weights",
                expected: 3 * Action::LEN,
                found: 2,
            })
        );

        let mut narrow = model.clone();
        narrow.hidden.inputs -= 1;
        assert_eq!(narrow.validate().map_err(|e| e.part), Err("inputs"));

        let mut extra_unit = model;
        extra_unit.hidden.biases.push(0.0);
        let err = extra_unit.validate().unwrap_err();
        assert_eq!((err.layer, err.part), ("hidden", "weights"));
    }
}
