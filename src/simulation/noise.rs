use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Disturbances added on top of a clean sensor signal
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    /// Standard deviation of additive white Gaussian noise
    pub gaussian_std: Option<f32>,
    pub impulse: Option<ImpulseNoiseConfig>,
}

/// Sparse spikes, like a relay switching next to the sensor line
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    /// Probability that any given sample carries a spike
    pub probability: f32,
    pub amplitude: f32,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_gaussian(mut self, std_dev: f32) -> Self {
        self.gaussian_std = Some(std_dev);
        self
    }

    pub fn with_impulses(mut self, probability: f32, amplitude: f32) -> Self {
        self.impulse = Some(ImpulseNoiseConfig {
            probability,
            amplitude,
        });
        self
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn apply_noise(signal: &mut [f32], config: &NoiseConfig) {
    let mut rng = create_rng(config.seed);

    if let Some(std_dev) = config.gaussian_std {
        apply_gaussian(signal, std_dev, &mut rng);
    }
    if let Some(ref impulse) = config.impulse {
        apply_impulses(signal, impulse, &mut rng);
    }
}

fn apply_gaussian(signal: &mut [f32], std_dev: f32, rng: &mut ChaCha8Rng) {
    let normal = match Normal::new(0.0, std_dev as f64) {
        Ok(normal) => normal,
        Err(e) => {
            log::warn!("Ignoring Gaussian noise with std {}: {}", std_dev, e);
            return;
        }
    };

    for sample in signal.iter_mut() {
        *sample += normal.sample(rng) as f32;
    }
}

fn apply_impulses(signal: &mut [f32], config: &ImpulseNoiseConfig, rng: &mut ChaCha8Rng) {
    for sample in signal.iter_mut() {
        if rng.random::<f32>() < config.probability {
            let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
            *sample += sign * config.amplitude;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let config = NoiseConfig::default().with_seed(42).with_gaussian(0.1);
        let mut a = vec![0.0; 256];
        let mut b = vec![0.0; 256];
        apply_noise(&mut a, &config);
        apply_noise(&mut b, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_gaussian_noise_statistics() {
        let config = NoiseConfig::default().with_seed(7).with_gaussian(0.5);
        let mut signal = vec![0.0; 20_000];
        apply_noise(&mut signal, &config);

        let n = signal.len() as f32;
        let mean = signal.iter().sum::<f32>() / n;
        let var = signal.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n;
        assert!(mean.abs() < 0.02, "mean {}", mean);
        assert!((var.sqrt() - 0.5).abs() < 0.02, "std {}", var.sqrt());
    }

    #[test]
    fn test_impulses_hit_roughly_expected_fraction() {
        let config = NoiseConfig::default().with_seed(3).with_impulses(0.1, 5.0);
        let mut signal = vec![0.0; 10_000];
        apply_noise(&mut signal, &config);

        let hits = signal.iter().filter(|x| x.abs() > 1.0).count();
        assert!((800..1200).contains(&hits), "hits {}", hits);
    }

    #[test]
    fn test_no_noise_leaves_signal_untouched() {
        let mut signal = vec![0.25; 16];
        apply_noise(&mut signal, &NoiseConfig::default().with_seed(1));
        assert_eq!(signal, vec![0.25; 16]);
    }
}
