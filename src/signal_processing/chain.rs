use crate::config::StageSpec;
use crate::error::{FilterError, Result};
use crate::signal_processing::{Filter, FirFilter, IirFilter};

/// A single bound filter stage of a runtime-configured pipeline
#[derive(Debug)]
pub enum Stage<'a> {
    Fir(FirFilter<'a>),
    /// FIR stage accumulating in double precision
    Fir64(FirFilter<'a, f64>),
    Iir(IirFilter<'a>),
}

impl Filter for Stage<'_> {
    fn process(&mut self, sample: f32) -> f32 {
        match self {
            Stage::Fir(fir) => fir.process(sample),
            Stage::Fir64(fir) => fir.process(f64::from(sample)) as f32,
            Stage::Iir(iir) => iir.process(sample),
        }
    }

    fn reset(&mut self) {
        match self {
            Stage::Fir(fir) => fir.reset(),
            Stage::Fir64(fir) => fir.reset(),
            Stage::Iir(iir) => iir.reset(),
        }
    }
}

/// Working memory of one stage, in the precision the stage runs at
#[derive(Debug, Clone, PartialEq)]
pub enum StageBuffer {
    Single(Vec<f32>),
    Double(Vec<f64>),
}

impl StageBuffer {
    pub fn len(&self) -> usize {
        match self {
            StageBuffer::Single(buffer) => buffer.len(),
            StageBuffer::Double(buffer) => buffer.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backing memory for every stage of a pipeline
///
/// Allocated once, before the sampling loop starts; the stages borrow it for
/// as long as the chain lives.
#[derive(Debug, Clone, Default)]
pub struct StageStorage {
    buffers: Vec<StageBuffer>,
}

impl StageStorage {
    pub fn for_stages(stages: &[StageSpec]) -> Self {
        Self {
            buffers: stages.iter().map(StageSpec::allocate).collect(),
        }
    }

    /// Total number of state slots held, whatever their precision
    pub fn total_len(&self) -> usize {
        self.buffers.iter().map(StageBuffer::len).sum()
    }
}

/// Filters run back to back, in configuration order
///
/// An empty chain passes samples through unchanged.
#[derive(Debug)]
pub struct FilterChain<'a> {
    stages: Vec<Stage<'a>>,
}

impl<'a> FilterChain<'a> {
    /// Bind each stage spec to its storage buffer
    ///
    /// # Errors
    /// Returns `FilterError::Config` if `storage` was sized for a different
    /// number of stages, or the binding error of the first stage that fails.
    pub fn build(specs: &'a [StageSpec], storage: &'a mut StageStorage) -> Result<Self> {
        if specs.len() != storage.buffers.len() {
            return Err(FilterError::Config(format!(
                "storage sized for {} stage(s), pipeline has {}",
                storage.buffers.len(),
                specs.len()
            )));
        }

        let stages = specs
            .iter()
            .zip(storage.buffers.iter_mut())
            .map(|(spec, buffer)| spec.bind(buffer))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Filter chain built with {} stage(s)", stages.len());

        Ok(Self { stages })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[Stage<'a>] {
        &self.stages
    }
}

impl Filter for FilterChain<'_> {
    fn process(&mut self, sample: f32) -> f32 {
        self.stages
            .iter_mut()
            .fold(sample, |value, stage| stage.process(value))
    }

    fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn moving_average(n: usize) -> StageSpec {
        StageSpec::Fir {
            coefficients: vec![1.0 / n as f32; n],
        }
    }

    #[test]
    fn test_empty_chain_passes_through() {
        let specs: Vec<StageSpec> = Vec::new();
        let mut storage = StageStorage::for_stages(&specs);
        let mut chain = FilterChain::build(&specs, &mut storage).unwrap();

        assert!(chain.is_empty());
        assert_eq!(chain.process(3.5), 3.5);
    }

    #[test]
    fn test_cascaded_fir_stages() {
        // Two 2-tap averages give the [0.25, 0.5, 0.25] kernel
        let specs = vec![moving_average(2), moving_average(2)];
        let mut storage = StageStorage::for_stages(&specs);
        let mut chain = FilterChain::build(&specs, &mut storage).unwrap();

        assert_eq!(chain.len(), 2);
        assert_abs_diff_eq!(chain.process(1.0), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(chain.process(0.0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(chain.process(0.0), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(chain.process(0.0), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fir_then_iir() {
        let specs = vec![
            moving_average(5),
            StageSpec::Iir {
                b: vec![0.2929, 0.5858, 0.2929],
                a: vec![1.0, 0.0, 0.1716],
            },
        ];
        let mut storage = StageStorage::for_stages(&specs);
        assert_eq!(storage.total_len(), 7);

        let mut chain = FilterChain::build(&specs, &mut storage).unwrap();
        assert!(matches!(chain.stages()[0], Stage::Fir(_)));
        assert!(matches!(chain.stages()[1], Stage::Iir(_)));

        assert_abs_diff_eq!(chain.process(1.0), 0.2 * 0.2929, epsilon = 1e-6);

        let mut out = 0.0;
        for _ in 0..100 {
            out = chain.process(1.0);
        }
        assert_abs_diff_eq!(out, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_reset_reaches_every_stage() {
        let specs = vec![moving_average(3), moving_average(3)];
        let mut storage = StageStorage::for_stages(&specs);
        let mut chain = FilterChain::build(&specs, &mut storage).unwrap();

        for _ in 0..10 {
            chain.process(1.0);
        }
        chain.reset();
        assert_abs_diff_eq!(chain.process(0.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mismatched_storage_rejected() {
        let specs = vec![moving_average(3)];
        let mut storage = StageStorage::for_stages(&[]);
        assert!(matches!(
            FilterChain::build(&specs, &mut storage),
            Err(FilterError::Config(_))
        ));
    }

    #[test]
    fn test_bind_error_propagates() {
        let specs = vec![StageSpec::Iir {
            b: vec![1.0],
            a: vec![0.5, 0.1],
        }];
        let mut storage = StageStorage::for_stages(&specs);
        assert!(matches!(
            FilterChain::build(&specs, &mut storage),
            Err(FilterError::FeedbackNotNormalized(_))
        ));
    }

    #[test]
    fn test_double_precision_stage() {
        let specs = vec![StageSpec::Fir64 {
            coefficients: vec![0.5, 0.25, 0.25],
        }];
        let mut storage = StageStorage::for_stages(&specs);
        assert_eq!(storage.buffers, vec![StageBuffer::Double(vec![0.0; 3])]);

        let mut chain = FilterChain::build(&specs, &mut storage).unwrap();
        assert!(matches!(chain.stages()[0], Stage::Fir64(_)));
        assert_eq!(chain.process(1.0), 0.5);
        assert_eq!(chain.process(1.0), 0.75);
        assert_eq!(chain.process(1.0), 1.0);
    }

    #[test]
    fn test_storage_precision_mismatch_rejected() {
        let specs = vec![moving_average(2)];
        let mut storage = StageStorage {
            buffers: vec![StageBuffer::Double(vec![0.0; 2])],
        };
        assert!(matches!(
            FilterChain::build(&specs, &mut storage),
            Err(FilterError::Config(_))
        ));
    }
}
