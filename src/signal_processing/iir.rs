use crate::constants::NORMALIZATION_TOLERANCE;
use crate::error::{FilterError, Result};
use crate::signal_processing::Filter;

/// Streaming IIR filter in Direct Form II Transposed over caller storage
///
/// Realizes the transfer function
///
/// ```text
///         b[0] + b[1] z^-1 + ... + b[nb-1] z^-(nb-1)
/// H(z) = --------------------------------------------
///         1    + a[1] z^-1 + ... + a[na-1] z^-(na-1)
/// ```
///
/// with `order = max(nb, na) - 1` state slots. The shorter coefficient table
/// is treated as zero-padded, so `nb` and `na` may differ.
///
/// The feedback table must already be normalized (`a[0] == 1`); the engine
/// rejects anything else rather than rescaling behind the caller's back. See
/// [`normalize_coefficients`] for an explicit way to normalize.
///
/// All arithmetic is single precision. Low-order sensor filters are fine;
/// high-order designs should be split into cascaded second-order sections.
///
/// # Example
/// ```
/// use sensorfilt::signal_processing::IirFilter;
///
/// let b = [0.2929, 0.5858, 0.2929];
/// let a = [1.0, 0.0, 0.1716];
/// let mut state = [0.0; 2];
/// let mut iir = IirFilter::new(&mut state, &b, &a).unwrap();
///
/// assert_eq!(iir.process(1.0), 0.2929);
/// ```
#[derive(Debug)]
pub struct IirFilter<'a> {
    b: &'a [f32],
    a: &'a [f32],
    state: &'a mut [f32],
}

impl<'a> IirFilter<'a> {
    /// Bind an IIR filter to caller storage
    ///
    /// `state` must hold at least `max(b.len(), a.len()) - 1` slots. Extra
    /// slots are left untouched; the used ones are zeroed.
    ///
    /// # Errors
    /// - `FilterError::EmptyFilter` if either coefficient table is empty
    /// - `FilterError::FeedbackNotNormalized` if `a[0]` is not 1
    /// - `FilterError::InsufficientStorage` if `state` is too short
    pub fn new(state: &'a mut [f32], b: &'a [f32], a: &'a [f32]) -> Result<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(FilterError::EmptyFilter);
        }
        if !is_normalized(a[0]) {
            return Err(FilterError::FeedbackNotNormalized(a[0]));
        }

        let order = required_state_len(b.len(), a.len());
        if state.len() < order {
            return Err(FilterError::InsufficientStorage {
                needed: order,
                available: state.len(),
            });
        }

        let state = &mut state[..order];
        state.fill(0.0);

        log::debug!(
            "IIR filter bound: order {} (nb={}, na={})",
            order,
            b.len(),
            a.len()
        );

        Ok(Self { b, a, state })
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, sample: f32) -> f32 {
        let order = self.state.len();
        if order == 0 {
            return self.b[0] * sample;
        }

        let output = self.b[0] * sample + self.state[0];

        for i in 0..order - 1 {
            self.state[i] = self.state[i + 1] + self.b_eff(i + 1) * sample
                - self.a_eff(i + 1) * output;
        }
        self.state[order - 1] = self.b_eff(order) * sample - self.a_eff(order) * output;

        output
    }

    /// Zero the internal state
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    /// Number of state slots, `max(nb, na) - 1`
    pub fn order(&self) -> usize {
        self.state.len()
    }

    pub fn feedforward(&self) -> &[f32] {
        self.b
    }

    pub fn feedback(&self) -> &[f32] {
        self.a
    }

    pub fn state(&self) -> &[f32] {
        self.state
    }

    #[inline]
    fn b_eff(&self, k: usize) -> f32 {
        self.b.get(k).copied().unwrap_or(0.0)
    }

    #[inline]
    fn a_eff(&self, k: usize) -> f32 {
        self.a.get(k).copied().unwrap_or(0.0)
    }
}

impl Filter for IirFilter<'_> {
    fn process(&mut self, sample: f32) -> f32 {
        IirFilter::process(self, sample)
    }

    fn reset(&mut self) {
        IirFilter::reset(self)
    }
}

/// Whether a leading feedback coefficient counts as 1; false for NaN
pub fn is_normalized(a0: f32) -> bool {
    (a0 - 1.0).abs() <= NORMALIZATION_TOLERANCE
}

/// State slots needed for `nb` feedforward and `na` feedback coefficients
pub fn required_state_len(nb: usize, na: usize) -> usize {
    nb.max(na).saturating_sub(1)
}

/// Scale `b` and `a` in place so that `a[0] == 1`
///
/// Opt-in helper for coefficient tables exported without normalization.
/// The filter engine itself never rescales.
///
/// # Errors
/// - `FilterError::EmptyFilter` if `a` is empty
/// - `FilterError::SingularFeedback` if `a[0]` is zero
pub fn normalize_coefficients(b: &mut [f32], a: &mut [f32]) -> Result<()> {
    let a0 = *a.first().ok_or(FilterError::EmptyFilter)?;
    if a0 == 0.0 {
        return Err(FilterError::SingularFeedback);
    }
    for coeff in b.iter_mut().chain(a.iter_mut()) {
        *coeff /= a0;
    }
    Ok(())
}
