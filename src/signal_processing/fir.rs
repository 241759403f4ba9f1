use num_traits::Float;

use crate::error::{FilterError, Result};
use crate::signal_processing::Filter;

/// Streaming FIR filter over caller-provided storage
///
/// Keeps the last `tap_count` input samples in a ring buffer and computes a
/// weighted sum of them for every new sample. The filter never allocates:
/// both the history ring and the coefficient table are borrowed for the
/// lifetime of the filter.
///
/// Coefficients are ordered most-recent-first, so `coefficients[0]` weights
/// the sample that was just written and `coefficients[tap_count - 1]` the
/// oldest retained one.
///
/// The sample type defaults to `f32`. Long tables (tens of taps with tiny
/// outer coefficients) can run in `f64` instead; only the `f32` variant
/// implements [`Filter`].
///
/// # Example
/// ```
/// use sensorfilt::signal_processing::FirFilter;
///
/// let taps = [0.2f32; 5];
/// let mut history = [0.0; 5];
/// let mut fir = FirFilter::from_coefficients(&mut history, &taps).unwrap();
///
/// let out = fir.process(1.0);
/// assert!((out - 0.2).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct FirFilter<'a, T = f32> {
    coefficients: &'a [T],
    history: &'a mut [T],
    write_index: usize,
}

impl<'a, T: Float> FirFilter<'a, T> {
    /// Bind a FIR filter to caller storage
    ///
    /// Only the first `tap_count` slots of `history` and `coefficients` are
    /// used. The history slots are zeroed, so the filter starts as if the
    /// signal had been zero forever.
    ///
    /// # Errors
    /// - `FilterError::EmptyFilter` if `tap_count` is zero
    /// - `FilterError::InsufficientCoefficients` if `coefficients` is shorter than `tap_count`
    /// - `FilterError::InsufficientStorage` if `history` is shorter than `tap_count`
    pub fn new(history: &'a mut [T], coefficients: &'a [T], tap_count: usize) -> Result<Self> {
        if tap_count == 0 {
            return Err(FilterError::EmptyFilter);
        }
        if coefficients.len() < tap_count {
            return Err(FilterError::InsufficientCoefficients {
                needed: tap_count,
                available: coefficients.len(),
            });
        }
        if history.len() < tap_count {
            return Err(FilterError::InsufficientStorage {
                needed: tap_count,
                available: history.len(),
            });
        }

        let history = &mut history[..tap_count];
        history.fill(T::zero());

        log::debug!("FIR filter bound with {} taps", tap_count);

        Ok(Self {
            coefficients: &coefficients[..tap_count],
            history,
            write_index: 0,
        })
    }

    /// Bind a FIR filter using every coefficient in `coefficients`
    pub fn from_coefficients(history: &'a mut [T], coefficients: &'a [T]) -> Result<Self> {
        Self::new(history, coefficients, coefficients.len())
    }

    /// Process a single sample through the filter
    ///
    /// Same as [`put`](Self::put) followed by [`output`](Self::output).
    pub fn process(&mut self, sample: T) -> T {
        self.put(sample);
        self.output()
    }

    /// Store a sample in the ring without computing an output
    ///
    /// Lets a sketch sample at one rate and read the filtered value at
    /// another, e.g. put every millisecond and plot every tenth.
    pub fn put(&mut self, sample: T) {
        self.history[self.write_index] = sample;
        self.write_index += 1;
        if self.write_index == self.history.len() {
            self.write_index = 0;
        }
    }

    /// Weighted sum of the retained samples, newest first
    ///
    /// Does not change the filter; calling it twice gives the same value.
    pub fn output(&self) -> T {
        let n = self.history.len();
        let newest = if self.write_index == 0 {
            n - 1
        } else {
            self.write_index - 1
        };

        let mut output = T::zero();

        // Walk the ring newest to oldest as two contiguous reverse ranges
        // instead of wrapping the index on every tap.
        let mut tap_i = 0usize;
        for delay_idx in (0..=newest).rev() {
            output = output + self.coefficients[tap_i] * self.history[delay_idx];
            tap_i += 1;
        }
        for delay_idx in ((newest + 1)..n).rev() {
            output = output + self.coefficients[tap_i] * self.history[delay_idx];
            tap_i += 1;
        }
        debug_assert_eq!(tap_i, n);

        output
    }

    /// Zero the history and rewind the write position
    pub fn reset(&mut self) {
        self.history.fill(T::zero());
        self.write_index = 0;
    }

    /// Number of taps (filter length)
    pub fn tap_count(&self) -> usize {
        self.history.len()
    }

    /// Ring slot the next sample will be written to
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn coefficients(&self) -> &[T] {
        self.coefficients
    }

    /// Retained input samples, newest first
    pub fn retained(&self) -> impl Iterator<Item = T> + '_ {
        let n = self.history.len();
        (0..n).map(move |age| self.history[(self.write_index + n - 1 - age) % n])
    }
}

impl Filter for FirFilter<'_, f32> {
    fn process(&mut self, sample: f32) -> f32 {
        FirFilter::process(self, sample)
    }

    fn reset(&mut self) {
        FirFilter::reset(self)
    }
}
