/// Common trait for streaming sample filters
///
/// Implemented by FirFilter, IirFilter and the composite types built on top
/// of them. One call consumes one input sample and yields one output sample.
pub trait Filter {
    /// Process a single sample through the filter
    fn process(&mut self, sample: f32) -> f32;

    /// Clear all retained history, as if the filter had just been built
    fn reset(&mut self);

    /// Process a buffer of samples in-place
    fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Feed the output of this filter into `next`
    fn then<F: Filter>(self, next: F) -> Cascade<Self, F>
    where
        Self: Sized,
    {
        Cascade::new(self, next)
    }
}

impl<F: Filter + ?Sized> Filter for &mut F {
    fn process(&mut self, sample: f32) -> f32 {
        (**self).process(sample)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Two filters run back to back
///
/// Holds both stages by value, so a cascade of borrowed engines allocates
/// nothing and can be nested to any depth.
pub struct Cascade<A, B> {
    first: A,
    second: B,
}

impl<A: Filter, B: Filter> Cascade<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Filter, B: Filter> Filter for Cascade<A, B> {
    fn process(&mut self, sample: f32) -> f32 {
        self.second.process(self.first.process(sample))
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}
