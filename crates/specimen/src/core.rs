//! Core Generator trait for value producers.

use crate::rng::Random;
use std::sync::Arc;

/// Core trait for anything that produces values from the run's RNG.
///
/// Built-in leaf producers and user-supplied value producers are both
/// expressed as generators. The RNG is passed in so that a run with a fixed
/// seed is reproducible.
pub trait Generator<T>: Send + Sync {
    /// Generate a single value using the provided RNG.
    fn generate(&self, rng: &mut Random) -> T;
}

/// Extension trait for storing generators in model contexts.
pub trait GeneratorExt<T>: Generator<T> + Sized {
    /// Share this generator behind an `Arc` for dynamic dispatch.
    fn shared(self) -> SharedGenerator<T>
    where
        Self: 'static,
        T: 'static,
    {
        Arc::new(self)
    }
}

impl<T, G: Generator<T> + Sized> GeneratorExt<T> for G {}

/// Shared generator for dynamic dispatch. Model contexts hold producers in
/// this form so that they can be cloned and sent across threads.
pub type SharedGenerator<T> = Arc<dyn Generator<T>>;

impl<T> Generator<T> for SharedGenerator<T> {
    fn generate(&self, rng: &mut Random) -> T {
        (**self).generate(rng)
    }
}

/// Generator from a closure.
pub struct ClosureGenerator<F> {
    f: F,
}

impl<T, F> Generator<T> for ClosureGenerator<F>
where
    F: Fn(&mut Random) -> T + Send + Sync,
{
    fn generate(&self, rng: &mut Random) -> T {
        (self.f)(rng)
    }
}

/// Helper function to create a closure-based generator.
pub fn gen<T, F>(f: F) -> ClosureGenerator<F>
where
    F: Fn(&mut Random) -> T + Send + Sync,
{
    ClosureGenerator { f }
}

/// Constant value generator.
#[derive(Clone)]
pub struct Constant<T>(pub T);

impl<T: Clone + Send + Sync> Generator<T> for Constant<T> {
    fn generate(&self, _rng: &mut Random) -> T {
        self.0.clone()
    }
}
