pub mod rng;

pub use rng::ThreadRngSource;
