//! Parametric model implementations.
//!
//! Models are small, pure value/gradient pairs so that fitting and guessing
//! code can stay generic over the [`ParametricModel`] trait.

pub mod decay;
pub mod logistic;
pub mod model;
pub mod poly;

pub use decay::*;
pub use logistic::*;
pub use model::*;
pub use poly::*;

use crate::domain::ModelChoice;

/// Resolve a CLI model choice to a boxed model instance.
pub fn model_for(choice: ModelChoice) -> Box<dyn ParametricModel> {
    match choice {
        ModelChoice::Decay => Box::new(DecayModel),
        ModelChoice::Logistic => Box::new(LogisticModel),
        ModelChoice::Quadratic => Box::new(PolyModel),
    }
}
