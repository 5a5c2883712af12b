/// Modelling layer: splits, estimators, and evaluation.
///
/// All estimators come from `smartcore`; this layer only wires features into
/// them, picks among candidates, and scores the result.
pub mod classifier;
pub mod metrics;
pub mod regressor;
pub mod split;
