//! Regression model families

pub mod family;
pub mod loader;
pub mod regressor;

pub use family::{Family, ModelFamily, Target};
pub use loader::ModelLoader;
pub use regressor::{LinearRegressor, OnnxRegressor, Regressor};
