//! Model families and blade-count routing

use std::fmt;

use crate::models::regressor::Regressor;

/// The two trained model families.
///
/// Family A covers 2-blade propellers. Family B covers every other blade
/// count, including counts it never saw in training (0, negative, 5+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    A,
    B,
}

impl Family {
    /// Route a blade count to its family.
    pub fn for_blade_count(blade_count: i64) -> Self {
        if blade_count == 2 {
            Family::A
        } else {
            Family::B
        }
    }

    /// Whether the blade count lies outside what the families were trained on.
    pub fn is_unusual_blade_count(blade_count: i64) -> bool {
        !(2..=4).contains(&blade_count)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::A => write!(f, "A"),
            Family::B => write!(f, "B"),
        }
    }
}

/// Which coefficient a regressor predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Thrust,
    Power,
    Efficiency,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Thrust, Target::Power, Target::Efficiency];
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Thrust => write!(f, "thrust"),
            Target::Power => write!(f, "power"),
            Target::Efficiency => write!(f, "efficiency"),
        }
    }
}

/// Three independently trained regressors sharing one input layout.
pub struct ModelFamily {
    pub thrust: Box<dyn Regressor>,
    pub power: Box<dyn Regressor>,
    pub efficiency: Box<dyn Regressor>,
}

impl ModelFamily {
    pub fn new(
        thrust: Box<dyn Regressor>,
        power: Box<dyn Regressor>,
        efficiency: Box<dyn Regressor>,
    ) -> Self {
        Self {
            thrust,
            power,
            efficiency,
        }
    }

    pub fn regressor(&self, target: Target) -> &dyn Regressor {
        match target {
            Target::Thrust => self.thrust.as_ref(),
            Target::Power => self.power.as_ref(),
            Target::Efficiency => self.efficiency.as_ref(),
        }
    }

    /// Model names in target order
    pub fn model_names(&self) -> Vec<String> {
        Target::ALL
            .iter()
            .map(|&t| self.regressor(t).name().to_string())
            .collect()
    }
}

impl fmt::Debug for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFamily")
            .field("models", &self.model_names())
            .finish()
    }
}
