//! Boost fuel gauge
//!
//! Boost can only start above the activation threshold and is forced off the
//! moment the tank runs dry.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Boost state transition reported by [`BoostFuel::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoostEdge {
    Started,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostFuel {
    fuel: f32,
    max_fuel: f32,
    consume_rate: f32,
    regen_rate: f32,
    activation_threshold: f32,
    active: bool,
}

impl BoostFuel {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            fuel: tuning.max_fuel,
            max_fuel: tuning.max_fuel,
            consume_rate: tuning.fuel_consume_rate,
            regen_rate: tuning.fuel_regen_rate,
            activation_threshold: tuning.boost_activation_threshold(),
            active: false,
        }
    }

    /// Try to start boosting. Returns true only on the off -> on transition.
    pub fn activate(&mut self) -> bool {
        if self.active || self.fuel <= self.activation_threshold {
            return false;
        }
        self.active = true;
        true
    }

    /// Stop boosting (boost key released). Returns true if boost was active.
    pub fn release(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }

    /// Burn or regenerate fuel. Reports `Stopped` when the tank runs dry.
    pub fn tick(&mut self, dt: f32) -> Option<BoostEdge> {
        if self.active {
            self.fuel -= self.consume_rate * dt;
            if self.fuel <= 0.0 {
                self.fuel = 0.0;
                self.active = false;
                return Some(BoostEdge::Stopped);
            }
        } else {
            self.fuel = (self.fuel + self.regen_rate * dt).min(self.max_fuel);
        }
        None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    pub fn max_fuel(&self) -> f32 {
        self.max_fuel
    }

    /// Fuel level as 0..=100 for the HUD bar
    pub fn percent(&self) -> f32 {
        self.fuel / self.max_fuel * 100.0
    }
}
