use serde::{Deserialize, Serialize};

/// Epoch counter and elapsed simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationClock {
    pub epoch: u64,
    pub elapsed_time_sec: f64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, time_step_sec: f64) {
        self.epoch += 1;
        self.elapsed_time_sec += time_step_sec;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
