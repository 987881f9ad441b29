//! # Pooled State Machines
//!
//! States are plain values - a function pointer plus a small inline payload -
//! so updating a thousand machines walks a dense array calling through one
//! pointer each, with no vtable or box per state.

use basilisk_core::{PoolHeader, Poolable};

/// Mutable state shared by all of a machine's states.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsmData {
    /// Seconds spent in the current state.
    pub time_in_state: f32,
    /// Four floats of machine-local scratch, meaning defined by the states.
    pub payload: [f32; 4],
}

/// What a state's update decides.
#[derive(Clone, Copy)]
pub enum Transition {
    /// Remain in the current state.
    Stay,
    /// Switch to another state; `time_in_state` resets.
    To(State),
}

/// A state: a name for diagnostics and an update function.
#[derive(Clone, Copy)]
pub struct State {
    /// Diagnostic name, shown in logs.
    pub name: &'static str,
    /// Per-frame update. Receives the machine data and the frame delta.
    pub update: fn(&mut FsmData, f32) -> Transition,
}

/// A pooled finite state machine.
pub struct StateMachine {
    header: PoolHeader,
    state: State,
    /// Machine-local data handed to every state update.
    pub data: FsmData,
}

impl StateMachine {
    /// Creates a machine in `initial`.
    #[must_use]
    pub fn new(initial: State) -> Self {
        Self {
            header: PoolHeader::new(),
            state: initial,
            data: FsmData::default(),
        }
    }

    /// Name of the current state.
    #[inline]
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.state.name
    }

    /// Runs one serial update step.
    pub fn update(&mut self, dt: f32) {
        self.data.time_in_state += dt;
        match (self.state.update)(&mut self.data, dt) {
            Transition::Stay => {}
            Transition::To(next) => {
                self.state = next;
                self.data.time_in_state = 0.0;
            }
        }
    }
}

impl Poolable for StateMachine {
    fn header(&self) -> &PoolHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut PoolHeader {
        &mut self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDLE: State = State {
        name: "idle",
        update: |data, _dt| {
            if data.time_in_state >= 1.0 {
                Transition::To(ACTIVE)
            } else {
                Transition::Stay
            }
        },
    };

    const ACTIVE: State = State {
        name: "active",
        update: |data, dt| {
            data.payload[0] += dt;
            Transition::Stay
        },
    };

    #[test]
    fn test_timed_transition() {
        let mut machine = StateMachine::new(IDLE);
        machine.update(0.5);
        assert_eq!(machine.state_name(), "idle");
        machine.update(0.6);
        assert_eq!(machine.state_name(), "active");
        assert!((machine.data.time_in_state - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_payload_accumulates() {
        let mut machine = StateMachine::new(ACTIVE);
        machine.update(0.25);
        machine.update(0.25);
        assert!((machine.data.payload[0] - 0.5).abs() < 1e-6);
    }
}
