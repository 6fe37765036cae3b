// execution.rs - One computed generation of a board

use serde::{Deserialize, Serialize};

use crate::grid::GridState;

/// One computed generation of a board.
///
/// Step 0 is the board's initial state and never has an execution; the first
/// computed generation is step 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    step: u32,
    state: GridState,
    is_final: bool,
}

impl Execution {
    pub fn new(step: u32, state: GridState, is_final: bool) -> Self {
        Self {
            step,
            state,
            is_final,
        }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    /// No further generation may be computed after this one.
    pub fn is_final(&self) -> bool {
        self.is_final
    }
}
