// board.rs - Board aggregate: initial state plus the generations computed from it

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BoardError, BoardResult};
use crate::execution::Execution;
use crate::grid::{Fingerprint, GridState};
use crate::transition::{self, DEFAULT_PARALLEL_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(pub Uuid);

impl BoardId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a board, derived from its latest execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardStatus {
    Unstarted,
    Active,
    Final,
}

/// A board and whatever slice of its history was loaded.
///
/// History is kept in two lists. `persisted` holds executions that came from
/// storage (or were handed out by [`Board::take_pending`]); `pending` holds the
/// ones computed since, in increasing step order. Every pending step is larger
/// than every persisted step.
#[derive(Debug, Clone)]
pub struct Board {
    id: BoardId,
    name: String,
    initial_state: GridState,
    initial_fingerprint: Fingerprint,
    persisted: Vec<Execution>,
    pending: Vec<Execution>,
    seen: HashSet<Fingerprint>,
    parallel_threshold: usize,
}

impl Board {
    /// Freshly registered board with no history.
    pub fn new(id: BoardId, name: impl Into<String>, initial_state: GridState) -> Self {
        Self::with_history(id, name, initial_state, Vec::new())
    }

    /// Board loaded from storage together with a slice of its executions.
    pub fn with_history(
        id: BoardId,
        name: impl Into<String>,
        initial_state: GridState,
        history: Vec<Execution>,
    ) -> Self {
        let initial_fingerprint = initial_state.fingerprint();
        let seen = history.iter().map(|e| e.state().fingerprint()).collect();
        Self {
            id,
            name: name.into(),
            initial_state,
            initial_fingerprint,
            persisted: history,
            pending: Vec::new(),
            seen,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn id(&self) -> BoardId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> &GridState {
        &self.initial_state
    }

    /// Every loaded or computed execution; persisted ones first.
    pub fn executions(&self) -> impl Iterator<Item = &Execution> {
        self.persisted.iter().chain(self.pending.iter())
    }

    pub fn persisted(&self) -> &[Execution] {
        &self.persisted
    }

    /// Executions computed since the board was loaded and not yet handed out.
    pub fn pending(&self) -> &[Execution] {
        &self.pending
    }

    /// Hands pending executions to the caller for flushing and counts them as
    /// persisted from now on.
    pub fn take_pending(&mut self) -> Vec<Execution> {
        let pending = std::mem::take(&mut self.pending);
        self.persisted.extend(pending.iter().cloned());
        pending
    }

    pub fn latest_execution(&self) -> Option<&Execution> {
        self.pending
            .last()
            .or_else(|| self.persisted.iter().max_by_key(|e| e.step()))
    }

    pub fn execution(&self, step: u32) -> Option<&Execution> {
        self.executions().find(|e| e.step() == step)
    }

    /// Step of the latest execution, 0 when none exists.
    pub fn current_step(&self) -> u32 {
        self.latest_execution().map_or(0, Execution::step)
    }

    pub fn current_state(&self) -> &GridState {
        self.latest_execution()
            .map_or(&self.initial_state, Execution::state)
    }

    pub fn status(&self) -> BoardStatus {
        match self.latest_execution() {
            None => BoardStatus::Unstarted,
            Some(latest) if latest.is_final() => BoardStatus::Final,
            Some(_) => BoardStatus::Active,
        }
    }

    /// Computes the generation after the latest one.
    pub fn resolve_next_execution(&mut self, ceiling: u32) -> BoardResult<Execution> {
        self.step_once(ceiling)?;
        Ok(self.last_computed())
    }

    /// Computes up to `executions_to_resolve` new generations, stopping early
    /// at a final one, and returns the last generation computed.
    ///
    /// Fails without computing anything when the board cannot take all of the
    /// requested steps under `ceiling`.
    pub fn resolve_next_executions(
        &mut self,
        executions_to_resolve: u32,
        ceiling: u32,
    ) -> BoardResult<Execution> {
        if executions_to_resolve == 0 {
            return Err(BoardError::InvalidStepCount);
        }
        self.ensure_can_progress(ceiling)?;

        let current_step = self.current_step();
        if current_step.saturating_add(executions_to_resolve) > ceiling {
            return Err(BoardError::ExecutionLimitReached {
                step: current_step,
                ceiling,
            });
        }

        for _ in 0..executions_to_resolve {
            if self.step_once(ceiling)? {
                break;
            }
        }
        Ok(self.last_computed())
    }

    /// Computes generations until one is final: a repeated state or the
    /// ceiling.
    pub fn resolve_final_execution(&mut self, ceiling: u32) -> BoardResult<Execution> {
        self.ensure_can_progress(ceiling)?;
        while !self.step_once(ceiling)? {}
        Ok(self.last_computed())
    }

    fn ensure_can_progress(&self, ceiling: u32) -> BoardResult<()> {
        let (step, is_final) = self
            .latest_execution()
            .map_or((0, false), |e| (e.step(), e.is_final()));
        if is_final || step >= ceiling {
            return Err(BoardError::ExecutionLimitReached { step, ceiling });
        }
        Ok(())
    }

    /// Appends one generation and reports whether it is final.
    fn step_once(&mut self, ceiling: u32) -> BoardResult<bool> {
        self.ensure_can_progress(ceiling)?;

        let next_step = self.current_step() + 1;
        let next_state =
            transition::next_generation_auto(self.current_state(), self.parallel_threshold);
        let fingerprint = next_state.fingerprint();
        let is_final = next_step == ceiling || self.is_last_state(&fingerprint);

        tracing::trace!(board_id = %self.id, step = next_step, is_final, "resolved execution");

        self.seen.insert(fingerprint);
        self.pending.push(Execution::new(next_step, next_state, is_final));
        Ok(is_final)
    }

    /// Back at the start, or at a state already in the loaded history.
    fn is_last_state(&self, fingerprint: &Fingerprint) -> bool {
        *fingerprint == self.initial_fingerprint || self.seen.contains(fingerprint)
    }

    // Only called right after a successful step_once.
    fn last_computed(&self) -> Execution {
        match self.pending.last() {
            Some(execution) => execution.clone(),
            None => unreachable!("a step was just resolved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_blinker() -> GridState {
        GridState::from_rows(&[
            [false, true, false],
            [false, true, false],
            [false, true, false],
        ])
        .unwrap()
    }

    fn board_with(initial: GridState, history: Vec<Execution>) -> Board {
        Board::with_history(BoardId::generate(), "test", initial, history)
    }

    #[test]
    fn latest_is_none_without_executions() {
        let board = Board::new(BoardId::generate(), "empty", vertical_blinker());
        assert!(board.latest_execution().is_none());
        assert_eq!(board.status(), BoardStatus::Unstarted);
        assert_eq!(board.current_step(), 0);
    }

    #[test]
    fn latest_is_highest_step() {
        let state = vertical_blinker();
        let board = board_with(
            state.clone(),
            vec![
                Execution::new(1, state.clone(), false),
                Execution::new(3, state.clone(), false),
                Execution::new(2, state, false),
            ],
        );
        assert_eq!(board.latest_execution().map(Execution::step), Some(3));
    }

    #[test]
    fn execution_finds_exact_step() {
        let state = vertical_blinker();
        let board = board_with(
            state.clone(),
            vec![
                Execution::new(2, state.clone(), false),
                Execution::new(5, state, false),
            ],
        );
        assert_eq!(board.execution(5).map(Execution::step), Some(5));
        assert!(board.execution(99).is_none());
    }

    #[test]
    fn first_execution_is_step_one() {
        let mut board = Board::new(BoardId::generate(), "blinker", vertical_blinker());
        let execution = board.resolve_next_execution(10).unwrap();
        assert_eq!(execution.step(), 1);
        assert!(!execution.is_final());
        assert_eq!(board.pending().len(), 1);
        assert_eq!(board.status(), BoardStatus::Active);
    }

    #[test]
    fn final_latest_blocks_resolution() {
        let mut board = board_with(
            vertical_blinker(),
            vec![Execution::new(5, vertical_blinker(), true)],
        );
        let err = board.resolve_next_execution(10).unwrap_err();
        assert!(err.is_limit_reached());
        assert!(board.pending().is_empty());
    }

    #[test]
    fn ceiling_blocks_resolution() {
        let mut board = board_with(
            vertical_blinker(),
            vec![Execution::new(10, vertical_blinker(), false)],
        );
        assert!(board.resolve_next_execution(10).unwrap_err().is_limit_reached());
        assert!(board.pending().is_empty());
    }

    #[test]
    fn return_to_initial_state_is_final() {
        let state = vertical_blinker();
        let mut board = board_with(
            state.clone(),
            vec![Execution::new(1, state.next_generation(), false)],
        );
        assert!(board.resolve_next_execution(10).unwrap().is_final());
    }

    #[test]
    fn repeat_of_earlier_execution_is_final() {
        // The initial state is outside the blinker cycle, so only the
        // step-1 execution can match.
        let initial = GridState::dead(3, 3).unwrap();
        let vertical = vertical_blinker();
        let horizontal = vertical.next_generation();
        let mut board = board_with(
            initial.clone(),
            vec![
                Execution::new(1, horizontal.clone(), false),
                Execution::new(2, vertical.clone(), false),
            ],
        );

        let execution = board.resolve_next_execution(10).unwrap();
        assert_eq!(execution.step(), 3);
        assert_eq!(execution.state(), &horizontal);
        assert_ne!(execution.state(), &initial);
        assert_ne!(execution.state(), &vertical);
        assert!(execution.is_final());
    }

    #[test]
    fn unseen_state_is_not_final() {
        let mut board = board_with(
            vertical_blinker(),
            vec![Execution::new(1, vertical_blinker(), false)],
        );
        let execution = board.resolve_next_execution(10).unwrap();
        assert_eq!(execution.step(), 2);
        assert!(!execution.is_final());
    }

    #[test]
    fn reaching_the_ceiling_is_final() {
        let glider = GridState::from_rows(&[
            [false, true, false, false, false, false],
            [false, false, true, false, false, false],
            [true, true, true, false, false, false],
            [false, false, false, false, false, false],
            [false, false, false, false, false, false],
            [false, false, false, false, false, false],
        ])
        .unwrap();
        let mut board = board_with(glider, Vec::new());
        let first = board.resolve_next_execution(2).unwrap();
        assert!(!first.is_final());
        let second = board.resolve_next_execution(2).unwrap();
        assert_eq!(second.step(), 2);
        assert!(second.is_final());
    }

    #[test]
    fn bulk_rejects_zero_steps() {
        let mut board = board_with(vertical_blinker(), Vec::new());
        assert!(matches!(
            board.resolve_next_executions(0, 10),
            Err(BoardError::InvalidStepCount)
        ));
    }

    #[test]
    fn bulk_fails_fast_past_the_ceiling() {
        let mut board = board_with(
            vertical_blinker(),
            vec![Execution::new(8, vertical_blinker(), false)],
        );
        let err = board.resolve_next_executions(3, 10).unwrap_err();
        assert!(err.is_limit_reached());
        assert!(board.pending().is_empty());
    }

    #[test]
    fn bulk_counts_only_new_executions() {
        let mut board = board_with(
            vertical_blinker(),
            vec![Execution::new(8, vertical_blinker(), false)],
        );
        let execution = board.resolve_next_executions(2, 10).unwrap();
        assert_eq!(execution.step(), 10);
        assert_eq!(board.pending().len(), 2);
    }

    #[test]
    fn final_fails_when_already_final() {
        let mut board = board_with(
            vertical_blinker(),
            vec![Execution::new(2, vertical_blinker(), true)],
        );
        assert!(board.resolve_final_execution(10).unwrap_err().is_limit_reached());
    }

    #[test]
    fn take_pending_moves_executions() {
        let mut board = board_with(vertical_blinker(), Vec::new());
        board.resolve_final_execution(10).unwrap();

        let pending = board.take_pending();
        assert_eq!(pending.len(), 2);
        assert!(board.pending().is_empty());
        assert_eq!(board.persisted().len(), 2);
        assert_eq!(board.current_step(), 2);
        assert_eq!(board.status(), BoardStatus::Final);
    }
}
