// service.rs - Orchestration: load a board, resolve it, flush what was computed
//
// Resolution for one board is serialised by a per-board async mutex held from
// load to flush. Storage uniqueness on (board_id, step) still backs this up
// when several service instances share one store.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::board::{Board, BoardId};
use crate::config::GameRules;
use crate::error::{BoardError, BoardResult};
use crate::execution::Execution;
use crate::grid::GridState;
use crate::repository::BoardRepository;

/// What callers see of a board at a given point in its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub id: BoardId,
    pub name: String,
    pub initial_state: GridState,
    pub current_step: u32,
    pub is_completed: bool,
    pub state: GridState,
}

impl BoardSnapshot {
    fn at(board: &Board, current_step: u32, is_completed: bool, state: GridState) -> Self {
        Self {
            id: board.id(),
            name: board.name().to_string(),
            initial_state: board.initial_state().clone(),
            current_step,
            is_completed,
            state,
        }
    }

    fn of_execution(board: &Board, execution: &Execution) -> Self {
        Self::at(
            board,
            execution.step(),
            execution.is_final(),
            execution.state().clone(),
        )
    }

    fn of_latest(board: &Board) -> Self {
        match board.latest_execution() {
            Some(latest) => Self::of_execution(board, latest),
            None => Self::at(board, 0, false, board.initial_state().clone()),
        }
    }
}

/// Result of a multi-step resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    #[serde(flatten)]
    pub snapshot: BoardSnapshot,
    /// Executions computed and stored by this call.
    pub calculated_steps: usize,
}

pub struct BoardService<R> {
    repository: Arc<R>,
    rules: GameRules,
    locks: DashMap<BoardId, Arc<Mutex<()>>>,
}

impl<R: BoardRepository + 'static> BoardService<R> {
    pub fn new(repository: Arc<R>, rules: GameRules) -> Self {
        Self {
            repository,
            rules,
            locks: DashMap::new(),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub async fn register(&self, name: &str, rows: &[Vec<bool>]) -> BoardResult<BoardId> {
        let initial_state = GridState::from_rows(rows)?;
        let board = self.repository.register_board(name, initial_state).await?;
        tracing::info!(board_id = %board.id(), name, rows = rows.len(), "board registered");
        Ok(board.id())
    }

    /// Latest computed generation, or the initial state at step 0.
    pub async fn current(&self, id: BoardId) -> BoardResult<BoardSnapshot> {
        let board = self.found(id, self.repository.load_board_with_latest_execution(id).await?)?;
        Ok(BoardSnapshot::of_latest(&board))
    }

    /// State at `step`. Progress fields describe the board's latest execution
    /// unless `step` itself is final.
    pub async fn step(&self, id: BoardId, step: u32) -> BoardResult<BoardSnapshot> {
        if step == 0 {
            let board =
                self.found(id, self.repository.load_board_with_latest_execution(id).await?)?;
            let latest = BoardSnapshot::of_latest(&board);
            let state = board.initial_state().clone();
            return Ok(BoardSnapshot { state, ..latest });
        }

        let board = self.found(
            id,
            self.repository
                .load_board_with_execution_at_step(id, step)
                .await?,
        )?;
        let execution = board
            .execution(step)
            .ok_or_else(|| BoardError::NotFound(format!("board {id} has no step {step}")))?;

        if execution.is_final() {
            return Ok(BoardSnapshot::of_execution(&board, execution));
        }

        // The requested step need not be the last one.
        let current =
            self.found(id, self.repository.load_board_with_latest_execution(id).await?)?;
        let latest = BoardSnapshot::of_latest(&current);
        Ok(BoardSnapshot {
            state: execution.state().clone(),
            ..latest
        })
    }

    /// Computes and stores one more generation. A board that already reached
    /// its final state is reported as is.
    pub async fn advance(&self, id: BoardId) -> BoardResult<BoardSnapshot> {
        let _lock = self.lock(id).await;

        let board = self.load_full(id).await?;
        if let Some(latest) = board.latest_execution().filter(|e| e.is_final()) {
            tracing::debug!(board_id = %id, step = latest.step(), "board already final");
            return Ok(BoardSnapshot::of_execution(&board, latest));
        }

        let (board, execution) = self
            .resolve(board, |board, ceiling| board.resolve_next_execution(ceiling))
            .await?;
        let stored = self.repository.append_execution(id, execution).await?;
        tracing::info!(
            board_id = %id,
            step = stored.step(),
            is_final = stored.is_final(),
            "advanced board"
        );
        Ok(BoardSnapshot::of_execution(&board, &stored))
    }

    /// Computes and stores up to `steps` generations.
    pub async fn advance_by(&self, id: BoardId, steps: u32) -> BoardResult<Advance> {
        let _lock = self.lock(id).await;

        let board = self.load_full(id).await?;
        let (board, execution) = self
            .resolve(board, move |board, ceiling| {
                board.resolve_next_executions(steps, ceiling)
            })
            .await?;
        self.flush(board, execution).await
    }

    /// Computes and stores generations until the board reaches a final state.
    pub async fn finalize(&self, id: BoardId) -> BoardResult<Advance> {
        let _lock = self.lock(id).await;

        let board = self.load_full(id).await?;
        let (board, execution) = self
            .resolve(board, |board, ceiling| board.resolve_final_execution(ceiling))
            .await?;
        self.flush(board, execution).await
    }

    async fn lock(&self, id: BoardId) -> BoardLock<'_> {
        let mutex = self.locks.entry(id).or_default().value().clone();
        BoardLock {
            locks: &self.locks,
            id,
            guard: Some(mutex.lock_owned().await),
        }
    }

    fn found(&self, id: BoardId, board: Option<Board>) -> BoardResult<Board> {
        board.ok_or_else(|| BoardError::NotFound(format!("board {id} not found")))
    }

    async fn load_full(&self, id: BoardId) -> BoardResult<Board> {
        let board = self.repository.load_board_with_full_history(id).await?;
        Ok(self
            .found(id, board)?
            .with_parallel_threshold(self.rules.parallel_threshold))
    }

    /// Runs a resolution off the async executor; large grids are CPU-bound.
    async fn resolve<F>(&self, board: Board, resolve: F) -> BoardResult<(Board, Execution)>
    where
        F: FnOnce(&mut Board, u32) -> BoardResult<Execution> + Send + 'static,
    {
        let ceiling = self.rules.max_executions_allowed;
        let id = board.id();
        let (board, outcome) = tokio::task::spawn_blocking(move || {
            let mut board = board;
            let outcome = resolve(&mut board, ceiling);
            (board, outcome)
        })
        .await?;

        match outcome {
            Ok(execution) => Ok((board, execution)),
            Err(err) => {
                tracing::debug!(board_id = %id, ceiling, error = %err, "resolution refused");
                Err(err)
            }
        }
    }

    async fn flush(&self, mut board: Board, execution: Execution) -> BoardResult<Advance> {
        let pending = board.take_pending();
        let calculated_steps = pending.len();
        self.repository
            .append_executions(board.id(), pending)
            .await?;

        tracing::info!(
            board_id = %board.id(),
            step = execution.step(),
            is_final = execution.is_final(),
            computed = calculated_steps,
            "resolved board"
        );
        Ok(Advance {
            snapshot: BoardSnapshot::of_execution(&board, &execution),
            calculated_steps,
        })
    }
}

/// Holds a board's mutex; the map entry goes away with the last holder.
struct BoardLock<'a> {
    locks: &'a DashMap<BoardId, Arc<Mutex<()>>>,
    id: BoardId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BoardLock<'_> {
    fn drop(&mut self) {
        // Release first so the guard's handle no longer counts.
        drop(self.guard.take());
        self.locks.remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
