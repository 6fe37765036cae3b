// memory.rs - In-memory implementation of the board repository
//
// Deterministic and test-friendly. Enforces the same `(board_id, step)`
// uniqueness a relational backend would enforce with a unique index.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use super::BoardRepository;
use crate::board::{Board, BoardId};
use crate::error::{StorageError, StorageResult};
use crate::execution::Execution;
use crate::grid::GridState;

struct StoredBoard {
    name: String,
    initial_state: GridState,
    executions: BTreeMap<u32, Execution>,
}

impl StoredBoard {
    fn to_board(&self, id: BoardId, history: Vec<Execution>) -> Board {
        Board::with_history(id, self.name.clone(), self.initial_state.clone(), history)
    }
}

#[derive(Default)]
pub struct InMemoryBoardRepository {
    boards: RwLock<HashMap<BoardId, StoredBoard>>,
}

impl InMemoryBoardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored executions for `id`.
    pub fn execution_count(&self, id: BoardId) -> StorageResult<usize> {
        let guard = self
            .boards
            .read()
            .map_err(|_| StorageError::Backend("boards lock poisoned".to_string()))?;
        Ok(guard.get(&id).map_or(0, |stored| stored.executions.len()))
    }

    fn load<F>(&self, id: BoardId, slice: F) -> StorageResult<Option<Board>>
    where
        F: FnOnce(&BTreeMap<u32, Execution>) -> Vec<Execution>,
    {
        let guard = self
            .boards
            .read()
            .map_err(|_| StorageError::Backend("boards lock poisoned".to_string()))?;
        Ok(guard
            .get(&id)
            .map(|stored| stored.to_board(id, slice(&stored.executions))))
    }
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    async fn register_board(&self, name: &str, initial_state: GridState) -> StorageResult<Board> {
        let mut guard = self
            .boards
            .write()
            .map_err(|_| StorageError::Backend("boards lock poisoned".to_string()))?;

        let id = BoardId::generate();
        if guard.contains_key(&id) {
            return Err(StorageError::Conflict(format!("board {id} already exists")));
        }

        let stored = StoredBoard {
            name: name.to_string(),
            initial_state,
            executions: BTreeMap::new(),
        };
        let board = stored.to_board(id, Vec::new());
        guard.insert(id, stored);

        tracing::debug!(board_id = %id, name, "registered board");
        Ok(board)
    }

    async fn load_board_with_full_history(&self, id: BoardId) -> StorageResult<Option<Board>> {
        self.load(id, |executions| executions.values().cloned().collect())
    }

    async fn load_board_with_latest_execution(
        &self,
        id: BoardId,
    ) -> StorageResult<Option<Board>> {
        self.load(id, |executions| {
            executions
                .last_key_value()
                .map(|(_, execution)| execution.clone())
                .into_iter()
                .collect()
        })
    }

    async fn load_board_with_execution_at_step(
        &self,
        id: BoardId,
        step: u32,
    ) -> StorageResult<Option<Board>> {
        self.load(id, |executions| executions.get(&step).cloned().into_iter().collect())
    }

    async fn append_execution(
        &self,
        board_id: BoardId,
        execution: Execution,
    ) -> StorageResult<Execution> {
        let mut guard = self
            .boards
            .write()
            .map_err(|_| StorageError::Backend("boards lock poisoned".to_string()))?;
        let stored = guard
            .get_mut(&board_id)
            .ok_or_else(|| StorageError::NotFound(format!("board {board_id} not found")))?;

        if stored.executions.contains_key(&execution.step()) {
            return Err(StorageError::Conflict(format!(
                "board {board_id} already has step {}",
                execution.step()
            )));
        }

        stored.executions.insert(execution.step(), execution.clone());
        tracing::debug!(board_id = %board_id, step = execution.step(), "appended execution");
        Ok(execution)
    }

    async fn append_executions(
        &self,
        board_id: BoardId,
        executions: Vec<Execution>,
    ) -> StorageResult<()> {
        let mut guard = self
            .boards
            .write()
            .map_err(|_| StorageError::Backend("boards lock poisoned".to_string()))?;
        let stored = guard
            .get_mut(&board_id)
            .ok_or_else(|| StorageError::NotFound(format!("board {board_id} not found")))?;

        // Validate the whole batch before touching anything.
        let mut batch = BTreeMap::new();
        for execution in executions {
            let step = execution.step();
            if stored.executions.contains_key(&step) || batch.insert(step, execution).is_some() {
                return Err(StorageError::Conflict(format!(
                    "board {board_id} already has step {step}"
                )));
            }
        }

        let count = batch.len();
        stored.executions.append(&mut batch);
        tracing::debug!(board_id = %board_id, count, "appended executions");
        Ok(())
    }
}
