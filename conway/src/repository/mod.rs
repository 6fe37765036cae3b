// mod.rs - Persistence port for boards and their executions

mod memory;

pub use memory::InMemoryBoardRepository;

use async_trait::async_trait;

use crate::board::{Board, BoardId};
use crate::error::StorageResult;
use crate::execution::Execution;
use crate::grid::GridState;

/// Storage operations the board service depends on.
///
/// Implementations must reject a second execution for the same
/// `(board_id, step)` with [`StorageError::Conflict`](crate::StorageError::Conflict).
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Create a board with an empty history.
    async fn register_board(&self, name: &str, initial_state: GridState) -> StorageResult<Board>;

    async fn load_board_with_full_history(&self, id: BoardId) -> StorageResult<Option<Board>>;

    /// History limited to the highest step, if any.
    async fn load_board_with_latest_execution(&self, id: BoardId)
    -> StorageResult<Option<Board>>;

    /// History limited to `step`, empty when that step was never computed.
    async fn load_board_with_execution_at_step(
        &self,
        id: BoardId,
        step: u32,
    ) -> StorageResult<Option<Board>>;

    async fn append_execution(
        &self,
        board_id: BoardId,
        execution: Execution,
    ) -> StorageResult<Execution>;

    /// Persist a batch in one transaction: either every execution is stored
    /// or none is.
    async fn append_executions(
        &self,
        board_id: BoardId,
        executions: Vec<Execution>,
    ) -> StorageResult<()>;
}
