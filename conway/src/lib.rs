// lib.rs - Board evolution engine for Conway's Game of Life

//! Board evolution engine for Conway's Game of Life.
//!
//! A [`Board`] owns an initial [`GridState`] and the ordered history of
//! [`Execution`]s computed from it. Resolution advances a board one step, N
//! steps, or until a cycle (or the configured ceiling) is reached. Storage sits
//! behind the [`BoardRepository`] port and [`BoardService`] ties the two
//! together.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod board;
pub mod config;
mod error;
pub mod execution;
pub mod grid;
pub mod patterns;
pub mod repository;
pub mod service;
pub mod transition;

pub use board::{Board, BoardId, BoardStatus};
pub use crate::config::GameRules;
pub use error::{BoardError, BoardResult, ConfigError, StorageError, StorageResult};
pub use execution::Execution;
pub use grid::{Fingerprint, GridState, TGrid, TRow};
pub use repository::{BoardRepository, InMemoryBoardRepository};
pub use service::{Advance, BoardService, BoardSnapshot};
pub use transition::Strategy;
