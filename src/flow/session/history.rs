//! Bounded edit and run histories

use std::collections::VecDeque;

use crate::flow::engine::types::ExecutionRun;
use crate::flow::graph::FlowGraph;

pub const EDIT_HISTORY_CAPACITY: usize = 50;
pub const RUN_HISTORY_CAPACITY: usize = 20;

/// Undo/redo stacks of graph snapshots
#[derive(Debug, Clone)]
pub struct EditHistory {
    past: VecDeque<FlowGraph>,
    future: Vec<FlowGraph>,
    capacity: usize,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::with_capacity(EDIT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(capacity),
            future: Vec::new(),
            capacity,
        }
    }

    /// Save the state that is about to be changed; clears redo
    pub fn record(&mut self, snapshot: FlowGraph) {
        if self.capacity == 0 {
            return;
        }
        if self.past.len() == self.capacity {
            self.past.pop_front();
        }
        self.past.push_back(snapshot);
        self.future.clear();
    }

    /// Step back, handing in the current state so it can be redone
    pub fn undo(&mut self, current: FlowGraph) -> Option<FlowGraph> {
        let previous = self.past.pop_back()?;
        self.future.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: FlowGraph) -> Option<FlowGraph> {
        let next = self.future.pop()?;
        self.past.push_back(current);
        if self.past.len() > self.capacity {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Completed runs, newest first
#[derive(Debug, Clone)]
pub struct RunHistory {
    runs: VecDeque<ExecutionRun>,
    capacity: usize,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::with_capacity(RUN_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            runs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, run: ExecutionRun) {
        self.runs.push_front(run);
        self.runs.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&ExecutionRun> {
        self.runs.front()
    }

    pub fn get(&self, run_id: &str) -> Option<&ExecutionRun> {
        self.runs.iter().find(|r| r.id == run_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionRun> {
        self.runs.iter()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new()
    }
}
