// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Prediction editor: a driver pool and an ordered top-three selection.
//!
//! Every roster driver sits in exactly one of the two lists. Selection
//! order is the predicted finishing order (index 0 = 1st place). The state
//! is never persisted locally; it is rebuilt from the stored guess.

use crate::models::{Driver, Guess, Race};

/// Number of podium places a guess covers.
pub const SELECTION_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverList {
    Pool,
    Selection,
}

/// In-progress guess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    pool: Vec<Driver>,
    selection: Vec<Driver>,
}

impl EditorState {
    /// Split the roster into the existing guess (in position order) and the
    /// rest (in roster order). Guess ids with no matching driver are skipped.
    pub fn load(existing: Option<&Guess>, roster: Vec<Driver>) -> Self {
        let mut pool = roster;
        let mut selection = Vec::with_capacity(SELECTION_SIZE);

        if let Some(guess) = existing {
            for driver_id in guess.positions().into_iter().flatten() {
                if let Some(index) = pool.iter().position(|d| d.driver_id == driver_id) {
                    selection.push(pool.remove(index));
                }
            }
        }

        Self { pool, selection }
    }

    pub fn pool(&self) -> &[Driver] {
        &self.pool
    }

    pub fn selection(&self) -> &[Driver] {
        &self.selection
    }

    pub fn is_complete(&self) -> bool {
        self.selection.len() == SELECTION_SIZE
    }

    /// Move a driver from the pool into the selection at `target_index`
    /// (clamped). Ignored if the selection is full or the driver is not in
    /// the pool.
    pub fn move_to_selection(&mut self, driver_id: u64, target_index: usize) -> bool {
        if self.selection.len() >= SELECTION_SIZE {
            tracing::debug!(driver_id, "Selection full, drop ignored");
            return false;
        }
        let Some(from) = self.pool.iter().position(|d| d.driver_id == driver_id) else {
            return false;
        };

        let driver = self.pool.remove(from);
        let to = target_index.min(self.selection.len());
        self.selection.insert(to, driver);
        true
    }

    /// Move a driver back to the end of the pool.
    pub fn move_to_pool(&mut self, driver_id: u64) -> bool {
        let Some(from) = self.selection.iter().position(|d| d.driver_id == driver_id) else {
            return false;
        };

        let driver = self.selection.remove(from);
        self.pool.push(driver);
        true
    }

    /// Move an entry within one list. `to` is clamped to the last slot.
    pub fn reorder(&mut self, list: DriverList, from: usize, to: usize) -> bool {
        let items = match list {
            DriverList::Pool => &mut self.pool,
            DriverList::Selection => &mut self.selection,
        };
        if from >= items.len() {
            return false;
        }

        let driver = items.remove(from);
        let to = to.min(items.len());
        items.insert(to, driver);
        true
    }

    /// Convert the selection into a guess; unfilled places are `None`.
    pub fn to_guess(&self, race_id: u64, owner_email: &str) -> Guess {
        let position = |i: usize| self.selection.get(i).map(|d| d.driver_id);

        Guess {
            guess_id: None,
            race_id,
            position_1_driver_id: position(0),
            position_2_driver_id: position(1),
            position_3_driver_id: position(2),
            user_email: owner_email.to_string(),
        }
    }
}

/// View model around the editor for one race.
///
/// Live updates only flip `race_finished`; they never reach the editor, so
/// an unsaved selection survives any number of push messages.
#[derive(Debug, Clone)]
pub struct RaceBoard {
    race: Race,
    editor: EditorState,
    race_finished: bool,
}

impl RaceBoard {
    pub fn new(race: Race, existing: Option<&Guess>, roster: Vec<Driver>) -> Self {
        Self {
            race,
            editor: EditorState::load(existing, roster),
            race_finished: false,
        }
    }

    pub fn race(&self) -> &Race {
        &self.race
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorState {
        &mut self.editor
    }

    pub fn race_finished(&self) -> bool {
        self.race_finished
    }

    /// A push message is a toggle signal; its payload is not interpreted.
    pub fn on_live_message(&mut self, _message: &str) {
        self.race_finished = !self.race_finished;
        tracing::debug!(
            race_id = self.race.race_id,
            race_finished = self.race_finished,
            "Race status toggled"
        );
    }

    pub fn to_guess(&self, owner_email: &str) -> Guess {
        self.editor.to_guess(self.race.race_id, owner_email)
    }
}
