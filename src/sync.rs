//! Debounced route synchronization state machine.
//!
//! Keeps a drawn route consistent with a changing point set. Mutations are
//! coalesced through a debounce window; a settled window either recomputes,
//! clears, or is ignored depending on the current state. A failed draw never
//! schedules a retry.

use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No route drawn; settle events are ignored.
    Idle,
    /// A route is displayed and matches the last reconciliation.
    Drawn,
    /// A provider call is in flight.
    Recomputing {
        generation: u64,
        /// Whether a route was displayed when the call started.
        had_route: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A point was added, removed or updated.
    Mutated { at: Instant },
    /// Clock tick; `live_points` is the current collection size.
    Poll { now: Instant, live_points: usize },
    /// A draw was issued (explicitly or in answer to `Recompute`).
    DrawStarted,
    DrawSucceeded { generation: u64, at: Instant },
    /// Provider failure or undecodable geometry.
    DrawFailed { generation: u64 },
    /// The response no longer matches the point set.
    DrawStale { generation: u64, at: Instant },
    /// Explicit clear or toggle-off; bypasses the debounce.
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    None,
    /// Re-invoke the draw with the active policy.
    Recompute,
    /// Remove the displayed route; no provider call.
    ClearRoute,
    /// Draw registered under this generation.
    AwaitDraw { generation: u64 },
}

#[derive(Debug, Clone)]
pub struct SyncController {
    state: SyncState,
    debounce: Duration,
    deadline: Option<Instant>,
    /// A window settled while a call was in flight.
    pending_after_flight: bool,
    generation: u64,
}

impl SyncController {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SyncState::Idle,
            debounce,
            deadline: None,
            pending_after_flight: false,
            generation: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_recomputing(&self) -> bool {
        matches!(self.state, SyncState::Recomputing { .. })
    }

    /// True when `generation` is the draw currently in flight.
    pub fn is_current(&self, generation: u64) -> bool {
        matches!(self.state, SyncState::Recomputing { generation: g, .. } if g == generation)
    }

    /// Whether mutations are waiting to be evaluated.
    pub fn has_pending(&self) -> bool {
        self.deadline.is_some() || self.pending_after_flight
    }

    /// Registers a draw and returns its generation.
    pub fn begin_draw(&mut self) -> u64 {
        match self.step(SyncEvent::DrawStarted) {
            SyncAction::AwaitDraw { generation } => generation,
            _ => self.generation,
        }
    }

    pub fn step(&mut self, event: SyncEvent) -> SyncAction {
        let action = match event {
            SyncEvent::Mutated { at } => {
                if self.state != SyncState::Idle {
                    self.deadline = Some(at + self.debounce);
                }
                SyncAction::None
            }
            SyncEvent::Poll { now, live_points } => self.settle(now, live_points),
            SyncEvent::DrawStarted => {
                let had_route = match self.state {
                    SyncState::Idle => false,
                    SyncState::Drawn => true,
                    SyncState::Recomputing { had_route, .. } => had_route,
                };
                self.generation += 1;
                self.state = SyncState::Recomputing {
                    generation: self.generation,
                    had_route,
                };
                SyncAction::AwaitDraw {
                    generation: self.generation,
                }
            }
            SyncEvent::DrawSucceeded { generation, at } => {
                if self.is_current(generation) {
                    self.state = SyncState::Drawn;
                    self.rearm_if_pending(at);
                }
                SyncAction::None
            }
            SyncEvent::DrawFailed { generation } => {
                if let SyncState::Recomputing { generation: g, had_route } = self.state {
                    if g == generation {
                        self.state = if had_route { SyncState::Drawn } else { SyncState::Idle };
                        self.deadline = None;
                        self.pending_after_flight = false;
                    }
                }
                SyncAction::None
            }
            SyncEvent::DrawStale { generation, at } => {
                if let SyncState::Recomputing { generation: g, had_route } = self.state {
                    if g == generation {
                        self.state = if had_route { SyncState::Drawn } else { SyncState::Idle };
                        self.rearm_if_pending(at);
                    }
                }
                SyncAction::None
            }
            SyncEvent::Cleared => {
                self.state = SyncState::Idle;
                self.deadline = None;
                self.pending_after_flight = false;
                SyncAction::None
            }
        };
        debug!(?event, ?action, state = ?self.state, "sync step");
        action
    }

    fn settle(&mut self, now: Instant, live_points: usize) -> SyncAction {
        match self.deadline {
            Some(deadline) if now >= deadline => self.deadline = None,
            _ => return SyncAction::None,
        }

        match self.state {
            SyncState::Idle => SyncAction::None,
            SyncState::Drawn if live_points >= 2 => SyncAction::Recompute,
            SyncState::Drawn => {
                self.state = SyncState::Idle;
                SyncAction::ClearRoute
            }
            SyncState::Recomputing { .. } => {
                self.pending_after_flight = true;
                SyncAction::None
            }
        }
    }

    fn rearm_if_pending(&mut self, at: Instant) {
        if self.pending_after_flight {
            self.pending_after_flight = false;
            self.deadline = Some(self.deadline.map_or(at, |d| d.min(at)));
        }
    }
}
