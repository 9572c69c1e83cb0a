//! MoveCoordinator - 手势状态机 (点按 / 长按换桌)
//!
//! # 状态
//!
//! ```text
//! Idle ──pointer-down(占用桌)──▶ PressPending ──800ms──▶ MoveArmed(source)
//!   ▲                               │                         │
//!   │◀── 移动 >10px / 抬起 ─────────┘                         │
//!   │◀── 抬起在空桌 (relocate) / cancel ──────────────────────┘
//! ```
//!
//! - 按下后 500ms 内抬起视为点按，打开详情；500–800ms 抬起不做任何事
//! - 空桌按下只记录按压 (不启动计时器)，短按同样可以打开详情
//! - 长按计时器是进入换桌模式的唯一途径，过期的计时事件按 `press_id` 丢弃
//! - 弹窗打开期间取消所有按压并忽略一切手势输入
//!
//! 状态机本身是同步的，可由 [`LongPressTimer`] 驱动，也可以在测试或
//! 非 tokio 前端中手动调用 [`MoveCoordinator::long_press_elapsed`]。

use shared::models::StoreId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::relocate::{Relocation, relocate};
use super::timer::{LongPressElapsed, LongPressTimer};
use crate::core::{FloorError, FloorResult};
use crate::storage::FloorStore;

/// Hold time that arms a move
pub const LONG_PRESS: Duration = Duration::from_millis(800);
/// Maximum release time still counted as a tap
pub const TAP_MAX: Duration = Duration::from_millis(500);
/// Pointer travel (either axis) that cancels a press
pub const MOVE_TOLERANCE_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug)]
struct PressState {
    press_id: u64,
    start_pos: Point,
    start_time: Instant,
    /// `None` for presses on empty tables
    timer: Option<CancellationToken>,
}

impl PressState {
    fn cancel_timer(&self) {
        if let Some(token) = &self.timer {
            token.cancel();
        }
    }
}

/// What a gesture input led to
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Input had no effect in the current state
    Ignored,
    PressStarted { press_id: u64, long_press: bool },
    /// Pointer travelled too far; press dropped
    PressCancelled,
    MoveArmed { source: String },
    /// Short tap: open the table's detail view
    OpenDetail { table: String },
    /// Released between tap and long-press thresholds
    Released,
    /// Armed, but the released-over table cannot receive the move
    StillArmed { source: String },
    Relocated(Relocation),
    MoveCancelled { source: String },
}

/// Gesture state for one floor view
pub struct MoveCoordinator {
    floor: Arc<dyn FloorStore>,
    store: StoreId,
    timer: Option<LongPressTimer>,
    presses: HashMap<String, PressState>,
    armed: Option<String>,
    modal_open: bool,
    next_press_id: u64,
}

impl MoveCoordinator {
    /// Coordinator driven manually through [`Self::long_press_elapsed`]
    pub fn new(floor: Arc<dyn FloorStore>, store: StoreId) -> Self {
        Self {
            floor,
            store,
            timer: None,
            presses: HashMap::new(),
            armed: None,
            modal_open: false,
            next_press_id: 0,
        }
    }

    /// Coordinator that schedules its own long-press timers (needs a tokio runtime)
    pub fn with_timer(floor: Arc<dyn FloorStore>, store: StoreId, timer: LongPressTimer) -> Self {
        let mut coordinator = Self::new(floor, store);
        coordinator.timer = Some(timer);
        coordinator
    }

    // ========== Inspection ==========

    pub fn armed_source(&self) -> Option<&str> {
        self.armed.as_deref()
    }

    pub fn is_pending(&self, table: &str) -> bool {
        self.presses.contains_key(table)
    }

    pub fn pending_count(&self) -> usize {
        self.presses.len()
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    // ========== Gesture inputs ==========

    pub fn begin_gesture(&mut self, table: &str, at: Point, now: Instant) -> FloorResult<GestureOutcome> {
        if self.modal_open {
            return Ok(GestureOutcome::Ignored);
        }

        let row = self
            .floor
            .get_table(self.store, table)?
            .ok_or_else(|| FloorError::table_not_found(table))?;

        self.next_press_id += 1;
        let press_id = self.next_press_id;

        // Long press only arms from idle on an occupied table
        let long_press = self.armed.is_none() && row.is_occupied();
        let timer = if long_press {
            self.timer.as_ref().map(|t| t.schedule(table, press_id))
        } else {
            None
        };

        let press = PressState {
            press_id,
            start_pos: at,
            start_time: now,
            timer,
        };
        if let Some(previous) = self.presses.insert(table.to_string(), press) {
            previous.cancel_timer();
        }

        tracing::trace!(table = %table, press_id = press_id, long_press = long_press, "Press started");
        Ok(GestureOutcome::PressStarted { press_id, long_press })
    }

    pub fn update_gesture(&mut self, table: &str, at: Point) -> GestureOutcome {
        if self.modal_open {
            return GestureOutcome::Ignored;
        }
        let Some(press) = self.presses.get(table) else {
            return GestureOutcome::Ignored;
        };

        let dx = (at.x - press.start_pos.x).abs();
        let dy = (at.y - press.start_pos.y).abs();
        if dx > MOVE_TOLERANCE_PX || dy > MOVE_TOLERANCE_PX {
            if let Some(press) = self.presses.remove(table) {
                press.cancel_timer();
            }
            tracing::debug!(table = %table, "Press cancelled by drag");
            return GestureOutcome::PressCancelled;
        }
        GestureOutcome::Ignored
    }

    /// Timer callback; stale or superseded presses are ignored
    pub fn long_press_elapsed(&mut self, event: &LongPressElapsed) -> GestureOutcome {
        if self.modal_open || self.armed.is_some() {
            return GestureOutcome::Ignored;
        }
        let current = self
            .presses
            .get(&event.table)
            .is_some_and(|p| p.press_id == event.press_id);
        if !current {
            tracing::trace!(table = %event.table, press_id = event.press_id, "Stale long press ignored");
            return GestureOutcome::Ignored;
        }

        self.presses.remove(&event.table);
        self.armed = Some(event.table.clone());
        tracing::info!(store = self.store, source = %event.table, "Move armed");
        GestureOutcome::MoveArmed {
            source: event.table.clone(),
        }
    }

    pub fn end_gesture(&mut self, table: &str, now: Instant) -> FloorResult<GestureOutcome> {
        if self.modal_open {
            return Ok(GestureOutcome::Ignored);
        }

        let press = self.presses.remove(table);
        if let Some(press) = &press {
            press.cancel_timer();
        }

        if let Some(source) = self.armed.clone() {
            return self.release_armed(source, table);
        }

        let Some(press) = press else {
            return Ok(GestureOutcome::Ignored);
        };
        if now.saturating_duration_since(press.start_time) < TAP_MAX {
            Ok(GestureOutcome::OpenDetail {
                table: table.to_string(),
            })
        } else {
            Ok(GestureOutcome::Released)
        }
    }

    /// Leave move mode (and drop any pending presses)
    pub fn cancel(&mut self) -> GestureOutcome {
        self.cancel_presses();
        match self.armed.take() {
            Some(source) => {
                tracing::info!(store = self.store, source = %source, "Move cancelled");
                GestureOutcome::MoveCancelled { source }
            }
            None => GestureOutcome::Ignored,
        }
    }

    /// Opening a modal cancels pending presses; inputs are ignored until it closes
    pub fn set_modal_open(&mut self, open: bool) {
        if open {
            self.cancel_presses();
        }
        self.modal_open = open;
    }

    fn release_armed(&mut self, source: String, target: &str) -> FloorResult<GestureOutcome> {
        if target == source {
            return Ok(GestureOutcome::StillArmed { source });
        }
        let row = self
            .floor
            .get_table(self.store, target)?
            .ok_or_else(|| FloorError::table_not_found(target))?;
        if row.is_occupied() {
            return Ok(GestureOutcome::StillArmed { source });
        }

        match relocate(self.floor.as_ref(), self.store, &source, target) {
            Ok(relocation) => {
                self.armed = None;
                Ok(GestureOutcome::Relocated(relocation))
            }
            // Target taken meanwhile: stay armed so another target can be picked
            Err(e) if e.is_conflict() => {
                tracing::warn!(source = %source, target = %target, error = %e, "Move target changed, still armed");
                Err(e)
            }
            Err(e) => {
                self.armed = None;
                Err(e)
            }
        }
    }

    fn cancel_presses(&mut self) {
        for (_, press) in self.presses.drain() {
            press.cancel_timer();
        }
    }
}

impl Drop for MoveCoordinator {
    fn drop(&mut self) {
        self.cancel_presses();
    }
}
