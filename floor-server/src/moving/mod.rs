//! 换桌 - 手势状态机、长按计时器、原子换桌

mod coordinator;
mod relocate;
mod timer;

pub use coordinator::{
    GestureOutcome, LONG_PRESS, MOVE_TOLERANCE_PX, MoveCoordinator, Point, TAP_MAX,
};
pub use relocate::{Relocation, relocate};
pub use timer::{LongPressElapsed, LongPressTimer};
