//! 长按计时器
//!
//! 每次按下启动一个可取消的 tokio 任务，到时后通过 channel 投递
//! [`LongPressElapsed`]。状态机根据 `press_id` 丢弃过期事件。

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Long press fired for a press that may or may not still be current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongPressElapsed {
    pub table: String,
    pub press_id: u64,
}

/// Schedules long-press callbacks on the tokio runtime
#[derive(Debug, Clone)]
pub struct LongPressTimer {
    delay: Duration,
    tx: mpsc::UnboundedSender<LongPressElapsed>,
}

impl LongPressTimer {
    /// Timer plus the receiving end the owner must drain
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<LongPressElapsed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { delay, tx }, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a tokio runtime
    pub fn schedule(&self, table: &str, press_id: u64) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.tx.clone();
        let delay = self.delay;
        let event = LongPressElapsed {
            table: table.to_string(),
            press_id,
        };

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone means the coordinator was dropped
                    let _ = tx.send(event);
                }
            }
        });

        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let (timer, mut rx) = LongPressTimer::new(Duration::from_millis(800));
        let _token = timer.schedule("A1", 7);

        tokio::time::sleep(Duration::from_millis(799)).await;
        assert!(rx.try_recv().is_err());

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            LongPressElapsed {
                table: "A1".to_string(),
                press_id: 7
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (timer, mut rx) = LongPressTimer::new(Duration::from_millis(800));
        let token = timer.schedule("A1", 1);
        token.cancel();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
