//! 换桌 - 将占用桌的客人信息与草稿订单整体移到空桌
//!
//! 全部写入在一个 [`WriteBatch`] 中完成：源桌必须仍在占用，目标桌必须仍为空，
//! 任一条件在提交时不成立则整个批次回滚 (Conflict)。

use serde::Serialize;
use shared::models::{StoreId, Table};

use crate::core::{FloorError, FloorResult};
use crate::storage::{FloorStore, Precondition, WriteBatch};

/// Tables after a successful move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relocation {
    pub source: Table,
    pub target: Table,
    pub moved_lines: usize,
}

pub fn relocate(
    floor: &dyn FloorStore,
    store: StoreId,
    source: &str,
    target: &str,
) -> FloorResult<Relocation> {
    if source == target {
        return Err(FloorError::InvalidMove(format!(
            "source and target are the same table: {}",
            source
        )));
    }

    let mut from = floor
        .get_table(store, source)?
        .ok_or_else(|| FloorError::table_not_found(source))?;
    let mut to = floor
        .get_table(store, target)?
        .ok_or_else(|| FloorError::table_not_found(target))?;

    let occupancy = from
        .occupancy()
        .ok_or_else(|| FloorError::InvalidMove(format!("table {} is not occupied", source)))?;
    if to.is_occupied() {
        return Err(FloorError::InvalidMove(format!("table {} is occupied", target)));
    }

    let lines = floor.get_draft(store, source)?;
    let moved_lines = lines.len();

    to.occupy(occupancy);
    from.vacate();

    floor.apply(
        WriteBatch::new(store)
            .require(source, Precondition::Occupied)
            .require(target, Precondition::Vacant)
            .put_table(to.clone())
            .put_table(from.clone())
            .put_draft(target, lines)
            .delete_draft(source),
    )?;

    tracing::info!(
        store = store,
        source = %source,
        target = %target,
        lines = moved_lines,
        "Table relocated"
    );

    Ok(Relocation {
        source: from,
        target: to,
        moved_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{RedbFloorStore, StoreResult};
    use chrono::NaiveDate;
    use shared::models::{Occupancy, OrderLine, Size};
    use std::collections::BTreeSet;

    const STORE: StoreId = 1;

    fn occupant(guest: &str) -> Occupancy {
        Occupancy {
            guest_name: guest.to_string(),
            cast_names: ["Ami".to_string()].into_iter().collect(),
            entry_time: NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(21, 0, 0),
            visit_type: Some("指名".to_string()),
        }
    }

    fn create_test_floor() -> RedbFloorStore {
        let floor = RedbFloorStore::open_in_memory().unwrap();
        let mut a1 = Table::new("A1", Size::default(), 1);
        a1.occupy(occupant("田中"));
        let mut a3 = Table::new("A3", Size::default(), 1);
        a3.occupy(occupant("佐藤"));
        floor
            .apply(
                WriteBatch::new(STORE)
                    .put_table(a1)
                    .put_table(Table::new("A2", Size::default(), 1))
                    .put_table(a3)
                    .put_draft(
                        "A1",
                        vec![
                            OrderLine::new("ビール", 500, BTreeSet::new()),
                            OrderLine::new("シャンパン", 8000, ["Ami".to_string()].into_iter().collect()),
                        ],
                    ),
            )
            .unwrap();
        floor
    }

    #[test]
    fn test_relocate_moves_occupant_and_draft() {
        let floor = create_test_floor();
        let before = floor.get_draft(STORE, "A1").unwrap();

        let moved = relocate(&floor, STORE, "A1", "A2").unwrap();
        assert_eq!(moved.moved_lines, 2);
        assert_eq!(moved.target.occupancy(), Some(occupant("田中")));

        assert!(!floor.get_table(STORE, "A1").unwrap().unwrap().is_occupied());
        assert!(floor.get_draft(STORE, "A1").unwrap().is_empty());
        assert_eq!(floor.get_table(STORE, "A2").unwrap().unwrap().occupancy(), Some(occupant("田中")));
        assert_eq!(floor.get_draft(STORE, "A2").unwrap(), before);
    }

    #[test]
    fn test_relocate_rejects_invalid_moves() {
        let floor = create_test_floor();
        assert!(matches!(relocate(&floor, STORE, "A1", "A3"), Err(FloorError::InvalidMove(_))));
        assert!(matches!(relocate(&floor, STORE, "A2", "A1"), Err(FloorError::InvalidMove(_))));
        assert!(matches!(relocate(&floor, STORE, "A1", "A1"), Err(FloorError::InvalidMove(_))));
        assert!(matches!(relocate(&floor, STORE, "A1", "Z9"), Err(FloorError::NotFound { .. })));
        assert!(matches!(relocate(&floor, STORE, "Z9", "A2"), Err(FloorError::NotFound { .. })));

        // Nothing was written
        assert_eq!(floor.get_draft(STORE, "A1").unwrap().len(), 2);
        assert!(!floor.get_table(STORE, "A2").unwrap().unwrap().is_occupied());
    }

    /// Seats the target between the read and the batch commit
    struct RacingFloor {
        inner: RedbFloorStore,
    }

    impl FloorStore for RacingFloor {
        fn list_tables(&self, store: StoreId) -> StoreResult<Vec<Table>> {
            self.inner.list_tables(store)
        }
        fn get_table(&self, store: StoreId, name: &str) -> StoreResult<Option<Table>> {
            self.inner.get_table(store, name)
        }
        fn get_draft(&self, store: StoreId, table: &str) -> StoreResult<Vec<OrderLine>> {
            self.inner.get_draft(store, table)
        }
        fn apply(&self, batch: WriteBatch) -> StoreResult<()> {
            let mut intruder = Table::new("A2", Size::default(), 1);
            intruder.occupy(occupant("割り込み"));
            self.inner.apply(WriteBatch::new(STORE).put_table(intruder))?;
            self.inner.apply(batch)
        }
        fn put_receipt_header(&self, h: &shared::models::FinalizedOrder) -> StoreResult<()> {
            self.inner.put_receipt_header(h)
        }
        fn put_receipt_lines(&self, s: StoreId, n: &str, l: &[shared::models::FinalizedOrderLine]) -> StoreResult<()> {
            self.inner.put_receipt_lines(s, n, l)
        }
        fn put_payment(&self, s: StoreId, n: &str, p: &shared::models::Payment) -> StoreResult<()> {
            self.inner.put_payment(s, n, p)
        }
        fn get_receipt_header(&self, s: StoreId, n: &str) -> StoreResult<Option<shared::models::FinalizedOrder>> {
            self.inner.get_receipt_header(s, n)
        }
        fn get_receipt_lines(&self, s: StoreId, n: &str) -> StoreResult<Vec<shared::models::FinalizedOrderLine>> {
            self.inner.get_receipt_lines(s, n)
        }
        fn get_payment(&self, s: StoreId, n: &str) -> StoreResult<Option<shared::models::Payment>> {
            self.inner.get_payment(s, n)
        }
        fn list_receipt_headers(
            &self,
            s: StoreId,
            from: chrono::NaiveDateTime,
            to: chrono::NaiveDateTime,
        ) -> StoreResult<Vec<shared::models::FinalizedOrder>> {
            self.inner.list_receipt_headers(s, from, to)
        }
        fn mark_receipt_deleted(
            &self,
            s: StoreId,
            n: &str,
            by: &str,
            at: chrono::NaiveDateTime,
        ) -> StoreResult<Option<shared::models::FinalizedOrder>> {
            self.inner.mark_receipt_deleted(s, n, by, at)
        }
        fn category_of(&self, s: StoreId, p: &str) -> StoreResult<Option<String>> {
            self.inner.category_of(s, p)
        }
        fn put_category(&self, s: StoreId, p: &str, c: &str) -> StoreResult<()> {
            self.inner.put_category(s, p, c)
        }
        fn get_settings(&self, s: StoreId) -> StoreResult<Option<shared::models::StoreSettings>> {
            self.inner.get_settings(s)
        }
        fn put_settings(&self, s: StoreId, v: &shared::models::StoreSettings) -> StoreResult<()> {
            self.inner.put_settings(s, v)
        }
    }

    #[test]
    fn test_target_seated_during_move_is_conflict() {
        let floor = RacingFloor {
            inner: create_test_floor(),
        };

        let err = relocate(&floor, STORE, "A1", "A2").unwrap_err();
        assert!(err.is_conflict());

        // Source untouched, intruder kept
        assert_eq!(floor.get_draft(STORE, "A1").unwrap().len(), 2);
        assert_eq!(
            floor.get_table(STORE, "A2").unwrap().unwrap().guest_name.as_deref(),
            Some("割り込み")
        );
    }
}
