//! 时间工具函数：营业日计算与业务时区
//!
//! 营业日以 `start_hour` 为分界：`[date @ start_hour, date+1 @ start_hour)`。
//! 深夜营业的店铺在凌晨结账时，小票仍归属前一个营业日。
//!
//! 引擎内部统一使用店铺本地时间 (`NaiveDateTime`)，
//! 时区换算只在 API 层通过 [`local_now`] 完成。

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 营业日区间 (左闭右开)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessDayRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BusinessDayRange {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// 营业日 `date` 的时间区间
pub fn range_for(date: NaiveDate, start_hour: u32) -> BusinessDayRange {
    debug_assert!(start_hour < 24, "business day start hour out of range: {start_hour}");
    let start = date.and_time(chrono::NaiveTime::MIN) + Duration::hours(i64::from(start_hour));
    BusinessDayRange {
        start,
        end: start + Duration::days(1),
    }
}

/// 时间戳所属的营业日
///
/// `ts.hour < start_hour` → 前一天，否则当天
pub fn business_date_of(ts: NaiveDateTime, start_hour: u32) -> NaiveDate {
    debug_assert!(start_hour < 24, "business day start hour out of range: {start_hour}");
    if ts.hour() < start_hour {
        ts.date() - Duration::days(1)
    } else {
        ts.date()
    }
}

/// 当前营业日 (业务时区)
pub fn current_business_date(start_hour: u32, tz: Tz) -> NaiveDate {
    business_date_of(local_now(tz), start_hour)
}

/// 业务时区的当前本地时间
pub fn local_now(tz: Tz) -> NaiveDateTime {
    chrono::Utc::now().with_timezone(&tz).naive_local()
}

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 入座时间取整到最近的 5 分钟 (秒数舍去, 60 分进位到下一小时)
pub fn round_entry_time(now: NaiveDateTime) -> NaiveDateTime {
    let minute = now.minute();
    let rounded = (minute + 2) / 5 * 5;
    let base = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .and_then(|t| t.with_minute(0))
        .unwrap_or(now);
    base + Duration::minutes(i64::from(rounded))
}

/// 入座经过时间的显示文本
///
/// - `< 60` 分: `N分`
/// - `< 1440` 分: `H時間M分`
/// - 其他: `D日H時間M分`
///
/// 负值 (入座时间设在未来) 按 0 处理
pub fn elapsed_label(entry_time: NaiveDateTime, now: NaiveDateTime) -> String {
    let minutes = (now - entry_time).num_minutes().max(0);
    if minutes >= 1440 {
        let days = minutes / 1440;
        let hours = (minutes % 1440) / 60;
        format!("{}日{}時間{}分", days, hours, minutes % 60)
    } else if minutes >= 60 {
        format!("{}時間{}分", minutes / 60, minutes % 60)
    } else {
        format!("{}分", minutes)
    }
}
