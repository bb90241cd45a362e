use chrono::{Datelike, Duration, Months, NaiveDate};

/// One cell of a week-aligned month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDay {
    pub date: NaiveDate,
    pub in_current_month: bool,
}

/// First of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First and last calendar day of the month containing `current_month`.
pub fn month_bounds(current_month: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = first_of_month(current_month);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start);
    (start, end)
}

/// Monday on/before the first of the month through Sunday on/after the last.
pub fn grid_bounds(current_month: NaiveDate) -> (NaiveDate, NaiveDate) {
    let (month_start, month_end) = month_bounds(current_month);
    let lead = month_start.weekday().num_days_from_monday() as i64;
    let trail = 6 - month_end.weekday().num_days_from_monday() as i64;
    (
        month_start - Duration::days(lead),
        month_end + Duration::days(trail),
    )
}

pub fn build_grid(current_month: NaiveDate) -> Vec<GridDay> {
    let (month_start, month_end) = month_bounds(current_month);
    let (grid_start, grid_end) = grid_bounds(current_month);
    let len = (grid_end - grid_start).num_days();

    (0..=len)
        .map(|i| {
            let date = grid_start + Duration::days(i);
            GridDay {
                date,
                in_current_month: date >= month_start && date <= month_end,
            }
        })
        .collect()
}

/// Move `delta` months from the month containing `date`. Always lands on the 1st.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(date);
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta as u32))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(first)
}

/// Splits a grid into rows of seven.
pub fn weeks<T>(cells: &[T]) -> impl Iterator<Item = &[T]> {
    cells.chunks(7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(d(2025, 2, 14)), (d(2025, 2, 1), d(2025, 2, 28)));
        assert_eq!(month_bounds(d(2024, 2, 29)), (d(2024, 2, 1), d(2024, 2, 29)));
        assert_eq!(month_bounds(d(2024, 12, 3)), (d(2024, 12, 1), d(2024, 12, 31)));
    }

    #[test]
    fn test_grid_is_monday_first_and_week_aligned() {
        // January 2025 starts on a Wednesday and ends on a Friday.
        let grid = build_grid(d(2025, 1, 20));

        assert_eq!(grid.len(), 35);
        assert_eq!(grid[0].date, d(2024, 12, 30));
        assert_eq!(grid[0].date.weekday(), Weekday::Mon);
        assert!(!grid[0].in_current_month);
        assert_eq!(grid[2].date, d(2025, 1, 1));
        assert!(grid[2].in_current_month);

        let last = grid.last().unwrap();
        assert_eq!(last.date, d(2025, 2, 2));
        assert_eq!(last.date.weekday(), Weekday::Sun);
        assert!(!last.in_current_month);
    }

    #[test]
    fn test_grid_without_padding() {
        // February 2021 starts on a Monday and ends on a Sunday.
        let grid = build_grid(d(2021, 2, 1));

        assert_eq!(grid.len(), 28);
        assert!(grid.iter().all(|c| c.in_current_month));
    }

    #[test]
    fn test_grid_lengths_are_whole_weeks() {
        for month in 1..=12 {
            let grid = build_grid(d(2026, month, 1));
            assert_eq!(grid.len() % 7, 0);
            assert_eq!(
                grid.iter().filter(|c| c.in_current_month).count() as u32,
                month_bounds(d(2026, month, 1)).1.day()
            );
            assert_eq!(weeks(&grid).count(), grid.len() / 7);
        }
    }

    #[test]
    fn test_shift_month_crosses_years() {
        assert_eq!(shift_month(d(2025, 1, 31), 1), d(2025, 2, 1));
        assert_eq!(shift_month(d(2025, 1, 15), -1), d(2024, 12, 1));
        assert_eq!(shift_month(d(2025, 11, 2), 14), d(2027, 1, 1));
        assert_eq!(shift_month(d(2025, 3, 9), 0), d(2025, 3, 1));
    }
}
