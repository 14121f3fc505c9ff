//! Price data access port trait.

use crate::domain::error::MacrossError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` within `[start_date, end_date]`, ascending by
    /// date. Missing trading days are left as gaps.
    fn fetch_closes(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>, MacrossError>;

    /// First date, last date and point count, `None` when there is no data.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, MacrossError>;
}
