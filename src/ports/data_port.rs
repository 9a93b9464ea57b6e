//! Price data access port trait.

use crate::domain::error::RotatorError;
use crate::domain::params::DateWindow;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` inside `window`, ascending by date.
    /// `Ok(None)` means the store has no data at all for the symbol.
    fn fetch_closes(
        &self,
        symbol: &str,
        window: DateWindow,
    ) -> Result<Option<PriceSeries>, RotatorError>;

    fn list_symbols(&self) -> Result<Vec<String>, RotatorError>;

    /// First date, last date and point count of everything stored for `symbol`.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RotatorError> {
        let series = self.fetch_closes(symbol, DateWindow::default())?;
        Ok(series.and_then(|s| match (s.first_date(), s.last_date()) {
            (Some(first), Some(last)) => Some((first, last, s.len())),
            _ => None,
        }))
    }
}
