//! The calendar month type used for allocations, month configs, goals and the budget month engine.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month};

use crate::Error;

/// A calendar month, e.g. 2024-03.
///
/// Serialized and stored as `YYYY-MM`, which sorts chronologically as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BudgetMonth {
    year: i32,
    month: Month,
}

impl BudgetMonth {
    /// Create a month from a year and a month.
    pub const fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month that `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month after this one.
    pub fn next(&self) -> Self {
        match self.month {
            Month::December => Self::new(self.year + 1, Month::January),
            month => Self::new(self.year, month.next()),
        }
    }

    /// The month before this one.
    pub fn previous(&self) -> Self {
        match self.month {
            Month::January => Self::new(self.year - 1, Month::December),
            month => Self::new(self.year, month.previous()),
        }
    }

    /// Iterate over every month from `self` to `until`, both inclusive.
    ///
    /// Yields nothing if `until` is before `self`.
    pub fn iter_until(self, until: BudgetMonth) -> impl Iterator<Item = BudgetMonth> {
        std::iter::successors(Some(self), move |month| {
            let next = month.next();
            (next <= until).then_some(next)
        })
        .take_while(move |month| *month <= until)
    }
}

impl Ord for BudgetMonth {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.month as u8).cmp(&(other.year, other.month as u8))
    }
}

impl PartialOrd for BudgetMonth {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for BudgetMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl FromStr for BudgetMonth {
    type Err = Error;

    /// Parse `YYYY-MM`. A full date (`YYYY-MM-DD`) is also accepted and truncated to its month.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(s.to_owned());
        let mut parts = s.trim().splitn(3, '-');

        let year = parts
            .next()
            .filter(|year| year.len() == 4)
            .and_then(|year| year.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let month = parts
            .next()
            .filter(|month| month.len() == 2)
            .and_then(|month| month.parse::<u8>().ok())
            .and_then(|month| Month::try_from(month).ok())
            .ok_or_else(invalid)?;

        if let Some(day) = parts.next() {
            let day = day.parse::<u8>().map_err(|_| invalid())?;
            Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
        }

        Ok(Self { year, month })
    }
}

impl Serialize for BudgetMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BudgetMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for BudgetMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for BudgetMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::Error;

    use super::BudgetMonth;

    #[test]
    fn parses_year_and_month() {
        let month: BudgetMonth = "2024-03".parse().unwrap();

        assert_eq!(month, BudgetMonth::new(2024, Month::March));
    }

    #[test]
    fn parses_full_date_as_its_month() {
        let month: BudgetMonth = "2019-01-31".parse().unwrap();

        assert_eq!(month, BudgetMonth::new(2019, Month::January));
    }

    #[test]
    fn rejects_invalid_months() {
        for text in ["2024-13", "2024-3", "24-03", "march", "", "2024-02-30"] {
            assert_eq!(
                text.parse::<BudgetMonth>(),
                Err(Error::InvalidMonth(text.to_owned())),
                "want {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn display_pads_month() {
        assert_eq!(BudgetMonth::new(2024, Month::July).to_string(), "2024-07");
    }

    #[test]
    fn next_and_previous_wrap_around_the_year() {
        let december = BudgetMonth::new(2023, Month::December);

        assert_eq!(december.next(), BudgetMonth::new(2024, Month::January));
        assert_eq!(december.next().previous(), december);
    }

    #[test]
    fn iter_until_is_inclusive() {
        let start = BudgetMonth::new(2023, Month::November);
        let end = BudgetMonth::new(2024, Month::February);

        let months: Vec<String> = start.iter_until(end).map(|m| m.to_string()).collect();

        assert_eq!(months, ["2023-11", "2023-12", "2024-01", "2024-02"]);
        assert_eq!(end.iter_until(start).count(), 0);
    }

    #[test]
    fn serializes_as_string() {
        let month = BudgetMonth::new(2022, Month::October);

        let json = serde_json::to_string(&month).unwrap();

        assert_eq!(json, "\"2022-10\"");
        assert_eq!(serde_json::from_str::<BudgetMonth>(&json).unwrap(), month);
    }
}
