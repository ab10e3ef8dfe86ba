//! Telemetry and calendar history queries.
//!
//! Dates are `YYYY-MM-DD` strings passed through to the upstream untouched. The
//! optional time zone defaults to the site's own zone upstream and is only sent
//! when non-empty. Period and kind are checked before anything goes out.

use crate::api::endpoint;
use crate::api::response::Envelope;
use crate::api::{Client, Error, Result};
use crate::model::HistoryData;
use chrono::{Days, Local, Months, NaiveDate};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Bucket size of a calendar history series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "day" => Some(Period::Day),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a calendar history series measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Energy,
    Backup,
}

impl HistoryKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "energy" => Some(HistoryKind::Energy),
            "backup" => Some(HistoryKind::Backup),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryKind::Energy => "energy",
            HistoryKind::Backup => "backup",
        }
    }
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_period(period: &str, query: &str) -> Result<Period> {
    Period::from_name(period).ok_or_else(|| {
        Error::invalid_argument(
            "period",
            format!(
                "invalid period for {}: {} (supported: day, week, month, year)",
                query, period
            ),
        )
    })
}

fn parse_kind(kind: &str) -> Result<HistoryKind> {
    HistoryKind::from_name(kind).ok_or_else(|| {
        Error::invalid_argument(
            "kind",
            format!(
                "invalid kind for calendar history: {} (supported: energy, backup)",
                kind
            ),
        )
    })
}

/// Query parameters in key order.
fn history_query<'a>(
    kind: &'a str,
    start_date: &'a str,
    end_date: &'a str,
    period: Option<Period>,
    time_zone: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut query = vec![("end_date", end_date), ("kind", kind)];
    if let Some(period) = period {
        query.push(("period", period.as_str()));
    }
    query.push(("start_date", start_date));
    if let Some(time_zone) = time_zone.filter(|tz| !tz.is_empty()) {
        query.push(("time_zone", time_zone));
    }
    query
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `(start, end)` covering `span` days up to today, local time.
fn last_days(span: u64) -> (String, String) {
    let today = Local::now().date_naive();
    let start = today.checked_sub_days(Days::new(span)).unwrap_or(today);
    (format_date(start), format_date(today))
}

fn last_months(span: u32) -> (String, String) {
    let today = Local::now().date_naive();
    let start = today.checked_sub_months(Months::new(span)).unwrap_or(today);
    (format_date(start), format_date(today))
}

impl Client {
    /// Charge telemetry between two dates.
    pub async fn telemetry_history(
        &self,
        start_date: &str,
        end_date: &str,
        time_zone: Option<&str>,
    ) -> Result<HistoryData> {
        let site_id = self.require_site()?;
        self.trace(&format!(
            "Fetching telemetry history for energy site {}, start={} end={}...",
            site_id, start_date, end_date
        ));

        let path = endpoint::energy_site(site_id, endpoint::TELEMETRY_HISTORY);
        let query = history_query("charge", start_date, end_date, None, time_zone);
        let history = self
            .get_json::<Envelope<HistoryData>>(&path, &query)
            .await?
            .response;

        self.trace(&format!(
            "Telemetry history retrieved successfully: {} data points from {} to {}",
            history.time_series.len(),
            start_date,
            end_date
        ));
        Ok(history)
    }

    /// Energy import/export totals bucketed by `period`.
    pub async fn energy_history(
        &self,
        start_date: &str,
        end_date: &str,
        period: &str,
        time_zone: Option<&str>,
    ) -> Result<HistoryData> {
        self.require_site()?;
        let period = parse_period(period, "energy history")?;
        self.fetch_calendar_history(HistoryKind::Energy, start_date, end_date, period, time_zone)
            .await
    }

    /// Backup events and outages bucketed by `period`.
    pub async fn backup_history(
        &self,
        start_date: &str,
        end_date: &str,
        period: &str,
        time_zone: Option<&str>,
    ) -> Result<HistoryData> {
        self.require_site()?;
        let period = parse_period(period, "backup history")?;
        self.fetch_calendar_history(HistoryKind::Backup, start_date, end_date, period, time_zone)
            .await
    }

    /// `kind` is `energy` or `backup`, `period` one of `day`, `week`, `month`, `year`.
    pub async fn calendar_history(
        &self,
        kind: &str,
        start_date: &str,
        end_date: &str,
        period: &str,
        time_zone: Option<&str>,
    ) -> Result<HistoryData> {
        self.require_site()?;
        let kind = parse_kind(kind)?;
        let period = parse_period(period, "calendar history")?;
        self.fetch_calendar_history(kind, start_date, end_date, period, time_zone)
            .await
    }

    async fn fetch_calendar_history(
        &self,
        kind: HistoryKind,
        start_date: &str,
        end_date: &str,
        period: Period,
        time_zone: Option<&str>,
    ) -> Result<HistoryData> {
        let site_id = self.require_site()?;
        self.trace(&format!(
            "Fetching calendar history for energy site {}, kind={} start={} end={} period={}...",
            site_id, kind, start_date, end_date, period
        ));

        let path = endpoint::energy_site(site_id, endpoint::CALENDAR_HISTORY);
        let query = history_query(kind.as_str(), start_date, end_date, Some(period), time_zone);
        let history = self
            .get_json::<Envelope<HistoryData>>(&path, &query)
            .await?
            .response;

        self.trace(&format!(
            "Calendar history retrieved successfully: {} data points for {} from {} to {} ({} periods)",
            history.time_series.len(),
            kind,
            start_date,
            end_date,
            period
        ));
        Ok(history)
    }

    /* Shortcuts over fixed windows ending today */

    pub async fn recent_telemetry_data(&self) -> Result<HistoryData> {
        let (start, end) = last_days(7);
        self.telemetry_history(&start, &end, None).await
    }

    pub async fn daily_energy_data(&self) -> Result<HistoryData> {
        let (start, end) = last_days(7);
        self.energy_history(&start, &end, Period::Day.as_str(), None)
            .await
    }

    pub async fn weekly_energy_data(&self) -> Result<HistoryData> {
        let (start, end) = last_months(1);
        self.energy_history(&start, &end, Period::Week.as_str(), None)
            .await
    }

    pub async fn monthly_energy_data(&self) -> Result<HistoryData> {
        let (start, end) = last_months(12);
        self.energy_history(&start, &end, Period::Month.as_str(), None)
            .await
    }
}
