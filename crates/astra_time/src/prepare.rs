//! Birth-instant preparation: local wall-clock → UTC → Julian Day.

use std::sync::Arc;

use chrono::{LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat, TimeZone, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use astra_metrics::{MetricsSink, metric_name};

use crate::delta_t::delta_t_seconds;
use crate::error::TimeError;
use crate::input::BirthInput;
use crate::julian::{SECONDS_PER_DAY, jd_ut_from_unix};
use crate::tzdb::TimezoneDatabase;

/// Where the effective timezone came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimezoneSource {
    UserProvided,
    Derived,
}

/// Time scale of the prepared instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeScale {
    UT,
    TT,
}

impl TimeScale {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UT => "UT",
            Self::TT => "TT",
        }
    }
}

/// A birth event resolved into a deterministic instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthPrepared {
    /// Local instant, RFC 3339 with offset.
    pub birth_datetime_local: String,
    /// UTC instant, RFC 3339 with `+00:00` offset.
    pub birth_datetime_utc: String,
    /// Seconds since the Unix epoch, integer part.
    pub timestamp_utc: i64,
    /// Julian Day in Universal Time, fractional seconds included.
    pub jd_ut: f64,
    /// Effective IANA zone.
    pub timezone_iana: String,
    pub timezone_source: TimezoneSource,
    pub time_scale: TimeScale,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_t_sec: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jd_tt: Option<f64>,
}

/// Turns [`BirthInput`] into [`BirthPrepared`].
pub struct TimePreparer {
    tzdb: Arc<dyn TimezoneDatabase>,
    metrics: Arc<dyn MetricsSink>,
    derive_from_coordinates: bool,
}

impl TimePreparer {
    pub fn new(tzdb: Arc<dyn TimezoneDatabase>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            tzdb,
            metrics,
            derive_from_coordinates: false,
        }
    }

    /// Enable coordinate-to-zone derivation when no zone is given.
    pub fn with_coordinate_derivation(mut self, enabled: bool) -> Self {
        self.derive_from_coordinates = enabled;
        self
    }

    /// Resolve a birth event into an instant on the UT (and optionally TT)
    /// scale. Identical inputs yield bit-identical outputs.
    pub fn prepare(&self, input: &BirthInput, tt_enabled: bool) -> Result<BirthPrepared, TimeError> {
        input.validate()?;

        let date = parse_birth_date(&input.birth_date)?;
        let time = match &input.birth_time {
            Some(raw) => parse_birth_time(raw)?,
            None => NaiveTime::MIN,
        };
        let naive = date.and_time(time);

        let (zone_name, source) = self.effective_zone(input)?;
        let Some(tz) = self.tzdb.resolve(&zone_name) else {
            self.metrics.incr("natal_preparation_timezone_errors_total");
            return Err(TimeError::InvalidTimezone { zone: zone_name });
        };

        let local = self.attach_local(tz, naive, &zone_name)?;
        let utc = local.with_timezone(&Utc);

        let timestamp_utc = utc.timestamp();
        let precise_seconds =
            timestamp_utc as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9;
        let jd_ut = jd_ut_from_unix(precise_seconds);

        let (time_scale, delta_t_sec, jd_tt) = if tt_enabled {
            let dt = delta_t_seconds(jd_ut);
            (TimeScale::TT, Some(dt), Some(jd_ut + dt / SECONDS_PER_DAY))
        } else {
            (TimeScale::UT, None, None)
        };

        debug!(
            "time prepared: timezone={zone_name} source={source:?} time_scale={}",
            time_scale.as_str()
        );

        Ok(BirthPrepared {
            birth_datetime_local: local
                .fixed_offset()
                .to_rfc3339_opts(SecondsFormat::AutoSi, false),
            birth_datetime_utc: utc.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            timestamp_utc,
            jd_ut,
            timezone_iana: zone_name,
            timezone_source: source,
            time_scale,
            delta_t_sec,
            jd_tt,
        })
    }

    fn effective_zone(&self, input: &BirthInput) -> Result<(String, TimezoneSource), TimeError> {
        if let Some(zone) = &input.birth_timezone {
            return Ok((zone.clone(), TimezoneSource::UserProvided));
        }
        if self.derive_from_coordinates {
            let (Some(lat), Some(lon)) = (input.birth_lat, input.birth_lon) else {
                return Err(TimeError::MissingCoordinates);
            };
            return match self.tzdb.zone_for_coordinates(lat, lon) {
                Some(zone) => Ok((zone, TimezoneSource::Derived)),
                None => Err(TimeError::MissingTimezone),
            };
        }
        Err(TimeError::MissingTimezone)
    }

    /// Attach the zone strictly: folds and gaps are errors.
    fn attach_local(
        &self,
        tz: chrono_tz::Tz,
        naive: NaiveDateTime,
        zone_name: &str,
    ) -> Result<chrono::DateTime<chrono_tz::Tz>, TimeError> {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt),
            LocalResult::Ambiguous(earliest, latest) => {
                self.metrics
                    .incr(&metric_name("time_ambiguity_total", &[("type", "ambiguous")]));
                Err(TimeError::AmbiguousLocalTime {
                    local: naive.to_string(),
                    zone: zone_name.to_string(),
                    offsets: [
                        earliest.offset().fix().to_string(),
                        latest.offset().fix().to_string(),
                    ],
                })
            }
            LocalResult::None => {
                self.metrics
                    .incr(&metric_name("time_ambiguity_total", &[("type", "nonexistent")]));
                Err(TimeError::NonexistentLocalTime {
                    local: naive.to_string(),
                    zone: zone_name.to_string(),
                })
            }
        }
    }
}

fn parse_birth_date(raw: &str) -> Result<NaiveDate, TimeError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| TimeError::InvalidBirthInput {
        reason: format!("birth_date '{raw}' is not a YYYY-MM-DD date"),
    })
}

/// Accepts `H:MM`, `HH:MM`, `HH:MM:SS` and `HH:MM:SS.fff`.
fn parse_birth_time(raw: &str) -> Result<NaiveTime, TimeError> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| TimeError::InvalidBirthInput {
            reason: format!("birth_time '{raw}' is not a valid wall-clock time"),
        })
}
