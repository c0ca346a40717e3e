use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Result of a single call, as recorded by callers or the voice agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum CallOutcome {
    Booked,
    Interested,
    #[serde(rename = "Not Interested")]
    #[sqlx(rename = "Not Interested")]
    NotInterested,
    Callback,
    #[serde(rename = "No Answer")]
    #[sqlx(rename = "No Answer")]
    NoAnswer,
    Voicemail,
    #[serde(rename = "Wrong Number")]
    #[sqlx(rename = "Wrong Number")]
    WrongNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCategory {
    Successful,
    Unsuccessful,
    Pending,
}

impl CallOutcome {
    pub const ALL: [CallOutcome; 7] = [
        CallOutcome::Booked,
        CallOutcome::Interested,
        CallOutcome::NotInterested,
        CallOutcome::Callback,
        CallOutcome::NoAnswer,
        CallOutcome::Voicemail,
        CallOutcome::WrongNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Booked => "Booked",
            CallOutcome::Interested => "Interested",
            CallOutcome::NotInterested => "Not Interested",
            CallOutcome::Callback => "Callback",
            CallOutcome::NoAnswer => "No Answer",
            CallOutcome::Voicemail => "Voicemail",
            CallOutcome::WrongNumber => "Wrong Number",
        }
    }

    pub fn category(&self) -> OutcomeCategory {
        match self {
            CallOutcome::Booked | CallOutcome::Interested => OutcomeCategory::Successful,
            CallOutcome::Callback | CallOutcome::NoAnswer | CallOutcome::Voicemail => {
                OutcomeCategory::Pending
            }
            CallOutcome::NotInterested | CallOutcome::WrongNumber => OutcomeCategory::Unsuccessful,
        }
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOutcome(pub String);

impl fmt::Display for UnknownOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown call outcome '{}'", self.0)
    }
}

impl std::error::Error for UnknownOutcome {}

/// Lenient parse: case-insensitive, `_` and `-` read as spaces.
/// Also accepts the "Booked Appointment" / "Callback Requested" spellings
/// used by the CRM databases.
impl FromStr for CallOutcome {
    type Err = UnknownOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let outcome = match normalized.as_str() {
            "booked" | "booked appointment" | "appointment booked" => CallOutcome::Booked,
            "interested" => CallOutcome::Interested,
            "not interested" => CallOutcome::NotInterested,
            "callback" | "call back" | "callback requested" => CallOutcome::Callback,
            "no answer" => CallOutcome::NoAnswer,
            "voicemail" | "voice mail" | "left voicemail" => CallOutcome::Voicemail,
            "wrong number" => CallOutcome::WrongNumber,
            _ => return Err(UnknownOutcome(s.to_string())),
        };
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct CallLog {
    pub id: i64,
    pub lead_id: Option<i64>,
    pub business_name: Option<String>,
    pub phone: String,
    pub caller: Option<String>,
    pub outcome: CallOutcome,
    pub duration_seconds: i64,
    pub notes: Option<String>,
    pub source: String,
    pub called_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCallLog {
    pub lead_id: Option<i64>,
    pub business_name: Option<String>,
    pub phone: String,
    pub caller: Option<String>,
    pub outcome: CallOutcome,
    #[serde(default)]
    pub duration_seconds: i64,
    pub notes: Option<String>,
    #[serde(default = "default_call_source")]
    pub source: String,
    pub called_at: Option<DateTime<Utc>>,
}

fn default_call_source() -> String {
    "manual".to_string()
}

/// The minimal view of a call the statistics need; both the local table and
/// the Notion calls database produce these.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub outcome: CallOutcome,
    pub duration_seconds: i64,
    pub called_at: DateTime<Utc>,
}

impl From<&CallLog> for CallRecord {
    fn from(log: &CallLog) -> Self {
        Self {
            outcome: log.outcome,
            duration_seconds: log.duration_seconds,
            called_at: log.called_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crm_spellings() {
        assert_eq!("not_interested".parse(), Ok(CallOutcome::NotInterested));
        assert_eq!("  NO-ANSWER ".parse(), Ok(CallOutcome::NoAnswer));
        assert_eq!("Booked Appointment".parse(), Ok(CallOutcome::Booked));
        assert_eq!("Callback Requested".parse(), Ok(CallOutcome::Callback));
        assert!("hung up".parse::<CallOutcome>().is_err());
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for outcome in CallOutcome::ALL {
            assert_eq!(outcome.as_str().parse(), Ok(outcome));
        }
    }

    #[test]
    fn categories() {
        assert_eq!(CallOutcome::Booked.category(), OutcomeCategory::Successful);
        assert_eq!(CallOutcome::Voicemail.category(), OutcomeCategory::Pending);
        assert_eq!(
            CallOutcome::WrongNumber.category(),
            OutcomeCategory::Unsuccessful
        );
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&CallOutcome::NotInterested).unwrap();
        assert_eq!(json, r#""Not Interested""#);
    }
}
