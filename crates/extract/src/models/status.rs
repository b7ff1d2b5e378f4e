use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Publication status of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
    Upcoming,
}
impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ongoing => "Ongoing",
            Status::Completed => "Completed",
            Status::Hiatus => "Hiatus",
            Status::Cancelled => "Cancelled",
            Status::Upcoming => "Upcoming",
        }
    }
}
impl From<&str> for Status {
    fn from(value: &str) -> Self {
        crate::normalize::parse_status(value)
    }
}
impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
