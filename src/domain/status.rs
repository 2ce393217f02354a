use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    InProgress,
    Completed,
    Blocked,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::InProgress,
        TicketStatus::Completed,
        TicketStatus::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Completed => "completed",
            TicketStatus::Blocked => "blocked",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::InProgress => "In progress",
            TicketStatus::Completed => "Completed",
            TicketStatus::Blocked => "Blocked",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "in_progress" => Some(TicketStatus::InProgress),
            "completed" => Some(TicketStatus::Completed),
            "blocked" => Some(TicketStatus::Blocked),
            _ => None,
        }
    }
}

impl Default for TicketStatus {
    fn default() -> Self {
        TicketStatus::InProgress
    }
}

/// Which tickets the list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TicketStatus),
}

impl StatusFilter {
    pub fn from_str(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(StatusFilter::All);
        }
        TicketStatus::from_str(value).map(StatusFilter::Only)
    }

    pub fn matches(&self, status: TicketStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => *expected == status,
        }
    }
}
