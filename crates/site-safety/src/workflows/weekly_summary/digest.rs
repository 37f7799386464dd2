use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::Action;

/// One open action as it appears in the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestLine {
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub site_name: Option<String>,
}

impl DigestLine {
    pub fn new(action: &Action, site_name: Option<String>) -> Self {
        Self {
            description: action.description.clone(),
            due_date: action.due_date,
            site_name,
        }
    }

    fn render(&self) -> String {
        format!(
            "  - {} (Due: {}, Site: {})\n",
            self.description,
            self.due_date.format("%Y-%m-%d"),
            self.site_name.as_deref().unwrap_or("N/A")
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCounts {
    pub overdue: usize,
    pub due_soon: usize,
    pub future: usize,
}

/// Open actions split by how close their due date is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionBacklog {
    pub overdue: Vec<DigestLine>,
    pub due_soon: Vec<DigestLine>,
    pub future: Vec<DigestLine>,
}

impl ActionBacklog {
    /// Due-soon covers `now..=now + due_soon_days`; anything earlier is overdue.
    pub fn bucket(
        lines: impl IntoIterator<Item = DigestLine>,
        now: DateTime<Utc>,
        due_soon_days: i64,
    ) -> Self {
        let horizon = now + Duration::days(due_soon_days);
        let mut backlog = Self::default();
        for line in lines {
            if line.due_date < now {
                backlog.overdue.push(line);
            } else if line.due_date <= horizon {
                backlog.due_soon.push(line);
            } else {
                backlog.future.push(line);
            }
        }
        backlog
    }

    pub fn counts(&self) -> ActionCounts {
        ActionCounts {
            overdue: self.overdue.len(),
            due_soon: self.due_soon.len(),
            future: self.future.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.due_soon.is_empty() && self.future.is_empty()
    }

    /// Plain-text email body for `client_name`.
    pub fn render(&self, client_name: &str) -> String {
        let mut body = format!("Weekly Safety Action Summary for {client_name}\n\n");
        push_section(&mut body, "OVERDUE", &self.overdue, true);
        push_section(&mut body, "DUE SOON", &self.due_soon, true);
        push_section(&mut body, "UPCOMING", &self.future, false);
        if self.is_empty() {
            body.push_str("No open corrective actions. Great work!\n");
        }
        body
    }
}

fn push_section(body: &mut String, heading: &str, lines: &[DigestLine], spaced: bool) {
    if lines.is_empty() {
        return;
    }
    body.push_str(&format!("{heading} ({}):\n", lines.len()));
    for line in lines {
        body.push_str(&line.render());
    }
    if spaced {
        body.push('\n');
    }
}

pub fn summary_subject(client_name: &str) -> String {
    format!("Weekly Safety Summary - {client_name}")
}
