use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which site form produced a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormType {
    Contact,
    Newsletter,
    Project,
    ScheduleCall,
}

impl FormType {
    pub const ALL: [FormType; 4] = [
        FormType::Contact,
        FormType::Newsletter,
        FormType::Project,
        FormType::ScheduleCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Contact => "contact",
            FormType::Newsletter => "newsletter",
            FormType::Project => "project",
            FormType::ScheduleCall => "schedule-call",
        }
    }

    /// Fields that must be present and non-blank for this form.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            FormType::Contact => &["name", "email", "message"],
            FormType::Newsletter => &["email"],
            FormType::Project => &["name", "email", "description"],
            FormType::ScheduleCall => &["name", "email", "date"],
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown form type: {s}"))
    }
}
