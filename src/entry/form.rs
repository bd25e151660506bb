//! The seven-field entry form and its validation into a [`TimeEntry`].

use chrono::NaiveDate;

/// Display and input format for entry dates (MM/DD/YYYY).
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Raw text of the popup's input fields, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub date: String,
    pub hours: String,
    pub description: String,
    pub project: String,
    pub branch: String,
    pub commit_start: String,
    pub commit_end: String,
}

/// Inline validation messages, one per required field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub date: Option<String>,
    pub hours: Option<String>,
    pub description: Option<String>,
    pub project: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.hours.is_none()
            && self.description.is_none()
            && self.project.is_none()
    }
}

/// A validated entry, ready to become one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    pub date: String,
    pub hours: String,
    pub description: String,
    pub project: String,
    pub branch: String,
    pub commit_start: String,
    pub commit_end: String,
}

impl TimeEntry {
    /// Cell values in sheet column order A..G.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.hours.clone(),
            self.description.clone(),
            self.project.clone(),
            self.branch.clone(),
            self.commit_start.clone(),
            self.commit_end.clone(),
        ]
    }
}

impl EntryForm {
    /// A blank form with the date seeded to `today`.
    pub fn seeded(today: NaiveDate) -> Self {
        Self {
            date: today.format(DATE_FORMAT).to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<TimeEntry, FieldErrors> {
        let errors = FieldErrors {
            date: validate_date(&self.date).err(),
            hours: validate_hours(&self.hours).err(),
            description: required(&self.description, "description is required").err(),
            project: required(&self.project, "project/repo is required").err(),
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TimeEntry {
            date: self.date.trim().to_string(),
            hours: self.hours.trim().to_string(),
            description: self.description.trim().to_string(),
            project: self.project.trim().to_string(),
            branch: self.branch.trim().to_string(),
            commit_start: self.commit_start.trim().to_string(),
            commit_end: self.commit_end.trim().to_string(),
        })
    }
}

fn required(text: &str, message: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        Err(message.to_string())
    } else {
        Ok(())
    }
}

/// Accepts only zero-padded MM/DD/YYYY naming a real calendar day.
pub fn validate_date(text: &str) -> Result<NaiveDate, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("date is required".to_string());
    }

    let invalid = || "invalid date format, use MM/DD/YYYY".to_string();
    let parts: Vec<&str> = text.split('/').collect();
    let well_formed = parts.len() == 3
        && parts[0].len() == 2
        && parts[1].len() == 2
        && parts[2].len() == 4
        && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())
}

pub fn validate_hours(text: &str) -> Result<f64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("hours are required".to_string());
    }
    match text.parse::<f64>() {
        Ok(hours) if hours.is_finite() => Ok(hours),
        _ => Err("invalid hours value, must be a number".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled() -> EntryForm {
        EntryForm {
            date: "01/02/2025".to_string(),
            hours: "3.5".to_string(),
            description: "Fix bug".to_string(),
            project: "repoA".to_string(),
            branch: "main".to_string(),
            commit_start: "abc123".to_string(),
            commit_end: "def456".to_string(),
        }
    }

    #[test]
    fn test_seeded_form_has_only_date() {
        let form = EntryForm::seeded(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(
            form,
            EntryForm { date: "01/02/2025".to_string(), ..EntryForm::default() }
        );
    }

    #[test]
    fn test_valid_form_becomes_row_in_column_order() {
        let entry = filled().validate().unwrap();
        assert_eq!(
            entry.to_row(),
            vec!["01/02/2025", "3.5", "Fix bug", "repoA", "main", "abc123", "def456"]
        );
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let form = EntryForm {
            branch: String::new(),
            commit_start: String::new(),
            commit_end: String::new(),
            ..filled()
        };
        let row = form.validate().unwrap().to_row();
        assert_eq!(&row[4..], &["", "", ""]);
    }

    #[test]
    fn test_date_format() {
        assert!(validate_date("01/02/2025").is_ok());
        assert!(validate_date("12/31/2024").is_ok());
        assert!(validate_date("02/29/2024").is_ok());

        assert!(validate_date("13/40/2024").is_err());
        assert!(validate_date("02/30/2025").is_err());
        assert!(validate_date("2025-01-02").is_err());
        assert!(validate_date("1/2/2025").is_err());
        assert!(validate_date("01/02/25").is_err());
        assert_eq!(validate_date(""), Err("date is required".to_string()));
    }

    #[test]
    fn test_hours_must_be_a_number() {
        assert_eq!(validate_hours("3.5"), Ok(3.5));
        assert_eq!(validate_hours("2"), Ok(2.0));
        assert_eq!(validate_hours(" 1.25 "), Ok(1.25));

        assert!(validate_hours("three").is_err());
        assert!(validate_hours("3h").is_err());
        assert!(validate_hours("NaN").is_err());
        assert!(validate_hours("inf").is_err());
        assert_eq!(validate_hours(""), Err("hours are required".to_string()));
    }

    #[test]
    fn test_missing_required_fields_are_reported_per_field() {
        let form = EntryForm {
            hours: "abc".to_string(),
            description: "   ".to_string(),
            project: String::new(),
            ..filled()
        };
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.date, None);
        assert_eq!(errors.hours.as_deref(), Some("invalid hours value, must be a number"));
        assert_eq!(errors.description.as_deref(), Some("description is required"));
        assert_eq!(errors.project.as_deref(), Some("project/repo is required"));
    }

    #[test]
    fn test_values_are_trimmed() {
        let form = EntryForm {
            description: "  Fix bug ".to_string(),
            branch: " main".to_string(),
            ..filled()
        };
        let entry = form.validate().unwrap();
        assert_eq!(entry.description, "Fix bug");
        assert_eq!(entry.branch, "main");
    }
}
