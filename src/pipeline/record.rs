use std::fmt::Display;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

pub const YEARS_EXPERIENCE: &str = "YearsExperience";
pub const AGE: &str = "Age";
pub const JOB_TITLE: &str = "JobTitle";
pub const EDUCATION_LEVEL: &str = "EducationLevel";
pub const DEPARTMENT: &str = "Department";

pub const NUMERIC_COLUMNS: [&str; 2] = [YEARS_EXPERIENCE, AGE];
pub const CATEGORICAL_COLUMNS: [&str; 3] = [JOB_TITLE, EDUCATION_LEVEL, DEPARTMENT];

/// One row of input for the salary pipeline.
///
/// Serialized column names are the ones the fitted pipeline was trained on.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    #[serde(rename = "YearsExperience")]
    pub years_experience: f64,
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "JobTitle")]
    pub job_title: String,
    #[serde(rename = "EducationLevel")]
    pub education_level: String,
    #[serde(rename = "Department")]
    pub department: String,
}

impl EmployeeRecord {
    /// Coerces submitted form fields into a record.
    ///
    /// Numeric fields are trimmed before parsing. Categorical fields are taken verbatim.
    /// When a field is submitted more than once its first value wins.
    #[tracing::instrument(level = "debug", skip(form))]
    pub fn from_form(form: &[(String, String)]) -> Result<Self> {
        let years_experience = parse_years(required(form, YEARS_EXPERIENCE)?)?;
        let age = parse_age(required(form, AGE)?)?;

        Ok(Self {
            years_experience,
            age,
            job_title: required(form, JOB_TITLE)?.to_string(),
            education_level: required(form, EDUCATION_LEVEL)?.to_string(),
            department: required(form, DEPARTMENT)?.to_string(),
        })
    }

    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            YEARS_EXPERIENCE => Some(self.years_experience),
            AGE => Some(self.age as f64),
            _ => None,
        }
    }

    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            JOB_TITLE => Some(&self.job_title),
            EDUCATION_LEVEL => Some(&self.education_level),
            DEPARTMENT => Some(&self.department),
            _ => None,
        }
    }
}

impl Display for EmployeeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={} {}={} {}={:?} {}={:?} {}={:?}",
            YEARS_EXPERIENCE,
            self.years_experience,
            AGE,
            self.age,
            JOB_TITLE,
            self.job_title,
            EDUCATION_LEVEL,
            self.education_level,
            DEPARTMENT,
            self.department
        )
    }
}

fn required<'a>(form: &'a [(String, String)], field: &str) -> Result<&'a str> {
    form.iter()
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| anyhow!("Missing form field '{}'", field))
}

fn parse_years(value: &str) -> Result<f64> {
    let years: f64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Could not convert {} value '{}' to a number", YEARS_EXPERIENCE, value))?;
    if !years.is_finite() {
        bail!("{} must be a finite number, got '{}'", YEARS_EXPERIENCE, value);
    }
    Ok(years)
}

fn parse_age(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Could not convert {} value '{}' to an integer", AGE, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_form() -> Vec<(String, String)> {
        form(&[
            (YEARS_EXPERIENCE, " 7.5 "),
            (AGE, "34"),
            (JOB_TITLE, "Data Scientist"),
            (EDUCATION_LEVEL, "Master's"),
            (DEPARTMENT, "Engineering"),
        ])
    }

    fn set(fields: &mut [(String, String)], field: &str, value: &str) {
        for (key, current) in fields.iter_mut() {
            if key == field {
                *current = value.to_string();
            }
        }
    }

    #[test]
    fn coerces_all_five_fields() {
        let record = EmployeeRecord::from_form(&complete_form()).unwrap();
        assert_eq!(
            record,
            EmployeeRecord {
                years_experience: 7.5,
                age: 34,
                job_title: "Data Scientist".into(),
                education_level: "Master's".into(),
                department: "Engineering".into(),
            }
        );
    }

    #[test]
    fn each_missing_field_is_reported_by_name() {
        for field in NUMERIC_COLUMNS.iter().chain(CATEGORICAL_COLUMNS.iter()) {
            let mut fields = complete_form();
            fields.retain(|(key, _)| key != field);
            let err = EmployeeRecord::from_form(&fields).unwrap_err();
            assert!(err.to_string().contains(field), "{err}");
        }
    }

    #[test]
    fn rejects_non_numeric_years() {
        let mut fields = complete_form();
        set(&mut fields, YEARS_EXPERIENCE, "abc");
        let err = EmployeeRecord::from_form(&fields).unwrap_err();
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn rejects_non_finite_years() {
        for value in ["inf", "NaN", "-infinity"] {
            let mut fields = complete_form();
            set(&mut fields, YEARS_EXPERIENCE, value);
            assert!(EmployeeRecord::from_form(&fields).is_err(), "{value}");
        }
    }

    #[test]
    fn age_must_be_an_integer() {
        let mut fields = complete_form();
        set(&mut fields, AGE, "34.5");
        assert!(EmployeeRecord::from_form(&fields).is_err());

        set(&mut fields, AGE, "+41");
        assert_eq!(EmployeeRecord::from_form(&fields).unwrap().age, 41);
    }

    #[test]
    fn repeated_fields_keep_the_first_value() {
        let mut fields = complete_form();
        fields.push((YEARS_EXPERIENCE.into(), "abc".into()));
        fields.push((AGE.into(), "99".into()));

        let record = EmployeeRecord::from_form(&fields).unwrap();
        assert_eq!(record.years_experience, 7.5);
        assert_eq!(record.age, 34);
    }

    #[test]
    fn columns_are_addressable_by_name() {
        let record = EmployeeRecord::from_form(&complete_form()).unwrap();
        assert_eq!(record.numeric(AGE), Some(34.0));
        assert_eq!(record.numeric(JOB_TITLE), None);
        assert_eq!(record.categorical(DEPARTMENT), Some("Engineering"));
        assert_eq!(record.categorical("Salary"), None);
    }

    #[test]
    fn serializes_with_pipeline_column_names() {
        let record = EmployeeRecord::from_form(&complete_form()).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        for column in NUMERIC_COLUMNS.iter().chain(CATEGORICAL_COLUMNS.iter()) {
            assert!(json.get(*column).is_some(), "{column}");
        }
    }
}
