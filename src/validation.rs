//! Local form validation. A form that fails here never reaches the network;
//! each failing field gets its own message, shown inline next to that field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use regex::Regex;
use crate::models::{
    CourseRequest, EnrollmentRequest, GradeRequest, LoginRequest, RegisterRequest, Role, StudentRequest,
};

pub const DEFAULT_SEMESTER: &str = "Fall";
pub const DEFAULT_ACADEMIC_YEAR: &str = "2025";
pub const DEFAULT_WEIGHT: f64 = 1.0;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    // The first message recorded for a field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if blank(value) {
        errors.add(field, message);
    }
}

fn check_email(errors: &mut FieldErrors, value: &str) {
    if blank(value) {
        errors.add("email", "Email is required");
    } else if !email_pattern().is_match(value.trim()) {
        errors.add("email", "Invalid email");
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseForm {
    pub code: String,
    pub title: String,
    pub description: String,
    pub credits: String,
}

impl CourseForm {
    pub fn validate(&self) -> Result<CourseRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        let code = self.code.trim();
        if code.is_empty() {
            errors.add("code", "Course code is required");
        } else if code.chars().count() < 2 {
            errors.add("code", "Course code must be at least 2 characters");
        }

        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "Course title is required");
        } else if title.chars().count() < 3 {
            errors.add("title", "Course title must be at least 3 characters");
        }

        let mut credits = None;
        if !blank(&self.credits) {
            match self.credits.trim().parse::<i32>() {
                Ok(c) if (1..=10).contains(&c) => credits = Some(c),
                _ => errors.add("credits", "Credits must be a number between 1 and 10"),
            }
        }

        errors.into_result(|| CourseRequest {
            code: code.to_string(),
            title: title.to_string(),
            description: optional(&self.description),
            credits,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentForm {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: String,
    pub address: String,
    pub department: String,
    pub year_of_study: String,
}

impl StudentForm {
    pub fn validate(&self) -> Result<StudentRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "studentId", &self.student_id, "Student ID is required");
        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");
        check_email(&mut errors, &self.email);
        require(&mut errors, "department", &self.department, "Department is required");

        let year_of_study = match self.year_of_study.trim().parse::<i32>() {
            Ok(year) if year > 0 => year,
            _ => {
                errors.add("yearOfStudy", "Year of study must be a positive number");
                0
            }
        };

        errors.into_result(|| StudentRequest {
            student_id: self.student_id.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone_number: optional(&self.phone_number),
            date_of_birth: optional(&self.date_of_birth),
            address: optional(&self.address),
            department: self.department.trim().to_string(),
            year_of_study,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentForm {
    pub student_id: Option<i64>,
    pub course_id: Option<i64>,
    pub semester: String,
    pub academic_year: String,
}

impl EnrollmentForm {
    pub fn validate(&self) -> Result<EnrollmentRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.student_id.is_none() {
            errors.add("studentId", "Student is required");
        }
        if self.course_id.is_none() {
            errors.add("courseId", "Course is required");
        }

        errors.into_result(|| EnrollmentRequest {
            student_id: self.student_id.unwrap_or_default(),
            course_id: self.course_id.unwrap_or_default(),
            semester: Some(optional(&self.semester).unwrap_or_else(|| DEFAULT_SEMESTER.to_string())),
            academic_year: Some(optional(&self.academic_year).unwrap_or_else(|| DEFAULT_ACADEMIC_YEAR.to_string())),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeForm {
    pub enrollment_id: Option<i64>,
    pub assessment_type: String,
    pub assessment_name: String,
    pub points_earned: String,
    pub total_points: String,
    pub letter_grade: String,
    pub weight: String,
    pub assessment_date: String,
    pub feedback: String,
    pub graded_by: String,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl GradeForm {
    pub fn validate(&self) -> Result<GradeRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.enrollment_id.is_none() {
            errors.add("enrollmentId", "Please select an enrollment");
        }
        require(&mut errors, "assessmentType", &self.assessment_type, "Assessment type is required");
        require(&mut errors, "assessmentName", &self.assessment_name, "Assessment name is required");

        let points_earned = if blank(&self.points_earned) {
            errors.add("pointsEarned", "Points earned is required");
            None
        } else {
            match parse_number(&self.points_earned) {
                Some(p) if p >= 0.0 => Some(p),
                _ => {
                    errors.add("pointsEarned", "Points earned must be zero or more");
                    None
                }
            }
        };

        let total_points = if blank(&self.total_points) {
            errors.add("totalPoints", "Total points is required");
            None
        } else {
            match parse_number(&self.total_points) {
                Some(t) if t > 0.0 => Some(t),
                _ => {
                    errors.add("totalPoints", "Total points must be greater than zero");
                    None
                }
            }
        };

        if let (Some(p), Some(t)) = (points_earned, total_points) {
            if p > t {
                errors.add("pointsEarned", "Points earned cannot exceed total points");
            }
        }

        let weight = if blank(&self.weight) {
            DEFAULT_WEIGHT
        } else {
            match parse_number(&self.weight) {
                Some(w) if w >= 0.0 => w,
                _ => {
                    errors.add("weight", "Weight must be zero or more");
                    DEFAULT_WEIGHT
                }
            }
        };

        errors.into_result(|| GradeRequest {
            enrollment_id: self.enrollment_id.unwrap_or_default(),
            assessment_type: self.assessment_type.trim().to_ascii_uppercase(),
            assessment_name: self.assessment_name.trim().to_string(),
            points_earned: points_earned.unwrap_or_default(),
            total_points: total_points.unwrap_or_default(),
            letter_grade: optional(&self.letter_grade),
            weight,
            assessment_date: optional(&self.assessment_date),
            feedback: optional(&self.feedback),
            graded_by: optional(&self.graded_by),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "username", &self.username, "Username is required");
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result(|| LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        require(&mut errors, "username", &self.username, "Username is required");
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        if self.role.is_none() {
            errors.add("role", "Role is required");
        }
        require(&mut errors, "firstName", &self.first_name, "First name is required");
        require(&mut errors, "lastName", &self.last_name, "Last name is required");

        errors.into_result(|| RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role.unwrap_or(Role::Student),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        })
    }
}
