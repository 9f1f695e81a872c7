use crate::controllers::dashboard::DashboardState;
use crate::controllers::ScreenState;
use crate::models::{Course, Enrollment, Grade, Student, User};
use crate::validation::FieldErrors;

const BAR_WIDTH: usize = 30;

// Renders rows as a left-aligned text table sized to its widest cells.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, width)| format!("{:<width$}", c, width = *width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    out.push_str(&line(dashes.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn courses(courses: &[Course]) -> String {
    if courses.is_empty() {
        return "No courses found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = courses
        .iter()
        .map(|c| {
            vec![
                c.id.to_string(),
                c.code.clone(),
                c.title.clone(),
                or_dash(c.credits),
                or_dash(c.description.as_deref()),
            ]
        })
        .collect();
    table(&["ID", "Code", "Title", "Credits", "Description"], &rows)
}

pub fn students(students: &[Student]) -> String {
    if students.is_empty() {
        return "No students found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = students
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.student_id.clone(),
                s.full_name(),
                s.email.clone(),
                or_dash(s.department.as_deref()),
                or_dash(s.year_of_study),
            ]
        })
        .collect();
    table(&["ID", "Student ID", "Name", "Email", "Department", "Year"], &rows)
}

pub fn enrollments(enrollments: &[Enrollment]) -> String {
    if enrollments.is_empty() {
        return "No enrollments found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = enrollments
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                format!("{} - {}", e.student.student_id, e.student.full_name()),
                format!("{} {}", e.course.code, e.course.title),
                or_dash(e.status),
                or_dash(e.semester.as_deref()),
                or_dash(e.academic_year.as_deref()),
            ]
        })
        .collect();
    table(&["ID", "Student", "Course", "Status", "Semester", "Year"], &rows)
}

pub fn grades(grades: &[Grade]) -> String {
    if grades.is_empty() {
        return "No grades found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = grades
        .iter()
        .map(|g| {
            vec![
                g.id.to_string(),
                format!("{} - {}", g.enrollment.student.student_id, g.enrollment.student.full_name()),
                g.enrollment.course.code.clone(),
                format!("{} ({})", g.assessment_name, g.assessment_type),
                format!("{}/{}", g.points_earned, g.total_points),
                or_dash(g.letter_grade.as_deref()),
                or_dash(g.weight),
                or_dash(g.graded_by.as_deref()),
            ]
        })
        .collect();
    table(&["ID", "Student", "Course", "Assessment", "Points", "Letter", "Weight", "Graded By"], &rows)
}

pub fn user(user: &User) -> String {
    let mut message = format!("👤 {} ({})\n", user.display_name(), user.role);
    message.push_str(&format!("   username: {}\n   email: {}\n", user.username, user.email));
    if let Some(student_id) = &user.student_id {
        message.push_str(&format!("   student id: {}\n", student_id));
    }
    message
}

pub fn field_errors(errors: &FieldErrors) -> String {
    let mut message = String::from("Please fix the following fields:\n");
    for (field, problem) in errors.iter() {
        message.push_str(&format!("  • {}: {}\n", field, problem));
    }
    message
}

/// Error or success banner for a screen, if it has one.
pub fn banner<T>(state: &ScreenState<T>) -> Option<String> {
    if let Some(error) = &state.error {
        return Some(format!("✖ {}", error));
    }
    state.notice.as_ref().map(|n| format!("✔ {}", n))
}

fn bar(value: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let filled = (value * BAR_WIDTH + max - 1) / max;
    "█".repeat(filled.min(BAR_WIDTH))
}

pub fn dashboard(state: &DashboardState) -> String {
    let mut message = String::from("📊 University Course Management\n\n");
    if let Some(error) = &state.error {
        message.push_str(&format!("✖ {}\n\n", error));
    }

    let stats = &state.stats;
    message.push_str(&format!(
        "Courses: {}   Students: {}   Enrollments: {}   Average grade: {:.2}\n",
        stats.total_courses, stats.total_students, stats.total_enrollments, stats.average_grade
    ));

    if !state.course_enrollments.is_empty() {
        message.push_str("\nEnrollments per course\n");
        for course in &state.course_enrollments {
            let enrolled = course.enrollments.max(0) as usize;
            message.push_str(&format!(
                "  {:<10} {:<30} {:>3}/{:<3}\n",
                course.code,
                bar(enrolled, course.capacity.max(1) as usize),
                course.enrollments,
                course.capacity
            ));
        }
    }

    if !state.grade_distribution.is_empty() {
        let max = state.grade_distribution.iter().map(|b| b.count).max().unwrap_or(0);
        message.push_str("\nGrade distribution\n");
        for bucket in &state.grade_distribution {
            message.push_str(&format!(
                "  {:<10} {:<30} {:>3}  {}\n",
                bucket.label,
                bar(bucket.count, max),
                bucket.count,
                bucket.color
            ));
        }
    }

    if !state.departments.is_empty() {
        let max = state.departments.iter().map(|d| d.students).max().unwrap_or(0);
        message.push_str("\nStudents by department\n");
        for dept in &state.departments {
            message.push_str(&format!(
                "  {:<20} {:<30} {:>3}  {}\n",
                dept.name,
                bar(dept.students, max),
                dept.students,
                dept.color
            ));
        }
    }

    message
}
