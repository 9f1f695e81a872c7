#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::LevelFilter;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use url::Url;
use coursedesk::models::{
    AuthResponse, Course, CourseRequest, Enrollment, EnrollmentCheck, EnrollmentRequest, EnrollmentStatus, Grade,
    GradeRequest, LoginRequest, RegisterRequest, Role, Student, StudentRequest, User,
};
use coursedesk::utils::storage::{FileStorage, MemoryStorage, Storage};
use coursedesk::{App, Config};

pub const ADMIN_TOKEN: &str = "admin-token";
pub const STUDENT_TOKEN: &str = "student-token";

/// In-memory stand-in for the course backend.
pub struct Data {
    pub courses: Vec<Course>,
    pub students: Vec<Student>,
    pub enrollments: Vec<Enrollment>,
    pub grades: Vec<Grade>,
    pub sessions: HashMap<String, User>,
    pub requests: Vec<String>,
    pub delay: Duration,
    pub fail_counts: bool,
    next_id: i64,
}

impl Data {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn caller(&self, headers: &HeaderMap) -> Option<User> {
        bearer(headers).and_then(|token| self.sessions.get(&token).cloned())
    }

    fn caller_student(&self, headers: &HeaderMap) -> Option<Student> {
        let student_id = self.caller(headers)?.student_id?;
        self.students.iter().find(|s| s.student_id == student_id).cloned()
    }
}

type Shared = Arc<Mutex<Data>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Data> {
    shared.lock().expect("backend lock")
}

pub fn course(id: i64, code: &str, title: &str, credits: i32) -> Course {
    Course {
        id,
        code: code.into(),
        title: title.into(),
        description: Some(format!("{} description", title)),
        credits: Some(credits),
        instructor: None,
        max_students: None,
        enrolled_students: None,
        semester: None,
    }
}

pub fn student(id: i64, student_id: &str, first: &str, last: &str, department: &str) -> Student {
    Student {
        id,
        student_id: student_id.into(),
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}.{}@university.edu", first.to_lowercase(), last.to_lowercase()),
        date_of_birth: None,
        phone_number: None,
        address: None,
        department: Some(department.into()),
        year_of_study: Some(2),
        enrollment_date: None,
    }
}

fn enrollment(id: i64, student: &Student, course: &Course, status: EnrollmentStatus) -> Enrollment {
    Enrollment {
        id,
        student: student.clone(),
        course: course.clone(),
        enrollment_date: Some("2025-09-01".into()),
        status: Some(status),
        semester: Some("Fall".into()),
        academic_year: Some("2025".into()),
        final_grade: None,
        credits_earned: None,
    }
}

fn grade(id: i64, enrollment: &Enrollment, name: &str, points: f64) -> Grade {
    Grade {
        id,
        enrollment: enrollment.clone(),
        assessment_type: "EXAM".into(),
        assessment_name: name.into(),
        points_earned: points,
        total_points: 100.0,
        percentage: Some(points),
        letter_grade: None,
        weight: Some(1.0),
        assessment_date: None,
        feedback: None,
        graded_by: Some("admin".into()),
    }
}

pub fn admin_user() -> User {
    User {
        id: 1,
        username: "admin".into(),
        email: "admin@university.edu".into(),
        role: Role::Admin,
        first_name: Some("Ada".into()),
        last_name: Some("Admin".into()),
        student_id: None,
    }
}

pub fn student_user() -> User {
    User {
        id: 2,
        username: "jdoe".into(),
        email: "john.doe@university.edu".into(),
        role: Role::Student,
        first_name: Some("John".into()),
        last_name: Some("Doe".into()),
        student_id: Some("STU2025001".into()),
    }
}

fn seed() -> Data {
    let courses = vec![
        course(1, "CS101", "Introduction to Programming", 3),
        course(2, "MATH201", "Linear Algebra", 4),
        course(3, "PHYS110", "Mechanics", 3),
    ];
    let students = vec![
        student(1, "STU2025001", "John", "Doe", "Computer Science"),
        student(2, "STU2025002", "Jane", "Smith", "Mathematics"),
    ];
    let enrollments = vec![
        enrollment(1, &students[0], &courses[0], EnrollmentStatus::Active),
        enrollment(2, &students[1], &courses[1], EnrollmentStatus::Enrolled),
    ];
    let grades = vec![grade(1, &enrollments[0], "Midterm", 85.0), grade(2, &enrollments[1], "Final", 92.0)];

    let mut sessions = HashMap::new();
    sessions.insert(ADMIN_TOKEN.to_string(), admin_user());
    sessions.insert(STUDENT_TOKEN.to_string(), student_user());

    Data {
        courses,
        students,
        enrollments,
        grades,
        sessions,
        requests: Vec::new(),
        delay: Duration::ZERO,
        fail_counts: false,
        next_id: 100,
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn error(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "status": status.as_u16(),
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message,
    });
    (status, Json(body)).into_response()
}

fn not_found(kind: &str, id: impl std::fmt::Display) -> Response {
    error(StatusCode::NOT_FOUND, &format!("{} not found with id: {}", kind, id))
}

// Logs every request and rejects unknown bearer tokens, like the real security filter.
async fn gatekeeper(State(shared): State<Shared>, req: Request, next: Next) -> Response {
    let path = req.uri().path().trim_start_matches("/api").to_string();
    let public = path == "/auth/login" || path == "/auth/register";
    let (delay, authorised) = {
        let mut data = lock(&shared);
        data.requests.push(format!("{} {}", req.method(), path));
        let known = bearer(req.headers()).map_or(false, |t| data.sessions.contains_key(&t));
        (data.delay, public || known)
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if !authorised {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required to access this resource");
    }
    next.run(req).await
}

fn auth_response(token: &str, user: &User) -> Response {
    Json(AuthResponse {
        token: token.to_string(),
        token_type: "Bearer".into(),
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        role: user.role,
        student_id: user.student_id.clone(),
    })
    .into_response()
}

async fn login(State(shared): State<Shared>, Json(body): Json<LoginRequest>) -> Response {
    let (token, user) = match (body.username.as_str(), body.password.as_str()) {
        ("admin", "admin123") => (ADMIN_TOKEN, admin_user()),
        ("jdoe", "student123") => (STUDENT_TOKEN, student_user()),
        _ => return error(StatusCode::UNAUTHORIZED, "Invalid username or password"),
    };
    lock(&shared).sessions.insert(token.to_string(), user.clone());
    auth_response(token, &user)
}

async fn register(State(shared): State<Shared>, Json(body): Json<RegisterRequest>) -> Response {
    let mut data = lock(&shared);
    if data.sessions.values().any(|u| u.username == body.username) {
        return error(StatusCode::BAD_REQUEST, "Username is already taken");
    }
    let user = User {
        id: data.next_id(),
        username: body.username.clone(),
        email: body.email,
        role: body.role,
        first_name: Some(body.first_name),
        last_name: Some(body.last_name),
        student_id: None,
    };
    let token = format!("token-{}", body.username);
    data.sessions.insert(token.clone(), user.clone());
    auth_response(&token, &user)
}

async fn me(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    match lock(&shared).caller(&headers) {
        Some(mut user) => {
            user.student_id = None;
            Json(user).into_response()
        }
        None => error(StatusCode::UNAUTHORIZED, "Not logged in"),
    }
}

async fn list_courses(State(shared): State<Shared>) -> Response {
    Json(lock(&shared).courses.clone()).into_response()
}

async fn get_course(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    match lock(&shared).courses.iter().find(|c| c.id == id) {
        Some(c) => Json(c.clone()).into_response(),
        None => not_found("Course", id),
    }
}

async fn course_by_code(State(shared): State<Shared>, Path(code): Path<String>) -> Response {
    match lock(&shared).courses.iter().find(|c| c.code == code) {
        Some(c) => Json(c.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Course not found with code: {}", code)),
    }
}

async fn available_courses(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let data = lock(&shared);
    let me = data.caller_student(&headers);
    let taken: Vec<i64> = data
        .enrollments
        .iter()
        .filter(|e| me.as_ref().map_or(false, |s| s.id == e.student.id))
        .filter(|e| e.status != Some(EnrollmentStatus::Dropped))
        .map(|e| e.course.id)
        .collect();
    let open: Vec<Course> = data.courses.iter().filter(|c| !taken.contains(&c.id)).cloned().collect();
    Json(open).into_response()
}

async fn create_course(State(shared): State<Shared>, Json(body): Json<CourseRequest>) -> Response {
    let mut data = lock(&shared);
    if data.courses.iter().any(|c| c.code == body.code) {
        return error(StatusCode::BAD_REQUEST, &format!("Course code already exists: {}", body.code));
    }
    let id = data.next_id();
    let created = Course {
        id,
        code: body.code,
        title: body.title,
        description: body.description,
        credits: body.credits,
        instructor: None,
        max_students: None,
        enrolled_students: None,
        semester: None,
    };
    data.courses.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_course(State(shared): State<Shared>, Path(id): Path<i64>, Json(body): Json<CourseRequest>) -> Response {
    let mut data = lock(&shared);
    match data.courses.iter_mut().find(|c| c.id == id) {
        Some(c) => {
            c.code = body.code;
            c.title = body.title;
            c.description = body.description;
            c.credits = body.credits;
            Json(c.clone()).into_response()
        }
        None => not_found("Course", id),
    }
}

async fn delete_course(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = lock(&shared);
    let before = data.courses.len();
    data.courses.retain(|c| c.id != id);
    if data.courses.len() == before {
        return not_found("Course", id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_students(State(shared): State<Shared>) -> Response {
    Json(lock(&shared).students.clone()).into_response()
}

async fn get_student(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    match lock(&shared).students.iter().find(|s| s.id == id) {
        Some(s) => Json(s.clone()).into_response(),
        None => not_found("Student", id),
    }
}

async fn student_by_number(State(shared): State<Shared>, Path(number): Path<String>) -> Response {
    match lock(&shared).students.iter().find(|s| s.student_id == number) {
        Some(s) => Json(s.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, &format!("Student not found with student ID: {}", number)),
    }
}

#[derive(Deserialize)]
struct Keyword {
    keyword: String,
}

async fn search_students(State(shared): State<Shared>, Query(q): Query<Keyword>) -> Response {
    let needle = q.keyword.to_lowercase();
    let found: Vec<Student> = lock(&shared)
        .students
        .iter()
        .filter(|s| s.full_name().to_lowercase().contains(&needle) || s.email.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    Json(found).into_response()
}

async fn students_in_department(State(shared): State<Shared>, Path(department): Path<String>) -> Response {
    let found: Vec<Student> = lock(&shared)
        .students
        .iter()
        .filter(|s| s.department.as_deref() == Some(department.as_str()))
        .cloned()
        .collect();
    Json(found).into_response()
}

fn student_from(id: i64, body: StudentRequest) -> Student {
    Student {
        id,
        student_id: body.student_id,
        first_name: body.first_name,
        last_name: body.last_name,
        email: body.email,
        date_of_birth: body.date_of_birth,
        phone_number: body.phone_number,
        address: body.address,
        department: Some(body.department),
        year_of_study: Some(body.year_of_study),
        enrollment_date: None,
    }
}

async fn create_student(State(shared): State<Shared>, Json(body): Json<StudentRequest>) -> Response {
    let mut data = lock(&shared);
    if data.students.iter().any(|s| s.email == body.email) {
        return error(StatusCode::BAD_REQUEST, &format!("Email already exists: {}", body.email));
    }
    let id = data.next_id();
    let created = student_from(id, body);
    data.students.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_student(State(shared): State<Shared>, Path(id): Path<i64>, Json(body): Json<StudentRequest>) -> Response {
    let mut data = lock(&shared);
    match data.students.iter_mut().find(|s| s.id == id) {
        Some(s) => {
            *s = student_from(id, body);
            Json(s.clone()).into_response()
        }
        None => not_found("Student", id),
    }
}

async fn delete_student(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = lock(&shared);
    let before = data.students.len();
    data.students.retain(|s| s.id != id);
    if data.students.len() == before {
        return not_found("Student", id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_enrollments(State(shared): State<Shared>) -> Response {
    Json(lock(&shared).enrollments.clone()).into_response()
}

async fn get_enrollment(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    match lock(&shared).enrollments.iter().find(|e| e.id == id) {
        Some(e) => Json(e.clone()).into_response(),
        None => not_found("Enrollment", id),
    }
}

async fn my_enrollments(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let data = lock(&shared);
    let Some(me) = data.caller_student(&headers) else {
        return error(StatusCode::BAD_REQUEST, "Current user is not a student");
    };
    let mine: Vec<Enrollment> = data.enrollments.iter().filter(|e| e.student.id == me.id).cloned().collect();
    Json(mine).into_response()
}

async fn create_enrollment(State(shared): State<Shared>, Json(body): Json<EnrollmentRequest>) -> Response {
    let mut data = lock(&shared);
    let Some(student) = data.students.iter().find(|s| s.id == body.student_id).cloned() else {
        return not_found("Student", body.student_id);
    };
    let Some(course) = data.courses.iter().find(|c| c.id == body.course_id).cloned() else {
        return not_found("Course", body.course_id);
    };
    let id = data.next_id();
    let mut created = enrollment(id, &student, &course, EnrollmentStatus::Enrolled);
    created.semester = body.semester;
    created.academic_year = body.academic_year;
    data.enrollments.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn self_enroll(State(shared): State<Shared>, headers: HeaderMap, Path(course_id): Path<i64>) -> Response {
    let mut data = lock(&shared);
    let Some(me) = data.caller_student(&headers) else {
        return error(StatusCode::BAD_REQUEST, "Current user is not a student");
    };
    let Some(course) = data.courses.iter().find(|c| c.id == course_id).cloned() else {
        return not_found("Course", course_id);
    };
    let already = data
        .enrollments
        .iter()
        .any(|e| e.student.id == me.id && e.course.id == course_id && e.status != Some(EnrollmentStatus::Dropped));
    if already {
        return error(StatusCode::BAD_REQUEST, "Already enrolled in this course");
    }
    let id = data.next_id();
    let created = enrollment(id, &me, &course, EnrollmentStatus::Enrolled);
    data.enrollments.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

#[derive(Deserialize)]
struct StatusParam {
    status: String,
}

async fn update_enrollment_status(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    Query(q): Query<StatusParam>,
) -> Response {
    let Some(status) = EnrollmentStatus::parse(&q.status) else {
        return error(StatusCode::BAD_REQUEST, &format!("Invalid status: {}", q.status));
    };
    let mut data = lock(&shared);
    match data.enrollments.iter_mut().find(|e| e.id == id) {
        Some(e) => {
            e.status = Some(status);
            Json(e.clone()).into_response()
        }
        None => not_found("Enrollment", id),
    }
}

async fn drop_enrollment(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = lock(&shared);
    match data.enrollments.iter_mut().find(|e| e.id == id) {
        Some(e) => {
            e.status = Some(EnrollmentStatus::Dropped);
            Json(json!({ "message": "Course dropped successfully" })).into_response()
        }
        None => not_found("Enrollment", id),
    }
}

async fn delete_enrollment(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = lock(&shared);
    let before = data.enrollments.len();
    data.enrollments.retain(|e| e.id != id);
    if data.enrollments.len() == before {
        return not_found("Enrollment", id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn count_for_course(State(shared): State<Shared>, Path(course_id): Path<i64>) -> Response {
    let data = lock(&shared);
    if data.fail_counts {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred");
    }
    let count = data.enrollments.iter().filter(|e| e.course.id == course_id).count() as i64;
    Json(count).into_response()
}

async fn count_for_student(State(shared): State<Shared>, Path(student_id): Path<i64>) -> Response {
    let count = lock(&shared).enrollments.iter().filter(|e| e.student.id == student_id).count() as i64;
    Json(count).into_response()
}

async fn enrollment_status(State(shared): State<Shared>, headers: HeaderMap, Path(course_id): Path<i64>) -> Response {
    let data = lock(&shared);
    let me = data.caller_student(&headers);
    let found = data
        .enrollments
        .iter()
        .find(|e| me.as_ref().map_or(false, |s| s.id == e.student.id) && e.course.id == course_id);
    Json(EnrollmentCheck { enrolled: found.is_some(), enrollment_id: found.map(|e| e.id) }).into_response()
}

async fn list_grades(State(shared): State<Shared>) -> Response {
    Json(lock(&shared).grades.clone()).into_response()
}

async fn get_grade(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    match lock(&shared).grades.iter().find(|g| g.id == id) {
        Some(g) => Json(g.clone()).into_response(),
        None => not_found("Grade", id),
    }
}

fn grades_where(shared: &Shared, keep: impl Fn(&Grade) -> bool) -> Vec<Grade> {
    lock(shared).grades.iter().filter(|g| keep(g)).cloned().collect()
}

async fn grades_for_enrollment(State(shared): State<Shared>, Path(enrollment_id): Path<i64>) -> Response {
    Json(grades_where(&shared, |g| g.enrollment.id == enrollment_id)).into_response()
}

async fn grades_for_student(State(shared): State<Shared>, Path(student_id): Path<i64>) -> Response {
    Json(grades_where(&shared, |g| g.enrollment.student.id == student_id)).into_response()
}

async fn grades_for_course(State(shared): State<Shared>, Path(course_id): Path<i64>) -> Response {
    Json(grades_where(&shared, |g| g.enrollment.course.id == course_id)).into_response()
}

async fn student_average(State(shared): State<Shared>, Path(student_id): Path<i64>) -> Response {
    let points: Vec<f64> = grades_where(&shared, |g| g.enrollment.student.id == student_id)
        .iter()
        .map(|g| g.points_earned)
        .collect();
    Json(average(&points)).into_response()
}

async fn my_grades_for_course(State(shared): State<Shared>, headers: HeaderMap, Path(course_id): Path<i64>) -> Response {
    let data = lock(&shared);
    let Some(me) = data.caller_student(&headers) else {
        return error(StatusCode::BAD_REQUEST, "Current user is not a student");
    };
    let mine: Vec<Grade> = data
        .grades
        .iter()
        .filter(|g| g.enrollment.student.id == me.id && g.enrollment.course.id == course_id)
        .cloned()
        .collect();
    Json(mine).into_response()
}

async fn my_grades(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let data = lock(&shared);
    let Some(me) = data.caller_student(&headers) else {
        return error(StatusCode::BAD_REQUEST, "Current user is not a student");
    };
    let mine: Vec<Grade> = data.grades.iter().filter(|g| g.enrollment.student.id == me.id).cloned().collect();
    Json(mine).into_response()
}

async fn my_average(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    let data = lock(&shared);
    let Some(me) = data.caller_student(&headers) else {
        return error(StatusCode::BAD_REQUEST, "Current user is not a student");
    };
    let points: Vec<f64> = data
        .grades
        .iter()
        .filter(|g| g.enrollment.student.id == me.id)
        .map(|g| g.points_earned)
        .collect();
    Json(average(&points)).into_response()
}

async fn course_average(State(shared): State<Shared>, Path(course_id): Path<i64>) -> Response {
    let points: Vec<f64> = lock(&shared)
        .grades
        .iter()
        .filter(|g| g.enrollment.course.id == course_id)
        .map(|g| g.points_earned)
        .collect();
    Json(average(&points)).into_response()
}

fn average(points: &[f64]) -> Option<f64> {
    if points.is_empty() {
        None
    } else {
        Some(points.iter().sum::<f64>() / points.len() as f64)
    }
}

fn grade_from(id: i64, enrollment: &Enrollment, body: GradeRequest) -> Grade {
    Grade {
        id,
        enrollment: enrollment.clone(),
        assessment_type: body.assessment_type,
        assessment_name: body.assessment_name,
        points_earned: body.points_earned,
        total_points: body.total_points,
        percentage: Some(body.points_earned / body.total_points * 100.0),
        letter_grade: body.letter_grade,
        weight: Some(body.weight),
        assessment_date: body.assessment_date,
        feedback: body.feedback,
        graded_by: body.graded_by,
    }
}

async fn create_grade(State(shared): State<Shared>, Json(body): Json<GradeRequest>) -> Response {
    let mut data = lock(&shared);
    let Some(enrollment) = data.enrollments.iter().find(|e| e.id == body.enrollment_id).cloned() else {
        return not_found("Enrollment", body.enrollment_id);
    };
    let id = data.next_id();
    let created = grade_from(id, &enrollment, body);
    data.grades.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_grade(State(shared): State<Shared>, Path(id): Path<i64>, Json(body): Json<GradeRequest>) -> Response {
    let mut data = lock(&shared);
    let Some(enrollment) = data.enrollments.iter().find(|e| e.id == body.enrollment_id).cloned() else {
        return not_found("Enrollment", body.enrollment_id);
    };
    match data.grades.iter_mut().find(|g| g.id == id) {
        Some(g) => {
            *g = grade_from(id, &enrollment, body);
            Json(g.clone()).into_response()
        }
        None => not_found("Grade", id),
    }
}

async fn delete_grade(State(shared): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut data = lock(&shared);
    let before = data.grades.len();
    data.grades.retain(|g| g.id != id);
    if data.grades.len() == before {
        return not_found("Grade", id);
    }
    StatusCode::NO_CONTENT.into_response()
}

fn routes() -> Router<Shared> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/available", get(available_courses))
        .route("/courses/code/{code}", get(course_by_code))
        .route("/courses/{id}", get(get_course).put(update_course).delete(delete_course))
        .route("/students", get(list_students).post(create_student))
        .route("/students/search", get(search_students))
        .route("/students/student-id/{number}", get(student_by_number))
        .route("/students/department/{department}", get(students_in_department))
        .route("/students/{id}", get(get_student).put(update_student).delete(delete_student))
        .route("/enrollments", get(list_enrollments).post(create_enrollment))
        .route("/enrollments/my-enrollments", get(my_enrollments))
        .route("/enrollments/self-enroll/{course_id}", post(self_enroll))
        .route("/enrollments/count/course/{course_id}", get(count_for_course))
        .route("/enrollments/count/student/{student_id}", get(count_for_student))
        .route("/enrollments/status/course/{course_id}", get(enrollment_status))
        .route("/enrollments/{id}", get(get_enrollment).delete(delete_enrollment))
        .route("/enrollments/{id}/status", put(update_enrollment_status))
        .route("/enrollments/{id}/drop", delete(drop_enrollment))
        .route("/grades", get(list_grades).post(create_grade))
        .route("/grades/my-grades", get(my_grades))
        .route("/grades/my-grades/course/{course_id}", get(my_grades_for_course))
        .route("/grades/my-average", get(my_average))
        .route("/grades/enrollment/{enrollment_id}", get(grades_for_enrollment))
        .route("/grades/student/{student_id}", get(grades_for_student))
        .route("/grades/course/{course_id}", get(grades_for_course))
        .route("/grades/average/student/{student_id}", get(student_average))
        .route("/grades/average/course/{course_id}", get(course_average))
        .route("/grades/{id}", get(get_grade).put(update_grade).delete(delete_grade))
}

#[derive(Clone)]
pub struct FakeBackend {
    shared: Shared,
    pub url: String,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(seed()));
        let router = Router::new()
            .nest("/api", routes())
            .layer(middleware::from_fn_with_state(shared.clone(), gatekeeper))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake backend");
        });

        FakeBackend { shared, url: format!("http://{}/api", addr) }
    }

    pub fn data(&self) -> MutexGuard<'_, Data> {
        lock(&self.shared)
    }

    pub fn requests(&self) -> Vec<String> {
        self.data().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.data().requests.clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.data().delay = delay;
    }

    // Every issued token stops being accepted.
    pub fn revoke_tokens(&self) {
        self.data().sessions.clear();
    }

    pub fn config(&self, state_file: &FsPath) -> Config {
        Config {
            api_url: Url::parse(&self.url).expect("backend url"),
            state_file: state_file.to_path_buf(),
            log_level: LevelFilter::Off,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn app(&self) -> App {
        self.app_with(Arc::new(MemoryStorage::new()))
    }

    pub fn app_with(&self, storage: Arc<dyn Storage>) -> App {
        App::with_storage(&self.config(FsPath::new("unused.json")), storage).expect("app")
    }

    pub fn app_on_disk(&self, state_file: &FsPath) -> App {
        let storage = FileStorage::open(state_file).expect("state file");
        self.app_with(Arc::new(storage))
    }

    pub async fn login(&self, app: &App, username: &str, password: &str) -> User {
        let credentials = LoginRequest { username: username.into(), password: password.into() };
        app.session.login(&app.api.auth, &credentials).await.expect("login")
    }

    pub async fn admin(&self) -> App {
        let app = self.app();
        self.login(&app, "admin", "admin123").await;
        self.clear_requests();
        app
    }

    pub async fn student(&self) -> App {
        let app = self.app();
        self.login(&app, "jdoe", "student123").await;
        self.clear_requests();
        app
    }
}
