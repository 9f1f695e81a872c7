//! Admin dashboard: headline counts and the data behind its three charts.
//!
//! The aggregates are derived from the four full lists, so unlike the list
//! screens the dashboard reloads everything after a change elsewhere.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use log::{info, warn};
use rand::Rng;
use tokio::task::JoinSet;
use crate::api::course::CourseApi;
use crate::api::enrollment::EnrollmentApi;
use crate::api::grade::GradeApi;
use crate::api::student::StudentApi;
use crate::api::Api;
use crate::controllers::{ControllerError, MountGuard};
use crate::models::{Course, Enrollment, Grade, Student};
use crate::session::SessionStore;

pub const CHART_COURSE_LIMIT: usize = 10;
pub const DEFAULT_CAPACITY: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub total_courses: usize,
    pub total_students: usize,
    pub total_enrollments: usize,
    pub average_grade: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseBar {
    pub code: String,
    pub title: String,
    pub enrollments: i64,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeBucket {
    pub label: &'static str,
    pub count: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentSlice {
    pub name: String,
    pub students: usize,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub loading: bool,
    pub error: Option<String>,
    pub stats: DashboardStats,
    pub courses: Vec<Course>,
    pub students: Vec<Student>,
    pub enrollments: Vec<Enrollment>,
    pub course_enrollments: Vec<CourseBar>,
    pub grade_distribution: Vec<GradeBucket>,
    pub departments: Vec<DepartmentSlice>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn compute_stats(courses: &[Course], students: &[Student], enrollments: &[Enrollment], grades: &[Grade]) -> DashboardStats {
    let average_grade = if grades.is_empty() {
        0.0
    } else {
        let total: f64 = grades.iter().map(|g| g.points_earned).sum();
        round2(total / grades.len() as f64)
    };

    DashboardStats {
        total_courses: courses.len(),
        total_students: students.len(),
        total_enrollments: enrollments.len(),
        average_grade,
    }
}

/// Buckets grades by points earned, dropping empty buckets.
pub fn grade_distribution(grades: &[Grade]) -> Vec<GradeBucket> {
    let mut buckets = [
        GradeBucket { label: "A (90-100)", count: 0, color: "#4caf50" },
        GradeBucket { label: "B (80-89)", count: 0, color: "#2196f3" },
        GradeBucket { label: "C (70-79)", count: 0, color: "#ff9800" },
        GradeBucket { label: "D (60-69)", count: 0, color: "#ff5722" },
        GradeBucket { label: "F (0-59)", count: 0, color: "#f44336" },
    ];

    for grade in grades {
        let score = grade.points_earned;
        let slot = if score >= 90.0 {
            0
        } else if score >= 80.0 {
            1
        } else if score >= 70.0 {
            2
        } else if score >= 60.0 {
            3
        } else {
            4
        };
        buckets[slot].count += 1;
    }

    buckets.into_iter().filter(|b| b.count > 0).collect()
}

/// Students per department, alphabetical. A missing department counts as `Unknown`.
pub fn department_breakdown<R: Rng>(students: &[Student], rng: &mut R) -> Vec<DepartmentSlice> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for student in students {
        let dept = student
            .department
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or("Unknown");
        *counts.entry(dept.to_string()).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|(name, students)| DepartmentSlice {
            name,
            students,
            color: format!("#{:06x}", rng.gen_range(0..=0xFF_FFFFu32)),
        })
        .collect()
}

pub fn local_enrollment_count(course_id: i64, enrollments: &[Enrollment]) -> i64 {
    enrollments.iter().filter(|e| e.course.id == course_id).count() as i64
}

/// Enrollment bars for the first ten courses. Each count comes from the backend;
/// a course whose count call fails is counted from the local enrollment list.
async fn course_enrollment_bars(api: &EnrollmentApi, courses: &[Course], enrollments: &[Enrollment]) -> Vec<CourseBar> {
    let shown: Vec<&Course> = courses.iter().take(CHART_COURSE_LIMIT).collect();

    let mut tasks = JoinSet::new();
    for (index, course) in shown.iter().enumerate() {
        let api = api.clone();
        let course_id = course.id;
        tasks.spawn(async move { (index, api.count_by_course(course_id).await) });
    }

    let mut counts: Vec<Option<i64>> = vec![None; shown.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(count))) => counts[index] = Some(count),
            Ok((index, Err(e))) => warn!("Falling back to local count for {}: {}", shown[index].code, e),
            Err(e) => warn!("Enrollment count task failed: {}", e),
        }
    }

    shown
        .iter()
        .zip(counts)
        .map(|(course, count)| CourseBar {
            code: course.code.clone(),
            title: course.title.clone(),
            enrollments: count.unwrap_or_else(|| local_enrollment_count(course.id, enrollments)),
            capacity: DEFAULT_CAPACITY,
        })
        .collect()
}

pub struct DashboardController {
    courses: CourseApi,
    students: StudentApi,
    enrollments: EnrollmentApi,
    grades: GradeApi,
    session: SessionStore,
    state: Arc<Mutex<DashboardState>>,
    guard: MountGuard,
}

impl DashboardController {
    pub fn new(api: &Api, session: SessionStore) -> Self {
        DashboardController {
            courses: api.courses.clone(),
            students: api.students.clone(),
            enrollments: api.enrollments.clone(),
            grades: api.grades.clone(),
            session,
            state: Arc::new(Mutex::new(DashboardState::default())),
            guard: MountGuard::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> DashboardState {
        self.lock().clone()
    }

    pub fn guard(&self) -> &MountGuard {
        &self.guard
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }

    pub async fn mount(&self) -> Result<(), ControllerError> {
        self.refresh().await
    }

    /// Full reload of every list and every derived aggregate.
    pub async fn refresh(&self) -> Result<(), ControllerError> {
        self.guard.ensure_mounted();
        let ticket = self.guard.ticket();
        if !self.session.is_admin() {
            let err = ControllerError::Forbidden("The dashboard requires an administrator account".to_string());
            if self.guard.is_live(ticket) {
                self.lock().error = Some(err.to_string());
            }
            return Err(err);
        }

        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
        }

        let fetched = tokio::try_join!(
            self.courses.list(),
            self.students.list(),
            self.enrollments.list(),
            self.grades.list(),
        );

        let (courses, students, enrollments, grades) = match fetched {
            Ok(lists) => lists,
            Err(err) => {
                if self.guard.is_live(ticket) {
                    let mut state = self.lock();
                    state.loading = false;
                    state.error = Some(format!("Failed to connect to API: {}", err));
                }
                return Err(err.into());
            }
        };

        let stats = compute_stats(&courses, &students, &enrollments, &grades);
        let distribution = grade_distribution(&grades);
        let departments = department_breakdown(&students, &mut rand::thread_rng());
        let bars = course_enrollment_bars(&self.enrollments, &courses, &enrollments).await;

        if !self.guard.is_live(ticket) {
            return Ok(());
        }

        info!(
            "Dashboard loaded: {} courses, {} students, {} enrollments, {} grades",
            courses.len(),
            students.len(),
            enrollments.len(),
            grades.len()
        );

        let mut state = self.lock();
        *state = DashboardState {
            loading: false,
            error: None,
            stats,
            courses,
            students,
            enrollments,
            course_enrollments: bars,
            grade_distribution: distribution,
            departments,
        };
        Ok(())
    }
}
