use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::debug;
use coursedesk::controllers::ControllerError;
use coursedesk::models::{EnrollmentStatus, Role};
use coursedesk::navigation::Route;
use coursedesk::utils::report;
use coursedesk::validation::{CourseForm, EnrollmentForm, GradeForm, LoginForm, RegisterForm, StudentForm};
use coursedesk::App;

#[derive(Debug, Parser)]
#[command(name = "coursedesk", version, about = "Terminal client for the university course-management system")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and remember the session
    Login {
        #[arg(short, long, default_value = "")]
        username: String,
        #[arg(short, long, env = "COURSEDESK_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
    /// Create an account and log into it
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami {
        /// Ask the backend instead of trusting the stored copy
        #[arg(long)]
        refresh: bool,
    },
    #[command(subcommand)]
    Courses(CourseCommand),
    #[command(subcommand)]
    Students(StudentCommand),
    #[command(subcommand)]
    Enrollments(EnrollmentCommand),
    #[command(subcommand)]
    Grades(GradeCommand),
    /// Admin overview with enrollment, grade and department charts
    Dashboard,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Admin,
    Student,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::Student => Role::Student,
        }
    }
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long, default_value = "")]
    username: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, env = "COURSEDESK_PASSWORD", hide_env_values = true, default_value = "")]
    password: String,
    #[arg(long, value_enum)]
    role: Option<RoleArg>,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
}

#[derive(Debug, Args)]
pub struct CourseArgs {
    #[arg(long, default_value = "")]
    code: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    credits: String,
}

impl From<CourseArgs> for CourseForm {
    fn from(args: CourseArgs) -> Self {
        CourseForm { code: args.code, title: args.title, description: args.description, credits: args.credits }
    }
}

#[derive(Debug, Subcommand)]
pub enum CourseCommand {
    List,
    /// Courses still open for self-enrollment
    Available,
    Show {
        id: i64,
    },
    /// Look a course up by its code
    Code {
        code: String,
    },
    Create(CourseArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: CourseArgs,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct StudentArgs {
    #[arg(long, default_value = "")]
    student_id: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    phone_number: String,
    #[arg(long, default_value = "")]
    date_of_birth: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    department: String,
    #[arg(long, default_value = "")]
    year_of_study: String,
}

impl From<StudentArgs> for StudentForm {
    fn from(args: StudentArgs) -> Self {
        StudentForm {
            student_id: args.student_id,
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone_number: args.phone_number,
            date_of_birth: args.date_of_birth,
            address: args.address,
            department: args.department,
            year_of_study: args.year_of_study,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    List,
    Show {
        id: i64,
    },
    /// Look a student up by their student number, e.g. STU2025001
    Number {
        student_id: String,
    },
    Search {
        keyword: String,
    },
    Department {
        name: String,
    },
    Create(StudentArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: StudentArgs,
    },
    Delete {
        id: i64,
    },
}

fn parse_status(raw: &str) -> std::result::Result<EnrollmentStatus, String> {
    EnrollmentStatus::parse(raw).ok_or_else(|| format!("unknown status {:?}, expected ENROLLED, ACTIVE, DROPPED or COMPLETED", raw))
}

#[derive(Debug, Subcommand)]
pub enum EnrollmentCommand {
    List,
    /// Your own enrollments (students)
    Mine,
    Create {
        #[arg(long)]
        student_id: Option<i64>,
        #[arg(long)]
        course_id: Option<i64>,
        #[arg(long, default_value = "")]
        semester: String,
        #[arg(long, default_value = "")]
        academic_year: String,
    },
    SelfEnroll {
        course_id: i64,
    },
    /// Whether you are already enrolled in a course
    Check {
        course_id: i64,
    },
    Status {
        id: i64,
        #[arg(value_parser = parse_status)]
        status: EnrollmentStatus,
    },
    Delete {
        id: i64,
    },
    Drop {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub struct GradeArgs {
    #[arg(long)]
    enrollment_id: Option<i64>,
    #[arg(long, default_value = "EXAM")]
    assessment_type: String,
    #[arg(long, default_value = "")]
    assessment_name: String,
    #[arg(long, default_value = "")]
    points_earned: String,
    #[arg(long, default_value = "100")]
    total_points: String,
    #[arg(long, default_value = "")]
    letter_grade: String,
    #[arg(long, default_value = "")]
    weight: String,
    #[arg(long, default_value = "")]
    assessment_date: String,
    #[arg(long, default_value = "")]
    feedback: String,
    #[arg(long, default_value = "")]
    graded_by: String,
}

impl From<GradeArgs> for GradeForm {
    fn from(args: GradeArgs) -> Self {
        GradeForm {
            enrollment_id: args.enrollment_id,
            assessment_type: args.assessment_type,
            assessment_name: args.assessment_name,
            points_earned: args.points_earned,
            total_points: args.total_points,
            letter_grade: args.letter_grade,
            weight: args.weight,
            assessment_date: args.assessment_date,
            feedback: args.feedback,
            graded_by: args.graded_by,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum GradeCommand {
    List,
    /// Your own results and overall average (students)
    Mine {
        #[arg(long)]
        course_id: Option<i64>,
    },
    Create(GradeArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: GradeArgs,
    },
    Delete {
        id: i64,
    },
    AverageStudent {
        student_id: i64,
    },
    AverageCourse {
        course_id: i64,
    },
}

// Prints what the user needs to fix and turns the failure into the command's error.
fn fail(err: ControllerError) -> anyhow::Error {
    if let ControllerError::Invalid(errors) = &err {
        print!("{}", report::field_errors(errors));
        return anyhow!("Submission blocked by invalid fields");
    }
    if err.api().map_or(false, |api| api.is_unauthorized()) {
        return anyhow!("{} (run `coursedesk login` to sign in again)", err);
    }
    anyhow!(err)
}

fn print_banner<T>(state: &coursedesk::controllers::ScreenState<T>) {
    if let Some(banner) = report::banner(state) {
        println!("{}", banner);
    }
}

fn ensure_route(app: &App, route: Route) -> Result<()> {
    if app.session.can_visit(route) {
        debug!("Opening {}", route);
        app.navigator().redirect(route);
        return Ok(());
    }
    if !app.session.is_authenticated() {
        app.navigator().redirect(Route::Login);
        Err(anyhow!("Not logged in, run `coursedesk login` first"))
    } else {
        Err(anyhow!("The {} screen requires an administrator account", route))
    }
}

pub async fn run(cli: Cli, app: &App) -> Result<()> {
    match cli.command {
        Command::Login { username, password } => {
            let credentials = LoginForm { username, password }.validate().map_err(|e| fail(ControllerError::Invalid(e)))?;
            let user = app.session.login(&app.api.auth, &credentials).await.map_err(|e| fail(e.into()))?;
            print!("{}", report::user(&user));
        }
        Command::Register(args) => {
            let form = RegisterForm {
                username: args.username,
                email: args.email,
                password: args.password,
                role: args.role.map(Role::from),
                first_name: args.first_name,
                last_name: args.last_name,
            };
            let request = form.validate().map_err(|e| fail(ControllerError::Invalid(e)))?;
            let user = app.session.register(&app.api.auth, &request).await.map_err(|e| fail(e.into()))?;
            print!("{}", report::user(&user));
        }
        Command::Logout => {
            app.session.logout();
            println!("Logged out.");
        }
        Command::Whoami { refresh } => {
            ensure_route(app, app.session.role().map_or(Route::Dashboard, Route::home))?;
            let user = if refresh {
                app.session.refresh_user(&app.api.auth).await.map_err(|e| fail(e.into()))?
            } else {
                app.session.user().ok_or_else(|| anyhow!("Not logged in"))?
            };
            print!("{}", report::user(&user));
        }
        Command::Courses(action) => run_courses(app, action).await?,
        Command::Students(action) => run_students(app, action).await?,
        Command::Enrollments(action) => run_enrollments(app, action).await?,
        Command::Grades(action) => run_grades(app, action).await?,
        Command::Dashboard => {
            ensure_route(app, Route::Dashboard)?;
            let dashboard = app.dashboard();
            let result = dashboard.mount().await;
            print!("{}", report::dashboard(&dashboard.state()));
            result.map_err(fail)?;
        }
    }
    Ok(())
}

async fn run_courses(app: &App, action: CourseCommand) -> Result<()> {
    ensure_route(app, Route::Courses)?;
    let screen = app.courses();
    match action {
        CourseCommand::List => {
            screen.mount().await.map_err(fail)?;
            print!("{}", report::courses(&screen.state().items));
        }
        CourseCommand::Available => {
            screen.mount_available().await.map_err(fail)?;
            print!("{}", report::courses(&screen.state().items));
        }
        CourseCommand::Show { id } => {
            let course = screen.select(id).await.map_err(fail)?;
            print!("{}", report::courses(&[course]));
        }
        CourseCommand::Code { code } => {
            let course = screen.find_by_code(&code).await.map_err(fail)?;
            print!("{}", report::courses(&[course]));
        }
        CourseCommand::Create(fields) => {
            screen.create(&fields.into()).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::courses(&screen.state().items));
        }
        CourseCommand::Update { id, fields } => {
            let course = screen.update(id, &fields.into()).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::courses(&[course]));
        }
        CourseCommand::Delete { id } => {
            screen.delete(id).await.map_err(fail)?;
            print_banner(&screen.state());
        }
    }
    Ok(())
}

async fn run_students(app: &App, action: StudentCommand) -> Result<()> {
    ensure_route(app, Route::Students)?;
    let screen = app.students();
    match action {
        StudentCommand::List => screen.mount().await.map_err(fail)?,
        StudentCommand::Show { id } => {
            let student = screen.show(id).await.map_err(fail)?;
            print!("{}", report::students(&[student]));
            return Ok(());
        }
        StudentCommand::Number { student_id } => {
            let student = screen.show_by_student_id(&student_id).await.map_err(fail)?;
            print!("{}", report::students(&[student]));
            return Ok(());
        }
        StudentCommand::Search { keyword } => screen.search(&keyword).await.map_err(fail)?,
        StudentCommand::Department { name } => screen.by_department(&name).await.map_err(fail)?,
        StudentCommand::Create(fields) => {
            screen.create(&fields.into()).await.map_err(fail)?;
            print_banner(&screen.state());
        }
        StudentCommand::Update { id, fields } => {
            screen.update(id, &fields.into()).await.map_err(fail)?;
            print_banner(&screen.state());
        }
        StudentCommand::Delete { id } => {
            screen.delete(id).await.map_err(fail)?;
            print_banner(&screen.state());
            return Ok(());
        }
    }
    print!("{}", report::students(&screen.state().items));
    Ok(())
}

async fn run_enrollments(app: &App, action: EnrollmentCommand) -> Result<()> {
    ensure_route(app, Route::Enrollments)?;
    let screen = app.enrollments();
    match action {
        EnrollmentCommand::List => {
            screen.mount().await.map_err(fail)?;
            print!("{}", report::enrollments(&screen.state().items));
        }
        EnrollmentCommand::Mine => {
            if !app.session.is_student() {
                return Err(anyhow!("`enrollments mine` is for student accounts, use `enrollments list`"));
            }
            screen.mount().await.map_err(fail)?;
            print!("{}", report::enrollments(&screen.state().items));
            println!("\nOpen for enrollment:");
            print!("{}", report::courses(&screen.lookups().courses));
        }
        EnrollmentCommand::Create { student_id, course_id, semester, academic_year } => {
            let form = EnrollmentForm { student_id, course_id, semester, academic_year };
            let enrollment = screen.create(&form).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::enrollments(&[enrollment]));
        }
        EnrollmentCommand::SelfEnroll { course_id } => {
            let enrollment = screen.self_enroll(course_id).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::enrollments(&[enrollment]));
        }
        EnrollmentCommand::Check { course_id } => {
            let check = screen.check(course_id).await.map_err(fail)?;
            match check.enrollment_id {
                Some(id) if check.enrolled => println!("Enrolled (enrollment {}).", id),
                _ if check.enrolled => println!("Enrolled."),
                _ => println!("Not enrolled."),
            }
        }
        EnrollmentCommand::Status { id, status } => {
            let enrollment = screen.update_status(id, status).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::enrollments(&[enrollment]));
        }
        EnrollmentCommand::Delete { id } => {
            screen.delete(id).await.map_err(fail)?;
            print_banner(&screen.state());
        }
        EnrollmentCommand::Drop { id } => {
            screen.drop_course(id).await.map_err(fail)?;
            print_banner(&screen.state());
        }
    }
    Ok(())
}

async fn run_grades(app: &App, action: GradeCommand) -> Result<()> {
    let screen = app.grades();
    match action {
        GradeCommand::List => {
            ensure_route(app, Route::Grades)?;
            screen.mount().await.map_err(fail)?;
            print!("{}", report::grades(&screen.state().items));
        }
        GradeCommand::Mine { course_id } => {
            ensure_route(app, Route::MyResults)?;
            match course_id {
                Some(course_id) => screen.mine_for_course(course_id).await.map_err(fail)?,
                None => screen.mount_mine().await.map_err(fail)?,
            }
            print!("{}", report::grades(&screen.state().items));
            if let Some(avg) = screen.my_average() {
                println!("\nOverall average: {:.2}", avg);
            }
        }
        GradeCommand::Create(fields) => {
            ensure_route(app, Route::Grades)?;
            let grade = screen.create(&fields.into()).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::grades(&[grade]));
        }
        GradeCommand::Update { id, fields } => {
            ensure_route(app, Route::Grades)?;
            let grade = screen.update(id, &fields.into()).await.map_err(fail)?;
            print_banner(&screen.state());
            print!("{}", report::grades(&[grade]));
        }
        GradeCommand::Delete { id } => {
            ensure_route(app, Route::Grades)?;
            screen.delete(id).await.map_err(fail)?;
            print_banner(&screen.state());
        }
        GradeCommand::AverageStudent { student_id } => {
            ensure_route(app, Route::Grades)?;
            let avg = screen.student_average(student_id).await.map_err(fail)?;
            println!("Average for student: {:.2}", avg);
        }
        GradeCommand::AverageCourse { course_id } => {
            ensure_route(app, Route::Grades)?;
            let avg = screen.course_average(course_id).await.map_err(fail)?;
            println!("Average for course: {:.2}", avg);
        }
    }
    Ok(())
}
