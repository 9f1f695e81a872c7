//! Per-screen data controllers.
//!
//! A controller fetches what its screen needs on mount, keeps list/loading/error
//! state, and splices that list after each successful mutation instead of
//! fetching it again. State lives behind a shared lock so a screen can be
//! unmounted while one of its requests is still in flight; the late response
//! is then dropped instead of being written into a view that no longer exists.

pub mod course;
pub mod dashboard;
pub mod enrollment;
pub mod grade;
pub mod student;

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use log::debug;
use thiserror::Error;
use crate::error::ApiError;
use crate::models::Identified;
use crate::session::SessionStore;
use crate::validation::FieldErrors;

pub use self::course::CoursesController;
pub use self::dashboard::DashboardController;
pub use self::enrollment::EnrollmentsController;
pub use self::grade::GradesController;
pub use self::student::StudentsController;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Please fix the highlighted fields: {0}")]
    Invalid(FieldErrors),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ControllerError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ControllerError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ControllerError::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    pub field_errors: FieldErrors,
}

impl<T> Default for ScreenState<T> {
    fn default() -> Self {
        ScreenState {
            items: Vec::new(),
            loading: false,
            error: None,
            notice: None,
            field_errors: FieldErrors::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action<T> {
    SetLoading(bool),
    SetItems(Vec<T>),
    SetError(String),
    ClearError,
    SetFieldErrors(FieldErrors),
    Notice(String),
    Add(T),
    Update(T),
    Delete(i64),
}

pub fn reduce<T: Identified>(state: &mut ScreenState<T>, action: Action<T>) {
    match action {
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetItems(items) => {
            state.items = items;
            state.loading = false;
            state.error = None;
        }
        Action::SetError(message) => {
            state.error = Some(message);
            state.notice = None;
            state.loading = false;
        }
        Action::ClearError => state.error = None,
        Action::SetFieldErrors(errors) => state.field_errors = errors,
        Action::Notice(message) => {
            state.notice = Some(message);
            state.error = None;
        }
        Action::Add(item) => {
            state.items.push(item);
            state.field_errors = FieldErrors::new();
        }
        Action::Update(item) => {
            let id = item.id();
            if let Some(slot) = state.items.iter_mut().find(|existing| existing.id() == id) {
                *slot = item;
            }
            state.field_errors = FieldErrors::new();
        }
        Action::Delete(id) => state.items.retain(|existing| existing.id() != id),
    }
}

/// Generation of a screen's lifetime that a pending request was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
struct GuardInner {
    mounted: AtomicBool,
    generation: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct MountGuard {
    inner: Arc<GuardInner>,
}

impl MountGuard {
    pub fn new() -> Self {
        MountGuard {
            inner: Arc::new(GuardInner { mounted: AtomicBool::new(true), generation: AtomicU64::new(0) }),
        }
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.inner.generation.load(Ordering::SeqCst))
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub fn is_live(&self, ticket: Ticket) -> bool {
        self.is_mounted() && self.inner.generation.load(Ordering::SeqCst) == ticket.0
    }

    pub fn unmount(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    // Responses issued before a remount are stale too.
    pub fn remount(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.mounted.store(true, Ordering::SeqCst);
    }

    /// Called by every mount entry so a screen that was left can be opened again.
    pub fn ensure_mounted(&self) {
        if !self.is_mounted() {
            debug!("Remounting screen");
            self.remount();
        }
    }
}

impl Default for MountGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// A screen's shared state plus the guard deciding whether updates still apply.
#[derive(Clone)]
pub struct Screen<T> {
    state: Arc<Mutex<ScreenState<T>>>,
    guard: MountGuard,
}

impl<T: Identified + Clone> Screen<T> {
    pub fn new() -> Self {
        Screen { state: Arc::new(Mutex::new(ScreenState::default())), guard: MountGuard::new() }
    }

    fn lock(&self) -> MutexGuard<'_, ScreenState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn guard(&self) -> &MountGuard {
        &self.guard
    }

    pub fn snapshot(&self) -> ScreenState<T> {
        self.lock().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn dispatch(&self, ticket: Ticket, action: Action<T>) -> bool {
        if !self.guard.is_live(ticket) {
            debug!("Screen no longer mounted, dropping {}", action_name(&action));
            return false;
        }
        reduce(&mut self.lock(), action);
        true
    }

    /// Starts a request: loading on, previous error cleared.
    pub fn begin(&self) -> Ticket {
        let ticket = self.guard.ticket();
        self.dispatch(ticket, Action::ClearError);
        self.dispatch(ticket, Action::SetLoading(true));
        ticket
    }

    pub fn finish(&self, ticket: Ticket) {
        self.dispatch(ticket, Action::SetLoading(false));
    }

    /// Records field errors for a blocked submission and hands back the error to return.
    pub fn reject(&self, errors: FieldErrors) -> ControllerError {
        let ticket = self.guard.ticket();
        self.dispatch(ticket, Action::SetFieldErrors(errors.clone()));
        ControllerError::Invalid(errors)
    }

    pub fn forbid(&self, message: &str) -> ControllerError {
        let err = ControllerError::Forbidden(message.to_string());
        self.dispatch(self.guard.ticket(), Action::SetError(err.to_string()));
        err
    }

    /// Runs one backend call and, on success, applies the action derived from its result.
    pub async fn apply<R, F, A>(&self, call: F, on_ok: A, notice: &str) -> Result<R, ControllerError>
    where
        F: Future<Output = Result<R, ApiError>>,
        A: FnOnce(&R) -> Option<Action<T>>,
    {
        let ticket = self.begin();
        match call.await {
            Ok(value) => {
                if let Some(action) = on_ok(&value) {
                    self.dispatch(ticket, action);
                }
                self.finish(ticket);
                self.dispatch(ticket, Action::Notice(notice.to_string()));
                Ok(value)
            }
            Err(err) => {
                self.dispatch(ticket, Action::SetError(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Replaces the list with the result of a query.
    pub async fn load<F>(&self, call: F) -> Result<(), ControllerError>
    where
        F: Future<Output = Result<Vec<T>, ApiError>>,
    {
        let ticket = self.begin();
        match call.await {
            Ok(items) => {
                self.dispatch(ticket, Action::SetItems(items));
                Ok(())
            }
            Err(err) => {
                self.dispatch(ticket, Action::SetError(err.to_string()));
                Err(err.into())
            }
        }
    }
}

impl<T: Identified + Clone> Default for Screen<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn action_name<T>(action: &Action<T>) -> &'static str {
    match action {
        Action::SetLoading(_) => "loading flag",
        Action::SetItems(_) => "list refresh",
        Action::SetError(_) => "error",
        Action::ClearError => "error reset",
        Action::SetFieldErrors(_) => "field errors",
        Action::Notice(_) => "notice",
        Action::Add(_) => "append",
        Action::Update(_) => "replace",
        Action::Delete(_) => "remove",
    }
}

pub(crate) fn require_admin<T: Identified + Clone>(
    session: &SessionStore,
    screen: &Screen<T>,
) -> Result<(), ControllerError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(screen.forbid("This action requires an administrator account"))
    }
}

pub(crate) fn require_student<T: Identified + Clone>(
    session: &SessionStore,
    screen: &Screen<T>,
) -> Result<(), ControllerError> {
    if session.is_student() {
        Ok(())
    } else {
        Err(screen.forbid("Only students can do this from their own account"))
    }
}
