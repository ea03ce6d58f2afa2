//! Async driver over [`StudioSession`].
//!
//! The controller owns the session behind a `RefCell` and the backend. Each
//! operation runs `begin_*`, awaits the backend with no borrow held, then runs
//! `finish_*`. Any number of operations may overlap on one thread; stale
//! results are dropped by the session.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::backend::StudioBackend;
use crate::input::InputError;
use crate::session::{ChatTicket, FileOpenStart, StudioSession};
use crate::tabs::{EditorSurface, SaveOutcome};
use crate::view::StudioView;

type ChangeListener = Rc<dyn Fn()>;

pub struct StudioController<B, S> {
    backend: B,
    session: RefCell<StudioSession<S>>,
    on_change: RefCell<Option<ChangeListener>>,
}

impl<B: StudioBackend, S: EditorSurface> StudioController<B, S> {
    pub fn new(backend: B, surface: S) -> Self {
        Self {
            backend,
            session: RefCell::new(StudioSession::new(surface)),
            on_change: RefCell::new(None),
        }
    }

    /// Registers the callback run after every state change. It runs with no
    /// session borrow held, so it may read the view.
    pub fn set_change_listener(&self, listener: impl Fn() + 'static) {
        *self.on_change.borrow_mut() = Some(Rc::new(listener));
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> Ref<'_, StudioSession<S>> {
        self.session.borrow()
    }

    pub fn view(&self) -> StudioView {
        self.session.borrow().view()
    }

    pub async fn refresh_workspaces(&self) {
        let token = self.session.borrow_mut().begin_refresh_workspaces();
        self.notify();
        let result = self.backend.list_projects().await;
        let applied = self
            .session
            .borrow_mut()
            .finish_refresh_workspaces(token, result);
        if applied {
            self.notify();
        }
    }

    /// Switches workspace, then loads its files and the connection status.
    pub async fn select_workspace(&self, name: &str) -> Result<(), InputError> {
        let ticket = self.session.borrow_mut().select_workspace(name)?;
        self.notify();

        let result = self.backend.list_plugin_files(&ticket.workspace).await;
        let applied = self.session.borrow_mut().finish_load_files(&ticket, result);
        if applied {
            self.notify();
            self.refresh_connection_status().await;
        }
        Ok(())
    }

    pub fn return_to_picker(&self) {
        self.session.borrow_mut().return_to_picker();
        self.notify();
    }

    pub async fn send_message(&self, text: &str) -> Result<(), InputError> {
        let ticket = self.session.borrow_mut().begin_send_message(text)?;
        self.run_chat(ticket).await;
        Ok(())
    }

    /// Sends from the picker's chat. The workspace list is refreshed once the
    /// exchange completes.
    pub async fn send_creation_message(&self, text: &str) -> Result<(), InputError> {
        let ticket = self.session.borrow_mut().begin_creation_message(text)?;
        self.run_chat(ticket).await;
        Ok(())
    }

    pub async fn send_editor_message(&self, text: &str) -> Result<(), InputError> {
        let ticket = self.session.borrow_mut().begin_editor_message(text)?;
        self.run_chat(ticket).await;
        Ok(())
    }

    pub async fn push_to_azdo(&self, target: &str) -> Result<(), InputError> {
        let ticket = self.session.borrow_mut().begin_push_to_azdo(target)?;
        self.run_chat(ticket).await;
        Ok(())
    }

    async fn run_chat(&self, ticket: ChatTicket) {
        self.notify();
        tracing::debug!(
            panel = ?ticket.panel,
            generation = ticket.token.generation(),
            "sending chat"
        );
        let result = self.backend.chat(&ticket.request).await;
        let completion = self.session.borrow_mut().finish_chat(&ticket, result);
        if completion.applied {
            self.notify();
        }
        if completion.refresh_workspaces {
            self.refresh_workspaces().await;
        }
    }

    /// Opens `filename` in the active workspace, fetching it only when no tab
    /// or fetch for it exists yet.
    pub async fn open_file(&self, filename: &str) -> Result<(), InputError> {
        let start = self.session.borrow_mut().begin_open_file(filename)?;
        self.notify();
        let FileOpenStart::Fetch(ticket) = start else {
            return Ok(());
        };

        let result = self
            .backend
            .read_plugin_file(&ticket.workspace, &ticket.open.filename)
            .await;
        self.session.borrow_mut().finish_open_file(&ticket, result);
        self.notify();
        Ok(())
    }

    pub fn activate_tab(&self, filename: &str) -> bool {
        let activated = self.session.borrow_mut().activate_tab(filename);
        if activated {
            self.notify();
        }
        activated
    }

    pub fn close_tab(&self, filename: &str) -> bool {
        let closed = self.session.borrow_mut().close_tab(filename);
        if closed {
            self.notify();
        }
        closed
    }

    pub fn edit_active_buffer(&self, text: impl Into<String>) -> bool {
        let changed = self.session.borrow_mut().edit_active_buffer(text);
        if changed {
            self.notify();
        }
        changed
    }

    /// Saves the active tab. Returns `None` when there is nothing to save.
    pub async fn save_active_tab(&self) -> Option<SaveOutcome> {
        let request = self.session.borrow_mut().begin_save()?;
        self.notify();

        let result = self
            .backend
            .write_plugin_file(
                &request.workspace,
                &request.save.filename,
                &request.save.content,
            )
            .await;
        let outcome = self.session.borrow_mut().finish_save(&request, result);
        self.notify();
        Some(outcome)
    }

    pub async fn load_azdo_targets(&self) {
        let token = self.session.borrow_mut().begin_load_azdo_targets();
        self.notify();
        let result = self.backend.list_azdo_targets().await;
        let applied = self
            .session
            .borrow_mut()
            .finish_load_azdo_targets(token, result);
        if applied {
            self.notify();
        }
    }

    pub async fn refresh_connection_status(&self) {
        let token = self.session.borrow_mut().begin_connection_status();
        let result = self.backend.connection_status().await;
        let applied = self
            .session
            .borrow_mut()
            .finish_connection_status(token, result);
        if applied {
            self.notify();
        }
    }

    fn notify(&self) {
        let listener = self.on_change.borrow().clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}
