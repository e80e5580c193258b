//! Master/detail editing of user accounts.
//!
//! The controller is always in exactly one [`FormMode`]. Selecting another
//! record, starting a new one or cancelling while the draft is dirty does not
//! happen immediately: the action is parked until the operator resolves the
//! discard prompt with [`UserFormController::confirm_discard`] or
//! [`UserFormController::cancel_discard`].

use std::{str::FromStr, sync::Arc};

use shared::{
    domain::{DirectoryEntry, DirectoryRecord, UserId},
    protocol::{CreateUserRequest, UpdateUserRequest},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{directory::DirectoryClient, error::ClientResult, shell::ConfirmDialog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    FirstName,
    LastName,
    Email,
    Password,
}

#[derive(Debug, Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(FormField::Username),
            "firstName" | "first_name" | "first-name" => Ok(FormField::FirstName),
            "lastName" | "last_name" | "last-name" => Ok(FormField::LastName),
            "email" => Ok(FormField::Email),
            "password" => Ok(FormField::Password),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Draft of the editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBuffer {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl FormBuffer {
    /// Password is never loaded from the server.
    pub fn from_record(record: &DirectoryRecord) -> Self {
        Self {
            username: record.username.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            email: record.email.clone(),
            password: String::new(),
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Username => &self.username,
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
            FormField::Password => &self.password,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Username => &mut self.username,
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Email => &mut self.email,
            FormField::Password => &mut self.password,
        };
        *slot = value.into();
    }

    // Password is left out of both change detection and the required set.
    fn profile_fields(&self) -> [&str; 4] {
        [&self.username, &self.first_name, &self.last_name, &self.email]
    }

    fn profile_complete(&self) -> bool {
        self.profile_fields().iter().all(|v| !v.trim().is_empty())
    }

    fn has_content(&self) -> bool {
        self.profile_fields().iter().any(|v| !v.is_empty())
    }

    pub fn create_request(&self) -> CreateUserRequest {
        CreateUserRequest {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    pub fn update_request(&self) -> UpdateUserRequest {
        UpdateUserRequest {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Idle,
    Editing {
        id: UserId,
        buffer: FormBuffer,
        baseline: FormBuffer,
    },
    Creating {
        buffer: FormBuffer,
    },
}

/// Action parked behind the discard prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    Select(UserId),
    StartCreate,
    Cancel,
}

/// What confirming the discard prompt does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscardBehavior {
    /// Drop the draft and close the form, whatever action raised the prompt.
    #[default]
    CloseForm,
    /// Drop the draft and carry out the parked action.
    ProceedWithAction,
}

pub struct UserFormController {
    directory: Arc<dyn DirectoryClient>,
    discard_behavior: DiscardBehavior,
    users: Vec<DirectoryEntry>,
    mode: FormMode,
    pending: Option<GatedAction>,
}

impl UserFormController {
    pub fn new(directory: Arc<dyn DirectoryClient>) -> Self {
        Self {
            directory,
            discard_behavior: DiscardBehavior::default(),
            users: Vec::new(),
            mode: FormMode::Idle,
            pending: None,
        }
    }

    pub fn with_discard_behavior(mut self, behavior: DiscardBehavior) -> Self {
        self.discard_behavior = behavior;
        self
    }

    pub fn users(&self) -> &[DirectoryEntry] {
        &self.users
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn selected_id(&self) -> Option<UserId> {
        match self.mode {
            FormMode::Editing { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_creating(&self) -> bool {
        matches!(self.mode, FormMode::Creating { .. })
    }

    pub fn buffer(&self) -> Option<&FormBuffer> {
        match &self.mode {
            FormMode::Idle => None,
            FormMode::Editing { buffer, .. } | FormMode::Creating { buffer } => Some(buffer),
        }
    }

    pub fn baseline(&self) -> Option<&FormBuffer> {
        match &self.mode {
            FormMode::Editing { baseline, .. } => Some(baseline),
            _ => None,
        }
    }

    pub fn pending_action(&self) -> Option<GatedAction> {
        self.pending
    }

    pub fn pending_confirmation(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        match &self.mode {
            FormMode::Idle => false,
            FormMode::Creating { buffer } => buffer.has_content(),
            FormMode::Editing {
                buffer, baseline, ..
            } => buffer.profile_fields() != baseline.profile_fields(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match &self.mode {
            FormMode::Idle => false,
            FormMode::Editing { buffer, .. } => buffer.profile_complete(),
            FormMode::Creating { buffer } => {
                buffer.profile_complete() && !buffer.password.trim().is_empty()
            }
        }
    }

    pub fn can_save(&self) -> bool {
        self.is_dirty() && self.is_valid()
    }

    pub fn form_visible(&self) -> bool {
        !matches!(self.mode, FormMode::Idle)
    }

    pub fn discard_prompt(&self) -> Option<ConfirmDialog> {
        self.pending.map(|_| ConfirmDialog {
            title: "Unsaved Changes".into(),
            message: "You have unsaved changes. Do you want to discard them?".into(),
            confirm_text: "Discard".into(),
            cancel_text: "Keep Editing".into(),
        })
    }

    pub async fn load_list(&mut self) -> ClientResult<()> {
        self.users = self.directory.list_users().await?;
        debug!(count = self.users.len(), "user list loaded");
        Ok(())
    }

    pub async fn select_record(&mut self, id: UserId) -> ClientResult<()> {
        if self.park(GatedAction::Select(id)) {
            return Ok(());
        }
        self.load_record(id).await
    }

    pub fn start_create(&mut self) {
        if self.park(GatedAction::StartCreate) {
            return;
        }
        self.enter_create();
    }

    pub fn cancel(&mut self) {
        if self.park(GatedAction::Cancel) {
            return;
        }
        self.close();
    }

    /// No-op while no form is open.
    pub fn edit(&mut self, field: FormField, value: impl Into<String>) {
        match &mut self.mode {
            FormMode::Idle => {}
            FormMode::Editing { buffer, .. } | FormMode::Creating { buffer } => {
                buffer.set(field, value)
            }
        }
    }

    /// Persists the draft. Does nothing when no form is open or the draft is
    /// invalid; if the write fails the draft is kept as it was.
    pub async fn save(&mut self) -> ClientResult<()> {
        if !self.is_valid() {
            debug!("save skipped; form is not valid");
            return Ok(());
        }

        match &self.mode {
            FormMode::Idle => return Ok(()),
            FormMode::Creating { buffer } => {
                let request = buffer.create_request();
                let record = self.directory.create_user(&request).await?;
                info!(user_id = %record.id, username = %record.username, "user created");
                let buffer = FormBuffer::from_record(&record);
                self.mode = FormMode::Editing {
                    id: record.id,
                    baseline: buffer.clone(),
                    buffer,
                };
            }
            FormMode::Editing { id, buffer, .. } => {
                let id = *id;
                let request = buffer.update_request();
                self.directory.update_user(id, &request).await?;
                info!(user_id = %id, "user updated");
                if let FormMode::Editing {
                    buffer, baseline, ..
                } = &mut self.mode
                {
                    *baseline = buffer.clone();
                }
            }
        }

        self.refresh_after_write().await;
        Ok(())
    }

    pub async fn confirm_discard(&mut self) -> ClientResult<()> {
        let Some(action) = self.pending.take() else {
            return Ok(());
        };
        debug!(?action, behavior = ?self.discard_behavior, "draft discarded");

        match (self.discard_behavior, action) {
            (DiscardBehavior::CloseForm, _)
            | (DiscardBehavior::ProceedWithAction, GatedAction::Cancel) => {
                self.close();
                Ok(())
            }
            (DiscardBehavior::ProceedWithAction, GatedAction::StartCreate) => {
                self.enter_create();
                Ok(())
            }
            (DiscardBehavior::ProceedWithAction, GatedAction::Select(id)) => {
                self.load_record(id).await
            }
        }
    }

    /// Dismisses the prompt and keeps the draft.
    pub fn cancel_discard(&mut self) {
        self.pending = None;
    }

    /// Not gated; deleting the open record closes the form.
    pub async fn delete_record(&mut self, id: UserId) -> ClientResult<()> {
        self.directory.delete_user(id).await?;
        info!(user_id = %id, "user deleted");
        if self.selected_id() == Some(id) {
            self.close();
        }
        self.refresh_after_write().await;
        Ok(())
    }

    /// The write already succeeded, so a failed refresh only leaves the list
    /// stale until the next `load_list`.
    async fn refresh_after_write(&mut self) {
        if let Err(err) = self.load_list().await {
            warn!(error = %err, "user list refresh failed");
        }
    }

    /// Returns true when `action` was parked behind the discard prompt.
    fn park(&mut self, action: GatedAction) -> bool {
        if self.is_dirty() {
            debug!(?action, "unsaved changes; confirmation required");
            self.pending = Some(action);
            true
        } else {
            self.pending = None;
            false
        }
    }

    async fn load_record(&mut self, id: UserId) -> ClientResult<()> {
        match self.directory.get_user(id).await {
            Ok(record) => {
                let buffer = FormBuffer::from_record(&record);
                self.mode = FormMode::Editing {
                    id,
                    baseline: buffer.clone(),
                    buffer,
                };
                Ok(())
            }
            Err(err) => {
                self.mode = FormMode::Idle;
                Err(err)
            }
        }
    }

    fn enter_create(&mut self) {
        self.mode = FormMode::Creating {
            buffer: FormBuffer::default(),
        };
    }

    fn close(&mut self) {
        self.mode = FormMode::Idle;
        self.pending = None;
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
