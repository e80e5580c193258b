//! View-models for the authenticated layout and the small dialogs around it.

use std::sync::Arc;

use crate::{
    navigation::{NavigationShell, Route, SessionState},
    session::SessionStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub route: Route,
    pub label: &'static str,
}

pub const SIDEBAR_ITEMS: [NavItem; 2] = [
    NavItem {
        route: Route::People,
        label: "People Management",
    },
    NavItem {
        route: Route::Modules,
        label: "Module Store",
    },
];

#[derive(Debug, Default)]
pub struct LayoutShell {
    sidebar_collapsed: bool,
}

impl LayoutShell {
    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
    }

    pub fn nav_items(&self) -> &'static [NavItem] {
        &SIDEBAR_ITEMS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupTab {
    #[default]
    Users,
    Roles,
}

impl SetupTab {
    pub const ALL: [SetupTab; 2] = [SetupTab::Users, SetupTab::Roles];

    pub fn id(self) -> &'static str {
        match self {
            SetupTab::Users => "users",
            SetupTab::Roles => "roles",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SetupTab::Users => "Users",
            SetupTab::Roles => "Roles",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.id() == id)
    }
}

#[derive(Debug, Default)]
pub struct SetupView {
    active: SetupTab,
}

impl SetupView {
    pub fn active_tab(&self) -> SetupTab {
        self.active
    }

    /// Unknown ids leave the active tab as it is.
    pub fn set_active_tab(&mut self, id: &str) -> bool {
        match SetupTab::from_id(id) {
            Some(tab) => {
                self.active = tab;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub confirm_text: String,
    pub cancel_text: String,
}

impl Default for ConfirmDialog {
    fn default() -> Self {
        Self {
            title: "Confirm".into(),
            message: "Are you sure?".into(),
            confirm_text: "Confirm".into(),
            cancel_text: "Cancel".into(),
        }
    }
}

pub struct TopMenu {
    shell: Arc<NavigationShell>,
}

impl TopMenu {
    pub fn new(shell: Arc<NavigationShell>) -> Self {
        Self { shell }
    }

    pub fn on_setup(&self, session: &impl SessionState) -> Route {
        self.shell.navigate(Route::Setup.path(), session)
    }

    pub async fn on_logout(&self, session: &mut SessionStore) {
        session.logout().await;
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
