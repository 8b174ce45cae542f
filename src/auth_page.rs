//! State of the login/register page: which panel is showing, whether the
//! admin-code field is visible, and the dismissible flash messages.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashCategory {
    Success,
    Danger,
    Info,
}

impl FlashCategory {
    /// Parse the category names the server uses when flashing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "success" => FlashCategory::Success,
            "danger" | "error" => FlashCategory::Danger,
            _ => FlashCategory::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthPage {
    mode: AuthMode,
    admin_requested: bool,
    admin_code: String,
    flashes: Vec<Flash>,
}

impl AuthPage {
    /// Page state with the flashes rendered by the server, as
    /// `(category, message)` pairs.
    pub fn with_flashes<I, S>(flashes: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        Self {
            flashes: flashes
                .into_iter()
                .map(|(category, message)| Flash {
                    category: FlashCategory::from_name(category.as_ref()),
                    message: message.as_ref().to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn show_login(&mut self) {
        self.mode = AuthMode::Login;
    }

    pub fn show_register(&mut self) {
        self.mode = AuthMode::Register;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
    }

    /// Tick or untick "register as admin". Unticking hides and clears the code.
    pub fn set_admin_requested(&mut self, requested: bool) {
        self.admin_requested = requested;
        if !requested {
            self.admin_code.clear();
        }
    }

    pub fn admin_code_visible(&self) -> bool {
        self.mode == AuthMode::Register && self.admin_requested
    }

    pub fn set_admin_code(&mut self, code: impl Into<String>) {
        if self.admin_requested {
            self.admin_code = code.into();
        }
    }

    /// The code to submit with the registration form, if the admin box is ticked.
    pub fn admin_code_for_submit(&self) -> Option<&str> {
        self.admin_code_visible().then_some(self.admin_code.as_str())
    }

    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    /// Close one flash message. Out-of-range indices are ignored.
    pub fn dismiss_flash(&mut self, index: usize) {
        if index < self.flashes.len() {
            self.flashes.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_between_panels() {
        let mut page = AuthPage::default();
        assert_eq!(page.mode(), AuthMode::Login);
        page.toggle_mode();
        assert_eq!(page.mode(), AuthMode::Register);
        page.toggle_mode();
        assert_eq!(page.mode(), AuthMode::Login);
        page.show_register();
        page.show_register();
        assert_eq!(page.mode(), AuthMode::Register);
    }

    #[test]
    fn test_admin_code_visibility() {
        let mut page = AuthPage::default();
        page.show_register();
        assert!(!page.admin_code_visible());
        page.set_admin_code("ignored");
        assert_eq!(page.admin_code_for_submit(), None);

        page.set_admin_requested(true);
        page.set_admin_code("s3cret");
        assert!(page.admin_code_visible());
        assert_eq!(page.admin_code_for_submit(), Some("s3cret"));

        page.show_login();
        assert!(!page.admin_code_visible());

        page.show_register();
        page.set_admin_requested(false);
        page.set_admin_requested(true);
        assert_eq!(page.admin_code_for_submit(), Some(""));
    }

    #[test]
    fn test_dismiss_flash() {
        let mut page = AuthPage::with_flashes([
            ("danger", "Invalid username or password."),
            ("success", "Successfully registered! Please log in."),
        ]);
        assert_eq!(page.flashes()[0].category, FlashCategory::Danger);

        page.dismiss_flash(0);
        assert_eq!(page.flashes().len(), 1);
        assert_eq!(page.flashes()[0].category, FlashCategory::Success);

        page.dismiss_flash(5);
        assert_eq!(page.flashes().len(), 1);
    }
}
