//! Transactional email templates.
//!
//! `render()` returns an `EmailMessage` ready to pass to `EmailSender::send`.

use crate::services::email_sender::EmailMessage;
use crate::types::UserRole;

// =============================================================================
// Welcome email
// =============================================================================

/// Sent when a new portal user is invited
pub struct WelcomeEmail<'a> {
    pub to: &'a str,
    pub name: Option<&'a str>,
    pub role: UserRole,
    /// Project the user can see; only meaningful for project users
    pub project_name: Option<&'a str>,
    pub login_url: &'a str,
}

impl<'a> WelcomeEmail<'a> {
    pub fn render(&self) -> EmailMessage {
        let greeting = match self.name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => format!("Hello {},", name),
            None => "Hello,".to_string(),
        };
        let access = match (self.role, self.project_name) {
            (UserRole::ProjectUser, Some(project)) => {
                format!("You have been given access to the {} portal.", project)
            }
            (role, _) => format!("You have been added to the portal as {}.", role.display_name()),
        };

        let html = format!(
            r#"<p>{greeting}</p>
<p>Welcome to Patient Pro Marketing. {access}</p>
<p>Sign in here: <a href="{url}">{url}</a></p>
<p>Use this email address ({to}) to log in.</p>"#,
            greeting = escape_html(&greeting),
            access = escape_html(&access),
            url = self.login_url,
            to = escape_html(self.to),
        );
        let text = format!(
            "{}\n\nWelcome to Patient Pro Marketing. {}\n\nSign in here: {}\n\nUse this email address ({}) to log in.",
            greeting, access, self.login_url, self.to
        );

        EmailMessage {
            to: self.to.to_string(),
            subject: "Welcome to the Patient Pro Marketing portal".to_string(),
            html,
            text,
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// =============================================================================
// Tests
// =============================================================================
