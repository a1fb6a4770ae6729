use std::fmt::{self, Display};

use super::OutgoingMail;

pub const VERIFY_SUBJECT: &str = "E-Mail-Adresse bestätigen";
pub const RESET_SUBJECT: &str = "Passwort zurücksetzen";
pub const WELCOME_SUBJECT: &str = "Willkommen bei BauJobs!";
pub const STATUS_SUBJECT: &str = "Änderung Ihres Account-Status";

/// Link to the e-mail confirmation page, valid for 24 hours.
pub struct VerificationTemplate<'a> {
    pub frontend_url: &'a str,
    pub token: &'a str,
}

impl Display for VerificationTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = link(self.frontend_url, "verify-email", self.token);
        write!(
            f,
            r#"<h1>Willkommen bei BauJobs!</h1>
<p>Bitte bestätigen Sie Ihre E-Mail-Adresse, indem Sie auf den folgenden Link klicken:</p>
<a href="{url}">E-Mail-Adresse bestätigen</a>
<p>Der Link ist 24 Stunden gültig.</p>
<p>Falls Sie sich nicht bei BauJobs registriert haben, können Sie diese E-Mail ignorieren.</p>"#
        )
    }
}

pub struct PasswordResetTemplate<'a> {
    pub frontend_url: &'a str,
    pub token: &'a str,
}

impl Display for PasswordResetTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = link(self.frontend_url, "reset-password", self.token);
        write!(
            f,
            r#"<h1>Passwort zurücksetzen</h1>
<p>Sie haben angefordert, Ihr Passwort zurückzusetzen. Klicken Sie auf den folgenden Link, um ein neues Passwort festzulegen:</p>
<a href="{url}">Passwort zurücksetzen</a>
<p>Der Link ist 1 Stunde gültig.</p>
<p>Falls Sie kein neues Passwort angefordert haben, können Sie diese E-Mail ignorieren.</p>"#
        )
    }
}

pub struct WelcomeTemplate<'a> {
    pub first_name: &'a str,
}

impl Display for WelcomeTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<h1>Willkommen bei BauJobs, {name}!</h1>
<p>Vielen Dank für Ihre Registrierung bei BauJobs.</p>
<p>Mit Ihrem Account können Sie:</p>
<ul>
  <li>Stellenanzeigen veröffentlichen</li>
  <li>Nach Jobs suchen</li>
  <li>Ihr Profil verwalten</li>
</ul>
<p>Ihr BauJobs Team</p>"#,
            name = escape(self.first_name)
        )
    }
}

pub struct AccountStatusTemplate<'a> {
    pub status: &'a str,
    pub reason: Option<&'a str>,
}

impl Display for AccountStatusTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<h1>{STATUS_SUBJECT}</h1>")?;
        writeln!(
            f,
            "<p>Der Status Ihres BauJobs-Accounts wurde auf \"{}\" geändert.</p>",
            escape(self.status)
        )?;
        if let Some(reason) = self.reason {
            writeln!(f, "<p>Grund: {}</p>", escape(reason))?;
        }
        write!(f, "<p>Bei Fragen kontaktieren Sie uns bitte.</p>\n<p>Ihr BauJobs Team</p>")
    }
}

pub fn verification(to: &str, frontend_url: &str, token: &str) -> OutgoingMail {
    compose(to, VERIFY_SUBJECT, VerificationTemplate { frontend_url, token })
}

pub fn password_reset(to: &str, frontend_url: &str, token: &str) -> OutgoingMail {
    compose(to, RESET_SUBJECT, PasswordResetTemplate { frontend_url, token })
}

pub fn welcome(to: &str, first_name: &str) -> OutgoingMail {
    compose(to, WELCOME_SUBJECT, WelcomeTemplate { first_name })
}

pub fn account_status(to: &str, status: &str, reason: Option<&str>) -> OutgoingMail {
    compose(to, STATUS_SUBJECT, AccountStatusTemplate { status, reason })
}

fn compose(to: &str, subject: &str, body: impl Display) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: subject.to_string(),
        html: body.to_string(),
    }
}

fn link(frontend_url: &str, page: &str, token: &str) -> String {
    format!("{}/{page}?token={token}", frontend_url.trim_end_matches('/'))
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_point_at_the_frontend() {
        let mail = verification("lea@bau.ch", "https://baujobs.ch/", "abc");
        assert_eq!(mail.subject, VERIFY_SUBJECT);
        assert!(mail.html.contains("https://baujobs.ch/verify-email?token=abc"));

        let mail = password_reset("lea@bau.ch", "https://baujobs.ch", "xyz");
        assert!(mail.html.contains("https://baujobs.ch/reset-password?token=xyz"));
        assert!(mail.html.contains("1 Stunde"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mail = welcome("lea@bau.ch", "<Lea>");
        assert!(mail.html.contains("&lt;Lea&gt;"));

        let mail = account_status("lea@bau.ch", "gelöscht", None);
        assert!(mail.html.contains("\"gelöscht\""));
        assert!(!mail.html.contains("Grund"));
    }
}
