use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    is_plausible_email, normalize_email, AccountType, PremiumFeatures, ProfileUpdate,
    Registration, UserId, UserRecord, UserView,
};
use super::repository::UserRepository;
use crate::auth::password::{self, hash_fingerprint, PasswordError};
use crate::auth::tokens::{TokenError, TokenIssuer, TokenKind};
use crate::error::ApiError;
use crate::listings::domain::SeekerProfile;
use crate::listings::query::ListingFilter;
use crate::listings::repository::ListingRepository;
use crate::mail::{templates, Mailer, OutgoingMail};
use crate::store::RepositoryError;

pub const PREMIUM_DAYS: i64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {} characters", password::MIN_PASSWORD_LENGTH)]
    WeakPassword,
    #[error("invalid account type")]
    InvalidAccountType,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("current password is incorrect")]
    WrongPassword,
    #[error("invalid premium type")]
    InvalidPremiumType,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AccountError> for ApiError {
    fn from(value: AccountError) -> Self {
        match value {
            AccountError::UserNotFound => ApiError::not_found(value.to_string()),
            AccountError::Repository(err) => err.into(),
            AccountError::Password(_) | AccountError::Token(_) => {
                tracing::error!(error = %value, "account operation failed");
                ApiError::Internal("account operation failed".to_string())
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize)]
pub struct PremiumStatus {
    #[serde(rename = "premiumFeatures")]
    pub premium: PremiumFeatures,
    #[serde(rename = "accountTyp")]
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PremiumActivation {
    #[serde(rename = "premiumTyp", default)]
    pub premium_type: String,
    #[serde(rename = "lebenslaufHervorgehoben", default)]
    pub highlighted_cv: bool,
}

/// Registration, login and everything a signed-in user does to their own account.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    seekers: Arc<dyn ListingRepository<SeekerProfile>>,
    tokens: Arc<TokenIssuer>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        seekers: Arc<dyn ListingRepository<SeekerProfile>>,
        tokens: Arc<TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            seekers,
            tokens,
            mailer,
            frontend_url: frontend_url.into(),
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<UserView, AccountError> {
        let email = normalize_email(&registration.email);
        if !is_plausible_email(&email) {
            return Err(AccountError::InvalidEmail);
        }
        if !password::is_acceptable(&registration.password) {
            return Err(AccountError::WeakPassword);
        }
        let account_type = match registration.account_type.as_deref() {
            None | Some("") => AccountType::JobSeeker,
            Some(raw) => AccountType::parse(raw).ok_or(AccountError::InvalidAccountType)?,
        };

        let user = UserRecord {
            id: UserId::generate(),
            email,
            password_hash: password::hash(&registration.password).await?,
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            phone: registration.phone,
            company: registration.company,
            profile_picture: None,
            account_type,
            email_verified: false,
            premium: PremiumFeatures::default(),
            cv: None,
            cv_visible: false,
            seeker_postings: Vec::new(),
            created_at: Utc::now(),
        };

        let user = self.users.insert(user).await.map_err(|err| match err {
            RepositoryError::Conflict => AccountError::DuplicateEmail,
            other => other.into(),
        })?;
        info!(user_id = %user.id, account_type = user.account_type.label(), "user registered");

        match self.tokens.issue_email_verification(&user.id) {
            Ok(token) => {
                self.deliver(templates::verification(&user.email, &self.frontend_url, &token))
                    .await
            }
            Err(err) => warn!(error = %err, "verification token could not be issued"),
        }
        self.deliver(templates::welcome(&user.email, &user.first_name))
            .await;

        Ok(user.view())
    }

    /// Unknown e-mail and wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AccountError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AccountError::InvalidCredentials)?;
        if !password::verify(password, &user.password_hash).await {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(LoginResponse {
            token: self.tokens.issue_session(&user.id)?,
            user: user.view(),
        })
    }

    pub async fn verify_email(&self, token: &str) -> Result<UserView, AccountError> {
        let user_id = self
            .tokens
            .verify_kind(token, TokenKind::VerifyEmail)
            .ok()
            .and_then(|claims| claims.user())
            .ok_or(AccountError::InvalidToken)?;
        let mut user = self.load(&user_id).await?;
        if !user.email_verified {
            user.email_verified = true;
            self.users.replace(user.clone()).await?;
            info!(user_id = %user.id, "e-mail verified");
        }
        Ok(user.view())
    }

    /// Succeeds whether or not the address belongs to an account.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Ok(());
        };
        let token = self
            .tokens
            .issue_password_reset(&user.id, &user.password_hash)?;
        self.deliver(templates::password_reset(&user.email, &self.frontend_url, &token))
            .await;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AccountError> {
        let claims = self
            .tokens
            .verify_kind(token, TokenKind::ResetPassword)
            .map_err(|_| AccountError::InvalidToken)?;
        let user_id = claims.user().ok_or(AccountError::InvalidToken)?;
        let mut user = self
            .users
            .fetch(&user_id)
            .await?
            .ok_or(AccountError::InvalidToken)?;
        if claims.fingerprint.as_deref() != Some(hash_fingerprint(&user.password_hash).as_str()) {
            return Err(AccountError::InvalidToken);
        }
        if !password::is_acceptable(new_password) {
            return Err(AccountError::WeakPassword);
        }
        user.password_hash = password::hash(new_password).await?;
        self.users.replace(user).await?;
        info!(user_id = %user_id, "password reset");
        Ok(())
    }

    pub async fn profile(&self, user_id: &UserId) -> Result<UserView, AccountError> {
        Ok(self.load(user_id).await?.view())
    }

    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserView, AccountError> {
        let mut user = self.load(user_id).await?;
        update.apply(&mut user);
        self.users.replace(user.clone()).await?;
        Ok(user.view())
    }

    pub async fn change_password(
        &self,
        user_id: &UserId,
        current: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        let mut user = self.load(user_id).await?;
        if !password::verify(current, &user.password_hash).await {
            return Err(AccountError::WrongPassword);
        }
        if !password::is_acceptable(new_password) {
            return Err(AccountError::WeakPassword);
        }
        user.password_hash = password::hash(new_password).await?;
        self.users.replace(user).await?;
        Ok(())
    }

    /// Removes the account together with its seeker postings.
    pub async fn delete_account(&self, user_id: &UserId) -> Result<(), AccountError> {
        let user = self.load(user_id).await?;
        let postings = self
            .seekers
            .remove_matching(&ListingFilter::by_creator(user_id.clone()))
            .await?;
        self.users.remove(user_id).await?;
        info!(user_id = %user_id, postings, "account deleted");
        self.deliver(templates::account_status(
            &user.email,
            "gelöscht",
            Some("Auf Ihren Wunsch"),
        ))
        .await;
        Ok(())
    }

    pub async fn premium_status(&self, user_id: &UserId) -> Result<PremiumStatus, AccountError> {
        let user = self.load(user_id).await?;
        Ok(PremiumStatus {
            premium: user.premium,
            account_type: user.account_type,
        })
    }

    pub async fn activate_premium(
        &self,
        user_id: &UserId,
        activation: PremiumActivation,
    ) -> Result<PremiumFeatures, AccountError> {
        let premium_type =
            AccountType::parse(&activation.premium_type).ok_or(AccountError::InvalidPremiumType)?;
        self.grant_premium(user_id, Some(premium_type), Some(activation.highlighted_cv))
            .await
    }

    /// Grants premium features for [`PREMIUM_DAYS`] from now. Without an
    /// explicit type the account's own type is used, and job seekers get the
    /// CV highlight unless told otherwise.
    pub async fn grant_premium(
        &self,
        user_id: &UserId,
        premium_type: Option<AccountType>,
        highlighted_cv: Option<bool>,
    ) -> Result<PremiumFeatures, AccountError> {
        let mut user = self.load(user_id).await?;
        let premium_type = premium_type.unwrap_or(user.account_type);
        user.premium = PremiumFeatures {
            highlighted_cv: highlighted_cv.unwrap_or(premium_type == AccountType::JobSeeker),
            premium_until: Some(Utc::now() + Duration::days(PREMIUM_DAYS)),
            premium_type: Some(premium_type),
        };
        self.users.replace(user.clone()).await?;
        info!(user_id = %user_id, premium_type = premium_type.label(), "premium granted");
        Ok(user.premium)
    }

    pub async fn set_cv_visibility(
        &self,
        user_id: &UserId,
        visible: bool,
    ) -> Result<bool, AccountError> {
        let mut user = self.load(user_id).await?;
        user.cv_visible = visible;
        self.users.replace(user).await?;
        Ok(visible)
    }

    async fn load(&self, user_id: &UserId) -> Result<UserRecord, AccountError> {
        self.users
            .fetch(user_id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    async fn deliver(&self, mail: OutgoingMail) {
        let subject = mail.subject.clone();
        if let Err(err) = self.mailer.send(mail).await {
            warn!(error = %err, %subject, "e-mail delivery failed");
        }
    }
}
