//! Account route handlers (requires login).
//!
//! Editing account fields, changing the password, and maintaining the
//! profile and stored shipping address.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{Email, Username};

use crate::db::profiles::ProfileUpdate;
use crate::db::{ProfileRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequestContext, RequireAuth};
use crate::models::{AccountDetails, CurrentUser, ShippingDetails, User};
use crate::routes::forms::{FormErrors, ShippingFields, validate_shipping};
use crate::services::auth::{AuthService, password_problems};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Account fields as submitted (and as shown when re-rendering).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.to_string(),
        }
    }
}

/// Password change form.
#[derive(Deserialize)]
pub struct PasswordForm {
    pub new_password1: String,
    pub new_password2: String,
}

/// Profile fields plus the shipping address, posted together.
///
/// Shipping inputs carry a `shipping_` prefix so they don't collide with the
/// profile's own address fields.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct InfoForm {
    pub phone: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub shipping_full_name: String,
    pub shipping_email: String,
    pub shipping_address1: String,
    pub shipping_address2: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_zipcode: String,
    pub shipping_country: String,
}

impl InfoForm {
    fn profile(&self) -> ProfileUpdate {
        ProfileUpdate {
            phone: self.phone.trim().to_string(),
            address1: self.address1.trim().to_string(),
            address2: self.address2.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            zipcode: self.zipcode.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }

    fn shipping(&self) -> ShippingDetails {
        ShippingFields {
            full_name: self.shipping_full_name.clone(),
            email: self.shipping_email.clone(),
            address1: self.shipping_address1.clone(),
            address2: self.shipping_address2.clone(),
            city: self.shipping_city.clone(),
            state: self.shipping_state.clone(),
            zipcode: self.shipping_zipcode.clone(),
            country: self.shipping_country.clone(),
        }
        .to_details()
    }
}

fn validate_profile(profile: &ProfileUpdate) -> FormErrors {
    let mut errors = FormErrors::new();
    errors.limit("phone", &profile.phone);
    errors.limit("address1", &profile.address1);
    errors.limit("address2", &profile.address2);
    errors.limit("city", &profile.city);
    errors.limit("state", &profile.state);
    errors.limit("zipcode", &profile.zipcode);
    errors.limit("country", &profile.country);
    errors
}

/// Parse account fields, collecting field errors.
fn parse_account(form: &UserForm) -> std::result::Result<AccountDetails, FormErrors> {
    let mut errors = FormErrors::new();

    let username = Username::parse(&form.username)
        .map_err(|e| errors.add("username", e.to_string()))
        .ok();
    let email = Email::parse(&form.email)
        .map_err(|e| errors.add("email", e.to_string()))
        .ok();
    errors.limit("first_name", &form.first_name);
    errors.limit("last_name", &form.last_name);

    match (username, email) {
        (Some(username), Some(email)) if errors.is_empty() => Ok(AccountDetails {
            username,
            email,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Edit account page.
#[derive(Template, WebTemplate)]
#[template(path = "account/update_user.html")]
pub struct UpdateUserTemplate {
    pub page: PageContext,
    pub form: UserForm,
    pub errors: FormErrors,
}

/// Change password page.
#[derive(Template, WebTemplate)]
#[template(path = "account/update_password.html")]
pub struct UpdatePasswordTemplate {
    pub page: PageContext,
}

/// Profile and shipping address page.
#[derive(Template, WebTemplate)]
#[template(path = "account/update_info.html")]
pub struct UpdateInfoTemplate {
    pub page: PageContext,
    pub profile: ProfileUpdate,
    pub shipping: ShippingDetails,
    pub profile_errors: FormErrors,
    pub shipping_errors: FormErrors,
}

// =============================================================================
// Update User
// =============================================================================

/// Display the account form, pre-filled.
#[instrument(skip(state, ctx, user), fields(user_id = %user.id))]
pub async fn update_user_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let account = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    Ok(UpdateUserTemplate {
        page: ctx.page().await?,
        form: UserForm::from(&account),
        errors: FormErrors::new(),
    }
    .into_response())
}

/// Save account changes.
#[instrument(skip(state, ctx, user, form), fields(user_id = %user.id))]
pub async fn update_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    mut ctx: RequestContext,
    Form(form): Form<UserForm>,
) -> Result<Response> {
    let errors = match parse_account(&form) {
        Ok(details) => {
            match UserRepository::new(state.pool())
                .update_account(user.id, &details)
                .await
            {
                Ok(updated) => {
                    ctx.refresh_user(CurrentUser {
                        id: updated.id,
                        username: updated.username,
                    })
                    .await?;
                    ctx.success("User Has Been Updated!").await?;
                    return Ok(Redirect::to("/").into_response());
                }
                Err(RepositoryError::Conflict(_)) => {
                    let mut errors = FormErrors::new();
                    errors.add("username", "A user with that username already exists.");
                    errors
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    Ok(UpdateUserTemplate {
        page: ctx.page().await?,
        form,
        errors,
    }
    .into_response())
}

// =============================================================================
// Update Password
// =============================================================================

/// Display the password form.
#[instrument(skip_all)]
pub async fn update_password_page(
    _auth: RequireAuth,
    ctx: RequestContext,
) -> Result<Response> {
    Ok(UpdatePasswordTemplate {
        page: ctx.page().await?,
    }
    .into_response())
}

/// Change the password. Each problem becomes its own notice.
#[instrument(skip(state, ctx, user, form), fields(user_id = %user.id))]
pub async fn update_password(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    mut ctx: RequestContext,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    let problems = password_problems(&form.new_password1, &form.new_password2);
    if !problems.is_empty() {
        for problem in problems {
            ctx.error(problem.to_string()).await?;
        }
        return Ok(Redirect::to("/update-password").into_response());
    }

    AuthService::new(state.pool())
        .change_password(user.id, &form.new_password1, &form.new_password2)
        .await?;

    // New credentials, new session ID
    ctx.log_in(user).await?;
    ctx.success("Your Password Has Been Updated...").await?;
    Ok(Redirect::to("/update-user").into_response())
}

// =============================================================================
// Update Info
// =============================================================================

/// Display the profile and shipping address forms.
#[instrument(skip(state, ctx, user), fields(user_id = %user.id))]
pub async fn update_info_page(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response> {
    let profiles = ProfileRepository::new(state.pool());
    let profile = profiles
        .get(user.id)
        .await?
        .map(|p| ProfileUpdate::from(&p))
        .unwrap_or_default();
    let shipping = profiles
        .shipping_address(user.id)
        .await?
        .map(|a| a.details)
        .unwrap_or_default();

    Ok(UpdateInfoTemplate {
        page: ctx.page().await?,
        profile,
        shipping,
        profile_errors: FormErrors::new(),
        shipping_errors: FormErrors::new(),
    }
    .into_response())
}

/// Save the profile and upsert the shipping address.
///
/// Nothing is written unless both forms validate.
#[instrument(skip(state, ctx, user, form), fields(user_id = %user.id))]
pub async fn update_info(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ctx: RequestContext,
    Form(form): Form<InfoForm>,
) -> Result<Response> {
    let profile = form.profile();
    let shipping = form.shipping();
    let profile_errors = validate_profile(&profile);
    let shipping_errors = validate_shipping(&shipping);

    if profile_errors.is_empty() && shipping_errors.is_empty() {
        ProfileRepository::new(state.pool())
            .save_info(user.id, &profile, &shipping)
            .await?;
        ctx.success("Your Info Has Been Updated!").await?;
        return Ok(Redirect::to("/").into_response());
    }

    Ok(UpdateInfoTemplate {
        page: ctx.page().await?,
        profile,
        shipping,
        profile_errors,
        shipping_errors,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_collects_field_errors() {
        let form = UserForm {
            username: "no spaces allowed".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: "missing-at.example.com".to_string(),
        };
        let errors = parse_account(&form).unwrap_err();
        assert!(errors.message("username").is_some());
        assert!(errors.message("email").is_some());
        assert!(errors.message("first_name").is_none());
    }

    #[test]
    fn test_parse_account_trims_names() {
        let form = UserForm {
            username: "ada".to_string(),
            first_name: "  Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        };
        let details = parse_account(&form).unwrap();
        assert_eq!(details.first_name, "Ada");
        assert_eq!(details.email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_info_form_splits_profile_and_shipping() {
        let form = InfoForm {
            phone: " 555-0100 ".to_string(),
            city: "Springfield".to_string(),
            shipping_full_name: "Ada Lovelace".to_string(),
            shipping_city: "London".to_string(),
            shipping_zipcode: " ".to_string(),
            ..InfoForm::default()
        };

        assert_eq!(form.profile().phone, "555-0100");
        assert_eq!(form.profile().city, "Springfield");

        let shipping = form.shipping();
        assert_eq!(shipping.city, "London");
        assert_eq!(shipping.zipcode, None);
        assert!(validate_shipping(&shipping).message("email").is_some());
    }
}
