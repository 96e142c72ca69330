use crate::{
    auth::{
        jwt::generate_access_token,
        password::{Verification, hash_password, verify_against_dummy, verify_password},
    },
    config::Config,
    error::AppError,
    model::user::{NewUser, User},
    models::{AuthResponse, LoginReq, SignupReq},
    store::{Store, StoreError},
    utils::email_registry::EmailRegistry,
};
use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument, warn};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Width of the `name` and `email` columns, counted in characters.
pub const MAX_FIELD_LEN: usize = 255;

/// Same text for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Email or password incorrect";

/// Trimmed, lower-cased signup input that passed validation.
#[derive(Debug, PartialEq, Eq)]
struct ValidSignup {
    name: String,
    email: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_signup(req: &SignupReq) -> Result<ValidSignup, AppError> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);

    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("Please fill in all fields!".into()));
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters!"
        )));
    }

    if !email.contains('@') {
        return Err(AppError::Validation("Please enter a valid email address!".into()));
    }

    if name.chars().count() > MAX_FIELD_LEN || email.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::Validation(format!(
            "Name and email must be at most {MAX_FIELD_LEN} characters!"
        )));
    }

    Ok(ValidSignup {
        name: name.to_string(),
        email,
    })
}

fn auth_response(
    message: &str,
    user: &User,
    employee_id: Option<u64>,
    config: &Config,
) -> Result<AuthResponse, AppError> {
    let token = generate_access_token(
        user.id,
        user.email.clone(),
        employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))?;

    Ok(AuthResponse {
        success: true,
        message: message.to_string(),
        user_id: user.id,
        user_name: user.name.clone(),
        employee_id,
        token,
    })
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupReq,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing fields, weak password, bad email or email taken"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_signup",
    skip(payload, store, registry, config),
    fields(email = %payload.email)
)]
pub async fn signup(
    payload: web::Json<SignupReq>,
    store: web::Data<dyn Store>,
    registry: web::Data<EmailRegistry>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Signup request received");

    let valid = validate_signup(&payload).inspect_err(|e| {
        info!(reason = %e, "Signup validation failed");
    })?;

    if !registry.is_available(&valid.email, store.get_ref()).await? {
        info!("Signup rejected: email taken");
        return Err(AppError::Conflict("This email is already registered!".into()));
    }

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let registration = match store
        .register_user(NewUser {
            email: valid.email.clone(),
            password_hash,
            name: valid.name,
        })
        .await
    {
        Ok(registration) => registration,
        // lost a race with a concurrent signup
        Err(StoreError::DuplicateEmail) => {
            registry.mark_taken(&valid.email).await;
            return Err(AppError::Conflict("This email is already registered!".into()));
        }
        Err(e) => return Err(e.into()),
    };

    registry.mark_taken(&valid.email).await;

    info!(
        user_id = registration.user.id,
        employee_id = registration.employee_id,
        "Signup successful"
    );

    let body = auth_response(
        "Signup successful!",
        &registration.user,
        Some(registration.employee_id),
        &config,
    )?;
    Ok(HttpResponse::Ok().json(body))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(payload, store, config),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<LoginReq>,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    // 1️⃣ Basic validation
    let email = normalize_email(&payload.email);
    if email.is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::Validation("Email and password are required!".into()));
    }

    // 2️⃣ Fetch user
    debug!("Fetching user from store");
    let Some(user) = store.find_user_by_email(&email).await? else {
        info!("Invalid credentials: user not found");
        verify_against_dummy(&payload.password);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    // 3️⃣ Verify password
    match verify_password(&payload.password, &user.password) {
        Verification::Valid => {}
        Verification::ValidLegacy => {
            upgrade_legacy_hash(store.get_ref(), &user, &payload.password).await
        }
        Verification::Invalid => {
            info!(user_id = user.id, "Invalid credentials: password mismatch");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
    }

    info!(user_id = user.id, "Login successful");

    let body = auth_response("Login successful!", &user, user.employee_id, &config)?;
    Ok(HttpResponse::Ok().json(body))
}

/// Replaces an unsalted digest with an argon2 hash. Failures are logged, not fatal.
async fn upgrade_legacy_hash(store: &dyn Store, user: &User, password: &str) {
    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, user_id = user.id, "Failed to rehash legacy password");
            return;
        }
    };

    match store.update_password_hash(user.id, &hash).await {
        Ok(()) => info!(user_id = user.id, "Upgraded legacy password digest"),
        Err(e) => warn!(error = %e, user_id = user.id, "Failed to store upgraded password"),
    }
}
