use std::sync::{Arc, Mutex};

use diesel::Connection as _;
use lettre::Transport;
use lettre_email::Email;
use quill_api::users::{
    ForgotPasswordData, LoginData, ThemeData, TokenData, UserInfoData, VerifyEmailData,
};
use quill_models::{
    api_tokens::ApiToken,
    blogs::{Blog, NewBlog},
    db_conn::DbConn,
    email_verifications::EmailVerification,
    password_reset_requests::PasswordResetRequest,
    users::{NewUser, User},
    Error, CONFIG,
};
use rocket::State;
use rocket_contrib::json::Json;
use tracing::warn;
use validator::Validate;

use crate::api::{ok, Api, ApiError};
use crate::mail::{build_mail, Mailer};

#[derive(Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 1, message = "A blog name is required"))]
    pub blog_name: String,
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordForm {
    pub token: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters long"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct ChangePasswordForm {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password should be at least 8 characters long"))]
    pub new_password: String,
}

#[derive(Deserialize, Validate)]
pub struct ChangeEmailForm {
    pub current_password: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

/// Hands the message to the SMTP collaborator once the database work is
/// done. A mail failure is logged, never turned into a request failure.
fn send(mailer: &State<Arc<Mutex<Mailer>>>, message: Option<Email>) {
    if let Some(message) = message {
        if let Some(ref mut mail) = *mailer.lock().unwrap() {
            mail.send(message.into())
                .map_err(|_| warn!("Couldn't send mail"))
                .ok();
        }
    }
}

/// Creates the account and its primary blog in one go, then mails a
/// verification link and logs the new user in.
#[post("/register", data = "<form>")]
pub fn register(
    form: Json<RegisterForm>,
    conn: DbConn,
    mailer: State<Arc<Mutex<Mailer>>>,
) -> Api<TokenData> {
    form.validate().map_err(ApiError::validation)?;
    if User::find_by_email(&*conn, &form.email).is_ok() {
        return Err(ApiError::unprocessable("Email already taken"));
    }

    let user = (*conn)
        .transaction::<_, Error, _>(|| {
            let user = User::insert(
                &*conn,
                NewUser::new_local(form.email.clone(), &form.password)?,
            )?;
            Blog::create(
                &*conn,
                NewBlog::public(form.blog_name.clone(), form.blog_name.clone()),
                &user,
            )?;
            Ok(user)
        })
        .map_err(|err| match err {
            Error::Conflict => ApiError::unprocessable("Blog name already taken"),
            err => err.into(),
        })?;

    let token = EmailVerification::insert(&*conn, &user)?;
    send(
        &mailer,
        build_mail(
            user.email.clone(),
            "Confirm your email address".to_owned(),
            format!(
                "Welcome to Quill!\n\nTo confirm your address, visit https://{}/email/verify/{}",
                CONFIG.base_url, token
            ),
        ),
    );

    let token = ApiToken::issue(&*conn, &user)?;
    ok(TokenData { token: token.value })
}

#[post("/login", data = "<form>")]
pub fn login(form: Json<LoginData>, conn: DbConn) -> Api<TokenData> {
    let user = User::login(&*conn, &form.email, &form.password)?;
    let token = ApiToken::issue(&*conn, &user)?;
    ok(TokenData { token: token.value })
}

#[post("/logout")]
pub fn logout(token: ApiToken, conn: DbConn) -> Api<serde_json::Value> {
    token.revoke(&*conn)?;
    ok(json!(null))
}

/// Always answers 200 so addresses cannot be probed; a token is only
/// generated and mailed when the address actually has an account.
#[post("/forgot_password", data = "<form>")]
pub fn forgot_password(
    form: Json<ForgotPasswordData>,
    conn: DbConn,
    mailer: State<Arc<Mutex<Mailer>>>,
) -> Api<serde_json::Value> {
    if User::find_by_email(&*conn, &form.email).is_ok() {
        let token = PasswordResetRequest::insert(&*conn, &form.email)?;
        send(
            &mailer,
            build_mail(
                form.email.clone(),
                "Password reset".to_owned(),
                format!(
                    "To reset your password, visit https://{}/reset_password/{}",
                    CONFIG.base_url, token
                ),
            ),
        );
    }
    ok(json!(null))
}

#[post("/reset_password", data = "<form>")]
pub fn reset_password(form: Json<ResetPasswordForm>, conn: DbConn) -> Api<serde_json::Value> {
    form.validate().map_err(ApiError::validation)?;

    (*conn).transaction::<_, Error, _>(|| {
        let request = PasswordResetRequest::find_and_consume(&*conn, &form.token)?;
        let user = User::find_by_email(&*conn, &request.email)?;
        user.reset_password(&*conn, &form.password)
    })?;
    ok(json!(null))
}

#[post("/email/verify", data = "<form>")]
pub fn verify_email(form: Json<VerifyEmailData>, conn: DbConn) -> Api<serde_json::Value> {
    EmailVerification::verify(&*conn, &form.token)?;
    ok(json!(null))
}

#[get("/user_theme")]
pub fn get_theme(user: User) -> Api<ThemeData> {
    ok(ThemeData { theme: user.theme })
}

#[put("/user_theme", data = "<form>")]
pub fn set_theme(form: Json<ThemeData>, user: User, conn: DbConn) -> Api<ThemeData> {
    user.update_theme(&*conn, &form.theme)?;
    ok(ThemeData {
        theme: form.theme.clone(),
    })
}

#[get("/user/info")]
pub fn user_info(user: User, conn: DbConn) -> Api<UserInfoData> {
    let primary_blog = user.primary_blog(&*conn).map(|blog| blog.blog_name).ok();
    ok(UserInfoData {
        id: user.id,
        email: user.email,
        email_verified: user.email_verified,
        theme: user.theme,
        primary_blog,
    })
}

#[put("/user/password", data = "<form>")]
pub fn change_password(
    form: Json<ChangePasswordForm>,
    user: User,
    conn: DbConn,
) -> Api<serde_json::Value> {
    form.validate().map_err(ApiError::validation)?;
    user.change_password(&*conn, &form.current_password, &form.new_password)?;
    ok(json!(null))
}

/// The new address starts unverified, a fresh confirmation link is mailed
/// to it.
#[put("/user/email", data = "<form>")]
pub fn change_email(
    form: Json<ChangeEmailForm>,
    user: User,
    conn: DbConn,
    mailer: State<Arc<Mutex<Mailer>>>,
) -> Api<serde_json::Value> {
    form.validate().map_err(ApiError::validation)?;
    user.change_email(&*conn, &form.current_password, &form.email)?;

    let user = User::get(&*conn, user.id)?;
    let token = EmailVerification::insert(&*conn, &user)?;
    send(
        &mailer,
        build_mail(
            user.email.clone(),
            "Confirm your email address".to_owned(),
            format!(
                "To confirm your new address, visit https://{}/email/verify/{}",
                CONFIG.base_url, token
            ),
        ),
    );
    ok(json!(null))
}
