use std::io::Cursor;

use quill_api::Meta;
use quill_models::{
    blog_users::{Access, DenyReason},
    Error, ITEMS_PER_PAGE,
};
use rocket::{
    http::{ContentType, RawStr, Status},
    request::{FromFormValue, Request},
    response::{self, Responder, Response},
};
use serde::Serialize;

pub mod blogs;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod session;
pub mod users;

/// What every route returns: a payload wrapped in the success envelope, or an
/// `ApiError` that renders the error envelope.
pub type Api<T> = std::result::Result<ApiSuccess<T>, ApiError>;

pub struct ApiSuccess<T> {
    status: Status,
    payload: T,
}

pub fn ok<T>(payload: T) -> Api<T> {
    Ok(ApiSuccess {
        status: Status::Ok,
        payload,
    })
}

pub fn created<T>(payload: T) -> Api<T> {
    Ok(ApiSuccess {
        status: Status::Created,
        payload,
    })
}

impl<'r, T: Serialize> Responder<'r> for ApiSuccess<T> {
    fn respond_to(self, _req: &Request) -> response::Result<'r> {
        let body = json!({
            "Meta": Meta::new(self.status.code, self.status.reason),
            "response": self.payload,
        });
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(Cursor::new(body.to_string()))
            .ok()
    }
}

/// Renders the `{Meta, errors}` envelope. Model errors convert through
/// `From<Error>`, so routes can use `?` directly on model calls.
#[derive(Debug)]
pub struct ApiError {
    status: Status,
    msg: String,
    errors: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: Status, msg: &str) -> ApiError {
        ApiError {
            status,
            msg: msg.to_owned(),
            errors: None,
        }
    }

    pub fn unprocessable(msg: &str) -> ApiError {
        ApiError::new(Status::UnprocessableEntity, msg)
    }

    pub fn validation(errors: validator::ValidationErrors) -> ApiError {
        ApiError {
            status: Status::UnprocessableEntity,
            msg: "Invalid data".to_owned(),
            errors: serde_json::to_value(errors).ok(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> ApiError {
        let (status, msg) = match err {
            Error::NotFound => (Status::NotFound, "Not found"),
            Error::Unauthorized => (Status::Unauthorized, "Unauthorized"),
            Error::Forbidden => (Status::Forbidden, "Forbidden"),
            Error::Blocked => (Status::Forbidden, "Blocked"),
            Error::Conflict => (Status::Conflict, "Conflict"),
            Error::InvalidValue => (Status::UnprocessableEntity, "Invalid data"),
            Error::InvalidToken => (Status::UnprocessableEntity, "Invalid token"),
            Error::Expired => (Status::UnprocessableEntity, "Expired token"),
            Error::Password | Error::Db(_) => (Status::InternalServerError, "Internal error"),
        };
        ApiError::new(status, msg)
    }
}

impl<'r> Responder<'r> for ApiError {
    fn respond_to(self, _req: &Request) -> response::Result<'r> {
        let body = json!({
            "Meta": Meta::new(self.status.code, &self.msg),
            "errors": self.errors,
        });
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(Cursor::new(body.to_string()))
            .ok()
    }
}

/// Turns an authorization decision into a route result. A post reached
/// through the wrong blog reads as missing, everything else is a plain 403.
pub fn grant(access: Access) -> Result<(), ApiError> {
    match access {
        Access::Allowed => Ok(()),
        Access::Denied(DenyReason::WrongBlog) => Err(Error::NotFound.into()),
        Access::Denied(_) => Err(Error::Forbidden.into()),
    }
}

#[derive(Copy, Clone)]
pub struct Page(i32);

impl<'v> FromFormValue<'v> for Page {
    type Error = &'v RawStr;

    fn from_form_value(form_value: &'v RawStr) -> Result<Page, &'v RawStr> {
        match form_value.parse::<i32>() {
            Ok(page) if page >= 1 => Ok(Page(page)),
            _ => Err(form_value),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page(1)
    }
}

impl Page {
    pub fn number(self) -> i32 {
        self.0
    }

    /// Page → offset window, for `Post::blog_page` and friends.
    pub fn limits(self) -> (i32, i32) {
        ((self.0 - 1) * ITEMS_PER_PAGE, self.0 * ITEMS_PER_PAGE)
    }
}

/// Link to the next page of a listing, or `None` on the last one.
pub fn next_url(path: &str, page: Page, total: i64) -> Option<String> {
    if i64::from(page.number() * ITEMS_PER_PAGE) < total {
        Some(format!("{}?page={}", path, page.number() + 1))
    } else {
        None
    }
}

#[catch(400)]
pub fn bad_request() -> ApiError {
    ApiError::new(Status::BadRequest, "Bad request")
}

#[catch(401)]
pub fn unauthorized() -> ApiError {
    ApiError::new(Status::Unauthorized, "Unauthorized")
}

#[catch(403)]
pub fn forbidden() -> ApiError {
    ApiError::new(Status::Forbidden, "Forbidden")
}

#[catch(404)]
pub fn not_found() -> ApiError {
    ApiError::new(Status::NotFound, "Not found")
}

#[catch(422)]
pub fn unprocessable_entity() -> ApiError {
    ApiError::new(Status::UnprocessableEntity, "Invalid data")
}

#[catch(500)]
pub fn server_error() -> ApiError {
    ApiError::new(Status::InternalServerError, "Internal error")
}
