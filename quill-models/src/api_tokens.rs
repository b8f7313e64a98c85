use crate::{db_conn::DbConn, schema::api_tokens, users::User, Error, Result};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    Outcome,
};

#[derive(Clone, Queryable, Identifiable)]
pub struct ApiToken {
    pub id: i32,
    pub creation_date: NaiveDateTime,
    pub value: String,
    pub user_id: i32,
}

#[derive(Insertable)]
#[table_name = "api_tokens"]
pub struct NewApiToken {
    pub value: String,
    pub user_id: i32,
}

impl ApiToken {
    get!(api_tokens);
    insert!(api_tokens, NewApiToken);
    find_by!(api_tokens, find_by_value, value as &str);

    pub fn issue(conn: &crate::Connection, user: &User) -> Result<ApiToken> {
        ApiToken::insert(
            conn,
            NewApiToken {
                value: quill_common::utils::random_hex(),
                user_id: user.id,
            },
        )
    }

    pub fn revoke(&self, conn: &crate::Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

#[derive(Debug)]
pub enum TokenError {
    /// The Authorization header was not present
    NoHeader,

    /// The Authorization header was not in the `Bearer x` format
    NoValue,

    /// No token with this value exists
    Invalid,
}

impl<'a, 'r> FromRequest<'a, 'r> for ApiToken {
    type Error = TokenError;

    fn from_request(request: &'a Request<'r>) -> request::Outcome<ApiToken, TokenError> {
        let headers: Vec<_> = request.headers().get("Authorization").collect();
        if headers.len() != 1 {
            return Outcome::Failure((Status::Unauthorized, TokenError::NoHeader));
        }

        let mut parsed_header = headers[0].split(' ');
        let auth_type = match parsed_header.next() {
            Some(t) => t,
            None => return Outcome::Failure((Status::BadRequest, TokenError::NoValue)),
        };
        let value = match parsed_header.next() {
            Some(v) => v,
            None => return Outcome::Failure((Status::BadRequest, TokenError::NoValue)),
        };
        if auth_type != "Bearer" {
            return Outcome::Failure((Status::BadRequest, TokenError::NoValue));
        }

        let conn = request
            .guard::<DbConn>()
            .map_failure(|(status, _)| (status, TokenError::Invalid))?;
        match ApiToken::find_by_value(&*conn, value) {
            Ok(token) => Outcome::Success(token),
            Err(_) => Outcome::Failure((Status::Unauthorized, TokenError::Invalid)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::db, users::tests as user_tests};
    use diesel::Connection;

    #[test]
    fn issue_and_revoke() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = user_tests::fill_database(&conn);

            let token = ApiToken::issue(&conn, &users[0]).unwrap();
            assert_eq!(token.value.len(), 64);
            assert_eq!(
                ApiToken::find_by_value(&conn, &token.value).unwrap().user_id,
                users[0].id
            );

            token.revoke(&conn).unwrap();
            assert!(ApiToken::find_by_value(&conn, &token.value).is_err());
            Ok(())
        });
    }
}
