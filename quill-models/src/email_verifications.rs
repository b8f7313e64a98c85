use crate::{schema::email_verifications, users::User, Connection, Error, Result};
use chrono::{offset::Utc, Duration, NaiveDateTime};
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Clone, Identifiable, Queryable)]
pub struct EmailVerification {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub expiration_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "email_verifications"]
pub struct NewEmailVerification {
    pub user_id: i32,
    pub token: String,
    pub expiration_date: NaiveDateTime,
}

const TOKEN_VALIDITY_HOURS: i64 = 24;

impl EmailVerification {
    /// Issues a fresh verification token for the user, replacing any
    /// previous one.
    pub fn insert(conn: &Connection, user: &User) -> Result<String> {
        diesel::delete(
            email_verifications::table.filter(email_verifications::user_id.eq(user.id)),
        )
        .execute(conn)?;

        let token = quill_common::utils::random_hex();
        let expiration_date = Utc::now()
            .naive_utc()
            .checked_add_signed(Duration::hours(TOKEN_VALIDITY_HOURS))
            .expect("could not calculate expiration date");
        diesel::insert_into(email_verifications::table)
            .values(NewEmailVerification {
                user_id: user.id,
                token: token.clone(),
                expiration_date,
            })
            .execute(conn)
            .map_err(Error::from)?;

        Ok(token)
    }

    /// Consumes the token and flips the user to verified. Single use.
    pub fn verify(conn: &Connection, token: &str) -> Result<User> {
        let verification = email_verifications::table
            .filter(email_verifications::token.eq(token))
            .first::<Self>(conn)
            .map_err(|_| Error::InvalidToken)?;

        if verification.expiration_date < Utc::now().naive_utc() {
            return Err(Error::Expired);
        }

        let user = User::get(conn, verification.user_id)?;
        user.mark_email_verified(conn)?;
        diesel::delete(
            email_verifications::table.filter(email_verifications::id.eq(verification.id)),
        )
        .execute(conn)?;
        Ok(user)
    }
}
