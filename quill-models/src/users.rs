use crate::{
    api_tokens::ApiToken,
    blog_users::BlogUser,
    blogs::Blog,
    db_conn::DbConn,
    schema::{api_tokens, blog_users, email_verifications, follows, notifications, post_notes, users},
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use rocket::{
    http::Status,
    request::{self, FromRequest, Request},
    Outcome,
};

pub mod theme {
    pub const LIGHT: &str = "light";
    pub const DARK: &str = "dark";

    pub fn is_valid(theme: &str) -> bool {
        theme == LIGHT || theme == DARK
    }
}

#[derive(Queryable, Identifiable, Clone, Debug, AsChangeset)]
#[changeset_options(treat_none_as_null = "true")]
pub struct User {
    pub id: i32,
    pub email: String,
    /// `None` for accounts created through an external identity provider
    pub hashed_password: Option<String>,
    pub email_verified: bool,
    pub theme: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser {
    pub email: String,
    pub hashed_password: Option<String>,
    pub email_verified: bool,
    pub theme: String,
}

impl NewUser {
    pub fn new_local(email: String, password: &str) -> Result<NewUser> {
        Ok(NewUser {
            email,
            hashed_password: Some(User::hash_pass(password)?),
            email_verified: false,
            theme: theme::LIGHT.to_owned(),
        })
    }
}

impl User {
    insert!(users, NewUser);
    get!(users);
    find_by!(users, find_by_email, email as &str);

    pub fn hash_pass(pass: &str) -> Result<String> {
        bcrypt::hash(pass, 10).map_err(Error::from)
    }

    pub fn auth(&self, password: &str) -> bool {
        self.hashed_password
            .as_ref()
            .map(|hash| bcrypt::verify(password, hash).unwrap_or(false))
            .unwrap_or(false)
    }

    pub fn login(conn: &Connection, email: &str, password: &str) -> Result<User> {
        match User::find_by_email(conn, email) {
            Ok(user) => {
                if user.auth(password) {
                    Ok(user)
                } else {
                    Err(Error::Unauthorized)
                }
            }
            Err(_) => {
                // if no user was found, fake-verify a password so that both
                // branches take roughly the same time
                if let Ok(other) = users::table.order_by(users::id.asc()).first::<User>(conn) {
                    if let Some(hash) = other.hashed_password {
                        let _ = bcrypt::verify(password, &hash);
                    }
                }
                Err(Error::Unauthorized)
            }
        }
    }

    pub fn reset_password(&self, conn: &Connection, pass: &str) -> Result<()> {
        diesel::update(self)
            .set(users::hashed_password.eq(User::hash_pass(pass)?))
            .execute(conn)?;
        Ok(())
    }

    pub fn change_password(&self, conn: &Connection, current: &str, new: &str) -> Result<()> {
        if !self.auth(current) {
            return Err(Error::Unauthorized);
        }
        self.reset_password(conn, new)
    }

    /// Changing the address resets the verification status, the new address
    /// has to be confirmed again.
    pub fn change_email(&self, conn: &Connection, current: &str, email: &str) -> Result<()> {
        if !self.auth(current) {
            return Err(Error::Unauthorized);
        }
        diesel::update(self)
            .set((users::email.eq(email), users::email_verified.eq(false)))
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    pub fn update_theme(&self, conn: &Connection, theme: &str) -> Result<()> {
        if !theme::is_valid(theme) {
            return Err(Error::InvalidValue);
        }
        diesel::update(self)
            .set(users::theme.eq(theme))
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    pub fn mark_email_verified(&self, conn: &Connection) -> Result<()> {
        diesel::update(self)
            .set(users::email_verified.eq(true))
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    pub fn primary_blog(&self, conn: &Connection) -> Result<Blog> {
        let blog_id = blog_users::table
            .filter(blog_users::user_id.eq(self.id))
            .filter(blog_users::is_primary.eq(true))
            .select(blog_users::blog_id)
            .first::<i32>(conn)?;
        Blog::get(conn, blog_id)
    }

    /// Removes the user and everything they own. Blogs left without any
    /// member are removed too.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        let blogs = Blog::find_for_member(conn, self)?;

        diesel::delete(api_tokens::table.filter(api_tokens::user_id.eq(self.id))).execute(conn)?;
        diesel::delete(
            email_verifications::table.filter(email_verifications::user_id.eq(self.id)),
        )
        .execute(conn)?;
        diesel::delete(follows::table.filter(follows::user_id.eq(self.id))).execute(conn)?;
        diesel::delete(post_notes::table.filter(post_notes::user_id.eq(self.id))).execute(conn)?;
        diesel::delete(notifications::table.filter(notifications::user_id.eq(self.id)))
            .execute(conn)?;
        diesel::delete(blog_users::table.filter(blog_users::user_id.eq(self.id))).execute(conn)?;

        for blog in blogs {
            if BlogUser::count_for_blog(conn, &blog)? == 0 {
                blog.delete(conn)?;
            }
        }

        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

impl<'a, 'r> FromRequest<'a, 'r> for User {
    type Error = ();

    fn from_request(request: &'a Request<'r>) -> request::Outcome<User, ()> {
        let conn = request.guard::<DbConn>()?;
        let token = request
            .guard::<ApiToken>()
            .map_failure(|(status, _)| (status, ()))?;
        match User::get(&*conn, token.user_id) {
            Ok(user) => Outcome::Success(user),
            Err(_) => Outcome::Failure((Status::Unauthorized, ())),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{tests::db, Connection as Conn};
    use diesel::Connection;

    pub(crate) fn fill_database(conn: &Conn) -> Vec<User> {
        vec![
            User::insert(
                conn,
                NewUser::new_local("admin@example.com".to_owned(), "my_password123").unwrap(),
            )
            .unwrap(),
            User::insert(
                conn,
                NewUser::new_local("user@example.com".to_owned(), "another_password").unwrap(),
            )
            .unwrap(),
            User::insert(
                conn,
                NewUser::new_local("other@example.com".to_owned(), "3rd_password").unwrap(),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn auth() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);

            assert!(users[0].auth("my_password123"));
            assert!(!users[0].auth("not_my_password"));
            assert_eq!(
                User::login(&conn, "admin@example.com", "my_password123")
                    .unwrap()
                    .id,
                users[0].id
            );
            assert!(matches!(
                User::login(&conn, "admin@example.com", "not_my_password"),
                Err(Error::Unauthorized)
            ));
            assert!(matches!(
                User::login(&conn, "ghost@example.com", "my_password123"),
                Err(Error::Unauthorized)
            ));
            Ok(())
        });
    }

    #[test]
    fn change_password() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);

            users[0]
                .change_password(&conn, "my_password123", "new_password")
                .unwrap();
            let user = User::get(&conn, users[0].id).unwrap();
            assert!(user.auth("new_password"));
            assert!(matches!(
                user.change_password(&conn, "wrong", "whatever"),
                Err(Error::Unauthorized)
            ));
            Ok(())
        });
    }

    #[test]
    fn change_email_resets_verification() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);

            users[0].mark_email_verified(&conn).unwrap();
            assert!(User::get(&conn, users[0].id).unwrap().email_verified);

            users[0]
                .change_email(&conn, "my_password123", "new@example.com")
                .unwrap();
            let user = User::get(&conn, users[0].id).unwrap();
            assert_eq!(user.email, "new@example.com");
            assert!(!user.email_verified);
            Ok(())
        });
    }

    #[test]
    fn theme() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let users = fill_database(&conn);

            users[0].update_theme(&conn, theme::DARK).unwrap();
            assert_eq!(User::get(&conn, users[0].id).unwrap().theme, theme::DARK);
            assert!(matches!(
                users[0].update_theme(&conn, "solarized"),
                Err(Error::InvalidValue)
            ));
            Ok(())
        });
    }
}
