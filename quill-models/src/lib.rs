#![allow(clippy::too_many_arguments)]

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;
#[cfg(test)]
#[macro_use]
extern crate diesel_migrations;

use diesel::result::DatabaseErrorKind;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type Connection = diesel::PgConnection;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type Connection = diesel::SqliteConnection;

/// All the possible errors that can be encountered in this crate
#[derive(Debug)]
pub enum Error {
    Blocked,
    Conflict,
    Db(diesel::result::Error),
    Expired,
    Forbidden,
    InvalidToken,
    InvalidValue,
    NotFound,
    Password,
    Unauthorized,
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Error::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::Conflict
            }
            e => Error::Db(e),
        }
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(_: bcrypt::BcryptError) -> Self {
        Error::Password
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Adds a function to a model, to retrieve an instance by a given column
///
/// # Usage
///
/// `find_by!(model_table, name_of_the_function, column1 as String, column2 as i32);`
macro_rules! find_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Self> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// List all rows of a model, filtered by one or more columns
macro_rules! list_by {
    ($table:ident, $fn:ident, $($col:ident as $type:ty),+) => {
        pub fn $fn(conn: &crate::Connection, $($col: $type),+) -> Result<Vec<Self>> {
            $table::table
                $(.filter($table::$col.eq($col)))+
                .load::<Self>(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to retrieve an instance by its id
macro_rules! get {
    ($table:ident) => {
        pub fn get(conn: &crate::Connection, id: i32) -> Result<Self> {
            $table::table
                .filter($table::id.eq(id))
                .first(conn)
                .map_err(Error::from)
        }
    };
}

/// Adds a function to a model to insert a new instance
macro_rules! insert {
    ($table:ident, $from:ty) => {
        insert!($table, $from, |x, _conn| Ok(x));
    };
    ($table:ident, $from:ty, |$val:ident, $conn:ident| $after:block) => {
        last!($table);
        pub fn insert(conn: &crate::Connection, new: $from) -> Result<Self> {
            diesel::insert_into($table::table)
                .values(new)
                .execute(conn)?;
            #[allow(unused_mut)]
            let mut $val = Self::last(conn)?;
            let $conn = conn;
            $after
        }
    };
}

/// Returns the last row of a table.
///
/// Mostly useful after an insert, to retrieve the inserted row.
macro_rules! last {
    ($table:ident) => {
        pub fn last(conn: &crate::Connection) -> Result<Self> {
            $table::table
                .order_by($table::id.desc())
                .first(conn)
                .map_err(Error::from)
        }
    };
}

pub const ITEMS_PER_PAGE: i32 = 15;

lazy_static! {
    pub static ref CONFIG: config::Config = config::Config::default();
}

pub mod api_tokens;
pub mod asks;
pub mod blocks;
pub mod blog_settings;
pub mod blog_users;
pub mod blogs;
pub mod config;
pub mod db_conn;
pub mod email_verifications;
pub mod follows;
pub mod messages;
pub mod notifications;
pub mod password_reset_requests;
pub mod post_notes;
pub mod posts;
pub mod schema;
pub mod submissions;
pub mod tags;
pub mod users;
