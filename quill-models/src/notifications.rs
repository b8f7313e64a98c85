use crate::{
    follows::Follow, post_notes::PostNote, posts::Post, schema::notifications, users::User,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use quill_api::notifications::NotificationData;

pub mod notification_kind {
    pub const ASK: &str = "ASK";
    pub const FOLLOW: &str = "FOLLOW";
    pub const LIKE: &str = "LIKE";
    pub const MESSAGE: &str = "MESSAGE";
    pub const REBLOG: &str = "REBLOG";
    pub const REPLY: &str = "REPLY";
    pub const SUBMISSION: &str = "SUBMISSION";
}

#[derive(Clone, Queryable, Identifiable)]
pub struct Notification {
    pub id: i32,
    pub user_id: i32,
    pub creation_date: NaiveDateTime,
    pub kind: String,
    pub object_id: i32,
}

#[derive(Insertable)]
#[table_name = "notifications"]
pub struct NewNotification {
    pub user_id: i32,
    pub kind: String,
    pub object_id: i32,
}

impl Notification {
    insert!(notifications, NewNotification);
    get!(notifications);

    pub fn find_for_user(conn: &Connection, user: &User) -> Result<Vec<Notification>> {
        notifications::table
            .filter(notifications::user_id.eq(user.id))
            .order_by(notifications::creation_date.desc())
            .load::<Notification>(conn)
            .map_err(Error::from)
    }

    pub fn count_for_user(conn: &Connection, user: &User) -> Result<i64> {
        notifications::table
            .filter(notifications::user_id.eq(user.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn page_for_user(
        conn: &Connection,
        user: &User,
        (min, max): (i32, i32),
    ) -> Result<Vec<Notification>> {
        notifications::table
            .filter(notifications::user_id.eq(user.id))
            .order_by(notifications::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Notification>(conn)
            .map_err(Error::from)
    }

    pub fn find<S: Into<String>>(conn: &Connection, kind: S, obj: i32) -> Result<Notification> {
        notifications::table
            .filter(notifications::kind.eq(kind.into()))
            .filter(notifications::object_id.eq(obj))
            .first::<Notification>(conn)
            .map_err(Error::from)
    }

    /// Removes every notification pointing at a deleted object.
    pub fn delete_for_object(conn: &Connection, kind: &str, obj: i32) -> Result<()> {
        diesel::delete(
            notifications::table
                .filter(notifications::kind.eq(kind))
                .filter(notifications::object_id.eq(obj)),
        )
        .execute(conn)
        .map(|_| ())
        .map_err(Error::from)
    }

    /// The post a notification is about, when it is about one.
    pub fn get_post(&self, conn: &Connection) -> Option<Post> {
        match self.kind.as_ref() {
            notification_kind::LIKE | notification_kind::REPLY | notification_kind::REBLOG => {
                PostNote::get(conn, self.object_id)
                    .and_then(|note| Post::get(conn, note.post_id))
                    .ok()
            }
            _ => None,
        }
    }

    /// The user who triggered this notification, when there is one.
    pub fn get_actor(&self, conn: &Connection) -> Result<User> {
        match self.kind.as_ref() {
            notification_kind::FOLLOW => {
                User::get(conn, Follow::get(conn, self.object_id)?.user_id)
            }
            notification_kind::LIKE | notification_kind::REPLY | notification_kind::REBLOG => {
                User::get(conn, PostNote::get(conn, self.object_id)?.user_id)
            }
            _ => Err(Error::NotFound),
        }
    }

    pub fn to_api(&self) -> NotificationData {
        NotificationData {
            id: self.id,
            kind: self.kind.clone(),
            object_id: self.object_id,
            date: self
                .creation_date
                .format("%A, %d-%b-%y %H:%M:%S UTC")
                .to_string(),
        }
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{post_notes::PostNote, posts::tests as post_tests, tests::db};
    use diesel::Connection;

    #[test]
    fn like_notification_resolves_post_and_actor() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, _, posts) = post_tests::fill_database(&conn);

            let note = PostNote::like(&conn, &users[2], &posts[0]).unwrap();
            let notif = Notification::find(&conn, notification_kind::LIKE, note.id).unwrap();

            assert_eq!(notif.get_post(&conn).unwrap().id, posts[0].id);
            assert_eq!(notif.get_actor(&conn).unwrap().id, users[2].id);
            Ok(())
        });
    }

    #[test]
    fn pages_are_newest_first() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, _, posts) = post_tests::fill_database(&conn);

            PostNote::like(&conn, &users[2], &posts[0]).unwrap();
            PostNote::reply(&conn, &users[2], &posts[0], "hello").unwrap();

            let count = Notification::count_for_user(&conn, &users[0]).unwrap();
            assert_eq!(count, 2);
            let page = Notification::page_for_user(&conn, &users[0], (0, 15)).unwrap();
            assert_eq!(page.len(), 2);
            assert!(page[0].creation_date >= page[1].creation_date);
            Ok(())
        });
    }
}
