use crate::{
    blocks::Block,
    blogs::Blog,
    notifications::{notification_kind, NewNotification, Notification},
    schema::{blogs, follows},
    users::User,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

#[derive(Clone, Queryable, Identifiable)]
pub struct Follow {
    pub id: i32,
    pub user_id: i32,
    pub blog_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "follows"]
pub struct NewFollow {
    pub user_id: i32,
    pub blog_id: i32,
}

impl Follow {
    insert!(follows, NewFollow);
    get!(follows);

    pub fn find(conn: &Connection, user_id: i32, blog_id: i32) -> Result<Follow> {
        follows::table
            .filter(follows::user_id.eq(user_id))
            .filter(follows::blog_id.eq(blog_id))
            .first(conn)
            .map_err(Error::from)
    }

    /// Creates the follow edge. Fails with `Conflict` when it already exists
    /// and with `Blocked` when either party blocked the other; the unique
    /// index on `(user_id, blog_id)` backs the existence check under
    /// concurrent requests.
    pub fn follow(conn: &Connection, user: &User, blog: &Blog) -> Result<Follow> {
        if Follow::find(conn, user.id, blog.id).is_ok() {
            return Err(Error::Conflict);
        }
        if let Ok(primary) = user.primary_blog(conn) {
            if Block::exists_between(conn, blog.id, primary.id)? {
                return Err(Error::Blocked);
            }
        }
        let follow = Follow::insert(
            conn,
            NewFollow {
                user_id: user.id,
                blog_id: blog.id,
            },
        )?;
        follow.notify(conn)?;
        Ok(follow)
    }

    /// Removing an edge that does not exist reports `NotFound`.
    pub fn unfollow(conn: &Connection, user: &User, blog: &Blog) -> Result<()> {
        let follow = Follow::find(conn, user.id, blog.id)?;
        diesel::delete(&follow).execute(conn)?;
        Notification::delete_for_object(conn, notification_kind::FOLLOW, follow.id)?;
        Ok(())
    }

    fn notify(&self, conn: &Connection) -> Result<()> {
        let blog = Blog::get(conn, self.blog_id)?;
        for member in blog.list_members(conn)? {
            if member.id == self.user_id {
                continue;
            }
            Notification::insert(
                conn,
                NewNotification {
                    kind: notification_kind::FOLLOW.to_string(),
                    object_id: self.id,
                    user_id: member.id,
                },
            )?;
        }
        Ok(())
    }

    pub fn count_following(conn: &Connection, user: &User) -> Result<i64> {
        follows::table
            .filter(follows::user_id.eq(user.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Blogs the user follows, oldest follow first.
    pub fn following_page(
        conn: &Connection,
        user: &User,
        (min, max): (i32, i32),
    ) -> Result<Vec<Blog>> {
        let blog_ids = follows::table
            .filter(follows::user_id.eq(user.id))
            .select(follows::blog_id);
        blogs::table
            .filter(blogs::id.eq_any(blog_ids))
            .order(blogs::id.asc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Blog>(conn)
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blogs::tests as blog_tests, tests::db};
    use diesel::Connection;

    #[test]
    fn follow_twice_conflicts() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            Follow::follow(&conn, &users[2], &blogs[0]).unwrap();
            assert!(matches!(
                Follow::follow(&conn, &users[2], &blogs[0]),
                Err(Error::Conflict)
            ));
            assert_eq!(
                follows::table
                    .filter(follows::user_id.eq(users[2].id))
                    .filter(follows::blog_id.eq(blogs[0].id))
                    .count()
                    .get_result::<i64>(&*conn)
                    .unwrap(),
                1
            );
            Ok(())
        });
    }

    #[test]
    fn follow_blocked_fails() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            // blogs[0] (users[0]'s) blocks users[2]'s primary blog; users[2]
            // can no longer follow blogs[0]
            Block::block(&conn, &blogs[0], &blogs[2]).unwrap();
            assert!(matches!(
                Follow::follow(&conn, &users[2], &blogs[0]),
                Err(Error::Blocked)
            ));
            Ok(())
        });
    }

    #[test]
    fn unfollow_without_edge_is_not_found() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            assert!(matches!(
                Follow::unfollow(&conn, &users[2], &blogs[0]),
                Err(Error::NotFound)
            ));

            Follow::follow(&conn, &users[2], &blogs[0]).unwrap();
            Follow::unfollow(&conn, &users[2], &blogs[0]).unwrap();
            assert!(Follow::find(&conn, users[2].id, blogs[0].id).is_err());
            Ok(())
        });
    }

    #[test]
    fn follow_notifies_members() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            let follow = Follow::follow(&conn, &users[2], &blogs[0]).unwrap();
            for member in &[&users[0], &users[1]] {
                assert!(Notification::find_for_user(&conn, member)
                    .unwrap()
                    .iter()
                    .any(|n| {
                        n.kind == notification_kind::FOLLOW && n.object_id == follow.id
                    }));
            }
            Ok(())
        });
    }

    #[test]
    fn following_page() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            Follow::follow(&conn, &users[2], &blogs[0]).unwrap();
            Follow::follow(&conn, &users[2], &blogs[1]).unwrap();

            assert_eq!(Follow::count_following(&conn, &users[2]).unwrap(), 2);
            let followed = Follow::following_page(&conn, &users[2], (0, 15)).unwrap();
            assert_eq!(followed.len(), 2);
            assert_eq!(followed[0].id, blogs[0].id);
            Ok(())
        });
    }
}
