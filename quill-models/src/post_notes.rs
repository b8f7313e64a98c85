use crate::{
    blog_settings::replies_policy,
    blog_users::BlogUser,
    blogs::Blog,
    follows::Follow,
    notifications::{notification_kind, NewNotification, Notification},
    posts::{post_state, NewPost, Post},
    schema::{post_notes, posts},
    users::User,
    Connection, Error, Result, CONFIG,
};
use chrono::NaiveDateTime;
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};

pub mod note_kind {
    pub const LIKE: &str = "like";
    pub const REPLY: &str = "reply";
    pub const REBLOG: &str = "reblog";
}

/// One note on a post: a like, a reply or a reblog. Notes are what the
/// `notes_count` of a post counts.
#[derive(Clone, Queryable, Identifiable)]
pub struct PostNote {
    pub id: i32,
    pub user_id: i32,
    pub post_id: i32,
    pub kind: String,
    pub content: Option<String>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "post_notes"]
pub struct NewPostNote {
    pub user_id: i32,
    pub post_id: i32,
    pub kind: String,
    pub content: Option<String>,
}

impl PostNote {
    insert!(post_notes, NewPostNote);
    get!(post_notes);
    list_by!(post_notes, for_post, post_id as i32);

    pub fn find_like(conn: &Connection, user_id: i32, post_id: i32) -> Result<PostNote> {
        post_notes::table
            .filter(post_notes::user_id.eq(user_id))
            .filter(post_notes::post_id.eq(post_id))
            .filter(post_notes::kind.eq(note_kind::LIKE))
            .first(conn)
            .map_err(Error::from)
    }

    /// A second like of the same post is a `Conflict`; the partial unique
    /// index backs this check under concurrent requests.
    pub fn like(conn: &Connection, user: &User, post: &Post) -> Result<PostNote> {
        if PostNote::find_like(conn, user.id, post.id).is_ok() {
            return Err(Error::Conflict);
        }
        let note = PostNote::insert(
            conn,
            NewPostNote {
                user_id: user.id,
                post_id: post.id,
                kind: note_kind::LIKE.to_owned(),
                content: None,
            },
        )?;
        note.notify(conn, notification_kind::LIKE)?;
        Ok(note)
    }

    /// Unliking a post that was never liked reports `NotFound`.
    pub fn unlike(conn: &Connection, user: &User, post: &Post) -> Result<()> {
        let note = PostNote::find_like(conn, user.id, post.id)?;
        diesel::delete(&note).execute(conn)?;
        Notification::delete_for_object(conn, notification_kind::LIKE, note.id)?;
        Ok(())
    }

    /// Replies respect the reply policy of the blog: everyone, only blogs the
    /// author follows back, or members only.
    pub fn reply(conn: &Connection, user: &User, post: &Post, content: &str) -> Result<PostNote> {
        let blog = post.get_blog(conn)?;
        let settings = blog.settings(conn)?;
        let member = BlogUser::find_for_user_on_blog(conn, user.id, blog.id).is_ok();
        let allowed = match settings.replies.as_str() {
            replies_policy::EVERYONE => true,
            replies_policy::FOLLOWING => member || Follow::find(conn, user.id, blog.id).is_ok(),
            _ => member,
        };
        if !allowed {
            return Err(Error::Forbidden);
        }
        let note = PostNote::insert(
            conn,
            NewPostNote {
                user_id: user.id,
                post_id: post.id,
                kind: note_kind::REPLY.to_owned(),
                content: Some(content.to_owned()),
            },
        )?;
        note.notify(conn, notification_kind::REPLY)?;
        Ok(note)
    }

    /// Reblogging records a note on the original and publishes a copy on the
    /// target blog, pointing back at the original post.
    pub fn reblog(conn: &Connection, user: &User, post: &Post, to_blog: &Blog) -> Result<Post> {
        conn.transaction(|| {
            let note = PostNote::insert(
                conn,
                NewPostNote {
                    user_id: user.id,
                    post_id: post.id,
                    kind: note_kind::REBLOG.to_owned(),
                    content: None,
                },
            )?;
            let copy = Post::insert(
                conn,
                NewPost {
                    blog_id: to_blog.id,
                    kind: post.kind.clone(),
                    state: post_state::PUBLISH.to_owned(),
                    content: post.content.clone(),
                    source_content: Some(format!("{}/posts/{}", CONFIG.base_url, post.id)),
                },
            )?;
            note.notify(conn, notification_kind::REBLOG)?;
            Ok(copy)
        })
    }

    /// Posts the user liked, most recently liked first.
    pub fn liked_posts(conn: &Connection, user: &User) -> Result<Vec<Post>> {
        let liked_ids = post_notes::table
            .filter(post_notes::user_id.eq(user.id))
            .filter(post_notes::kind.eq(note_kind::LIKE))
            .order((post_notes::creation_date.desc(), post_notes::id.desc()))
            .select(post_notes::post_id)
            .load::<i32>(conn)?;
        let mut loaded = posts::table
            .filter(posts::id.eq_any(&liked_ids))
            .load::<Post>(conn)?;
        loaded.sort_by_key(|post| liked_ids.iter().position(|id| *id == post.id));
        Ok(loaded)
    }

    fn notify(&self, conn: &Connection, kind: &str) -> Result<()> {
        let post = Post::get(conn, self.post_id)?;
        for member in post.get_blog(conn)?.list_members(conn)? {
            if member.id == self.user_id {
                continue;
            }
            Notification::insert(
                conn,
                NewNotification {
                    kind: kind.to_string(),
                    object_id: self.id,
                    user_id: member.id,
                },
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blog_settings::BlogSetting, posts::tests as post_tests, tests::db,
    };
    use diesel::Connection;

    #[test]
    fn like_twice_conflicts() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, _, posts) = post_tests::fill_database(&conn);

            PostNote::like(&conn, &users[2], &posts[0]).unwrap();
            assert!(matches!(
                PostNote::like(&conn, &users[2], &posts[0]),
                Err(Error::Conflict)
            ));
            assert!(posts[0].is_liked(&conn, &users[2]).unwrap());
            assert_eq!(posts[0].notes_count(&conn).unwrap(), 1);
            Ok(())
        });
    }

    #[test]
    fn unlike_without_like_is_not_found() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, _, posts) = post_tests::fill_database(&conn);

            assert!(matches!(
                PostNote::unlike(&conn, &users[2], &posts[0]),
                Err(Error::NotFound)
            ));

            PostNote::like(&conn, &users[2], &posts[0]).unwrap();
            PostNote::unlike(&conn, &users[2], &posts[0]).unwrap();
            assert!(!posts[0].is_liked(&conn, &users[2]).unwrap());
            Ok(())
        });
    }

    #[test]
    fn reply_policies() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs, posts) = post_tests::fill_database(&conn);

            // default policy: everyone
            PostNote::reply(&conn, &users[2], &posts[0], "nice!").unwrap();

            let mut settings = BlogSetting::find_for_blog(&conn, blogs[0].id).unwrap();
            settings.replies = replies_policy::NOBODY.to_owned();
            settings.save(&conn).unwrap();

            assert!(matches!(
                PostNote::reply(&conn, &users[2], &posts[0], "me again"),
                Err(Error::Forbidden)
            ));
            // members still can
            PostNote::reply(&conn, &users[0], &posts[0], "thanks!").unwrap();
            Ok(())
        });
    }

    #[test]
    fn reblog_creates_copy_and_note() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs, posts) = post_tests::fill_database(&conn);

            let copy = PostNote::reblog(&conn, &users[2], &posts[0], &blogs[2]).unwrap();
            assert_eq!(copy.blog_id, blogs[2].id);
            assert_eq!(copy.content, posts[0].content);
            assert!(copy
                .source_content
                .as_ref()
                .unwrap()
                .ends_with(&format!("/posts/{}", posts[0].id)));
            assert_eq!(posts[0].notes_count(&conn).unwrap(), 1);
            Ok(())
        });
    }

    #[test]
    fn liked_posts_newest_first() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, _, posts) = post_tests::fill_database(&conn);

            PostNote::like(&conn, &users[2], &posts[0]).unwrap();
            PostNote::like(&conn, &users[2], &posts[2]).unwrap();

            let liked = PostNote::liked_posts(&conn, &users[2]).unwrap();
            assert_eq!(liked.len(), 2);
            // the most recent like comes first
            assert_eq!(liked[0].id, posts[2].id);
            Ok(())
        });
    }
}
