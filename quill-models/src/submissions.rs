use crate::{
    blocks::Block,
    blogs::Blog,
    notifications::{notification_kind, NewNotification, Notification},
    posts::{post_kind, post_state, NewPost, Post},
    schema::submissions,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};
use quill_api::messages::SubmissionData;

/// Content submitted to another blog, pending approval by its owner.
/// Approving turns it into a published post of the receiving blog.
#[derive(Clone, Queryable, Identifiable)]
pub struct Submission {
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub kind: String,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "submissions"]
pub struct NewSubmission {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub kind: String,
}

impl Submission {
    insert!(submissions, NewSubmission);
    get!(submissions);

    pub fn create(
        conn: &Connection,
        sender: &Blog,
        receiver: &Blog,
        kind: &str,
        content: &str,
    ) -> Result<Submission> {
        if !post_kind::is_valid(kind) {
            return Err(Error::InvalidValue);
        }
        if Block::exists_between(conn, sender.id, receiver.id)? {
            return Err(Error::Blocked);
        }
        let submission = Submission::insert(
            conn,
            NewSubmission {
                sender_id: sender.id,
                receiver_id: receiver.id,
                content: content.to_owned(),
                kind: kind.to_owned(),
            },
        )?;
        for member in receiver.list_members(conn)? {
            Notification::insert(
                conn,
                NewNotification {
                    kind: notification_kind::SUBMISSION.to_string(),
                    object_id: submission.id,
                    user_id: member.id,
                },
            )?;
        }
        Ok(submission)
    }

    /// Publishes the submission on the receiving blog and removes it from
    /// the inbox, atomically.
    pub fn approve(&self, conn: &Connection) -> Result<Post> {
        conn.transaction(|| {
            let post = Post::insert(
                conn,
                NewPost {
                    blog_id: self.receiver_id,
                    kind: self.kind.clone(),
                    state: post_state::PUBLISH.to_owned(),
                    content: self.content.clone(),
                    source_content: None,
                },
            )?;
            diesel::delete(self).execute(conn)?;
            Notification::delete_for_object(conn, notification_kind::SUBMISSION, self.id)?;
            Ok(post)
        })
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Notification::delete_for_object(conn, notification_kind::SUBMISSION, self.id)?;
        Ok(())
    }

    /// Pending submissions of a blog, newest first.
    pub fn inbox_for_blog(conn: &Connection, blog: &Blog) -> Result<Vec<Submission>> {
        submissions::table
            .filter(submissions::receiver_id.eq(blog.id))
            .order(submissions::creation_date.desc())
            .load::<Submission>(conn)
            .map_err(Error::from)
    }

    pub fn to_api(&self, conn: &Connection) -> Result<SubmissionData> {
        Ok(SubmissionData {
            id: self.id,
            sender: Blog::get(conn, self.sender_id)?.blog_name,
            kind: self.kind.clone(),
            content: self.content.clone(),
            date: self
                .creation_date
                .format("%A, %d-%b-%y %H:%M:%S UTC")
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blogs::tests as blog_tests, tests::db};
    use diesel::Connection;

    #[test]
    fn approve_creates_exactly_one_published_post() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            let submission = Submission::create(
                &conn,
                &blogs[1],
                &blogs[0],
                post_kind::TEXT,
                "<p>for your blog</p>",
            )
            .unwrap();

            let before = Post::count_for_blog(&conn, &blogs[0], Some(&users[0])).unwrap();
            let post = submission.approve(&conn).unwrap();
            let after = Post::count_for_blog(&conn, &blogs[0], Some(&users[0])).unwrap();

            assert_eq!(after, before + 1);
            assert_eq!(post.blog_id, blogs[0].id);
            assert_eq!(post.state, post_state::PUBLISH);
            assert!(Submission::get(&conn, submission.id).is_err());
            Ok(())
        });
    }

    #[test]
    fn invalid_kind_rejected() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            assert!(matches!(
                Submission::create(&conn, &blogs[1], &blogs[0], "essay", "x"),
                Err(Error::InvalidValue)
            ));
            Ok(())
        });
    }

    #[test]
    fn delete_clears_inbox() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            let submission =
                Submission::create(&conn, &blogs[1], &blogs[0], post_kind::TEXT, "x").unwrap();
            assert_eq!(
                Submission::inbox_for_blog(&conn, &blogs[0]).unwrap().len(),
                1
            );
            submission.delete(&conn).unwrap();
            assert!(Submission::inbox_for_blog(&conn, &blogs[0])
                .unwrap()
                .is_empty());
            Ok(())
        });
    }
}
