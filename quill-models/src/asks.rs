use crate::{
    blocks::Block,
    blogs::Blog,
    notifications::{notification_kind, NewNotification, Notification},
    schema::asks,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use quill_api::messages::AskData;

/// A question directed at a blog, waiting in its inbox until it is answered
/// or discarded. Anonymous asks carry no sender.
#[derive(Clone, Queryable, Identifiable)]
pub struct Ask {
    pub id: i32,
    pub sender_id: Option<i32>,
    pub receiver_id: i32,
    pub question: String,
    pub answer: Option<String>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "asks"]
pub struct NewAsk {
    pub sender_id: Option<i32>,
    pub receiver_id: i32,
    pub question: String,
}

impl Ask {
    insert!(asks, NewAsk);
    get!(asks);

    pub fn create(
        conn: &Connection,
        sender: Option<&Blog>,
        receiver: &Blog,
        question: &str,
    ) -> Result<Ask> {
        if let Some(sender) = sender {
            if Block::exists_between(conn, sender.id, receiver.id)? {
                return Err(Error::Blocked);
            }
        }
        let ask = Ask::insert(
            conn,
            NewAsk {
                sender_id: sender.map(|blog| blog.id),
                receiver_id: receiver.id,
                question: question.to_owned(),
            },
        )?;
        for member in receiver.list_members(conn)? {
            Notification::insert(
                conn,
                NewNotification {
                    kind: notification_kind::ASK.to_string(),
                    object_id: ask.id,
                    user_id: member.id,
                },
            )?;
        }
        Ok(ask)
    }

    /// An ask can be answered once; answering again is a `Conflict`.
    pub fn answer(&self, conn: &Connection, answer: &str) -> Result<Ask> {
        if self.answer.is_some() {
            return Err(Error::Conflict);
        }
        diesel::update(self)
            .set(asks::answer.eq(answer))
            .execute(conn)?;
        Ask::get(conn, self.id)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self).execute(conn)?;
        Notification::delete_for_object(conn, notification_kind::ASK, self.id)?;
        Ok(())
    }

    /// Unanswered asks of a blog, newest first.
    pub fn inbox_for_blog(conn: &Connection, blog: &Blog) -> Result<Vec<Ask>> {
        asks::table
            .filter(asks::receiver_id.eq(blog.id))
            .filter(asks::answer.is_null())
            .order(asks::creation_date.desc())
            .load::<Ask>(conn)
            .map_err(Error::from)
    }

    pub fn to_api(&self, conn: &Connection) -> Result<AskData> {
        let sender = match self.sender_id {
            Some(id) => Some(Blog::get(conn, id)?.blog_name),
            None => None,
        };
        Ok(AskData {
            id: self.id,
            sender,
            question: self.question.clone(),
            answer: self.answer.clone(),
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
    fn ask_answer_once() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            let ask = Ask::create(&conn, Some(&blogs[1]), &blogs[0], "why rust?").unwrap();
            assert_eq!(Ask::inbox_for_blog(&conn, &blogs[0]).unwrap().len(), 1);

            let answered = ask.answer(&conn, "because").unwrap();
            assert_eq!(answered.answer.as_deref(), Some("because"));
            assert!(matches!(
                answered.answer(&conn, "again"),
                Err(Error::Conflict)
            ));
            // answered asks leave the inbox
            assert!(Ask::inbox_for_blog(&conn, &blogs[0]).unwrap().is_empty());
            Ok(())
        });
    }

    #[test]
    fn anonymous_ask_has_no_sender() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            let ask = Ask::create(&conn, None, &blogs[0], "guess who").unwrap();
            assert!(ask.sender_id.is_none());
            assert!(ask.to_api(&conn).unwrap().sender.is_none());
            Ok(())
        });
    }

    #[test]
    fn blocked_sender_cannot_ask() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            Block::block(&conn, &blogs[0], &blogs[1]).unwrap();
            assert!(matches!(
                Ask::create(&conn, Some(&blogs[1]), &blogs[0], "hello?"),
                Err(Error::Blocked)
            ));
            Ok(())
        });
    }
}
