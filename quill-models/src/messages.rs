use crate::{
    blocks::Block,
    blogs::Blog,
    notifications::{notification_kind, NewNotification, Notification},
    schema::messages,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, BoolExpressionMethods, ExpressionMethods, QueryDsl, RunQueryDsl};
use quill_api::messages::MessageData;

/// A direct message between two blogs.
#[derive(Clone, Queryable, Identifiable)]
pub struct Message {
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub read: bool,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "messages"]
pub struct NewMessage {
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub read: bool,
}

impl Message {
    insert!(messages, NewMessage);
    get!(messages);

    pub fn send(conn: &Connection, from: &Blog, to: &Blog, content: &str) -> Result<Message> {
        if Block::exists_between(conn, from.id, to.id)? {
            return Err(Error::Blocked);
        }
        let message = Message::insert(
            conn,
            NewMessage {
                sender_id: from.id,
                receiver_id: to.id,
                content: content.to_owned(),
                read: false,
            },
        )?;
        for member in to.list_members(conn)? {
            Notification::insert(
                conn,
                NewNotification {
                    kind: notification_kind::MESSAGE.to_string(),
                    object_id: message.id,
                    user_id: member.id,
                },
            )?;
        }
        Ok(message)
    }

    /// Both sides of a conversation, oldest first. Messages addressed to
    /// `viewer` are marked read on the way out.
    pub fn conversation(conn: &Connection, viewer: &Blog, other: &Blog) -> Result<Vec<Message>> {
        diesel::update(
            messages::table
                .filter(messages::sender_id.eq(other.id))
                .filter(messages::receiver_id.eq(viewer.id))
                .filter(messages::read.eq(false)),
        )
        .set(messages::read.eq(true))
        .execute(conn)?;

        messages::table
            .filter(
                messages::sender_id
                    .eq(viewer.id)
                    .and(messages::receiver_id.eq(other.id))
                    .or(messages::sender_id
                        .eq(other.id)
                        .and(messages::receiver_id.eq(viewer.id))),
            )
            .order(messages::creation_date.asc())
            .load::<Message>(conn)
            .map_err(Error::from)
    }

    pub fn delete_conversation(conn: &Connection, viewer: &Blog, other: &Blog) -> Result<()> {
        diesel::delete(
            messages::table.filter(
                messages::sender_id
                    .eq(viewer.id)
                    .and(messages::receiver_id.eq(other.id))
                    .or(messages::sender_id
                        .eq(other.id)
                        .and(messages::receiver_id.eq(viewer.id))),
            ),
        )
        .execute(conn)
        .map(|_| ())
        .map_err(Error::from)
    }

    /// The latest message of every conversation this blog takes part in,
    /// newest conversation first, with its unread count.
    pub fn conversation_heads(
        conn: &Connection,
        blog: &Blog,
    ) -> Result<Vec<(i32, Message, i64)>> {
        let all = messages::table
            .filter(
                messages::sender_id
                    .eq(blog.id)
                    .or(messages::receiver_id.eq(blog.id)),
            )
            .order(messages::creation_date.desc())
            .load::<Message>(conn)?;

        let mut heads: Vec<(i32, Message, i64)> = Vec::new();
        for message in all {
            let partner = if message.sender_id == blog.id {
                message.receiver_id
            } else {
                message.sender_id
            };
            let incoming_unread =
                message.receiver_id == blog.id && !message.read;
            match heads.iter_mut().find(|(p, _, _)| *p == partner) {
                Some((_, _, unread)) => {
                    if incoming_unread {
                        *unread += 1;
                    }
                }
                None => heads.push((partner, message, if incoming_unread { 1 } else { 0 })),
            }
        }
        Ok(heads)
    }

    pub fn to_api(&self) -> MessageData {
        MessageData {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content.clone(),
            read: self.read,
            date: self
                .creation_date
                .format("%A, %d-%b-%y %H:%M:%S UTC")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blogs::tests as blog_tests, tests::db};
    use diesel::Connection;

    #[test]
    fn send_and_read_conversation() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            Message::send(&conn, &blogs[0], &blogs[1], "hey").unwrap();
            Message::send(&conn, &blogs[1], &blogs[0], "hey yourself").unwrap();

            let seen_by_first = Message::conversation(&conn, &blogs[0], &blogs[1]).unwrap();
            assert_eq!(seen_by_first.len(), 2);
            assert_eq!(seen_by_first[0].content, "hey");
            // the incoming message is now read
            assert!(seen_by_first[1].read);
            Ok(())
        });
    }

    #[test]
    fn send_blocked_fails() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            Block::block(&conn, &blogs[1], &blogs[0]).unwrap();
            assert!(matches!(
                Message::send(&conn, &blogs[0], &blogs[1], "let me in"),
                Err(Error::Blocked)
            ));
            Ok(())
        });
    }

    #[test]
    fn conversation_heads_fold() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            Message::send(&conn, &blogs[1], &blogs[0], "one").unwrap();
            Message::send(&conn, &blogs[1], &blogs[0], "two").unwrap();
            Message::send(&conn, &blogs[2], &blogs[0], "hello").unwrap();

            let heads = Message::conversation_heads(&conn, &blogs[0]).unwrap();
            assert_eq!(heads.len(), 2);
            let with_second = heads
                .iter()
                .find(|(partner, _, _)| *partner == blogs[1].id)
                .unwrap();
            assert_eq!(with_second.2, 2);
            Ok(())
        });
    }

    #[test]
    fn delete_conversation_removes_both_sides() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            Message::send(&conn, &blogs[0], &blogs[1], "a").unwrap();
            Message::send(&conn, &blogs[1], &blogs[0], "b").unwrap();
            Message::delete_conversation(&conn, &blogs[0], &blogs[1]).unwrap();
            assert!(Message::conversation(&conn, &blogs[0], &blogs[1])
                .unwrap()
                .is_empty());
            Ok(())
        });
    }
}
