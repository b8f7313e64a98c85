use chrono::NaiveDateTime;
use quill_api::{
    messages::{
        AnswerAskData, AskData, ConversationHeadData, InboxData, MessageData, NewAskData,
        NewMessageData, NewSubmissionData, SubmissionData,
    },
    posts::PostData,
};
use quill_models::{
    asks::Ask,
    blog_users::{BlogUser, Privilege},
    blogs::Blog,
    db_conn::DbConn,
    messages::Message,
    submissions::Submission,
    users::User,
    Connection, Result,
};
use rocket_contrib::json::Json;

use crate::api::{created, grant, ok, Api};

/// The latest message of every conversation one of the caller's blogs takes
/// part in, with its unread count.
#[get("/messaging/<blog_name>")]
pub fn heads(blog_name: String, user: User, conn: DbConn) -> Api<Vec<ConversationHeadData>> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;

    let mut heads = Vec::new();
    for (partner_id, last, unread) in Message::conversation_heads(&*conn, &blog)? {
        let partner = Blog::get(&*conn, partner_id)?;
        heads.push(ConversationHeadData {
            with_blog_id: partner.id,
            with_blog_name: partner.blog_name,
            last_message: last.to_api(),
            unread,
        });
    }
    ok(heads)
}

/// Reading a conversation marks the incoming messages read.
#[get("/messaging/conversation/<from>/<to>")]
pub fn conversation(from: String, to: String, user: User, conn: DbConn) -> Api<Vec<MessageData>> {
    let from = Blog::find_by_name(&*conn, &from)?;
    let to = Blog::find_by_name(&*conn, &to)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &from,
        Privilege::Contributor,
    )?)?;
    let messages = Message::conversation(&*conn, &from, &to)?
        .iter()
        .map(Message::to_api)
        .collect();
    ok(messages)
}

#[post("/messaging/conversation/<from>/<to>", data = "<payload>")]
pub fn send(
    from: String,
    to: String,
    payload: Json<NewMessageData>,
    user: User,
    conn: DbConn,
) -> Api<MessageData> {
    let from = Blog::find_by_name(&*conn, &from)?;
    let to = Blog::find_by_name(&*conn, &to)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &from,
        Privilege::Contributor,
    )?)?;
    let message = Message::send(&*conn, &from, &to, &payload.content)?;
    created(message.to_api())
}

#[delete("/messaging/conversation/<from>/<to>")]
pub fn delete_conversation(
    from: String,
    to: String,
    user: User,
    conn: DbConn,
) -> Api<serde_json::Value> {
    let from = Blog::find_by_name(&*conn, &from)?;
    let to = Blog::find_by_name(&*conn, &to)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &from,
        Privilege::Contributor,
    )?)?;
    Message::delete_conversation(&*conn, &from, &to)?;
    ok(json!(null))
}

/// Anonymous asks carry no sender and skip the block check; attributed ones
/// are sent as the caller's primary blog.
#[post("/blog/<blog_name>/ask", data = "<payload>")]
pub fn ask(blog_name: String, payload: Json<NewAskData>, user: User, conn: DbConn) -> Api<AskData> {
    let receiver = Blog::find_by_name(&*conn, &blog_name)?;
    let sender = if payload.anonymous {
        None
    } else {
        Some(user.primary_blog(&*conn)?)
    };
    let ask = Ask::create(&*conn, sender.as_ref(), &receiver, &payload.question)?;
    created(ask.to_api(&*conn)?)
}

#[post("/ask/<id>", data = "<payload>")]
pub fn answer_ask(id: i32, payload: Json<AnswerAskData>, user: User, conn: DbConn) -> Api<AskData> {
    let ask = Ask::get(&*conn, id)?;
    let receiver = Blog::get(&*conn, ask.receiver_id)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &receiver,
        Privilege::Contributor,
    )?)?;
    let ask = ask.answer(&*conn, &payload.answer)?;
    ok(ask.to_api(&*conn)?)
}

#[delete("/ask/<id>")]
pub fn delete_ask(id: i32, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let ask = Ask::get(&*conn, id)?;
    let receiver = Blog::get(&*conn, ask.receiver_id)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &receiver,
        Privilege::Contributor,
    )?)?;
    ask.delete(&*conn)?;
    ok(json!(null))
}

#[post("/blog/<blog_name>/submit", data = "<payload>")]
pub fn submit(
    blog_name: String,
    payload: Json<NewSubmissionData>,
    user: User,
    conn: DbConn,
) -> Api<SubmissionData> {
    let receiver = Blog::find_by_name(&*conn, &blog_name)?;
    let sender = user.primary_blog(&*conn)?;
    let submission =
        Submission::create(&*conn, &sender, &receiver, &payload.kind, &payload.content)?;
    created(submission.to_api(&*conn)?)
}

#[post("/submit/<id>")]
pub fn approve_submission(id: i32, user: User, conn: DbConn) -> Api<PostData> {
    let submission = Submission::get(&*conn, id)?;
    let receiver = Blog::get(&*conn, submission.receiver_id)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &receiver,
        Privilege::Contributor,
    )?)?;
    let post = submission.approve(&*conn)?;
    created(post.to_api(&*conn, Some(&user))?)
}

#[delete("/submit/<id>")]
pub fn delete_submission(id: i32, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let submission = Submission::get(&*conn, id)?;
    let receiver = Blog::get(&*conn, submission.receiver_id)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &receiver,
        Privilege::Contributor,
    )?)?;
    submission.delete(&*conn)?;
    ok(json!(null))
}

fn blog_inbox_data(conn: &Connection, blog: &Blog) -> Result<(Vec<(NaiveDateTime, AskData)>, Vec<(NaiveDateTime, SubmissionData)>)> {
    let mut asks = Vec::new();
    for ask in Ask::inbox_for_blog(conn, blog)? {
        asks.push((ask.creation_date, ask.to_api(conn)?));
    }
    let mut submissions = Vec::new();
    for submission in Submission::inbox_for_blog(conn, blog)? {
        submissions.push((submission.creation_date, submission.to_api(conn)?));
    }
    Ok((asks, submissions))
}

fn into_inbox(
    mut asks: Vec<(NaiveDateTime, AskData)>,
    mut submissions: Vec<(NaiveDateTime, SubmissionData)>,
) -> InboxData {
    asks.sort_by(|a, b| b.0.cmp(&a.0));
    submissions.sort_by(|a, b| b.0.cmp(&a.0));
    InboxData {
        asks: asks.into_iter().map(|(_, ask)| ask).collect(),
        submissions: submissions
            .into_iter()
            .map(|(_, submission)| submission)
            .collect(),
    }
}

/// Pending asks and submissions across every blog of the caller, newest
/// first.
#[get("/user/inbox")]
pub fn inbox(user: User, conn: DbConn) -> Api<InboxData> {
    let mut asks = Vec::new();
    let mut submissions = Vec::new();
    for blog in Blog::find_for_member(&*conn, &user)? {
        let (blog_asks, blog_submissions) = blog_inbox_data(&*conn, &blog)?;
        asks.extend(blog_asks);
        submissions.extend(blog_submissions);
    }
    ok(into_inbox(asks, submissions))
}

#[get("/user/inbox/<blog_name>")]
pub fn blog_inbox(blog_name: String, user: User, conn: DbConn) -> Api<InboxData> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;
    let (asks, submissions) = blog_inbox_data(&*conn, &blog)?;
    ok(into_inbox(asks, submissions))
}

#[delete("/user/inbox")]
pub fn clear_inbox(user: User, conn: DbConn) -> Api<serde_json::Value> {
    for blog in Blog::find_for_member(&*conn, &user)? {
        for ask in Ask::inbox_for_blog(&*conn, &blog)? {
            ask.delete(&*conn)?;
        }
        for submission in Submission::inbox_for_blog(&*conn, &blog)? {
            submission.delete(&*conn)?;
        }
    }
    ok(json!(null))
}
