#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewMessageData {
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageData {
    pub id: i32,
    pub sender_id: i32,
    pub receiver_id: i32,
    pub content: String,
    pub read: bool,
    pub date: String,
}

/// Latest message of each conversation a blog takes part in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationHeadData {
    pub with_blog_id: i32,
    pub with_blog_name: String,
    pub last_message: MessageData,
    pub unread: i64,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewAskData {
    pub question: String,
    #[serde(default)]
    pub anonymous: bool,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AnswerAskData {
    pub answer: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskData {
    pub id: i32,
    pub sender: Option<String>,
    pub question: String,
    pub answer: Option<String>,
    pub date: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewSubmissionData {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionData {
    pub id: i32,
    pub sender: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub date: String,
}

/// Asks and submissions pending on the caller's blogs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct InboxData {
    pub asks: Vec<AskData>,
    pub submissions: Vec<SubmissionData>,
}
