/// Body of `POST /api/posts`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewPostData {
    pub blog_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    pub content: String,
    pub source_content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Body of `PUT /api/update/<blog_name>/<post_id>`. Full-replace semantics:
/// every field overwrites the stored one.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostData {
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    pub content: String,
    pub source_content: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostInfo {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    pub content: String,
    pub source_content: Option<String>,
    pub date: String,
    pub tags: Vec<String>,
    pub is_liked: bool,
    pub is_mine: bool,
    pub notes_count: i64,
}

/// The blog block attached to every post payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostBlogInfo {
    pub blog_id: i32,
    pub blog_name: String,
    pub avatar: String,
    pub avatar_shape: String,
    pub replies: String,
    pub follower: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostData {
    pub post: PostInfo,
    pub blog: PostBlogInfo,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PostsPage {
    pub posts: Vec<PostData>,
    pub next_url: Option<String>,
    pub total: i64,
    pub current_page: i32,
    pub posts_per_page: i32,
}
