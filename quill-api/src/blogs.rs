/// Body of `POST /api/blog`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewBlogData {
    pub blog_name: String,
    pub title: String,
    pub privacy: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlogData {
    pub id: i32,
    pub blog_name: String,
    pub title: String,
    pub privacy: String,
    pub avatar: String,
    pub avatar_shape: String,
    pub description: String,
    pub is_primary: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlogSettingsData {
    pub avatar: String,
    pub avatar_shape: String,
    pub description: String,
    pub replies: String,
}

/// Body of the block/unblock endpoints: the blog to (un)block.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BlockTargetData {
    pub blog_name: String,
}

/// One entry of a followers listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FollowerData {
    pub id: i32,
    pub blog_name: String,
    pub title: String,
    pub avatar: String,
    pub is_followed: bool,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct BlogsPage {
    pub blogs: Vec<BlogData>,
    pub next_url: Option<String>,
    pub total: i64,
    pub current_page: i32,
    pub posts_per_page: i32,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FollowersPage {
    pub followers: Vec<FollowerData>,
    pub next_url: Option<String>,
    pub total: i64,
    pub current_page: i32,
    pub posts_per_page: i32,
}
