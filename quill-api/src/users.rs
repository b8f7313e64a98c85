#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

/// Issued on login and register.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenData {
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserInfoData {
    pub id: i32,
    pub email: String,
    pub email_verified: bool,
    pub theme: String,
    pub primary_blog: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FollowBlogData {
    pub blog_name: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LikePostData {
    pub post_id: i32,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ReplyPostData {
    pub post_id: i32,
    pub content: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ReblogPostData {
    pub post_id: i32,
    pub blog_name: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ThemeData {
    pub theme: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ForgotPasswordData {
    pub email: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct VerifyEmailData {
    pub token: String,
}
