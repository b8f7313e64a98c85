use quill_api::blogs::{
    BlockTargetData, BlogData, BlogSettingsData, FollowerData, FollowersPage, NewBlogData,
};
use quill_models::{
    blocks::Block,
    blog_users::{BlogUser, Privilege},
    blogs::{privacy, Blog, NewBlog},
    db_conn::DbConn,
    follows::Follow,
    users::User,
    Connection, Error, Result, ITEMS_PER_PAGE,
};
use rocket_contrib::json::Json;

use crate::api::{created, grant, next_url, ok, Api, ApiError, Page};

pub(crate) fn to_blog_data(conn: &Connection, blog: &Blog, user: &User) -> Result<BlogData> {
    let settings = blog.settings(conn)?;
    let is_primary = BlogUser::find_for_user_on_blog(conn, user.id, blog.id)
        .map(|membership| membership.is_primary)
        .unwrap_or(false);
    Ok(BlogData {
        id: blog.id,
        blog_name: blog.blog_name.clone(),
        title: blog.title.clone(),
        privacy: blog.privacy.clone(),
        avatar: settings.avatar,
        avatar_shape: settings.avatar_shape,
        description: settings.description,
        is_primary,
    })
}

/// A taken name answers 422, not 409: the client treats it like any other
/// invalid field on the creation form.
#[post("/blog", data = "<payload>")]
pub fn create(payload: Json<NewBlogData>, user: User, conn: DbConn) -> Api<BlogData> {
    let privacy = payload
        .privacy
        .clone()
        .unwrap_or_else(|| privacy::PUBLIC.to_owned());
    if privacy == privacy::PASSWORD && payload.password.is_none() {
        return Err(ApiError::unprocessable(
            "A password is required for password-protected blogs",
        ));
    }
    let blog = Blog::create(
        &*conn,
        NewBlog {
            blog_name: payload.blog_name.clone(),
            title: payload.title.clone(),
            privacy,
            password: payload.password.clone(),
        },
        &user,
    )
    .map_err(|err| match err {
        Error::Conflict => ApiError::unprocessable("Blog name already taken"),
        err => err.into(),
    })?;
    created(to_blog_data(&*conn, &blog, &user)?)
}

#[get("/user/blogs")]
pub fn my_blogs(user: User, conn: DbConn) -> Api<Vec<BlogData>> {
    let blogs = Blog::find_for_member(&*conn, &user)?
        .iter()
        .map(|blog| to_blog_data(&*conn, blog, &user))
        .collect::<Result<Vec<BlogData>>>()?;
    ok(blogs)
}

#[delete("/blog/<blog_name>")]
pub fn delete(blog_name: String, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(&*conn, &user, &blog, Privilege::Full)?)?;
    blog.delete(&*conn)?;
    ok(json!(null))
}

#[get("/blog/<blog_name>/settings")]
pub fn settings(blog_name: String, user: User, conn: DbConn) -> Api<BlogSettingsData> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;
    let settings = blog.settings(&*conn)?;
    ok(BlogSettingsData {
        avatar: settings.avatar,
        avatar_shape: settings.avatar_shape,
        description: settings.description,
        replies: settings.replies,
    })
}

#[put("/blog/<blog_name>/settings", data = "<payload>")]
pub fn save_settings(
    blog_name: String,
    payload: Json<BlogSettingsData>,
    user: User,
    conn: DbConn,
) -> Api<BlogSettingsData> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(&*conn, &user, &blog, Privilege::Full)?)?;

    let mut settings = blog.settings(&*conn)?;
    settings.avatar = payload.avatar.clone();
    settings.avatar_shape = payload.avatar_shape.clone();
    settings.description = payload.description.clone();
    settings.replies = payload.replies.clone();
    settings.save(&*conn)?;
    ok(payload.into_inner())
}

/// Followers are presented through their primary blog; accounts without one
/// are left out.
#[get("/blog/<blog_name>/followers?<page>")]
pub fn followers(
    blog_name: String,
    page: Option<Page>,
    user: User,
    conn: DbConn,
) -> Api<FollowersPage> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;

    let page = page.unwrap_or_default();
    let mut followers = Vec::new();
    for follower in blog.followers_page(&*conn, page.limits())? {
        let follower_blog = match follower.primary_blog(&*conn) {
            Ok(blog) => blog,
            Err(Error::NotFound) => continue,
            Err(err) => return Err(err.into()),
        };
        let settings = follower_blog.settings(&*conn)?;
        followers.push(FollowerData {
            id: follower.id,
            blog_name: follower_blog.blog_name,
            title: follower_blog.title,
            avatar: settings.avatar,
            is_followed: Follow::find(&*conn, user.id, follower_blog.id).is_ok(),
        });
    }
    let total = blog.count_followers(&*conn)?;
    ok(FollowersPage {
        followers,
        next_url: next_url(
            &format!("/api/blog/{}/followers", blog.blog_name),
            page,
            total,
        ),
        total,
        current_page: page.number(),
        posts_per_page: ITEMS_PER_PAGE,
    })
}

#[post("/blog/<blog_name>/block", data = "<payload>")]
pub fn block(
    blog_name: String,
    payload: Json<BlockTargetData>,
    user: User,
    conn: DbConn,
) -> Api<serde_json::Value> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(&*conn, &user, &blog, Privilege::Full)?)?;
    let target = Blog::find_by_name(&*conn, &payload.blog_name)?;
    Block::block(&*conn, &blog, &target)?;
    ok(json!(null))
}

#[post("/blog/<blog_name>/unblock", data = "<payload>")]
pub fn unblock(
    blog_name: String,
    payload: Json<BlockTargetData>,
    user: User,
    conn: DbConn,
) -> Api<serde_json::Value> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(&*conn, &user, &blog, Privilege::Full)?)?;
    let target = Blog::find_by_name(&*conn, &payload.blog_name)?;
    Block::unblock(&*conn, &blog, &target)?;
    ok(json!(null))
}

#[get("/blog/<blog_name>/blocks")]
pub fn blocks(blog_name: String, user: User, conn: DbConn) -> Api<Vec<BlogData>> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(&*conn, &user, &blog, Privilege::Full)?)?;
    let blocked = Block::blocked_blogs(&*conn, &blog)?
        .iter()
        .map(|blocked| to_blog_data(&*conn, blocked, &user))
        .collect::<Result<Vec<BlogData>>>()?;
    ok(blocked)
}
