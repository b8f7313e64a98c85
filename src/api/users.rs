use quill_api::{
    blogs::{BlogData, BlogsPage},
    posts::PostData,
    users::{FollowBlogData, LikePostData, ReblogPostData, ReplyPostData},
};
use quill_models::{
    blog_users::{BlogUser, Privilege},
    blogs::Blog,
    db_conn::DbConn,
    follows::Follow,
    post_notes::PostNote,
    users::User,
    Result, ITEMS_PER_PAGE,
};
use rocket_contrib::json::Json;

use crate::api::{blogs::to_blog_data, created, grant, next_url, ok, posts::visible_post, Api, Page};

#[post("/user/follow", data = "<payload>")]
pub fn follow(payload: Json<FollowBlogData>, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let blog = Blog::find_by_name(&*conn, &payload.blog_name)?;
    Follow::follow(&*conn, &user, &blog)?;
    ok(json!(null))
}

#[delete("/user/follow", data = "<payload>")]
pub fn unfollow(payload: Json<FollowBlogData>, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let blog = Blog::find_by_name(&*conn, &payload.blog_name)?;
    Follow::unfollow(&*conn, &user, &blog)?;
    ok(json!(null))
}

#[get("/user/following?<page>")]
pub fn following(page: Option<Page>, user: User, conn: DbConn) -> Api<BlogsPage> {
    let page = page.unwrap_or_default();
    let blogs = Follow::following_page(&*conn, &user, page.limits())?
        .iter()
        .map(|blog| to_blog_data(&*conn, blog, &user))
        .collect::<Result<Vec<BlogData>>>()?;
    let total = Follow::count_following(&*conn, &user)?;
    ok(BlogsPage {
        blogs,
        next_url: next_url("/api/user/following", page, total),
        total,
        current_page: page.number(),
        posts_per_page: ITEMS_PER_PAGE,
    })
}

#[post("/post/like", data = "<payload>")]
pub fn like(payload: Json<LikePostData>, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let post = visible_post(&*conn, payload.post_id, Some(&user))?;
    PostNote::like(&*conn, &user, &post)?;
    ok(json!(null))
}

#[delete("/post/like", data = "<payload>")]
pub fn unlike(payload: Json<LikePostData>, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let post = visible_post(&*conn, payload.post_id, Some(&user))?;
    PostNote::unlike(&*conn, &user, &post)?;
    ok(json!(null))
}

#[get("/user/likes")]
pub fn likes(user: User, conn: DbConn) -> Api<Vec<PostData>> {
    let posts = PostNote::liked_posts(&*conn, &user)?
        .iter()
        .map(|post| post.to_api(&*conn, Some(&user)))
        .collect::<Result<Vec<PostData>>>()?;
    ok(posts)
}

#[post("/post/reply", data = "<payload>")]
pub fn reply(payload: Json<ReplyPostData>, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let post = visible_post(&*conn, payload.post_id, Some(&user))?;
    PostNote::reply(&*conn, &user, &post, &payload.content)?;
    ok(json!(null))
}

/// The copy lands on one of the caller's own blogs, as a published post.
#[post("/post/reblog", data = "<payload>")]
pub fn reblog(payload: Json<ReblogPostData>, user: User, conn: DbConn) -> Api<PostData> {
    let post = visible_post(&*conn, payload.post_id, Some(&user))?;
    let to_blog = Blog::find_by_name(&*conn, &payload.blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &to_blog,
        Privilege::Contributor,
    )?)?;
    let copy = PostNote::reblog(&*conn, &user, &post, &to_blog)?;
    created(copy.to_api(&*conn, Some(&user))?)
}
