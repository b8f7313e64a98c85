use chrono::{offset::Utc, NaiveDateTime};
use quill_api::posts::{NewPostData, PostData, PostsPage, UpdatePostData};
use quill_models::{
    blog_users::{BlogUser, Privilege},
    blogs::{privacy, Blog},
    db_conn::DbConn,
    posts::{post_state, NewPost, Post},
    users::User,
    Connection, Error, Result, ITEMS_PER_PAGE,
};
use rocket_contrib::json::Json;

use crate::api::{created, grant, next_url, ok, Api, Page};

/// Published posts are public; drafts and private posts only exist for
/// members of their blog.
pub(crate) fn visible_post(conn: &Connection, post_id: i32, viewer: Option<&User>) -> Result<Post> {
    let post = Post::get(conn, post_id)?;
    if post.state != post_state::PUBLISH {
        let member = match viewer {
            Some(user) => BlogUser::find_for_user_on_blog(conn, user.id, post.blog_id).is_ok(),
            None => false,
        };
        if !member {
            return Err(Error::NotFound);
        }
    }
    Ok(post)
}

fn is_member(conn: &Connection, blog: &Blog, viewer: Option<&User>) -> bool {
    viewer
        .map(|user| BlogUser::find_for_user_on_blog(conn, user.id, blog.id).is_ok())
        .unwrap_or(false)
}

#[post("/posts", data = "<payload>")]
pub fn create(payload: Json<NewPostData>, user: User, conn: DbConn) -> Api<PostData> {
    let blog = Blog::find_by_name(&*conn, &payload.blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;
    let post = Post::create(
        &*conn,
        NewPost {
            blog_id: blog.id,
            kind: payload.kind.clone(),
            state: payload.state.clone(),
            content: payload.content.clone(),
            source_content: payload.source_content.clone(),
        },
        payload.tags.as_deref().unwrap_or(&[]),
    )?;
    created(post.to_api(&*conn, Some(&user))?)
}

#[get("/edit/<blog_name>/<post_id>")]
pub fn edit(blog_name: String, post_id: i32, user: User, conn: DbConn) -> Api<PostData> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    let post = Post::get(&*conn, post_id)?;
    grant(post.can_edit(&*conn, &user, &blog)?)?;
    ok(post.to_api(&*conn, Some(&user))?)
}

/// Full-replace update; the post keeps its identity but every field,
/// including the state and the date, is rewritten.
#[put("/update/<blog_name>/<post_id>", data = "<payload>")]
pub fn update(
    blog_name: String,
    post_id: i32,
    payload: Json<UpdatePostData>,
    user: User,
    conn: DbConn,
) -> Api<PostData> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    let mut post = Post::get(&*conn, post_id)?;
    grant(post.can_edit(&*conn, &user, &blog)?)?;

    post.kind = payload.kind.clone();
    post.state = payload.state.clone();
    post.content = payload.content.clone();
    post.source_content = payload.source_content.clone();
    post.creation_date = Utc::now().naive_utc();
    let post = post.save_with_tags(&*conn, payload.tags.as_deref().unwrap_or(&[]))?;
    ok(post.to_api(&*conn, Some(&user))?)
}

#[get("/posts/<post_id>")]
pub fn details(post_id: i32, viewer: Option<User>, conn: DbConn) -> Api<PostData> {
    let post = visible_post(&*conn, post_id, viewer.as_ref())?;
    ok(post.to_api(&*conn, viewer.as_ref())?)
}

#[delete("/post/delete/<post_id>")]
pub fn delete(post_id: i32, user: User, conn: DbConn) -> Api<serde_json::Value> {
    let post = Post::get(&*conn, post_id)?;
    let blog = post.get_blog(&*conn)?;
    grant(post.can_edit(&*conn, &user, &blog)?)?;
    post.delete(&*conn)?;
    ok(json!(null))
}

#[get("/posts/radar")]
pub fn radar(user: User, conn: DbConn) -> Api<PostData> {
    let post = Post::radar(&*conn, &user)?;
    ok(post.to_api(&*conn, Some(&user))?)
}

/// Password-protected and private blogs only serve their members here.
#[get("/posts/view/<blog_name>?<page>")]
pub fn blog_feed(
    blog_name: String,
    page: Option<Page>,
    viewer: Option<User>,
    conn: DbConn,
) -> Api<PostsPage> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    if blog.privacy != privacy::PUBLIC && !is_member(&*conn, &blog, viewer.as_ref()) {
        return Err(Error::Forbidden.into());
    }
    let page = page.unwrap_or_default();
    let posts = Post::blog_page(&*conn, &blog, viewer.as_ref(), page.limits())?
        .iter()
        .map(|post| post.to_api(&*conn, viewer.as_ref()))
        .collect::<Result<Vec<PostData>>>()?;
    let total = Post::count_for_blog(&*conn, &blog, viewer.as_ref())?;
    ok(PostsPage {
        posts,
        next_url: next_url(
            &format!("/api/posts/view/{}", blog.blog_name),
            page,
            total,
        ),
        total,
        current_page: page.number(),
        posts_per_page: ITEMS_PER_PAGE,
    })
}

#[get("/posts/drafts/<blog_name>?<page>")]
pub fn drafts(blog_name: String, page: Option<Page>, user: User, conn: DbConn) -> Api<PostsPage> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;
    let page = page.unwrap_or_default();
    let posts = Post::drafts_page(&*conn, &blog, page.limits())?
        .iter()
        .map(|post| post.to_api(&*conn, Some(&user)))
        .collect::<Result<Vec<PostData>>>()?;
    let total = Post::count_drafts(&*conn, &blog)?;
    ok(PostsPage {
        posts,
        next_url: next_url(
            &format!("/api/posts/drafts/{}", blog.blog_name),
            page,
            total,
        ),
        total,
        current_page: page.number(),
        posts_per_page: ITEMS_PER_PAGE,
    })
}

#[post("/posts/publish/<blog_name>/<post_id>")]
pub fn publish(blog_name: String, post_id: i32, user: User, conn: DbConn) -> Api<PostData> {
    let blog = Blog::find_by_name(&*conn, &blog_name)?;
    grant(BlogUser::can_act(
        &*conn,
        &user,
        &blog,
        Privilege::Contributor,
    )?)?;
    let post = Post::publish_draft(&*conn, &blog, post_id)?;
    ok(post.to_api(&*conn, Some(&user))?)
}

fn explore_feed(
    path: &str,
    page: Option<Page>,
    viewer: Option<&User>,
    conn: &Connection,
) -> Api<PostsPage> {
    let page = page.unwrap_or_default();
    let posts = Post::explore_page(conn, viewer, page.limits())?
        .iter()
        .map(|post| post.to_api(conn, viewer))
        .collect::<Result<Vec<PostData>>>()?;
    let total = Post::count_explore(conn, viewer)?;
    ok(PostsPage {
        posts,
        next_url: next_url(path, page, total),
        total,
        current_page: page.number(),
        posts_per_page: ITEMS_PER_PAGE,
    })
}

#[get("/recommended/posts?<page>")]
pub fn recommended(page: Option<Page>, viewer: Option<User>, conn: DbConn) -> Api<PostsPage> {
    explore_feed("/api/recommended/posts", page, viewer.as_ref(), &conn)
}

#[get("/trending/posts?<page>")]
pub fn trending(page: Option<Page>, viewer: Option<User>, conn: DbConn) -> Api<PostsPage> {
    explore_feed("/api/trending/posts", page, viewer.as_ref(), &conn)
}

/// Cursor feed: `before` is a Unix timestamp, an exclusive upper bound on
/// post dates.
#[get("/post/tagged?<tag>&<before>&<limit>")]
pub fn tagged(
    tag: String,
    before: Option<i64>,
    limit: Option<i64>,
    viewer: Option<User>,
    conn: DbConn,
) -> Api<Vec<PostData>> {
    let before = match before {
        Some(timestamp) => {
            Some(NaiveDateTime::from_timestamp_opt(timestamp, 0).ok_or(Error::InvalidValue)?)
        }
        None => None,
    };
    let limit = limit
        .unwrap_or_else(|| i64::from(ITEMS_PER_PAGE))
        .min(50)
        .max(1);
    let posts = Post::tagged_before(&*conn, &tag, before, limit)?
        .iter()
        .map(|post| post.to_api(&*conn, viewer.as_ref()))
        .collect::<Result<Vec<PostData>>>()?;
    ok(posts)
}
