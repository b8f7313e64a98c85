use crate::{
    blog_settings::BlogSetting,
    blog_users::{Access, BlogUser, DenyReason, Privilege},
    blogs::Blog,
    schema::{blocks, blog_users, follows, post_notes, post_tags, posts, tags},
    tags::Tag,
    users::User,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{
    self, dsl::not, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl,
};
use quill_api::posts::{PostBlogInfo, PostData, PostInfo};

pub mod post_kind {
    pub const TEXT: &str = "text";
    pub const PHOTO: &str = "photo";
    pub const VIDEO: &str = "video";
    pub const AUDIO: &str = "audio";
    pub const QUOTE: &str = "quote";

    pub fn is_valid(kind: &str) -> bool {
        kind == TEXT || kind == PHOTO || kind == VIDEO || kind == AUDIO || kind == QUOTE
    }
}

pub mod post_state {
    pub const DRAFT: &str = "draft";
    pub const PUBLISH: &str = "publish";
    pub const PRIVATE: &str = "private";

    pub fn is_valid(state: &str) -> bool {
        state == DRAFT || state == PUBLISH || state == PRIVATE
    }
}

no_arg_sql_function!(
    random,
    diesel::sql_types::Integer,
    "Represents the SQL RANDOM() function"
);

#[derive(Queryable, Identifiable, Clone, AsChangeset, Debug)]
#[changeset_options(treat_none_as_null = "true")]
pub struct Post {
    pub id: i32,
    pub blog_id: i32,
    pub kind: String,
    pub state: String,
    pub content: String,
    pub source_content: Option<String>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub blog_id: i32,
    pub kind: String,
    pub state: String,
    pub content: String,
    pub source_content: Option<String>,
}

impl Post {
    insert!(posts, NewPost);
    get!(posts);

    /// Inserts the post and links its tags in one transaction.
    pub fn create(conn: &Connection, new: NewPost, tag_names: &[String]) -> Result<Post> {
        if !post_kind::is_valid(&new.kind) || !post_state::is_valid(&new.state) {
            return Err(Error::InvalidValue);
        }
        conn.transaction(|| {
            let post = Post::insert(conn, new)?;
            Tag::link(conn, post.id, tag_names)?;
            Ok(post)
        })
    }

    /// Full-replace update. The caller has already written the new field
    /// values into `self`; tags are relinked from scratch.
    pub fn save_with_tags(&self, conn: &Connection, tag_names: &[String]) -> Result<Post> {
        if !post_kind::is_valid(&self.kind) || !post_state::is_valid(&self.state) {
            return Err(Error::InvalidValue);
        }
        conn.transaction(|| {
            diesel::update(self).set(self).execute(conn)?;
            Tag::relink(conn, self.id, tag_names)?;
            Post::get(conn, self.id)
        })
    }

    /// The only guarded state transition: draft becomes publish. Any other
    /// starting state, or a post of another blog, fails without mutating.
    pub fn publish_draft(conn: &Connection, blog: &Blog, post_id: i32) -> Result<Post> {
        let post = Post::get(conn, post_id)?;
        if post.blog_id != blog.id || post.state != post_state::DRAFT {
            return Err(Error::NotFound);
        }
        diesel::update(&post)
            .set((
                posts::state.eq(post_state::PUBLISH),
                posts::creation_date.eq(diesel::dsl::now),
            ))
            .execute(conn)?;
        Post::get(conn, post_id)
    }

    pub fn delete(&self, conn: &Connection) -> Result<()> {
        conn.transaction(|| {
            diesel::delete(post_tags::table.filter(post_tags::post_id.eq(self.id)))
                .execute(conn)?;
            diesel::delete(post_notes::table.filter(post_notes::post_id.eq(self.id)))
                .execute(conn)?;
            diesel::delete(self)
                .execute(conn)
                .map(|_| ())
                .map_err(Error::from)
        })
    }

    /// Edit rights: the post must belong to the given blog, and the user must
    /// be at least a contributor on it.
    pub fn can_edit(&self, conn: &Connection, user: &User, blog: &Blog) -> Result<Access> {
        if self.blog_id != blog.id {
            return Ok(Access::Denied(DenyReason::WrongBlog));
        }
        BlogUser::can_act(conn, user, blog, Privilege::Contributor)
    }

    pub fn get_blog(&self, conn: &Connection) -> Result<Blog> {
        Blog::get(conn, self.blog_id)
    }

    /// All posts of a blog, whatever their state. Used by cascades.
    pub fn list_for_blog(conn: &Connection, blog: &Blog) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::blog_id.eq(blog.id))
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn blog_page(
        conn: &Connection,
        blog: &Blog,
        viewer: Option<&User>,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        let mut query = posts::table
            .filter(posts::blog_id.eq(blog.id))
            .order(posts::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .into_boxed();
        if !Post::is_privileged(conn, blog, viewer)? {
            query = query.filter(posts::state.eq(post_state::PUBLISH));
        }
        query.load::<Post>(conn).map_err(Error::from)
    }

    pub fn count_for_blog(conn: &Connection, blog: &Blog, viewer: Option<&User>) -> Result<i64> {
        let mut query = posts::table
            .filter(posts::blog_id.eq(blog.id))
            .into_boxed();
        if !Post::is_privileged(conn, blog, viewer)? {
            query = query.filter(posts::state.eq(post_state::PUBLISH));
        }
        query.count().get_result(conn).map_err(Error::from)
    }

    fn is_privileged(conn: &Connection, blog: &Blog, viewer: Option<&User>) -> Result<bool> {
        match viewer {
            Some(user) => match BlogUser::find_for_user_on_blog(conn, user.id, blog.id) {
                Ok(_) => Ok(true),
                Err(Error::NotFound) => Ok(false),
                Err(e) => Err(e),
            },
            None => Ok(false),
        }
    }

    pub fn drafts_page(
        conn: &Connection,
        blog: &Blog,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        posts::table
            .filter(posts::blog_id.eq(blog.id))
            .filter(posts::state.eq(post_state::DRAFT))
            .order(posts::creation_date.desc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<Post>(conn)
            .map_err(Error::from)
    }

    pub fn count_drafts(conn: &Connection, blog: &Blog) -> Result<i64> {
        posts::table
            .filter(posts::blog_id.eq(blog.id))
            .filter(posts::state.eq(post_state::DRAFT))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// One random published post from outside the caller's world: not from
    /// their own blogs, not from blogs they follow, not from blogs blocked
    /// either way.
    pub fn radar(conn: &Connection, user: &User) -> Result<Post> {
        let own = blog_users::table
            .filter(blog_users::user_id.eq(user.id))
            .select(blog_users::blog_id);
        let followed = follows::table
            .filter(follows::user_id.eq(user.id))
            .select(follows::blog_id);

        let mut query = posts::table
            .filter(posts::state.eq(post_state::PUBLISH))
            .filter(not(posts::blog_id.eq_any(own)))
            .filter(not(posts::blog_id.eq_any(followed)))
            .order(random)
            .into_boxed();

        if let Ok(primary) = user.primary_blog(conn) {
            let blocked = blocks::table
                .filter(blocks::blog_id.eq(primary.id))
                .select(blocks::blocked_id);
            let blockers = blocks::table
                .filter(blocks::blocked_id.eq(primary.id))
                .select(blocks::blog_id);
            query = query
                .filter(not(posts::blog_id.eq_any(blocked)))
                .filter(not(posts::blog_id.eq_any(blockers)));
        }

        query.first(conn).map_err(Error::from)
    }

    /// Randomized explore selection. Stands in for a real ranking strategy:
    /// replacing this query is enough to plug one in.
    pub fn explore_page(
        conn: &Connection,
        viewer: Option<&User>,
        (min, max): (i32, i32),
    ) -> Result<Vec<Post>> {
        let mut query = posts::table
            .filter(posts::state.eq(post_state::PUBLISH))
            .order(random)
            .offset(min.into())
            .limit((max - min).into())
            .into_boxed();
        if let Some(user) = viewer {
            let own = blog_users::table
                .filter(blog_users::user_id.eq(user.id))
                .select(blog_users::blog_id);
            query = query.filter(not(posts::blog_id.eq_any(own)));
        }
        query.load::<Post>(conn).map_err(Error::from)
    }

    pub fn count_explore(conn: &Connection, viewer: Option<&User>) -> Result<i64> {
        let mut query = posts::table
            .filter(posts::state.eq(post_state::PUBLISH))
            .into_boxed();
        if let Some(user) = viewer {
            let own = blog_users::table
                .filter(blog_users::user_id.eq(user.id))
                .select(blog_users::blog_id);
            query = query.filter(not(posts::blog_id.eq_any(own)));
        }
        query.count().get_result(conn).map_err(Error::from)
    }

    /// Cursor-paginated tag feed: `before` is an exclusive upper bound on the
    /// post date.
    pub fn tagged_before(
        conn: &Connection,
        tag_name: &str,
        before: Option<NaiveDateTime>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let tag_ids = tags::table
            .filter(tags::name.eq(quill_common::utils::normalize_tag(tag_name)))
            .select(tags::id);
        let post_ids = post_tags::table
            .filter(post_tags::tag_id.eq_any(tag_ids))
            .select(post_tags::post_id);

        let mut query = posts::table
            .filter(posts::id.eq_any(post_ids))
            .filter(posts::state.eq(post_state::PUBLISH))
            .order(posts::creation_date.desc())
            .limit(limit)
            .into_boxed();
        if let Some(before) = before {
            query = query.filter(posts::creation_date.lt(before));
        }
        query.load::<Post>(conn).map_err(Error::from)
    }

    pub fn is_liked(&self, conn: &Connection, user: &User) -> Result<bool> {
        post_notes::table
            .filter(post_notes::post_id.eq(self.id))
            .filter(post_notes::user_id.eq(user.id))
            .filter(post_notes::kind.eq(crate::post_notes::note_kind::LIKE))
            .count()
            .get_result::<i64>(conn)
            .map(|count| count > 0)
            .map_err(Error::from)
    }

    pub fn notes_count(&self, conn: &Connection) -> Result<i64> {
        post_notes::table
            .filter(post_notes::post_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// "Monday, 20-Dec-21 21:54:11 UTC", the date format of the public API.
    pub fn format_date(&self) -> String {
        self.creation_date
            .format("%A, %d-%b-%y %H:%M:%S UTC")
            .to_string()
    }

    pub fn to_api(&self, conn: &Connection, viewer: Option<&User>) -> Result<PostData> {
        let blog = self.get_blog(conn)?;
        let settings = BlogSetting::find_for_blog(conn, blog.id)?;
        let tag_names = Tag::for_post(conn, self.id)?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let (is_liked, is_mine, follower) = match viewer {
            Some(user) => (
                self.is_liked(conn, user)?,
                BlogUser::find_for_user_on_blog(conn, user.id, blog.id).is_ok(),
                follows::table
                    .filter(follows::user_id.eq(user.id))
                    .filter(follows::blog_id.eq(blog.id))
                    .count()
                    .get_result::<i64>(conn)?
                    > 0,
            ),
            None => (false, false, false),
        };

        Ok(PostData {
            post: PostInfo {
                id: self.id,
                kind: self.kind.clone(),
                state: self.state.clone(),
                content: self.content.clone(),
                source_content: self.source_content.clone(),
                date: self.format_date(),
                tags: tag_names,
                is_liked,
                is_mine,
                notes_count: self.notes_count(conn)?,
            },
            blog: PostBlogInfo {
                blog_id: blog.id,
                blog_name: blog.blog_name.clone(),
                avatar: settings.avatar,
                avatar_shape: settings.avatar_shape,
                replies: settings.replies,
                follower,
            },
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{blogs::tests as blog_tests, tests::db, Connection as Conn};
    use diesel::Connection;

    pub(crate) fn fill_database(conn: &Conn) -> (Vec<User>, Vec<Blog>, Vec<Post>) {
        let (users, blogs) = blog_tests::fill_database(conn);
        let post1 = Post::create(
            conn,
            NewPost {
                blog_id: blogs[0].id,
                kind: post_kind::TEXT.to_owned(),
                state: post_state::PUBLISH.to_owned(),
                content: "<p>hello world</p>".to_owned(),
                source_content: None,
            },
            &["First".to_owned(), "hello".to_owned()],
        )
        .unwrap();
        let post2 = Post::create(
            conn,
            NewPost {
                blog_id: blogs[0].id,
                kind: post_kind::QUOTE.to_owned(),
                state: post_state::DRAFT.to_owned(),
                content: "<p>not done yet</p>".to_owned(),
                source_content: None,
            },
            &[],
        )
        .unwrap();
        let post3 = Post::create(
            conn,
            NewPost {
                blog_id: blogs[1].id,
                kind: post_kind::PHOTO.to_owned(),
                state: post_state::PUBLISH.to_owned(),
                content: "<img src=\"cat.png\"/>".to_owned(),
                source_content: Some("https://example.com/cats".to_owned()),
            },
            &["hello".to_owned()],
        )
        .unwrap();
        (users, blogs, vec![post1, post2, post3])
    }

    #[test]
    fn create_validates_enums() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs, _) = fill_database(&conn);

            let bad_kind = Post::create(
                &conn,
                NewPost {
                    blog_id: blogs[0].id,
                    kind: "essay".to_owned(),
                    state: post_state::PUBLISH.to_owned(),
                    content: String::new(),
                    source_content: None,
                },
                &[],
            );
            assert!(matches!(bad_kind, Err(Error::InvalidValue)));

            let bad_state = Post::create(
                &conn,
                NewPost {
                    blog_id: blogs[0].id,
                    kind: post_kind::TEXT.to_owned(),
                    state: "pending".to_owned(),
                    content: String::new(),
                    source_content: None,
                },
                &[],
            );
            assert!(matches!(bad_state, Err(Error::InvalidValue)));
            Ok(())
        });
    }

    #[test]
    fn tags_keep_submitted_order() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, _, posts) = fill_database(&conn);

            let names: Vec<String> = Tag::for_post(&conn, posts[0].id)
                .unwrap()
                .into_iter()
                .map(|t| t.name)
                .collect();
            assert_eq!(names, vec!["first".to_owned(), "hello".to_owned()]);
            Ok(())
        });
    }

    #[test]
    fn publish_draft_only_from_draft() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs, posts) = fill_database(&conn);

            let published = Post::publish_draft(&conn, &blogs[0], posts[1].id).unwrap();
            assert_eq!(published.state, post_state::PUBLISH);

            // a second publish fails and the state stays untouched
            assert!(matches!(
                Post::publish_draft(&conn, &blogs[0], posts[1].id),
                Err(Error::NotFound)
            ));
            assert_eq!(
                Post::get(&conn, posts[1].id).unwrap().state,
                post_state::PUBLISH
            );

            // a draft of another blog is out of reach
            assert!(matches!(
                Post::publish_draft(&conn, &blogs[1], posts[1].id),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn blog_page_hides_private_and_drafts_from_strangers() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs, posts) = fill_database(&conn);

            let anon = Post::blog_page(&conn, &blogs[0], None, (0, 15)).unwrap();
            assert_eq!(anon.len(), 1);
            assert_eq!(anon[0].id, posts[0].id);

            let stranger = Post::blog_page(&conn, &blogs[0], Some(&users[2]), (0, 15)).unwrap();
            assert_eq!(stranger.len(), 1);

            let owner = Post::blog_page(&conn, &blogs[0], Some(&users[0]), (0, 15)).unwrap();
            assert_eq!(owner.len(), 2);

            assert_eq!(Post::count_for_blog(&conn, &blogs[0], None).unwrap(), 1);
            assert_eq!(
                Post::count_for_blog(&conn, &blogs[0], Some(&users[0])).unwrap(),
                2
            );
            Ok(())
        });
    }

    #[test]
    fn can_edit() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs, posts) = fill_database(&conn);

            assert!(posts[0]
                .can_edit(&conn, &users[0], &blogs[0])
                .unwrap()
                .granted());
            // contributor may edit too
            assert!(posts[0]
                .can_edit(&conn, &users[1], &blogs[0])
                .unwrap()
                .granted());
            // outsider may not
            assert!(!posts[0]
                .can_edit(&conn, &users[2], &blogs[0])
                .unwrap()
                .granted());
            // right user, wrong blog
            assert_eq!(
                posts[0].can_edit(&conn, &users[0], &blogs[1]).unwrap(),
                Access::Denied(DenyReason::WrongBlog)
            );
            Ok(())
        });
    }

    #[test]
    fn radar_avoids_own_and_followed_blogs() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs, posts) = fill_database(&conn);

            // users[2] owns blogs[2] (no posts) and follows nothing: both
            // published posts are eligible
            for _ in 0..5 {
                let post = Post::radar(&conn, &users[2]).unwrap();
                assert!(post.id == posts[0].id || post.id == posts[2].id);
            }

            crate::follows::Follow::follow(&conn, &users[2], &blogs[1]).unwrap();
            for _ in 0..5 {
                let post = Post::radar(&conn, &users[2]).unwrap();
                assert_eq!(post.id, posts[0].id);
            }

            // users[0] is a member of blogs[0], so only blogs[1] remains
            for _ in 0..5 {
                let post = Post::radar(&conn, &users[0]).unwrap();
                assert_eq!(post.id, posts[2].id);
            }
            Ok(())
        });
    }

    #[test]
    fn tagged_before_cursor() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, _, posts) = fill_database(&conn);

            let all = Post::tagged_before(&conn, "hello", None, 20).unwrap();
            assert_eq!(all.len(), 2);
            // newest first
            assert!(all[0].creation_date >= all[1].creation_date);

            let oldest = all.last().unwrap().clone();
            let before = Post::tagged_before(&conn, "hello", Some(all[0].creation_date), 20)
                .unwrap();
            assert!(before.iter().all(|p| p.creation_date < all[0].creation_date));
            assert!(before.iter().any(|p| p.id == oldest.id) || before.is_empty());

            // tags are matched case-insensitively
            let first = Post::tagged_before(&conn, "FIRST", None, 20).unwrap();
            assert_eq!(first.len(), 1);
            assert_eq!(first[0].id, posts[0].id);
            Ok(())
        });
    }

    #[test]
    fn delete_cascades_notes_and_tags() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, _, posts) = fill_database(&conn);

            crate::post_notes::PostNote::like(&conn, &users[2], &posts[0]).unwrap();
            posts[0].delete(&conn).unwrap();

            assert!(Post::get(&conn, posts[0].id).is_err());
            assert!(Tag::for_post(&conn, posts[0].id).unwrap().is_empty());
            assert_eq!(
                post_notes::table
                    .filter(post_notes::post_id.eq(posts[0].id))
                    .count()
                    .get_result::<i64>(&*conn)
                    .unwrap(),
                0
            );
            Ok(())
        });
    }
}
