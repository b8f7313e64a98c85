use crate::{
    blog_settings::{BlogSetting, NewBlogSetting},
    blog_users::{BlogUser, NewBlogUser},
    posts::Post,
    schema::{
        asks, blocks, blog_settings, blog_users, blogs, follows, messages, submissions, users,
    },
    users::User,
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{
    self, BoolExpressionMethods, Connection as _, ExpressionMethods, OptionalExtension, QueryDsl,
    RunQueryDsl,
};

pub mod privacy {
    pub const PUBLIC: &str = "public";
    pub const PRIVATE: &str = "private";
    pub const PASSWORD: &str = "password";

    pub fn is_valid(privacy: &str) -> bool {
        privacy == PUBLIC || privacy == PRIVATE || privacy == PASSWORD
    }
}

#[derive(Queryable, Identifiable, Clone, Debug)]
pub struct Blog {
    pub id: i32,
    pub blog_name: String,
    pub title: String,
    pub privacy: String,
    pub password: Option<String>,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "blogs"]
pub struct NewBlog {
    pub blog_name: String,
    pub title: String,
    pub privacy: String,
    pub password: Option<String>,
}

impl NewBlog {
    pub fn public(blog_name: String, title: String) -> NewBlog {
        NewBlog {
            blog_name,
            title,
            privacy: privacy::PUBLIC.to_owned(),
            password: None,
        }
    }
}

impl Blog {
    insert!(blogs, NewBlog);
    get!(blogs);
    find_by!(blogs, find_by_name, blog_name as &str);

    /// Creates the blog, the owner membership and the default settings in a
    /// single transaction. The first blog a user creates becomes their
    /// primary one.
    pub fn create(conn: &Connection, new: NewBlog, owner: &User) -> Result<Blog> {
        if !privacy::is_valid(&new.privacy) {
            return Err(Error::InvalidValue);
        }
        conn.transaction(|| {
            if Blog::find_by_name(conn, &new.blog_name).is_ok() {
                return Err(Error::Conflict);
            }
            let is_primary = BlogUser::list_for_user(conn, owner.id)?.is_empty();
            let blog = Blog::insert(conn, new)?;
            BlogUser::insert(
                conn,
                NewBlogUser {
                    user_id: owner.id,
                    blog_id: blog.id,
                    is_primary,
                    full_privileges: true,
                    contributor_privileges: false,
                },
            )?;
            BlogSetting::insert(conn, NewBlogSetting::defaults(blog.id))?;
            Ok(blog)
        })
    }

    pub fn settings(&self, conn: &Connection) -> Result<BlogSetting> {
        BlogSetting::find_for_blog(conn, self.id)
    }

    pub fn find_for_member(conn: &Connection, user: &User) -> Result<Vec<Blog>> {
        let blog_ids = blog_users::table
            .filter(blog_users::user_id.eq(user.id))
            .select(blog_users::blog_id);
        blogs::table
            .filter(blogs::id.eq_any(blog_ids))
            .load::<Blog>(conn)
            .map_err(Error::from)
    }

    pub fn list_members(&self, conn: &Connection) -> Result<Vec<User>> {
        let member_ids = blog_users::table
            .filter(blog_users::blog_id.eq(self.id))
            .select(blog_users::user_id);
        users::table
            .filter(users::id.eq_any(member_ids))
            .load::<User>(conn)
            .map_err(Error::from)
    }

    pub fn count_followers(&self, conn: &Connection) -> Result<i64> {
        follows::table
            .filter(follows::blog_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    pub fn followers_page(
        &self,
        conn: &Connection,
        (min, max): (i32, i32),
    ) -> Result<Vec<User>> {
        let follower_ids = follows::table
            .filter(follows::blog_id.eq(self.id))
            .select(follows::user_id);
        users::table
            .filter(users::id.eq_any(follower_ids))
            .order(users::id.asc())
            .offset(min.into())
            .limit((max - min).into())
            .load::<User>(conn)
            .map_err(Error::from)
    }

    /// Removes the blog and everything that hangs off it. Users whose primary
    /// blog this was get their oldest remaining membership promoted.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        conn.transaction(|| {
            let memberships = BlogUser::list_for_blog(conn, self.id)?;

            for post in Post::list_for_blog(conn, self)? {
                post.delete(conn)?;
            }

            diesel::delete(follows::table.filter(follows::blog_id.eq(self.id))).execute(conn)?;
            diesel::delete(
                blocks::table
                    .filter(blocks::blog_id.eq(self.id).or(blocks::blocked_id.eq(self.id))),
            )
            .execute(conn)?;
            diesel::delete(
                messages::table.filter(
                    messages::sender_id
                        .eq(self.id)
                        .or(messages::receiver_id.eq(self.id)),
                ),
            )
            .execute(conn)?;
            diesel::delete(
                asks::table.filter(
                    asks::receiver_id
                        .eq(self.id)
                        .or(asks::sender_id.eq(self.id)),
                ),
            )
            .execute(conn)?;
            diesel::delete(
                submissions::table.filter(
                    submissions::sender_id
                        .eq(self.id)
                        .or(submissions::receiver_id.eq(self.id)),
                ),
            )
            .execute(conn)?;
            diesel::delete(blog_settings::table.filter(blog_settings::blog_id.eq(self.id)))
                .execute(conn)?;
            diesel::delete(blog_users::table.filter(blog_users::blog_id.eq(self.id)))
                .execute(conn)?;

            for membership in memberships.into_iter().filter(|m| m.is_primary) {
                let next = blog_users::table
                    .filter(blog_users::user_id.eq(membership.user_id))
                    .order(blog_users::id.asc())
                    .first::<BlogUser>(conn)
                    .optional()?;
                if let Some(next) = next {
                    diesel::update(&next)
                        .set(blog_users::is_primary.eq(true))
                        .execute(conn)?;
                }
            }

            diesel::delete(self)
                .execute(conn)
                .map(|_| ())
                .map_err(Error::from)
        })
    }
}
