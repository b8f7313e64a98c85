use crate::{schema::blog_settings, Connection, Error, Result};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

pub const DEFAULT_AVATAR: &str =
    "https://assets.tumblr.com/images/default_avatar/cone_closed_128.png";

pub mod replies_policy {
    pub const EVERYONE: &str = "everyone";
    pub const FOLLOWING: &str = "following";
    pub const NOBODY: &str = "nobody";

    pub fn is_valid(policy: &str) -> bool {
        policy == EVERYONE || policy == FOLLOWING || policy == NOBODY
    }
}

#[derive(Clone, Queryable, Identifiable, AsChangeset)]
pub struct BlogSetting {
    pub id: i32,
    pub blog_id: i32,
    pub avatar: String,
    pub avatar_shape: String,
    pub description: String,
    pub replies: String,
}

#[derive(Insertable)]
#[table_name = "blog_settings"]
pub struct NewBlogSetting {
    pub blog_id: i32,
    pub avatar: String,
    pub avatar_shape: String,
    pub description: String,
    pub replies: String,
}

impl NewBlogSetting {
    pub fn defaults(blog_id: i32) -> NewBlogSetting {
        NewBlogSetting {
            blog_id,
            avatar: DEFAULT_AVATAR.to_owned(),
            avatar_shape: "circle".to_owned(),
            description: String::new(),
            replies: replies_policy::EVERYONE.to_owned(),
        }
    }
}

impl BlogSetting {
    insert!(blog_settings, NewBlogSetting);
    get!(blog_settings);
    find_by!(blog_settings, find_for_blog, blog_id as i32);

    pub fn save(&self, conn: &Connection) -> Result<()> {
        if !replies_policy::is_valid(&self.replies) {
            return Err(Error::InvalidValue);
        }
        diesel::update(self)
            .set(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blogs::tests as blog_tests, tests::db};
    use diesel::Connection;

    #[test]
    fn defaults_and_save() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            let mut settings = BlogSetting::find_for_blog(&conn, blogs[0].id).unwrap();
            assert_eq!(settings.avatar, DEFAULT_AVATAR);
            assert_eq!(settings.replies, replies_policy::EVERYONE);

            settings.description = "art and code".to_owned();
            settings.replies = replies_policy::FOLLOWING.to_owned();
            settings.save(&conn).unwrap();

            let settings = BlogSetting::find_for_blog(&conn, blogs[0].id).unwrap();
            assert_eq!(settings.description, "art and code");
            assert_eq!(settings.replies, replies_policy::FOLLOWING);

            settings.save(&conn).unwrap();
            let mut bad = settings.clone();
            bad.replies = "friends".to_owned();
            assert!(matches!(bad.save(&conn), Err(Error::InvalidValue)));
            Ok(())
        });
    }
}
