use crate::{blogs::Blog, schema::blog_users, users::User, Connection, Error, Result};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};

/// Privilege level required for an action on a blog.
///
/// `Full` covers destructive and administrative actions (deleting the blog,
/// saving settings), `Contributor` covers posting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Privilege {
    Full,
    Contributor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenyReason {
    NoMembership,
    NotEnoughPrivileges,
    WrongBlog,
}

/// Outcome of an authorization check. Checked explicitly by every write
/// endpoint before touching the database.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Denied(DenyReason),
}

impl Access {
    pub fn granted(self) -> bool {
        matches!(self, Access::Allowed)
    }
}

#[derive(Clone, Queryable, Identifiable)]
pub struct BlogUser {
    pub id: i32,
    pub user_id: i32,
    pub blog_id: i32,
    pub is_primary: bool,
    pub full_privileges: bool,
    pub contributor_privileges: bool,
}

#[derive(Insertable)]
#[table_name = "blog_users"]
pub struct NewBlogUser {
    pub user_id: i32,
    pub blog_id: i32,
    pub is_primary: bool,
    pub full_privileges: bool,
    pub contributor_privileges: bool,
}

impl BlogUser {
    insert!(blog_users, NewBlogUser);
    get!(blog_users);
    find_by!(blog_users, find_for_user_on_blog, user_id as i32, blog_id as i32);
    list_by!(blog_users, list_for_blog, blog_id as i32);
    list_by!(blog_users, list_for_user, user_id as i32);

    pub fn count_for_blog(conn: &Connection, blog: &Blog) -> Result<i64> {
        blog_users::table
            .filter(blog_users::blog_id.eq(blog.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// The single choke point for "may this user touch this blog".
    pub fn can_act(
        conn: &Connection,
        user: &User,
        blog: &Blog,
        privilege: Privilege,
    ) -> Result<Access> {
        let membership = match BlogUser::find_for_user_on_blog(conn, user.id, blog.id) {
            Ok(membership) => membership,
            Err(Error::NotFound) => return Ok(Access::Denied(DenyReason::NoMembership)),
            Err(e) => return Err(e),
        };
        let enough = match privilege {
            Privilege::Full => membership.full_privileges,
            Privilege::Contributor => {
                membership.full_privileges || membership.contributor_privileges
            }
        };
        if enough {
            Ok(Access::Allowed)
        } else {
            Ok(Access::Denied(DenyReason::NotEnoughPrivileges))
        }
    }
}
