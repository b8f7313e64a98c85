use crate::{
    blogs::Blog,
    schema::{blocks, blog_users, follows},
    Connection, Error, Result,
};
use chrono::NaiveDateTime;
use diesel::{self, Connection as _, ExpressionMethods, QueryDsl, RunQueryDsl};

/// A directed blog-to-blog block edge. Blocking suppresses following,
/// messaging, asks and submissions between the two parties, and hides the
/// blocked party from discovery feeds.
#[derive(Clone, Queryable, Identifiable)]
pub struct Block {
    pub id: i32,
    pub blog_id: i32,
    pub blocked_id: i32,
    pub creation_date: NaiveDateTime,
}

#[derive(Insertable)]
#[table_name = "blocks"]
pub struct NewBlock {
    pub blog_id: i32,
    pub blocked_id: i32,
}

impl Block {
    insert!(blocks, NewBlock);
    get!(blocks);
    list_by!(blocks, list_for_blog, blog_id as i32);

    pub fn find(conn: &Connection, blog_id: i32, blocked_id: i32) -> Result<Block> {
        blocks::table
            .filter(blocks::blog_id.eq(blog_id))
            .filter(blocks::blocked_id.eq(blocked_id))
            .first(conn)
            .map_err(Error::from)
    }

    /// True when one of the two blogs blocks the other, in either direction.
    pub fn exists_between(conn: &Connection, a: i32, b: i32) -> Result<bool> {
        let count: i64 = blocks::table
            .filter(blocks::blog_id.eq(a))
            .filter(blocks::blocked_id.eq(b))
            .count()
            .get_result(conn)?;
        if count > 0 {
            return Ok(true);
        }
        let count: i64 = blocks::table
            .filter(blocks::blog_id.eq(b))
            .filter(blocks::blocked_id.eq(a))
            .count()
            .get_result(conn)?;
        Ok(count > 0)
    }

    /// Creates the edge and severs any follow relation between the two
    /// parties, in both directions, in one transaction.
    pub fn block(conn: &Connection, blocker: &Blog, target: &Blog) -> Result<Block> {
        if blocker.id == target.id {
            return Err(Error::InvalidValue);
        }
        if Block::find(conn, blocker.id, target.id).is_ok() {
            return Err(Error::Conflict);
        }
        conn.transaction(|| {
            let block = Block::insert(
                conn,
                NewBlock {
                    blog_id: blocker.id,
                    blocked_id: target.id,
                },
            )?;

            let target_members = blog_users::table
                .filter(blog_users::blog_id.eq(target.id))
                .select(blog_users::user_id);
            diesel::delete(
                follows::table
                    .filter(follows::blog_id.eq(blocker.id))
                    .filter(follows::user_id.eq_any(target_members)),
            )
            .execute(conn)?;

            let blocker_members = blog_users::table
                .filter(blog_users::blog_id.eq(blocker.id))
                .select(blog_users::user_id);
            diesel::delete(
                follows::table
                    .filter(follows::blog_id.eq(target.id))
                    .filter(follows::user_id.eq_any(blocker_members)),
            )
            .execute(conn)?;

            Ok(block)
        })
    }

    pub fn unblock(conn: &Connection, blocker: &Blog, target: &Blog) -> Result<()> {
        let block = Block::find(conn, blocker.id, target.id)?;
        diesel::delete(&block)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    /// Blogs blocked by this one.
    pub fn blocked_blogs(conn: &Connection, blog: &Blog) -> Result<Vec<Blog>> {
        use crate::schema::blogs;
        let blocked_ids = blocks::table
            .filter(blocks::blog_id.eq(blog.id))
            .select(blocks::blocked_id);
        blogs::table
            .filter(blogs::id.eq_any(blocked_ids))
            .load::<Blog>(conn)
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blogs::tests as blog_tests, follows::Follow, tests::db};
    use diesel::Connection;

    #[test]
    fn block_twice_conflicts() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            Block::block(&conn, &blogs[0], &blogs[2]).unwrap();
            assert!(matches!(
                Block::block(&conn, &blogs[0], &blogs[2]),
                Err(Error::Conflict)
            ));
            assert!(Block::exists_between(&conn, blogs[0].id, blogs[2].id).unwrap());
            assert!(Block::exists_between(&conn, blogs[2].id, blogs[0].id).unwrap());
            Ok(())
        });
    }

    #[test]
    fn block_severs_follows_both_ways() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (users, blogs) = blog_tests::fill_database(&conn);

            // users[2] follows blogs[0], users[0] follows blogs[2]
            Follow::follow(&conn, &users[2], &blogs[0]).unwrap();
            Follow::follow(&conn, &users[0], &blogs[2]).unwrap();

            Block::block(&conn, &blogs[0], &blogs[2]).unwrap();

            assert!(Follow::find(&conn, users[2].id, blogs[0].id).is_err());
            assert!(Follow::find(&conn, users[0].id, blogs[2].id).is_err());
            Ok(())
        });
    }

    #[test]
    fn unblock_restores_nothing_but_removes_edge() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, blogs) = blog_tests::fill_database(&conn);

            assert!(matches!(
                Block::unblock(&conn, &blogs[0], &blogs[2]),
                Err(Error::NotFound)
            ));

            Block::block(&conn, &blogs[0], &blogs[2]).unwrap();
            Block::unblock(&conn, &blogs[0], &blogs[2]).unwrap();
            assert!(!Block::exists_between(&conn, blogs[0].id, blogs[2].id).unwrap());
            Ok(())
        });
    }
}
