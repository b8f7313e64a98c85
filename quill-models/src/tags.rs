use crate::{
    schema::{post_tags, tags},
    Connection, Error, Result,
};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use quill_common::utils::normalize_tag;

#[derive(Clone, Identifiable, Serialize, Queryable)]
pub struct Tag {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable)]
#[table_name = "tags"]
pub struct NewTag {
    pub name: String,
}

#[derive(Clone, Identifiable, Queryable)]
pub struct PostTag {
    pub id: i32,
    pub post_id: i32,
    pub tag_id: i32,
    pub position: i32,
}

#[derive(Insertable)]
#[table_name = "post_tags"]
pub struct PostTagLink {
    pub post_id: i32,
    pub tag_id: i32,
    pub position: i32,
}

impl Tag {
    insert!(tags, NewTag);
    get!(tags);
    find_by!(tags, find_by_name, name as &str);

    /// Idempotent by normalized name.
    pub fn find_or_insert(conn: &Connection, name: &str) -> Result<Tag> {
        let name = normalize_tag(name);
        if name.is_empty() {
            return Err(Error::InvalidValue);
        }
        match Tag::find_by_name(conn, &name) {
            Ok(tag) => Ok(tag),
            Err(Error::NotFound) => Tag::insert(conn, NewTag { name }),
            Err(e) => Err(e),
        }
    }

    /// Tags of a post, in the order they were submitted.
    pub fn for_post(conn: &Connection, post_id: i32) -> Result<Vec<Tag>> {
        post_tags::table
            .inner_join(tags::table)
            .filter(post_tags::post_id.eq(post_id))
            .order(post_tags::position.asc())
            .select((tags::id, tags::name))
            .load::<Tag>(conn)
            .map_err(Error::from)
    }

    /// Upserts every name and links it to the post, keeping the submitted
    /// order. Duplicate names collapse onto their first occurrence.
    pub fn link(conn: &Connection, post_id: i32, names: &[String]) -> Result<()> {
        let mut seen: Vec<i32> = Vec::new();
        for name in names {
            let tag = Tag::find_or_insert(conn, name)?;
            if seen.contains(&tag.id) {
                continue;
            }
            diesel::insert_into(post_tags::table)
                .values(PostTagLink {
                    post_id,
                    tag_id: tag.id,
                    position: seen.len() as i32,
                })
                .execute(conn)?;
            seen.push(tag.id);
        }
        Ok(())
    }

    /// Drops the old links of a post and writes the new list.
    pub fn relink(conn: &Connection, post_id: i32, names: &[String]) -> Result<()> {
        diesel::delete(post_tags::table.filter(post_tags::post_id.eq(post_id))).execute(conn)?;
        Tag::link(conn, post_id, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{posts::tests as post_tests, tests::db};
    use diesel::Connection;

    #[test]
    fn find_or_insert_is_idempotent() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            post_tests::fill_database(&conn);

            let a = Tag::find_or_insert(&conn, "Music").unwrap();
            let b = Tag::find_or_insert(&conn, "  #music ").unwrap();
            assert_eq!(a.id, b.id);
            assert_eq!(a.name, "music");

            assert!(matches!(
                Tag::find_or_insert(&conn, "  "),
                Err(Error::InvalidValue)
            ));
            Ok(())
        });
    }

    #[test]
    fn relink_replaces_and_reorders() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let (_, _, posts) = post_tests::fill_database(&conn);

            Tag::relink(
                &conn,
                posts[0].id,
                &["zebra".to_owned(), "apple".to_owned(), "Zebra".to_owned()],
            )
            .unwrap();
            let names: Vec<String> = Tag::for_post(&conn, posts[0].id)
                .unwrap()
                .into_iter()
                .map(|t| t.name)
                .collect();
            assert_eq!(names, vec!["zebra".to_owned(), "apple".to_owned()]);
            Ok(())
        });
    }
}
