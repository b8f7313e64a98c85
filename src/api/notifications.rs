use quill_api::notifications::{NotificationData, NotificationsPage};
use quill_models::{db_conn::DbConn, notifications::Notification, users::User, ITEMS_PER_PAGE};

use crate::api::{next_url, ok, Api, Page};

#[get("/notifications?<page>")]
pub fn list(page: Option<Page>, user: User, conn: DbConn) -> Api<NotificationsPage> {
    let page = page.unwrap_or_default();
    let notifications: Vec<NotificationData> =
        Notification::page_for_user(&*conn, &user, page.limits())?
            .iter()
            .map(Notification::to_api)
            .collect();
    let total = Notification::count_for_user(&*conn, &user)?;
    ok(NotificationsPage {
        notifications,
        next_url: next_url("/api/notifications", page, total),
        total,
        current_page: page.number(),
        posts_per_page: ITEMS_PER_PAGE,
    })
}
