#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationData {
    pub id: i32,
    pub kind: String,
    pub object_id: i32,
    pub date: String,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NotificationsPage {
    pub notifications: Vec<NotificationData>,
    pub next_url: Option<String>,
    pub total: i64,
    pub current_page: i32,
    pub posts_per_page: i32,
}
