#[macro_use]
extern crate serde_derive;

pub mod blogs;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod users;

/// Status block shared by every response, error or not.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "Status")]
    pub status: u16,
    pub msg: String,
}

impl Meta {
    pub fn new(status: u16, msg: &str) -> Meta {
        Meta {
            status,
            msg: msg.to_owned(),
        }
    }
}
