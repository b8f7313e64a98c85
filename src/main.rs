#![allow(clippy::too_many_arguments)]
#![feature(proc_macro_hygiene, decl_macro)]

#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

use std::sync::{Arc, Mutex};

use diesel::r2d2::ConnectionManager;
use quill_models::{db_conn::DbPool, CONFIG};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod mail;

fn init_pool() -> Option<DbPool> {
    let manager = ConnectionManager::new(CONFIG.database_url.as_str());
    DbPool::builder().build(manager).ok()
}

fn main() {
    dotenv::dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Couldn't initialize logging");

    let dbpool = init_pool().expect("Couldn't connect to the database");
    info!("Serving on {}", CONFIG.base_url);

    rocket::ignite()
        .mount(
            "/api",
            routes![
                api::session::register,
                api::session::login,
                api::session::logout,
                api::session::forgot_password,
                api::session::reset_password,
                api::session::verify_email,
                api::session::get_theme,
                api::session::set_theme,
                api::session::user_info,
                api::session::change_password,
                api::session::change_email,
                api::posts::create,
                api::posts::edit,
                api::posts::update,
                api::posts::details,
                api::posts::delete,
                api::posts::radar,
                api::posts::blog_feed,
                api::posts::drafts,
                api::posts::publish,
                api::posts::recommended,
                api::posts::trending,
                api::posts::tagged,
                api::blogs::create,
                api::blogs::my_blogs,
                api::blogs::delete,
                api::blogs::settings,
                api::blogs::save_settings,
                api::blogs::followers,
                api::blogs::block,
                api::blogs::unblock,
                api::blogs::blocks,
                api::users::follow,
                api::users::unfollow,
                api::users::following,
                api::users::like,
                api::users::unlike,
                api::users::likes,
                api::users::reply,
                api::users::reblog,
                api::messages::heads,
                api::messages::conversation,
                api::messages::send,
                api::messages::delete_conversation,
                api::messages::ask,
                api::messages::answer_ask,
                api::messages::delete_ask,
                api::messages::submit,
                api::messages::approve_submission,
                api::messages::delete_submission,
                api::messages::inbox,
                api::messages::blog_inbox,
                api::messages::clear_inbox,
                api::notifications::list,
            ],
        )
        .register(catchers![
            api::bad_request,
            api::unauthorized,
            api::forbidden,
            api::not_found,
            api::unprocessable_entity,
            api::server_error,
        ])
        .manage(dbpool)
        .manage(Arc::new(Mutex::new(mail::init())))
        .launch();
}
