#[macro_use]
extern crate diesel_migrations;

use clap::App;
use diesel::Connection;
use quill_models::{Connection as Conn, CONFIG};
use std::io::{self, prelude::*};

mod migration;
mod users;

#[cfg(feature = "sqlite")]
embed_migrations!("../migrations/sqlite");
#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
embed_migrations!("../migrations/postgres");

fn main() {
    let mut app = App::new("Quill CLI")
        .bin_name("qll")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collection of tools to manage your Quill instance.")
        .subcommand(migration::command())
        .subcommand(users::command());
    let matches = app.clone().get_matches();

    match dotenv::dotenv() {
        Ok(path) => println!("Configuration read from {}", path.display()),
        Err(ref e) if e.not_found() => eprintln!("no .env was found"),
        e => e.map(|_| ()).unwrap(),
    }
    let conn = Conn::establish(CONFIG.database_url.as_str());

    match matches.subcommand() {
        ("migration", Some(args)) => {
            migration::run(args, &conn.expect("Couldn't connect to the database."))
        }
        ("users", Some(args)) => {
            users::run(args, &conn.expect("Couldn't connect to the database."))
        }
        _ => app.print_help().expect("Couldn't print help"),
    };
}

pub fn ask_for(something: &str) -> String {
    print!("{}: ", something);
    io::stdout().flush().expect("Couldn't flush STDOUT");
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .expect("Unable to read line");
    input.retain(|c| c != '\n');
    input
}
