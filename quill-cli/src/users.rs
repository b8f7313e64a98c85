use clap::{App, Arg, ArgMatches, SubCommand};
use std::io::{self, Write};

use quill_models::{
    blogs::{Blog, NewBlog},
    users::{NewUser, User},
    Connection,
};

pub fn command<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("users")
        .about("Manage users")
        .subcommand(
            SubCommand::with_name("new")
                .arg(
                    Arg::with_name("email")
                        .short("e")
                        .long("email")
                        .takes_value(true)
                        .help("Email address of the new user"),
                )
                .arg(
                    Arg::with_name("blog")
                        .short("b")
                        .long("blog")
                        .takes_value(true)
                        .help("Name of the user's primary blog"),
                )
                .arg(
                    Arg::with_name("password")
                        .short("p")
                        .long("password")
                        .takes_value(true)
                        .help("The password of the new user"),
                )
                .about("Create a new user with their primary blog"),
        )
        .subcommand(
            SubCommand::with_name("reset-password")
                .arg(
                    Arg::with_name("email")
                        .short("e")
                        .long("email")
                        .takes_value(true)
                        .help("Email address of the user"),
                )
                .about("Set a new password for a user"),
        )
        .subcommand(
            SubCommand::with_name("delete")
                .arg(
                    Arg::with_name("email")
                        .short("e")
                        .long("email")
                        .takes_value(true)
                        .help("Email address of the user to delete"),
                )
                .about("Delete a user and the blogs only they owned"),
        )
}

pub fn run<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    match args.subcommand() {
        ("new", Some(x)) => new(x, conn),
        ("reset-password", Some(x)) => reset_password(x, conn),
        ("delete", Some(x)) => delete(x, conn),
        ("", None) => command().print_help().unwrap(),
        _ => println!("Unknown subcommand"),
    }
}

fn ask_password() -> String {
    print!("Password: ");
    io::stdout().flush().expect("Couldn't flush STDOUT");
    rpassword::read_password().expect("Couldn't read your password.")
}

fn new<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let email = args
        .value_of("email")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Email address"));
    let blog_name = args
        .value_of("blog")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Blog name"));
    let password = args
        .value_of("password")
        .map(String::from)
        .unwrap_or_else(ask_password);

    let user = User::insert(
        conn,
        NewUser::new_local(email, &password).expect("Couldn't hash the password"),
    )
    .expect("Couldn't save the user");
    Blog::create(
        conn,
        NewBlog::public(blog_name.clone(), blog_name),
        &user,
    )
    .expect("Couldn't create the primary blog");
}

fn reset_password<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let email = args
        .value_of("email")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Email address"));
    let user = User::find_by_email(conn, &email).expect("No user with this email");
    user.reset_password(conn, &ask_password())
        .expect("Couldn't save the new password");
}

fn delete<'a>(args: &ArgMatches<'a>, conn: &Connection) {
    let email = args
        .value_of("email")
        .map(String::from)
        .unwrap_or_else(|| super::ask_for("Email address"));
    let user = User::find_by_email(conn, &email).expect("No user with this email");
    user.delete(conn).expect("Couldn't delete the user");
}
