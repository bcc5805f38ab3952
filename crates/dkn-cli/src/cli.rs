//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

fn id_arg() -> Arg {
    Arg::new("id").required(true).help("Document id")
}

fn tag_arg() -> Arg {
    Arg::new("tag")
        .long("tag")
        .action(ArgAction::Append)
        .help("Tag id; repeat to attach several")
}

fn email_arg() -> Arg {
    Arg::new("email").long("email").required(true).help("Login email")
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .env("DKN_PASSWORD")
        .hide_env_values(true)
        .required(true)
        .help("Password")
}

/// Build the `dkn` command tree
#[must_use]
pub fn command() -> Command {
    Command::new("dkn")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal client for the DKN knowledge platform")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("API origin, overrides config and DKN_API_URL"),
        )
        .arg(
            Arg::new("session-dir")
                .long("session-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory holding session.json"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default ~/.dkn/config.toml)"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in")
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(Arg::new("name").long("name").required(true).help("Display name"))
                .arg(email_arg())
                .arg(password_arg())
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("Role name (default: first offered role)"),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and forget the session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(Command::new("roles").about("List roles offered at registration"))
        .subcommand(Command::new("nav").about("Show the navigation for the current user"))
        .subcommand(
            Command::new("open")
                .about("Resolve an app path through the route gate")
                .arg(Arg::new("path").required(true).help("Path, e.g. /dashboard/audit"))
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Location the path was opened from"),
                ),
        )
        .subcommand(
            Command::new("view")
                .about("Render one dashboard view")
                .arg(Arg::new("key").help("View key, e.g. knowledge or validation")),
        )
        .subcommand(
            Command::new("dashboard")
                .about("Load every dashboard resource and summarize")
                .arg(
                    Arg::new("all-projects")
                        .long("all-projects")
                        .action(ArgAction::SetTrue)
                        .help("Include inactive projects"),
                ),
        )
        .subcommand(
            Command::new("doc")
                .about("Work with one document")
                .subcommand_required(true)
                .subcommand(Command::new("show").about("Show document detail").arg(id_arg()))
                .subcommand(
                    Command::new("update")
                        .about("Edit a document")
                        .arg(id_arg())
                        .arg(Arg::new("title").long("title").help("New title"))
                        .arg(Arg::new("description").long("description").help("New description"))
                        .arg(
                            Arg::new("confidentiality")
                                .long("confidentiality")
                                .help("PUBLIC, INTERNAL or RESTRICTED"),
                        )
                        .arg(Arg::new("status").long("status").help("Target status"))
                        .arg(tag_arg()),
                )
                .subcommand(Command::new("delete").about("Delete a document").arg(id_arg()))
                .subcommand(
                    Command::new("validate")
                        .about("Validate a pending document")
                        .arg(id_arg()),
                )
                .subcommand(
                    Command::new("add-rule")
                        .about("Attach a policy rule")
                        .arg(id_arg())
                        .arg(Arg::new("type").long("type").required(true).help("Rule type"))
                        .arg(Arg::new("description").long("description").help("Description")),
                )
                .subcommand(
                    Command::new("add-job")
                        .about("Queue an AI job")
                        .arg(id_arg())
                        .arg(Arg::new("type").long("type").required(true).help("Job type"))
                        .arg(Arg::new("status").long("status").help("Initial status")),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Submit a document for validation")
                .arg(Arg::new("title").long("title").help("Title (required)"))
                .arg(Arg::new("description").long("description").help("Description"))
                .arg(
                    Arg::new("confidentiality")
                        .long("confidentiality")
                        .default_value("INTERNAL")
                        .help("PUBLIC, INTERNAL or RESTRICTED"),
                )
                .arg(Arg::new("project").long("project").help("Project id"))
                .arg(Arg::new("workspace").long("workspace").help("Workspace id"))
                .arg(tag_arg()),
        )
        .subcommand(
            Command::new("tag")
                .about("Manage tags")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create")
                        .about("Create a tag")
                        .arg(Arg::new("name").required(true).help("Tag name")),
                ),
        )
        .subcommand(
            Command::new("expertise")
                .about("Manage the expertise profile")
                .subcommand_required(true)
                .subcommand(
                    Command::new("set")
                        .about("Update skills and experience level")
                        .arg(Arg::new("skills").long("skills").help("Skills"))
                        .arg(Arg::new("level").long("level").help("Experience level")),
                ),
        )
}
