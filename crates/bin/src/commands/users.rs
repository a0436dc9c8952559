//! Users command - lists registered accounts without their password hashes.

use chrono::DateTime;
use serde::Serialize;

use currex::User;

use crate::backend::create_store;
use crate::cli::{Format, UsersCommand, UsersListArgs};

/// Public view of a user record.
#[derive(Debug, Serialize, PartialEq)]
struct UserSummary {
    id: i64,
    username: String,
    created_at: i64,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}

/// Run a users subcommand
pub async fn run(command: &UsersCommand) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        UsersCommand::List(args) => list(args).await,
    }
}

async fn list(args: &UsersListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.backend_config).await?;
    let users: Vec<UserSummary> = store
        .list_users()
        .await?
        .into_iter()
        .map(UserSummary::from)
        .collect();

    match args.format {
        Format::Human => {
            if users.is_empty() {
                println!("No users registered");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.username.clone(),
                        format_timestamp(u.created_at),
                    ]
                })
                .collect();
            crate::output::print_table(&["ID", "USERNAME", "CREATED"], &rows);
        }
        Format::Json => crate::output::print_json(&users)?,
    }

    Ok(())
}
