//! Info command - shows the configured backend and how many users it holds.

use serde::Serialize;

use crate::backend::{backend_label, create_store};
use crate::cli::{Format, InfoArgs};

#[derive(Serialize)]
struct Info {
    backend: String,
    kind: &'static str,
    users: u64,
}

/// Run the info command
pub async fn run(args: &InfoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = create_store(&args.backend_config).await?;

    let info = Info {
        backend: backend_label(&args.backend_config),
        kind: store.kind(),
        users: store.user_count().await?,
    };

    match args.format {
        Format::Human => {
            println!("Backend:     {}", info.backend);
            println!("Users:       {}", info.users);
        }
        Format::Json => crate::output::print_json(&info)?,
    }

    Ok(())
}
