use super::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "kost-client", about = "Client for the kost rental backend")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    /// Log in with this account before running the command.
    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, env = "KOST_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all rooms.
    Rooms,
    /// Show tenant, payment and cleaning info for one room.
    Dashboard { room: String },
    /// Show the FAQ.
    Faq,
    /// List tenant registrations (admin).
    Registrations,
    /// Approve a tenant registration (admin).
    Approve { id: String },
    /// Delete a tenant registration (admin).
    Delete { id: String },
}
