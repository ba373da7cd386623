use kost_client::application_impl::*;
use kost_client::application_port::*;
use kost_client::domain_model::*;
use kost_client::domain_port::*;
use kost_client::infra_http::*;
use kost_client::logger::*;
use kost_client::settings::*;
use serde::Serialize;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let transport: Arc<dyn Transport> =
        Arc::new(ReqwestTransport::new(&project_settings.reqwest_config())?);
    let session: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let client: Arc<dyn AuthenticatedClient> = Arc::new(RealAuthenticatedClient::new(
        transport.clone(),
        session.clone(),
        project_settings.refresh_config(),
    ));
    let kost: Arc<dyn KostService> =
        Arc::new(RealKostService::new(client, transport, session.clone()));

    let mut session_rx = session.subscribe();
    let watcher = tokio::spawn(async move {
        while session_rx.changed().await.is_ok() {
            let state = session_rx.borrow_and_update().clone();
            if let SessionState::Ended { reason, .. } = state {
                error!(%reason, "session ended, log in again");
            }
        }
    });

    if let (Some(email), Some(password)) = (cli.email.clone(), cli.password.clone()) {
        kost.login(LoginInput { email, password }).await?;
    }

    let result = run(kost.as_ref(), cli.command).await;
    watcher.abort();
    result
}

async fn run(kost: &dyn KostService, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Rooms => print_json(&kost.list_rooms().await?),
        Command::Dashboard { room } => {
            let room_id: RoomId = room.parse()?;
            print_json(&kost.room_dashboard(&room_id).await?)
        }
        Command::Faq => print_json(&kost.faq().await?),
        Command::Registrations => print_json(&kost.registrations().await?),
        Command::Approve { id } => {
            let id: RegistrationId = id.parse()?;
            kost.approve_registration(&id).await?;
            info!(%id, "approved");
            Ok(())
        }
        Command::Delete { id } => {
            let id: RegistrationId = id.parse()?;
            kost.delete_registration(&id).await?;
            info!(%id, "deleted");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
