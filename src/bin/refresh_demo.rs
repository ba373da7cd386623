/// Fires several requests at an in-memory backend whose credential has just
/// expired, then prints every call the backend saw.
///
/// $ cargo run --bin refresh_demo -- 8
use futures_util::future::join_all;
use kost_client::application_impl::*;
use kost_client::application_port::*;
use kost_client::domain_model::*;
use kost_client::domain_port::*;
use kost_client::infra_http::*;
use kost_client::logger::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let requests: usize = std::env::args()
        .nth(1)
        .map(|n| n.parse())
        .transpose()?
        .unwrap_or(4);

    let transport = Arc::new(FakeTransport::new());
    let session = Arc::new(MemorySessionStore::new());
    session.establish();
    let client = RealAuthenticatedClient::new(
        transport.clone(),
        session.clone(),
        RefreshConfig::default(),
    );

    transport.expire_credential();
    info!(requests, "credential expired, sending requests");

    let paths: Vec<String> = (0..requests).map(|i| format!("/rooms/{}/tenant", i)).collect();
    let results = join_all(paths.iter().map(|p| client.send(Request::get(p.clone())))).await;

    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(response) => println!("{:<24} -> {}", path, response.status),
            Err(e) => println!("{:<24} -> {}", path, e),
        }
    }

    println!();
    for call in transport.calls() {
        println!(
            "{:<6} {:<24} credential={:?}",
            call.method, call.path, call.credential
        );
    }
    println!("\nrefresh calls: {}", transport.refresh_calls());
    println!("session: {:?}", session.state());

    Ok(())
}
