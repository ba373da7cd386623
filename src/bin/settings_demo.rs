use kost_client::settings::*;

fn main() -> anyhow::Result<()> {
    // Default location for this build profile
    let project_settings = parse_settings(None)?;
    println!("Loaded settings: {:?}", project_settings);
    println!("Refresh config: {:?}", project_settings.refresh_config());

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    // Environment overrides win over the file:
    // $ KOST__BACKEND__BASE_URL=http://localhost:9000 cargo run --bin settings_demo
    Ok(())
}
