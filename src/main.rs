use school_records::api::{
    config::Settings,
    db::SqliteStore,
    err::Result,
    fixture::FixtureSet,
    logging::init_logger,
    store::RecordStore,
    SchoolService,
};
use serde_json::json;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        log::error!("{}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;
    init_logger(settings.log_level)?;

    let store = SqliteStore::connect(&settings.database_url).await?;
    if let Some(dir) = &settings.fixtures_dir {
        // only seed an empty database
        if store.schools().await?.is_empty() {
            let fixtures = FixtureSet::read_dir(dir)?;
            store.load_fixtures(&fixtures).await?;
        } else {
            log::info!("database already has data, skipping {}", dir.display());
        }
    }

    let service = SchoolService::from_settings(store, &settings);
    let output = json!({
        "structure": service.get_structure_tree().await?,
        "hierarchy": service.get_nested_hierarchy().await?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
