use std::sync::Arc;

use anyhow::{Context, Result};
use meteoros_core::Config;
use meteoros_services::{
    InMemoryNotificationCenter, JsonStore, NotificationService, RefreshOutcome, SettingsStore,
    SqliteKvStore, WeatherSnapshot, WeatherState,
};
use meteoros_weather::WeatherClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    meteoros_core::init()?;

    let (config, _) = Config::load_validated()?;
    let api_key = config.weather.require_api_key()?;

    let store_path = config.store_path();
    let backend = SqliteKvStore::new(&store_path)
        .with_context(|| format!("Failed to open store at {}", store_path.display()))?;
    let store = JsonStore::new(Arc::new(backend));

    let settings = SettingsStore::load(store.clone());
    let unit = settings.settings().temperature_unit;

    let client = WeatherClient::with_base_url(&config.weather.base_url, api_key)?;
    let notifications = Arc::new(NotificationService::new(Arc::new(
        InMemoryNotificationCenter::new(),
    )));
    let state = WeatherState::new(client, notifications, store, &config.default_city);

    let city = std::env::args()
        .skip(1)
        .collect::<Vec<String>>()
        .join(" ");
    let city = if city.trim().is_empty() {
        state.current_city()
    } else {
        city
    };

    tracing::info!("Meteoros started");

    match state.refresh(&city, unit).await {
        Ok(RefreshOutcome::Updated { completed, .. }) => {
            for challenge in &completed {
                println!("Challenge completed: {} (+{} points)", challenge.title, challenge.points);
            }
        }
        Ok(RefreshOutcome::Superseded) => {}
        Err(e) => {
            tracing::error!("Refresh failed: {}", e);
            println!("{}", e.user_message());
        }
    }

    state.sync_notifications(&settings.settings().notification_settings);
    print_snapshot(&state.snapshot(), unit.symbol());

    Ok(())
}

fn print_snapshot(snapshot: &WeatherSnapshot, symbol: &str) {
    println!("Meteoros - {}", snapshot.city_name);

    if let Some(current) = &snapshot.current {
        let description = current
            .primary_condition()
            .map(|c| c.description.as_str())
            .unwrap_or("unknown");
        println!(
            "  Now: {:.0}{} (feels like {:.0}{}), {}",
            current.main.temp, symbol, current.main.feels_like, symbol, description
        );
        println!(
            "  Humidity {}%, pressure {} hPa, wind {:.1}",
            current.main.humidity,
            current.main.pressure,
            current.wind_speed()
        );
        if snapshot.extreme_weather {
            println!("  Extreme weather conditions");
        }
    }

    if let Some(forecast) = &snapshot.forecast {
        println!("  Forecast:");
        for entry in forecast.list.iter().take(8) {
            let description = entry
                .primary_condition()
                .map(|c| c.description.as_str())
                .unwrap_or("unknown");
            println!("    {}  {:.0}{}  {}", entry.dt_txt, entry.main.temp, symbol, description);
        }
    }

    let completed = snapshot.challenges.iter().filter(|c| c.is_completed).count();
    println!(
        "  Challenges: {}/{} completed, {} points",
        completed,
        snapshot.challenges.len(),
        snapshot.total_points
    );
    println!("  Saved locations: {}", snapshot.saved_locations.len());
}
