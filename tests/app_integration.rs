use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use fxwallet::{AppCommand, run_command};
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use std::fs;
    use std::path::{Path, PathBuf};

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const COINGECKO_PRICES: &str = r#"{
        "bitcoin": { "usd": 50000.0 },
        "ethereum": { "usd": 2500.0 },
        "solana": { "usd": 100.0 }
    }"#;

    pub async fn create_coingecko_mock(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Writes a config that points the coingecko provider at
    /// `provider_url` and keeps all data files under `dir`.
    pub fn write_config(dir: &Path, provider_url: &str) -> PathBuf {
        write_config_at(&dir.join("config.yaml"), &dir.join("data"), provider_url)
    }

    pub fn write_config_at(config_path: &Path, data_path: &Path, provider_url: &str) -> PathBuf {
        let config_content = format!(
            r#"
base_currency: "USD"
rates_ttl_seconds: 300
default_source: "coingecko"
data_path: "{}"
providers:
  coingecko:
    base_url: {}
"#,
            data_path.display(),
            provider_url
        );
        fs::write(config_path, config_content).expect("Failed to write config file");
        config_path.to_path_buf()
    }
}

fn config_str(path: &Path) -> Option<&str> {
    path.to_str()
}

fn data_file(dir: &Path, name: &str) -> PathBuf {
    dir.join("data").join(name)
}

#[test_log::test(tokio::test)]
async fn test_update_rates_persists_snapshot_history_and_audit() {
    let mock_server = test_utils::create_coingecko_mock(test_utils::COINGECKO_PRICES).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());

    let result = run_command(
        AppCommand::UpdateRates { source: None },
        config_str(&config_path),
    )
    .await;
    assert!(result.is_ok(), "update-rates failed: {:?}", result.err());

    let cache: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_file(dir.path(), "rates.json")).unwrap())
            .unwrap();
    assert_eq!(cache["base"], "USD");
    let btc = cache["rates"]["BTC"].as_f64().unwrap();
    assert!((btc - 1.0 / 50000.0).abs() < 1e-12, "BTC rate was {btc}");
    assert!(cache["rates"]["ETH"].is_f64());
    assert!(cache["rates"]["SOL"].is_f64());

    let history: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(data_file(dir.path(), "rates_history.json")).unwrap(),
    )
    .unwrap();
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["source"], "coingecko");
    assert_eq!(entries[0]["snapshot"]["base"], "USD");

    let audit = fs::read_to_string(data_file(dir.path(), "actions.log")).unwrap();
    assert!(audit.contains("UPDATE_RATES source=coingecko"));
}

#[test_log::test(tokio::test)]
async fn test_malformed_provider_response_leaves_state_unchanged() {
    // First a successful update seeds the cache.
    let good_server = test_utils::create_coingecko_mock(test_utils::COINGECKO_PRICES).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &good_server.uri());
    run_command(
        AppCommand::UpdateRates { source: None },
        config_str(&config_path),
    )
    .await
    .expect("seeding update failed");

    let cache_before = fs::read_to_string(data_file(dir.path(), "rates.json")).unwrap();

    // A payload missing an expected coin must fail the whole fetch.
    let partial = r#"{ "bitcoin": { "usd": 51000.0 }, "ethereum": { "usd": 2600.0 } }"#;
    let bad_server = test_utils::create_coingecko_mock(partial).await;
    let bad_config = test_utils::write_config_at(
        &dir.path().join("config_bad.yaml"),
        &dir.path().join("data"),
        &bad_server.uri(),
    );

    let result = run_command(
        AppCommand::UpdateRates { source: None },
        config_str(&bad_config),
    )
    .await;
    assert!(result.is_err(), "malformed payload should fail the update");
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("malformed"), "unexpected error: {msg}");

    let cache_after = fs::read_to_string(data_file(dir.path(), "rates.json")).unwrap();
    assert_eq!(cache_before, cache_after, "cache changed after a failed update");

    let history: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(data_file(dir.path(), "rates_history.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_deposit_buy_and_portfolio_flow() {
    let mock_server = test_utils::create_coingecko_mock(test_utils::COINGECKO_PRICES).await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());
    let config = config_str(&config_path);

    run_command(AppCommand::UpdateRates { source: None }, config)
        .await
        .expect("update-rates failed");
    run_command(
        AppCommand::Deposit {
            user: "alice".to_string(),
            currency: "USD".to_string(),
            amount: 1000.0,
        },
        config,
    )
    .await
    .expect("deposit failed");
    run_command(
        AppCommand::Buy {
            user: "alice".to_string(),
            currency: "btc".to_string(),
            amount: 500.0,
            force: false,
        },
        config,
    )
    .await
    .expect("buy failed");

    let wallets: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_file(dir.path(), "wallets.json")).unwrap())
            .unwrap();
    let records = wallets.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["user_id"], "alice");
    let usd = records[0]["balances"]["USD"].as_f64().unwrap();
    let btc = records[0]["balances"]["BTC"].as_f64().unwrap();
    info!(usd, btc, "balances after buy");
    assert!((usd - 500.0).abs() < 1e-9);
    assert!((btc - 500.0 / 50000.0).abs() < 1e-12);

    // Read-only views over the same state succeed.
    run_command(
        AppCommand::ShowPortfolio {
            user: "alice".to_string(),
            base: None,
        },
        config,
    )
    .await
    .expect("show-portfolio failed");
    run_command(
        AppCommand::ShowRates {
            currency: None,
            top: Some(2),
            base: None,
        },
        config,
    )
    .await
    .expect("show-rates failed");
    run_command(
        AppCommand::GetRate {
            from: "BTC".to_string(),
            to: "USD".to_string(),
        },
        config,
    )
    .await
    .expect("get-rate failed");

    let audit = fs::read_to_string(data_file(dir.path(), "actions.log")).unwrap();
    assert!(audit.contains("DEPOSIT user=alice currency=USD"));
    assert!(audit.contains("BUY user=alice currency=BTC"));
}

#[test_log::test(tokio::test)]
async fn test_stale_rates_refuse_trades_unless_forced() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    // No provider needed; the cache file is seeded directly.
    let config_path = test_utils::write_config(dir.path(), "http://unused.invalid");

    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let stale_cache = serde_json::json!({
        "base": "USD",
        "rates": { "EUR": 0.9 },
        "fetched_at": (Utc::now() - Duration::seconds(3600)).to_rfc3339(),
    });
    fs::write(data_dir.join("rates.json"), stale_cache.to_string()).unwrap();

    let config = config_str(&config_path);
    run_command(
        AppCommand::Deposit {
            user: "bob".to_string(),
            currency: "USD".to_string(),
            amount: 100.0,
        },
        config,
    )
    .await
    .expect("deposit failed");

    let refused = run_command(
        AppCommand::Buy {
            user: "bob".to_string(),
            currency: "EUR".to_string(),
            amount: 100.0,
            force: false,
        },
        config,
    )
    .await;
    assert!(refused.is_err());
    let msg = format!("{:#}", refused.unwrap_err());
    assert!(msg.contains("stale"), "unexpected error: {msg}");

    run_command(
        AppCommand::Buy {
            user: "bob".to_string(),
            currency: "EUR".to_string(),
            amount: 100.0,
            force: true,
        },
        config,
    )
    .await
    .expect("forced buy failed");

    let wallets: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_file(dir.path(), "wallets.json")).unwrap())
            .unwrap();
    let eur = wallets[0]["balances"]["EUR"].as_f64().unwrap();
    assert!((eur - 90.0).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn test_trades_without_rates_fail_with_guidance() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), "http://unused.invalid");
    let config = config_str(&config_path);

    run_command(
        AppCommand::Deposit {
            user: "carol".to_string(),
            currency: "USD".to_string(),
            amount: 100.0,
        },
        config,
    )
    .await
    .expect("deposit failed");

    let result = run_command(
        AppCommand::Buy {
            user: "carol".to_string(),
            currency: "EUR".to_string(),
            amount: 50.0,
            force: false,
        },
        config,
    )
    .await;
    assert!(result.is_err());
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("no exchange rates"), "unexpected error: {msg}");
}

#[test_log::test(tokio::test)]
async fn test_unknown_currency_is_rejected_with_supported_codes() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(dir.path(), "http://unused.invalid");

    let result = run_command(
        AppCommand::Deposit {
            user: "dave".to_string(),
            currency: "DOGE2".to_string(),
            amount: 10.0,
        },
        config_str(&config_path),
    )
    .await;
    assert!(result.is_err());
    let msg = format!("{:#}", result.unwrap_err());
    assert!(msg.contains("unknown currency 'DOGE2'"), "unexpected error: {msg}");
    assert!(msg.contains("BTC"), "hint should list supported codes: {msg}");

    // Nothing was created for the failed deposit.
    assert!(!data_file(dir.path(), "wallets.json").exists());
}
