use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use convoy_core::app::{FanOut, Requests, SequentialExecutor, request_stream};
use convoy_core::config::ConvoyConfig;
use convoy_core::domain::{Pagination, classify};
use convoy_core::impls::{InMemoryClient, RecordDraft};
use convoy_core::ports::ListQuery;

type DemoResult = Result<(), Box<dyn std::error::Error>>;

/// 設定：第 1 引数に JSON ファイルがあれば読む。なければ既定値
fn load_config() -> Result<ConvoyConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let config = ConvoyConfig::from_json_str(&raw)?;
            tracing::info!(%path, "loaded config");
            Ok(config)
        }
        None => Ok(ConvoyConfig::default()),
    }
}

fn print_json<T: serde::Serialize>(label: &str, value: &T) -> DemoResult {
    println!("{label}: {}", serde_json::to_string(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> DemoResult {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;

    // (A) クライアントを用意（id=3 は遅い、id=9 は 503 を返す）
    let client = InMemoryClient::seeded(12)
        .with_latency(Duration::from_millis(20))
        .with_delay(3, Duration::from_millis(200))
        .with_failure(9, 503);
    let requests = Requests::new(Arc::new(client), config.client.clone());

    // (B) 単発：一覧取得（stream 形式で Loading → 結果）
    let mut list = requests.list();
    let mut updates = Box::pin(request_stream(list.run(ListQuery::default()), true));
    while let Some(envelope) = updates.next().await {
        print_json("list", &envelope)?;
        if let Some(page) = envelope.pagination().filter(Pagination::is_known) {
            println!("list: page {}/{} ({} records)", page.page, page.total_pages, page.total);
        }
    }

    // (C) 単発 + timeout：id=3 は 200ms かかるので 50ms で打ち切られる
    let executor = SequentialExecutor::new(config.executor.clone());
    let mut slow = requests.get_one();
    match executor
        .execute_task(&mut slow, 3, Some(Duration::from_millis(50)))
        .await
    {
        Ok(record) => print_json("get_one(3)", &record)?,
        Err(err) => println!("get_one(3): failed code={} ({err})", err.code()),
    }

    // (D) 作成 → 更新
    let created = requests
        .create()
        .run(RecordDraft::new("neo", "the one"))
        .await;
    print_json("create", &created)?;
    if let Some(id) = created.payload().map(|r| r.id) {
        let updated = requests
            .update()
            .run((id, RecordDraft::new("neo", "retired")))
            .await;
        print_json("update", &updated)?;
    }

    // (E) 並列：全件成功
    let fanout = FanOut::new(config.fanout.clone());
    let calls = [1, 2, 4, 5]
        .into_iter()
        .map(|id| (requests.get_one(), id))
        .collect();
    print_json("fanout ok", &fanout.run_tasks(calls).await)?;

    // (F) 並列：id=9 が失敗 → 兄弟もキャンセルされて集約 Failure
    let calls = [3, 7, 8, 9]
        .into_iter()
        .map(|id| (requests.get_one(), id))
        .collect();
    let failed = fanout.run_tasks(calls).await;
    print_json("fanout failed", &failed)?;
    if let Some(code) = failed.failure_code() {
        let category = classify(code);
        println!(
            "fanout failed: {} (retryable={})",
            category.label,
            category.is_retryable()
        );
    }

    Ok(())
}
