//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small category with listing and
//! product pages and run the full crawl cycle end-to-end.

use catalog_ripple::config::{Config, CrawlerConfig, OutputConfig};
use catalog_ripple::crawler::{run_crawl, Coordinator};
use catalog_ripple::output::{MemorySink, CSV_HEADER};
use catalog_ripple::HarvestError;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATEGORY_PATH: &str = "/category/morozhenoe";
const STORE_COOKIE: &str = "pickupStore=11; metroStoreId=11";

/// Creates a test configuration crawling the mock server's category
fn create_test_config(base_url: &str, csv_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: format!("{}{}", base_url, CATEGORY_PATH),
            max_concurrent_listing_pages: 2,
            max_concurrent_detail_pages: 4,
            request_timeout_secs: 5,
            crawl_timeout_secs: 0,
        },
        output: OutputConfig {
            csv_path: csv_path.to_string(),
        },
        ..Config::default()
    }
}

fn pagination(last_page: u32) -> String {
    let items: String = (1..=last_page)
        .map(|page| format!(r#"<li><a href="?page={0}">{0}</a></li>"#, page))
        .collect();
    format!(
        r#"<ul class="catalog-paginate v-pagination">{}<li><a href="?page=2">›</a></li></ul>"#,
        items
    )
}

fn card(id: u32, price: &str, old_price: Option<&str>, in_stock: bool) -> String {
    let stock = if in_stock {
        String::new()
    } else {
        r#"<p is-out-of-stock="true">Закончился</p>"#.to_string()
    };
    let old = old_price
        .map(|old| format!(r#"<span class="product-card-prices__old">{}</span>"#, old))
        .unwrap_or_default();
    format!(
        r#"<div class="product-card__content">
             {stock}
             <a data-qa="product-card-photo-link" href="/products/{id}"><img alt=""></a>
             <span class="product-card-prices__actual">{price}</span>
             {old}
           </div>"#
    )
}

fn listing_page(pagination: &str, cards: &[String]) -> String {
    format!(
        r#"<html><head><title>Мороженое</title></head>
           <body>{}<div class="catalog">{}</div></body></html>"#,
        pagination,
        cards.concat()
    )
}

fn product_page(id: u32, name: &str, brand: &str) -> String {
    format!(
        r#"<html><body>
             <h1 class="product-page-content__product-name">  {name}  </h1>
             <p itemprop="productID">{id}</p>
             <ul class="product-attributes__list style--product-page-full-list">
               <li><span class="product-attributes__list-item-name">Бренд</span>
                   <span class="product-attributes__list-item-value">{brand}</span></li>
               <li><span class="product-attributes__list-item-name">Страна</span>
                   <span class="product-attributes__list-item-value">Россия</span></li>
             </ul>
           </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_product(server: &MockServer, id: u32, name: &str, brand: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/products/{}", id)))
        .respond_with(html(product_page(id, name, brand)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_skips_out_of_stock() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(header("cookie", STORE_COOKIE))
        .respond_with(html(listing_page(
            "",
            &[
                card(1, "1 299,90 ₽", Some("1 499,90 ₽"), true),
                card(2, "89,99 ₽", None, false),
                card(3, "259 ₽", None, true),
            ],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_product(
        &mock_server,
        1,
        "Пломбир ванильный",
        "Чистая Линия",
    )
    .await;
    mount_product(&mock_server, 3, "Эскимо шоколадное", "Инмарко").await;
    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(html(product_page(2, "Фруктовый лёд", "Айсберри")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, "unused.csv");
    let coordinator = Coordinator::from_config(&config).expect("Failed to create coordinator");
    let start_url = url::Url::parse(&config.crawler.start_url).unwrap();
    let sink = Arc::new(MemorySink::new());

    let report = coordinator
        .crawl(&start_url, Arc::clone(&sink))
        .await
        .expect("Crawl failed");

    assert_eq!(report.listing_pages, 1);
    assert_eq!(report.summaries, 2);
    assert_eq!(report.records, 2);
    assert_eq!(report.fetch_failures(), 0);
    assert!(!report.is_degraded());
    assert!(!report.cancelled);

    let mut records = sink.records();
    records.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].id, "1");
    assert_eq!(records[0].name, "Пломбир ванильный");
    assert_eq!(records[0].brand, "Чистая Линия");
    assert_eq!(records[0].current_price, "129990");
    assert_eq!(records[0].previous_price, "149990");
    assert_eq!(records[0].url, format!("{}/products/1", base_url));

    assert_eq!(records[1].id, "3");
    assert_eq!(records[1].current_price, "259");
    assert_eq!(records[1].previous_price, "");
}

#[tokio::test]
async fn test_failed_listing_page_does_not_stop_siblings() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Page-specific mocks are mounted first so they win over the bare path
    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("page", "1"))
        .respond_with(html(listing_page(&pagination(3), &[])))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(query_param("page", "3"))
        .respond_with(html(listing_page(
            &pagination(3),
            &[card(30, "45,50 ₽", None, true)],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .respond_with(html(listing_page(
            &pagination(3),
            &[card(10, "100 ₽", Some("120 ₽"), true)],
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_product(&mock_server, 10, "Сорбет манго", "Movenpick").await;
    mount_product(
        &mock_server,
        30,
        "Рожок крем-брюле",
        "Баскин Роббинс",
    )
    .await;

    let config = create_test_config(&base_url, "unused.csv");
    let coordinator = Coordinator::from_config(&config).expect("Failed to create coordinator");
    let start_url = url::Url::parse(&config.crawler.start_url).unwrap();
    let sink = Arc::new(MemorySink::new());

    let report = coordinator
        .crawl(&start_url, Arc::clone(&sink))
        .await
        .expect("Crawl failed");

    assert_eq!(report.listing_pages, 2);
    assert_eq!(report.listing_failures, 1);
    assert_eq!(report.records, 2);
    assert!(report.is_degraded());

    let mut ids: Vec<String> = sink.records().into_iter().map(|r| r.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["10".to_string(), "30".to_string()]);
}

#[tokio::test]
async fn test_product_without_brand_is_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .respond_with(html(listing_page(
            "",
            &[card(1, "99 ₽", None, true), card(2, "199 ₽", None, true)],
        )))
        .mount(&mock_server)
        .await;

    mount_product(&mock_server, 1, "Пломбир", "Чистая Линия").await;
    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(html(
            r#"<html><body>
                 <h1 class="product-page-content__product-name">Без бренда</h1>
                 <p itemprop="productID">2</p>
               </body></html>"#
                .to_string(),
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, "unused.csv");
    let coordinator = Coordinator::from_config(&config).unwrap();
    let start_url = url::Url::parse(&config.crawler.start_url).unwrap();
    let sink = Arc::new(MemorySink::new());

    let report = coordinator.crawl(&start_url, Arc::clone(&sink)).await.unwrap();

    assert_eq!(report.summaries, 2);
    assert_eq!(report.records, 1);
    assert_eq!(report.extraction_failures, 1);
    assert_eq!(report.detail_failures, 0);
    assert_eq!(sink.records()[0].id, "1");
}

#[tokio::test]
async fn test_unreachable_start_page_is_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, "unused.csv");
    let coordinator = Coordinator::from_config(&config).unwrap();
    let start_url = url::Url::parse(&config.crawler.start_url).unwrap();
    let sink = Arc::new(MemorySink::new());

    let result = coordinator.crawl(&start_url, Arc::clone(&sink)).await;

    match result {
        Err(HarvestError::StartPage { url, .. }) => assert_eq!(url, start_url.to_string()),
        other => panic!("expected StartPage error, got {:?}", other),
    }
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_run_crawl_writes_csv() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(header("cookie", STORE_COOKIE))
        .respond_with(html(listing_page(
            "",
            &[card(7, "349,90 ₽", Some("399,90 ₽"), true)],
        )))
        .mount(&mock_server)
        .await;
    mount_product(
        &mock_server,
        7,
        "Пломбир, шоколадный",
        "Коровка из Кореновки",
    )
    .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let csv_path = temp_dir.path().join("products.csv");
    let config = create_test_config(&base_url, csv_path.to_str().unwrap());

    let report = run_crawl(&config, std::future::pending())
        .await
        .expect("Crawl failed");
    assert_eq!(report.records, 1);

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, CSV_HEADER);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "7");
    assert_eq!(&rows[0][1], "Пломбир, шоколадный");
    assert_eq!(&rows[0][2], "Коровка из Кореновки");
    assert_eq!(&rows[0][3], "34990");
    assert_eq!(&rows[0][4], "39990");
    assert_eq!(&rows[0][5], format!("{}/products/7", base_url));
}

#[tokio::test]
async fn test_run_crawl_rejects_invalid_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let csv_path = temp_dir.path().join("products.csv");
    let config = create_test_config("ftp://example.com", csv_path.to_str().unwrap());

    let result = run_crawl(&config, std::future::pending()).await;

    assert!(matches!(result, Err(HarvestError::Config(_))));
    assert!(!csv_path.exists());
}

#[tokio::test]
async fn test_shutdown_before_start_page_fails_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .respond_with(
            html(listing_page("", &[card(1, "99 ₽", None, true)]))
                .set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let csv_path = temp_dir.path().join("products.csv");
    let config = create_test_config(&base_url, csv_path.to_str().unwrap());

    let shutdown = tokio::time::sleep(std::time::Duration::from_millis(100));
    let result = run_crawl(&config, shutdown).await;

    assert!(matches!(result, Err(HarvestError::StartPage { .. })));
}
