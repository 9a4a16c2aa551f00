use std::time::Duration;
use travaux_scraper::{FetchError, ListOptions, ScrapeError, ScraperConfig, TaskScraper};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn config(server: &MockServer) -> ScraperConfig {
    ScraperConfig {
        base_url: server.uri(),
        user_agent: "travaux-test/1.0".to_string(),
        request_timeout_secs: 5,
        max_retries: 0,
        retry_base_delay_ms: 10,
        ..Default::default()
    }
}

fn list_page(ids: &[&str], pagecount: u32) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr id="task{id}"><td class="task_id">{id}</td><td class="task_tasktype">Incident</td>
                <td class="task_project">Network</td><td class="task_category">Backbone</td>
                <td class="task_summary"><a>Task {id}</a></td><td class="task_status">Open</td></tr>"#
            )
        })
        .collect();
    format!(r#"<html><body><div id="numbers">Page 1 of {pagecount}</div><table>{rows}</table></body></html>"#)
}

async fn mount_list_page(server: &MockServer, project: &str, page: &str, body: String, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("project", project))
        .and(query_param("pagenum", page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("project", "0"))
        .and(query_param("perpage", "1"))
        .and(header("user-agent", "travaux-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="projectsmenupos"><input name="project" value="4"><input class="mainbutton" value="Network"></div></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = TaskScraper::from_config(&config(&server)).unwrap();
    let categories = scraper.list_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, "4");
    assert_eq!(categories[0].name, "Network");
}

#[tokio::test]
async fn test_non_success_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scraper = TaskScraper::from_config(&config(&server)).unwrap();
    let err = scraper.fetch_detail("10421", None).await.unwrap_err();
    match err {
        ScrapeError::Fetch(FetchError::Status { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("?do=details&id=10421"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss.php"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rss.php"))
        .and(query_param("proj", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<rss version=\"2.0\"><channel><item><link>http://x/?do=details&amp;id=1</link></item></channel></rss>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = ScraperConfig {
        max_retries: 2,
        ..config(&server)
    };
    let scraper = TaskScraper::from_config(&config).unwrap();
    let items = scraper.consume_feed(0).await.unwrap();
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_streamed_feed_with_three_items() {
    let server = MockServer::start().await;
    let items: String = (1..=3)
        .map(|i| format!("<item><title>FS#{i}</title><link>http://x/?do=details&amp;id={i}</link></item>"))
        .collect();
    let body = format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Travaux</title>{items}</channel></rss>"
    );
    Mock::given(method("GET"))
        .and(path("/rss.php"))
        .and(query_param("proj", "7"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let scraper = TaskScraper::from_config(&config(&server)).unwrap();
    let items = scraper.consume_feed(7).await.unwrap();
    let titles: Vec<_> = items.iter().filter_map(|i| i.title.as_deref()).collect();
    assert_eq!(titles, vec!["FS#1", "FS#2", "FS#3"]);
}

#[tokio::test]
async fn test_page_order_survives_injected_latency() {
    let server = MockServer::start().await;
    mount_list_page(&server, "3", "2", list_page(&["20", "21"], 4), 300).await;
    mount_list_page(&server, "3", "3", list_page(&["30"], 4), 150).await;
    mount_list_page(&server, "3", "4", list_page(&["40"], 4), 0).await;

    let scraper = TaskScraper::from_config(&config(&server)).unwrap();
    for concurrency in [1, 3] {
        let listing = scraper
            .list_pages(
                3,
                &ListOptions {
                    from: Some(2),
                    to: Some(4),
                    concurrency: Some(concurrency),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ids: Vec<_> = listing.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["20", "21", "30", "40"]);
        assert!(listing.tasks.iter().all(|t| t.project_id.as_deref() == Some("3")));
    }
}

#[tokio::test]
async fn test_request_timeout_is_enforced() {
    let server = MockServer::start().await;
    mount_list_page(&server, "1", "1", list_page(&["1"], 1), 3_000).await;

    let config = ScraperConfig {
        request_timeout_secs: 1,
        ..config(&server)
    };
    let scraper = TaskScraper::from_config(&config).unwrap();
    let err = scraper.fetch_list_page(1, 1, false).await.unwrap_err();
    assert!(matches!(err, ScrapeError::Fetch(FetchError::Transport { .. })));
}
