//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a fake social network and drive the
//! full login/crawl/logout cycle over the real TCP transport. The crawler is
//! blocking, so it runs on a `spawn_blocking` thread beside the mock server.

use flag_harvester::config::Config;
use flag_harvester::crawler::{harvest, Credentials};
use flag_harvester::HarvestError;
use wiremock::matchers::{body_string_contains, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PAGE: &str = r#"<html><body>
    <form method="post" action="/accounts/login/">
        <input type="hidden" name="csrfmiddlewaretoken" value="tok123">
        <input type="text" name="username">
        <input type="password" name="password">
    </form>
</body></html>"#;

/// Creates a test configuration aimed at the mock server
fn create_test_config(server: &MockServer, target: usize) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = server.address().port();
    config.server.read_block_size = 64;
    config.crawler.target_flags = target;
    config.crawler.retry_backoff_ms = 0;
    config.crawler.max_backoff_ms = 0;
    config.crawler.max_retries = 3;
    config
}

fn flag(seed: char) -> String {
    seed.to_string().repeat(64)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

/// Mounts the login form, the login handler and the cookie-less fallback
/// that bounces every protected page to the login form
async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/accounts/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(LOGIN_PAGE)
                .insert_header("content-type", "text/html")
                .insert_header("set-cookie", "csrftoken=tok123; Path=/"),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .and(header_exists("cookie"))
        .and(body_string_contains("csrfmiddlewaretoken=tok123"))
        .and(body_string_contains("username=alice"))
        .and(body_string_contains("password=s3cret"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/fakebook/")
                .insert_header("set-cookie", "sessionid=s1; HttpOnly; Path=/"),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex("^/fakebook/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/accounts/login/?next=/fakebook/"),
        )
        .with_priority(10)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts/logout/"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/accounts/login/"))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts an authenticated page
async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page))
        .and(header_exists("cookie"))
        .respond_with(response)
        .with_priority(2)
        .mount(server)
        .await;
}

async fn run_harvest(config: Config) -> Result<Vec<String>, HarvestError> {
    tokio::task::spawn_blocking(move || {
        harvest(&config, Credentials::new("alice", "s3cret")).map(|flags| flags.into_vec())
    })
    .await
    .expect("Crawl task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_harvest() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let (f1, f2, f3) = (flag('a'), flag('b'), flag('c'));

    mount_page(
        &server,
        "/fakebook/",
        html(&format!(
            r#"<a href="/fakebook/1/">Friend 1</a>
               <a href="/fakebook/2/">Friend 2</a>
               <a href="mailto:admin@example.com">Mail</a>
               <a href="http://elsewhere.example/">Elsewhere</a>
               <h2 class="secret_flag" style="color:red">FLAG: {f1}</h2>"#
        )),
    )
    .await;

    mount_page(
        &server,
        "/fakebook/1/",
        ResponseTemplate::new(301).insert_header("location", "/fakebook/3/"),
    )
    .await;

    mount_page(
        &server,
        "/fakebook/3/",
        html(&format!(
            r#"<a href="/fakebook/">Home</a>
               <h2 class="secret_flag" style="color:red">FLAG: {f2}</h2>"#
        )),
    )
    .await;

    // First hit fails, the retry over a fresh connection succeeds
    Mock::given(method("GET"))
        .and(path("/fakebook/2/"))
        .and(header_exists("cookie"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/fakebook/2/",
        html(&format!(r#"<h2 class="secret_flag">FLAG: {f3}</h2>"#)),
    )
    .await;

    let config = create_test_config(&server, 3);
    let flags = run_harvest(config).await.expect("Crawl failed");

    assert_eq!(flags, vec![f1, f2, f3]);
    // Wiremock verifies the login and logout expectations when the server drops
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_errors_are_abandoned() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let found = flag('d');

    mount_page(
        &server,
        "/fakebook/",
        html(
            r#"<a href="/fakebook/missing/">Gone</a>
               <a href="/fakebook/forbidden/">Forbidden</a>
               <a href="/fakebook/4/">Friend 4</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/fakebook/missing/", ResponseTemplate::new(404)).await;
    mount_page(&server, "/fakebook/forbidden/", ResponseTemplate::new(403)).await;
    mount_page(
        &server,
        "/fakebook/4/",
        html(&format!(r#"<h2 class="secret_flag">FLAG: {found}</h2>"#)),
    )
    .await;

    let config = create_test_config(&server, 1);
    let flags = run_harvest(config).await.expect("Crawl failed");

    assert_eq!(flags, vec![found]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_frontier_exhausted() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    mount_page(
        &server,
        "/fakebook/",
        html(&format!(
            r#"<a href="/fakebook/5/">Friend 5</a>
               <h2 class="secret_flag">FLAG: {}</h2>"#,
            flag('e')
        )),
    )
    .await;
    mount_page(&server, "/fakebook/5/", html("<p>No flags here</p>")).await;

    let config = create_test_config(&server, 5);
    let err = run_harvest(config).await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::FrontierExhausted {
            found: 1,
            target: 5
        }
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fakebook/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/accounts/login/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Please try again"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, 1);
    let err = run_harvest(config).await.unwrap_err();

    assert!(matches!(err, HarvestError::LoginRejected { status: 200 }));
}
