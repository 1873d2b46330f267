//! Local HTTP site for driving the engine end to end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use novelsync::config::ScrapingConfig;
use novelsync::scrapers::{SelectorConfig, StrategyConfig};

/// Canned responses keyed by request path and query. Each request to a
/// route consumes the next response; the last one repeats.
#[derive(Default, Clone)]
pub struct Routes {
    routes: HashMap<String, Vec<(u16, String)>>,
    delay: Duration,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, path: &str, body: impl Into<String>) -> Self {
        self.routes.insert(path.to_string(), vec![(200, body.into())]);
        self
    }

    pub fn status(mut self, path: &str, status: u16) -> Self {
        self.routes
            .insert(path.to_string(), vec![(status, String::new())]);
        self
    }

    pub fn sequence(mut self, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.routes.insert(path.to_string(), responses);
        self
    }

    /// Holds every response for `delay` before answering.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct Traffic {
    hits: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Local site answering from [`Routes`]. Requests are handled on their own
/// threads, so concurrent client requests overlap on the server too.
pub struct TestSite {
    pub base: String,
    routes: Arc<Mutex<Routes>>,
    traffic: Arc<Traffic>,
    shutdown: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestSite {
    pub fn spawn(routes: Routes) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
        let base = format!("http://{}", server.server_addr());
        let routes = Arc::new(Mutex::new(routes));
        let traffic = Arc::new(Traffic::default());
        let (shutdown, shutdown_rx) = mpsc::channel::<()>();

        let shared_routes = Arc::clone(&routes);
        let shared_traffic = Arc::clone(&traffic);
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(20)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let seen = {
                    let mut hits = shared_traffic.hits.lock().unwrap();
                    let n = hits.entry(url.clone()).or_insert(0);
                    *n += 1;
                    *n
                };

                let (status, body, delay) = {
                    let routes = shared_routes.lock().unwrap();
                    let (status, body) = match routes.routes.get(&url) {
                        Some(responses) => responses[(seen - 1).min(responses.len() - 1)].clone(),
                        None => (404, "not found".to_string()),
                    };
                    (status, body, routes.delay)
                };

                let traffic = Arc::clone(&shared_traffic);
                thread::spawn(move || {
                    let now = traffic.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    traffic.peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(delay);
                    // Not counted while the response is written.
                    traffic.in_flight.fetch_sub(1, Ordering::SeqCst);

                    let header =
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..])
                            .unwrap();
                    let _ = request.respond(
                        tiny_http::Response::from_string(body)
                            .with_status_code(status)
                            .with_header(header),
                    );
                });
            }
        });

        Self {
            base,
            routes,
            traffic,
            shutdown,
            handle: Some(handle),
        }
    }

    /// Swaps the served routes, keeping the address and request counts.
    pub fn replace(&self, routes: Routes) {
        *self.routes.lock().unwrap() = routes;
    }

    pub fn url(&self, path: &str) -> url::Url {
        url::Url::parse(&format!("{}{}", self.base, path)).unwrap()
    }

    /// Number of requests served for `path` (path and query).
    pub fn hits(&self, path: &str) -> usize {
        self.traffic.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Most requests that were being handled at the same moment.
    pub fn peak_in_flight(&self) -> usize {
        self.traffic.peak.load(Ordering::SeqCst)
    }
}

impl Drop for TestSite {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn fast_config() -> ScrapingConfig {
    ScrapingConfig {
        concurrency: 3,
        retry_attempts: 3,
        retry_delay_sec: 0.01,
        delay_between_requests_sec: 0.0,
        timeout_sec: 5,
        ..ScrapingConfig::default()
    }
}

/// Listing-style strategy for the test site, zero-based `data-page` like novelfull.
pub fn strategy_config(authority: &str) -> StrategyConfig {
    StrategyConfig {
        authority: authority.to_string(),
        selectors: SelectorConfig {
            title: "h3.title".to_string(),
            author: "div.info a.author".to_string(),
            rating: Some("span.rating".to_string()),
            description: "div.desc-text p".to_string(),
            genres: "div.info a.genre".to_string(),
            alternative_names: None,
            status: "div.info span.status".to_string(),
            thumbnail: "div.book img".to_string(),
            chapter_links: "ul.list-chapter li a".to_string(),
            chapter_title: "a.chapter-title".to_string(),
            chapter_content: "#chapter-content p".to_string(),
            alternative_chapter_content: "#chapter-content div".to_string(),
            last_toc_page: "li.last a".to_string(),
            last_toc_page_number_attribute: "data-page".to_string(),
            latest_chapter: Some("ul.l-chapters li a".to_string()),
        },
        pagination_template: "?page={page}".to_string(),
        page_offset: 1,
        completed_status: "completed".to_string(),
        novel_info_on_different_page: false,
    }
}

/// A listing page with the given chapter links. `last_page` is one-based.
pub fn listing_page(chapters: &[&str], last_page: u32) -> String {
    let links: String = chapters
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">Chapter {href}</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
<h3 class="title">The Long Road</h3>
<div class="info">
  <a class="author" href="/author/ana">Ana Reyes</a>
  <a class="genre" href="/genre/fantasy">Fantasy</a>
  <a class="genre" href="/genre/action">Action</a>
  <span class="status">Completed</span>
</div>
<span class="rating">8.7</span>
<div class="desc-text"><p>A long road.</p><p>Walked slowly.</p></div>
<div class="book"><img src="/covers/road.jpg"></div>
<ul class="l-chapters"><li><a href="/road/c-7">Chapter 7: The End</a></li></ul>
<ul class="list-chapter">{links}</ul>
<ul class="pagination"><li class="last"><a href="?page={last_page}" data-page="{zero_based}">Last</a></li></ul>
</body></html>"#,
        zero_based = last_page - 1
    )
}

/// A chapter page with `paragraphs` body paragraphs.
pub fn chapter_page(title: &str, paragraphs: usize) -> String {
    let body: String = (1..=paragraphs)
        .map(|i| format!("<p>Paragraph {i} of {title}.</p>"))
        .collect();
    format!(
        r##"<html><body><a class="chapter-title" href="#">{title}</a><div id="chapter-content">{body}</div></body></html>"##
    )
}
