//! 采集流程
//!
//! 串行执行：翻页收集详情链接，再逐个抓取、解析、写入。

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::error::Result;
use crate::scraper::client::FetchClient;
use crate::scraper::importer::{ImportReport, Importer};
use crate::storage::repository::Document;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

pub struct ScrapeRunner {
    client: FetchClient,
    max_pages: usize,
    limit: Option<usize>,
    show_progress: bool,
}

impl ScrapeRunner {
    pub fn new(client: FetchClient) -> Self {
        Self {
            client,
            max_pages: 1,
            limit: None,
            show_progress: true,
        }
    }

    /// 最多翻多少页列表
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages.max(1);
        self
    }

    /// 最多处理多少个详情页
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// 从 `start_url` 开始翻页收集链接
    ///
    /// `next` 接收当前页内容、地址与页码（从 1 开始），返回下一页地址。
    /// 第一页抓取失败直接返回错误；后续页失败只停止翻页。
    pub async fn discover<L, N>(&self, start_url: &str, links: L, next: N) -> Result<Vec<String>>
    where
        L: Fn(&str, &str) -> Vec<String>,
        N: Fn(&str, &str, usize) -> Option<String>,
    {
        let mut found: Vec<String> = Vec::new();
        let mut url = start_url.to_string();

        for page_no in 1..=self.max_pages {
            let page = match self.client.get_text(&url).await {
                Ok(page) => page,
                Err(e) if page_no == 1 => return Err(e),
                Err(e) => {
                    warn!(url = %url, error = %e, "列表页抓取失败，停止翻页");
                    break;
                }
            };

            let before = found.len();
            for link in links(page.as_str(), url.as_str()) {
                if !found.contains(&link) {
                    found.push(link);
                }
            }
            info!(page = page_no, url = %url, new = found.len() - before, "列表页");

            if found.len() == before || self.limit.is_some_and(|l| found.len() >= l) {
                break;
            }
            match next(page.as_str(), url.as_str(), page_no) {
                Some(next_url) if next_url != url => url = next_url,
                _ => break,
            }
        }

        if let Some(limit) = self.limit {
            found.truncate(limit);
        }
        Ok(found)
    }

    /// 逐个抓取详情页并写入；单页失败只计数
    pub async fn import_pages<T, P>(
        &self,
        urls: &[String],
        parse: P,
        importer: &Importer<T>,
    ) -> ImportReport
    where
        T: Document,
        P: Fn(&str, &str) -> Result<T>,
    {
        let mut report = ImportReport {
            discovered: urls.len(),
            ..Default::default()
        };
        let pb = self.progress_bar(urls.len());

        for url in urls {
            pb.set_message(url.clone());
            match self.client.get_text(url).await.and_then(|page| parse(page.as_str(), url.as_str())) {
                Ok(doc) => importer.import_into(doc, &mut report).await,
                Err(e) => {
                    warn!(url = %url, error = %e, "页面处理失败");
                    report.record_failure();
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("done");
        info!(collection = T::COLLECTION, "{}", report);
        report
    }

    /// 收集链接并导入
    pub async fn run<T, L, N, P>(
        &self,
        start_url: &str,
        links: L,
        next: N,
        parse: P,
        importer: &Importer<T>,
    ) -> Result<ImportReport>
    where
        T: Document,
        L: Fn(&str, &str) -> Vec<String>,
        N: Fn(&str, &str, usize) -> Option<String>,
        P: Fn(&str, &str) -> Result<T>,
    {
        let urls = self.discover(start_url, links, next).await?;
        info!(collection = T::COLLECTION, count = urls.len(), "待处理页面");
        Ok(self.import_pages(&urls, parse, importer).await)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ReadThrough;
    use crate::models::LoreCharacter;
    use crate::scraper::fandom;
    use crate::scraper::importer::ImportMode;
    use crate::services::ContentService;
    use crate::storage::MemoryRepository;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runner(pages: usize, limit: Option<usize>) -> ScrapeRunner {
        let client = FetchClient::new("codex-test", Duration::from_secs(5), Duration::ZERO).unwrap();
        ScrapeRunner::new(client)
            .with_max_pages(pages)
            .with_limit(limit)
            .with_progress(false)
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_string(body.to_string())
    }

    async fn wiki() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wiki/Category:Pilots"))
            .and(query_param("from", "K"))
            .respond_with(html(
                r#"<a class="category-page__member-link" href="/wiki/Kai_Shiden">Kai</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Category:Pilots"))
            .respond_with(html(
                r#"<a class="category-page__member-link" href="/wiki/Amuro_Ray">Amuro</a>
                   <a class="category-page__member-link" href="/wiki/Broken">Broken</a>
                   <a class="category-page__pagination-next" href="/wiki/Category:Pilots?from=K">Next</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Amuro_Ray"))
            .respond_with(html("<h1>Amuro Ray</h1><p>Ace pilot.</p>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Kai_Shiden"))
            .respond_with(html("<h1>Kai Shiden</h1>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/wiki/Broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_discover_follows_pages_and_respects_limit() {
        let server = wiki().await;
        let start = fandom::category_url(&server.uri(), "Pilots");
        let next = |page: &str, url: &str, _: usize| fandom::next_category_page(page, url);

        let all = runner(5, None)
            .discover(&start, fandom::category_members, next)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[2].ends_with("/wiki/Kai_Shiden"));

        let one_page = runner(1, None)
            .discover(&start, fandom::category_members, next)
            .await
            .unwrap();
        assert_eq!(one_page.len(), 2);

        let limited = runner(5, Some(1))
            .discover(&start, fandom::category_members, next)
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_run_imports_and_counts_failures() {
        let server = wiki().await;
        let service = ContentService::<LoreCharacter>::new(
            Arc::new(MemoryRepository::new()),
            ReadThrough::disabled(),
        );
        let importer = Importer::new(service.clone(), ImportMode::SkipExisting);
        let start = fandom::category_url(&server.uri(), "Pilots");

        let report = runner(5, None)
            .run(
                &start,
                fandom::category_members,
                |page: &str, url: &str, _: usize| fandom::next_category_page(page, url),
                fandom::parse_character,
                &importer,
            )
            .await
            .unwrap();

        assert_eq!(report.discovered, 3);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(service.count_all().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_first_listing_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = runner(3, None)
            .discover(&server.uri(), fandom::category_members, |_: &str, _: &str, _: usize| None)
            .await;
        assert!(result.is_err());
    }
}
