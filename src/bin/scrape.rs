use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use gundam_codex::cache::{ReadThrough, create_cache};
use gundam_codex::config::{AppConfig, ConfigLoader};
use gundam_codex::observability::init_tracing;
use gundam_codex::scraper::{
    FetchClient, ImportMode, ImportReport, Importer, ScrapeRunner, fandom, gunpladb, mechabay,
};
use gundam_codex::services::ContentService;
use gundam_codex::storage::{Document, Repositories, Repository, StorageFactory};

/// 把 wiki 与商品站点的数据采集进百科库
#[derive(Parser, Debug)]
#[command(name = "gundam-scrape", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: RunOptions,
}

#[derive(Args, Debug)]
struct RunOptions {
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 最多翻多少页列表
    #[arg(long, global = true, default_value_t = 1)]
    pages: usize,

    /// 最多处理多少个详情页
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// 两次请求之间的间隔（毫秒），覆盖配置
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// 已存在的文档整体覆盖，而不是跳过
    #[arg(long, global = true)]
    update: bool,

    /// 只打印解析结果的 JSON，不写入存储
    #[arg(long, global = true, conflicts_with = "update")]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// gundam.fandom.com 势力
    Factions(WikiSource),
    /// gundam.fandom.com 机体
    LoreSuits(WikiSource),
    /// gundam.fandom.com 人物
    Characters(WikiSource),
    /// gunpladb.net 模型商品
    Gunpladb(ShopSource),
    /// mechabay.com 模型商品
    Mechabay(ShopSource),
}

#[derive(Args, Debug)]
struct WikiSource {
    /// 分类名，例如 "Mobile Suits"
    #[arg(long)]
    category: Option<String>,

    /// 直接指定分类页地址
    #[arg(long, conflicts_with = "category")]
    url: Option<String>,
}

#[derive(Args, Debug)]
struct ShopSource {
    /// 列表页路径或完整地址
    #[arg(long)]
    url: Option<String>,
}

impl WikiSource {
    fn start_url(&self, base_url: &str, default_category: &str) -> String {
        match (&self.url, &self.category) {
            (Some(url), _) => url.clone(),
            (None, Some(category)) => fandom::category_url(base_url, category),
            (None, None) => fandom::category_url(base_url, default_category),
        }
    }
}

/// 一次采集共享的运行环境
struct Context {
    runner: ScrapeRunner,
    mode: ImportMode,
    /// `--dry-run` 时不连接存储
    repositories: Option<Repositories>,
    cache: ReadThrough,
}

impl Context {
    async fn new(config: &AppConfig, options: &RunOptions) -> Result<Self> {
        let client = FetchClient::from_config(&config.scraper).context("创建 HTTP 客户端失败")?;
        let runner = ScrapeRunner::new(client)
            .with_max_pages(options.pages)
            .with_limit(options.limit);

        let mode = if options.dry_run {
            ImportMode::DryRun
        } else if options.update {
            ImportMode::Update
        } else {
            ImportMode::SkipExisting
        };

        let (repositories, cache) = if mode == ImportMode::DryRun {
            (None, ReadThrough::disabled())
        } else {
            let repositories = StorageFactory::create(&config.database)
                .await
                .context("连接存储失败")?;
            // 写入后清掉 API 的读缓存
            let cache = ReadThrough::new(create_cache(&config.cache).await, &config.cache);
            (Some(repositories), cache)
        };

        Ok(Self {
            runner,
            mode,
            repositories,
            cache,
        })
    }

    fn importer<T: Document>(
        &self,
        select: impl FnOnce(&Repositories) -> Arc<dyn Repository<T>>,
    ) -> Importer<T> {
        match &self.repositories {
            Some(repositories) => Importer::new(
                ContentService::new(select(repositories), self.cache.clone()),
                self.mode,
            ),
            None => Importer::dry_run(),
        }
    }
}

async fn run(config: &AppConfig, cli: &Cli) -> Result<ImportReport> {
    let ctx = Context::new(config, &cli.options).await?;
    let scraper = &config.scraper;
    let wiki_next = |page: &str, url: &str, _: usize| fandom::next_category_page(page, url);

    let report = match &cli.command {
        Command::Factions(source) => {
            let importer = ctx.importer(|r| r.factions.clone());
            let start = source.start_url(&scraper.fandom_base_url, "Factions");
            ctx.runner
                .run(&start, fandom::category_members, wiki_next, fandom::parse_faction, &importer)
                .await?
        }
        Command::LoreSuits(source) => {
            let importer = ctx.importer(|r| r.lore.clone());
            let start = source.start_url(&scraper.fandom_base_url, "Mobile Suits");
            ctx.runner
                .run(&start, fandom::category_members, wiki_next, fandom::parse_lore_suit, &importer)
                .await?
        }
        Command::Characters(source) => {
            let importer = ctx.importer(|r| r.characters.clone());
            let start = source.start_url(&scraper.fandom_base_url, "Characters");
            ctx.runner
                .run(&start, fandom::category_members, wiki_next, fandom::parse_character, &importer)
                .await?
        }
        Command::Gunpladb(source) => {
            let importer = ctx.importer(|r| r.mobile_suits.clone());
            let base = scraper.gunpladb_base_url.clone();
            let path = source.url.clone().unwrap_or_else(|| "/kits".to_string());
            let start = gunpladb::listing_url(&base, &path, 1);
            let next = |_: &str, _: &str, page: usize| Some(gunpladb::listing_url(&base, &path, page + 1));
            ctx.runner
                .run(&start, gunpladb::listing_links, next, gunpladb::parse_product, &importer)
                .await?
        }
        Command::Mechabay(source) => {
            let importer = ctx.importer(|r| r.mobile_suits.clone());
            let base = scraper.mechabay_base_url.clone();
            let collection = source.url.clone().unwrap_or_else(|| "gundam".to_string());
            let start = mechabay::listing_url(&base, &collection, 1);
            let next =
                |_: &str, _: &str, page: usize| Some(mechabay::listing_url(&base, &collection, page + 1));
            ctx.runner
                .run(&start, mechabay::listing_links, next, mechabay::parse_product, &importer)
                .await?
        }
    };

    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.options.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    }
    .context("加载配置失败")?;
    if let Some(delay_ms) = cli.options.delay_ms {
        config.scraper.delay_ms = delay_ms;
    }

    let _log_guard = init_tracing(&config.logging).context("初始化日志失败")?;
    info!(command = ?cli.command, delay_ms = config.scraper.delay_ms, "开始采集");

    let report = run(&config, &cli).await?;
    // 汇总写到 stderr，stdout 留给 --dry-run 的 JSON
    eprintln!("{}", report);
    Ok(())
}
