// Integration tests for the content layer
//
// Tests cover:
// - Read-through caching and invalidation on writes
// - Paging, keyword search and filters
// - Timeline event ordering
// - Registration, login and token validation
// - Scraped pages flowing through the importer

use std::sync::Arc;

use gundam_codex::cache::{Cache, MemoryCache, ReadThrough};
use gundam_codex::config::AppConfig;
use gundam_codex::models::{Faction, Grade, LoreMobileSuit, MobileSuit, Timeline, TimelineEvent};
use gundam_codex::scraper::{ImportMode, ImportReport, Importer, fandom};
use gundam_codex::security::auth::{Authenticator, JwtAuth};
use gundam_codex::services::{AuthService, ContentService, Registration, TimelineService};
use gundam_codex::storage::{ListQuery, MemoryRepository, Pagination, Repositories};

fn cached<T: gundam_codex::storage::Document>() -> (ContentService<T>, Arc<MemoryCache>) {
    let config = AppConfig::testing();
    let cache = Arc::new(MemoryCache::new());
    let read_through = ReadThrough::new(cache.clone(), &config.cache);
    (
        ContentService::new(Arc::new(MemoryRepository::<T>::new()), read_through),
        cache,
    )
}

// ============ Cache Tests ============

#[tokio::test]
async fn test_reads_populate_cache_and_writes_invalidate() {
    let (service, cache) = cached::<Faction>();
    let zeon = service.create(Faction::new("Principality of Zeon")).await.unwrap();

    service.get(&zeon.id).await.unwrap();
    service
        .list(&ListQuery::new(Pagination::new(1, 10)))
        .await
        .unwrap();
    assert_eq!(cache.len(), 2);

    service
        .update(&zeon.id, |f| {
            f.era = "Universal Century".into();
            Ok(())
        })
        .await
        .unwrap();
    assert!(cache.is_empty());

    let fresh = service.get(&zeon.id).await.unwrap();
    assert_eq!(fresh.era, "Universal Century");
    assert!(cache.ping().await.is_ok());
}

// ============ Listing Tests ============

#[tokio::test]
async fn test_pages_are_disjoint_and_searchable() {
    let (service, _) = cached::<MobileSuit>();
    let kits = [
        ("HG RX-78-2 Gundam", Grade::HighGrade),
        ("MG Zaku II Ver.2.0", Grade::MasterGrade),
        ("RG Zaku II", Grade::RealGrade),
        ("HG Gouf", Grade::HighGrade),
        ("PG Unleashed RX-78-2", Grade::PerfectGrade),
    ];
    for (name, grade) in kits {
        service.create(MobileSuit::new(name, grade)).await.unwrap();
    }

    let first = service.list(&ListQuery::new(Pagination::new(1, 2))).await.unwrap();
    let second = service.list(&ListQuery::new(Pagination::new(2, 2))).await.unwrap();
    assert_eq!(first.total, 5);
    assert!(first
        .items
        .iter()
        .all(|a| second.items.iter().all(|b| a.id != b.id)));

    let zaku = service
        .list(&ListQuery::new(Pagination::new(1, 10)).with_keyword(Some("zaku".into())))
        .await
        .unwrap();
    assert_eq!(zaku.total, 2);

    let hg = service
        .list(&ListQuery::new(Pagination::new(1, 10)).with_filter("grade", Some("HG".into())))
        .await
        .unwrap();
    assert_eq!(hg.total, 2);
}

// ============ Timeline Tests ============

#[tokio::test]
async fn test_timeline_events_sorted_by_year_then_date() {
    let (content, _) = cached::<Timeline>();
    let timelines = TimelineService::new(content);
    let uc = timelines
        .create(Timeline::new("Universal Century", 1))
        .await
        .unwrap();

    timelines
        .add_event(&uc.id, TimelineEvent::new("Unknown", None, "Undated skirmish", ""))
        .await
        .unwrap();
    timelines
        .add_event(&uc.id, TimelineEvent::new("0079.09.18", Some(79), "Battle of Solomon", ""))
        .await
        .unwrap();
    let uc = timelines
        .add_event(&uc.id, TimelineEvent::new("0079.01.03", Some(79), "One Year War begins", ""))
        .await
        .unwrap();

    let titles: Vec<_> = uc.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["One Year War begins", "Battle of Solomon", "Undated skirmish"]
    );
}

// ============ Auth Tests ============

#[tokio::test]
async fn test_first_user_is_admin_and_tokens_validate() {
    let config = AppConfig::testing();
    let repositories = Repositories::in_memory();
    let auth = AuthService::new(repositories.users.clone(), &config.security);
    let jwt = JwtAuth::from_config(&config.security);

    let bright = auth
        .register(Registration {
            username: "bright".into(),
            email: "bright@whitebase.ef".into(),
            password: "gundam0079".into(),
        })
        .await
        .unwrap();
    let kai = auth
        .register(Registration {
            username: "kai".into(),
            email: "kai@whitebase.ef".into(),
            password: "gundam0079".into(),
        })
        .await
        .unwrap();
    assert!(bright.user.is_admin());
    assert!(!kai.user.is_admin());

    let session = auth.login("KAI@whitebase.ef", "gundam0079").await.unwrap();
    let claims = jwt.validate_token(&session.token.token).await.unwrap();
    assert_eq!(claims.sub, kai.user.id);
    assert_eq!(claims.role, "user");

    assert!(auth.login("kai", "wrong-password").await.is_err());
    assert!(auth.login("", "gundam0079").await.is_err());
}

// ============ Import Tests ============

#[tokio::test]
async fn test_scraped_lore_suit_is_updated_in_place() {
    let (service, _) = cached::<LoreMobileSuit>();
    let url = "https://gundam.fandom.com/wiki/MS-06_Zaku_II";
    let page = r#"<h1>MS-06 Zaku II</h1>
        <div class="pi-item pi-data" data-source="manufacturer"><h3 class="pi-data-label">Manufacturer</h3><div class="pi-data-value">Zeonic Company</div></div>"#;

    let mut report = ImportReport::default();
    let importer = Importer::new(service.clone(), ImportMode::SkipExisting);
    importer
        .import_into(fandom::parse_lore_suit(page, url).unwrap(), &mut report)
        .await;
    importer
        .import_into(fandom::parse_lore_suit(page, url).unwrap(), &mut report)
        .await;
    assert_eq!((report.created, report.skipped), (1, 1));

    let original = service.find_by_natural_key(url).await.unwrap().unwrap();
    let updated_page = page.replace("Zeonic Company", "Zeonic Company, Zimmad");
    let updater = Importer::new(service.clone(), ImportMode::Update);
    updater
        .import_into(fandom::parse_lore_suit(&updated_page, url).unwrap(), &mut report)
        .await;

    let stored = service.get(&original.id).await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(stored.manufacturer.as_deref(), Some("Zeonic Company, Zimmad"));
    assert_eq!(stored.created_at, original.created_at);
    assert_eq!(service.count_all().await.unwrap(), 1);
}
