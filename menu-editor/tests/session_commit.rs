// menu-editor/tests/session_commit.rs
// Staging + commit against the in-memory backend

use std::sync::Arc;
use std::time::Duration;

use menu_editor::{
    EditSession, EditorConfig, EditorError, EntityKind, MemoryBackend, OutcomeStatus, PersistError,
};
use rust_decimal::Decimal;
use shared::models::{Category, Dish, EntityId, Restaurant, RestaurantUpdate};
use shared::staged::ActionKind;
use tokio_util::sync::CancellationToken;

struct Fixture {
    backend: Arc<MemoryBackend>,
    session: EditSession,
    mains: Category,
    dishes: Vec<Dish>,
}

fn restaurant(id: i64, slug: &str, user_id: &str) -> Restaurant {
    Restaurant {
        id,
        name: slug.to_string(),
        logo_url: None,
        slug: slug.to_string(),
        user_id: user_id.to_string(),
        created_at: None,
        updated_at: None,
    }
}

/// Restaurant 1 owned by "u1" with one category "Mains" and three dishes
async fn fixture_with(backend: MemoryBackend) -> Fixture {
    let backend = Arc::new(backend);
    backend.insert_restaurant(restaurant(1, "bistro", "u1"));
    let mains = backend.insert_category(1, "Mains");
    let dishes = ["Steak", "Risotto", "Curry"]
        .iter()
        .map(|title| backend.insert_dish(Dish::draft(mains.id, *title, Decimal::new(15, 0))))
        .collect();

    let session = EditSession::new(backend.clone(), EditorConfig::default());
    session.load(1).await.unwrap();
    Fixture {
        backend,
        session,
        mains,
        dishes,
    }
}

async fn fixture() -> Fixture {
    fixture_with(MemoryBackend::new()).await
}

fn renamed(dish: &Dish, title: &str) -> Dish {
    Dish {
        title: title.to_string(),
        ..dish.clone()
    }
}

#[tokio::test]
async fn test_dish_under_new_category_gets_server_parent_id() {
    let f = fixture().await;

    let desserts = Category::draft(1, "Desserts");
    let flan = Dish::draft(desserts.id, "Flan", Decimal::new(6, 0));
    f.session
        .stage_category(desserts.id, ActionKind::Create, desserts.clone())
        .unwrap();
    f.session
        .stage_dish(flan.id, ActionKind::Create, flan.clone())
        .unwrap();

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());

    let server_category = report.remap.get(&desserts.id).unwrap();
    assert!(!server_category.is_temp());

    let OutcomeStatus::Committed { server_id } = report.outcome(&flan.id).unwrap().status else {
        panic!("dish create not committed");
    };
    let stored = f.backend.dish(server_id.persisted().unwrap()).unwrap();
    assert_eq!(stored.category_id, server_category);

    // no call ever carried the temporary parent id
    assert!(
        f.backend
            .calls()
            .iter()
            .all(|call| call.category_id != Some(desserts.id))
    );

    assert!(!f.session.has_unsaved_changes());
    let merged = f.session.merged_menu();
    let last = merged.last().unwrap();
    assert_eq!(last.id(), server_category);
    assert_eq!(last.dishes[0].id, server_id);
    assert_eq!(last.dishes[0].category_id, server_category);
}

#[tokio::test]
async fn test_partial_failure_keeps_only_failed_entry() {
    let f = fixture().await;
    for (dish, title) in f.dishes.iter().zip(["Ribeye", "Mushroom risotto", "Green curry"]) {
        f.session
            .stage_dish(dish.id, ActionKind::Update, renamed(dish, title))
            .unwrap();
    }
    f.backend.fail_on(
        EntityKind::Dish,
        f.dishes[1].id,
        PersistError::Server("database is locked".to_string()),
    );

    let report = f.session.commit().await.unwrap();
    assert!(!report.is_complete());
    let failed: Vec<_> = report.failures().map(|o| o.id).collect();
    assert_eq!(failed, vec![f.dishes[1].id]);

    f.session.with_cache(|cache| {
        assert_eq!(cache.dishes().len(), 1);
        assert!(cache.dishes().contains(&f.dishes[1].id));
        assert!(cache.categories().is_empty());
    });
    assert!(f.session.has_unsaved_changes());

    // committed edits are now server truth
    assert_eq!(f.backend.dish(f.dishes[0].id.persisted().unwrap()).unwrap().title, "Ribeye");
    assert_eq!(f.backend.dish(f.dishes[1].id.persisted().unwrap()).unwrap().title, "Risotto");

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.outcomes.len(), 1);
    assert!(!f.session.has_unsaved_changes());
}

#[tokio::test]
async fn test_dish_deletes_sent_before_category_delete() {
    let f = fixture().await;
    f.session
        .stage_category(f.mains.id, ActionKind::Delete, f.mains.clone())
        .unwrap();
    f.session.with_cache(|cache| assert_eq!(cache.dishes().len(), 3));
    assert!(f.session.merged_menu().is_empty());

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());

    let calls = f.backend.calls();
    let kinds: Vec<_> = calls.iter().map(|c| (c.kind, c.action)).collect();
    assert_eq!(
        kinds,
        vec![
            (EntityKind::Dish, ActionKind::Delete),
            (EntityKind::Dish, ActionKind::Delete),
            (EntityKind::Dish, ActionKind::Delete),
            (EntityKind::Category, ActionKind::Delete),
        ]
    );
    assert!(f.backend.category(f.mains.id.persisted().unwrap()).is_none());
    assert!(f.backend.dishes().is_empty());
    assert!(!f.session.has_unsaved_changes());
}

#[tokio::test]
async fn test_category_delete_blocked_by_failed_dish_delete() {
    let f = fixture().await;
    f.session
        .stage_category(f.mains.id, ActionKind::Delete, f.mains.clone())
        .unwrap();
    f.backend.fail_on(
        EntityKind::Dish,
        f.dishes[2].id,
        PersistError::Transport("timed out".to_string()),
    );

    let report = f.session.commit().await.unwrap();
    assert_eq!(
        report.outcome(&f.mains.id).unwrap().status,
        OutcomeStatus::Blocked { on: f.dishes[2].id }
    );
    assert!(f.backend.category(f.mains.id.persisted().unwrap()).is_some());

    f.session.with_cache(|cache| {
        assert_eq!(cache.categories().kind_of(&f.mains.id), Some(ActionKind::Delete));
        assert_eq!(cache.dishes().len(), 1);
    });

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());
    assert!(f.backend.category(f.mains.id.persisted().unwrap()).is_none());
}

#[tokio::test]
async fn test_second_commit_rejected_while_first_in_flight() {
    let f = fixture_with(MemoryBackend::new().with_latency(Duration::from_millis(50))).await;
    f.session
        .stage_dish(f.dishes[0].id, ActionKind::Update, renamed(&f.dishes[0], "T-bone"))
        .unwrap();

    let (first, second) = tokio::join!(f.session.commit(), f.session.commit());
    assert!(first.unwrap().is_complete());
    assert!(matches!(second, Err(EditorError::CommitInProgress)));

    // flag released once the first commit finished
    assert!(!f.session.is_committing());
    assert!(f.session.commit().await.unwrap().is_complete());
}

#[tokio::test]
async fn test_cancellation_skips_unissued_entries() {
    let f = fixture_with(MemoryBackend::new().with_latency(Duration::from_millis(100))).await;
    for dish in &f.dishes {
        f.session
            .stage_dish(dish.id, ActionKind::Update, renamed(dish, "Special"))
            .unwrap();
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let (report, _) = tokio::join!(f.session.commit_with_cancel(cancel), async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let report = report.unwrap();

    assert!(report.cancelled);
    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status.clone()).collect();
    assert!(statuses[0].is_committed());
    assert_eq!(statuses[1..], [OutcomeStatus::Skipped, OutcomeStatus::Skipped]);
    assert_eq!(f.backend.calls().len(), 1);

    f.session.with_cache(|cache| {
        assert_eq!(cache.dishes().len(), 2);
        assert!(!cache.dishes().contains(&f.dishes[0].id));
    });
}

#[tokio::test]
async fn test_edit_during_commit_survives() {
    let f = fixture_with(MemoryBackend::new().with_latency(Duration::from_millis(60))).await;
    let steak = &f.dishes[0];
    f.session
        .stage_dish(steak.id, ActionKind::Update, renamed(steak, "Sirloin"))
        .unwrap();

    let (report, staged) = tokio::join!(f.session.commit(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        // projection and staging stay available mid-commit
        assert!(f.session.is_committing());
        assert_eq!(f.session.merged_menu()[0].dishes[0].title, "Sirloin");
        f.session
            .stage_dish(steak.id, ActionKind::Update, renamed(steak, "Flank"))
    });
    assert!(report.unwrap().is_complete());
    staged.unwrap();

    let stored = f.backend.dish(steak.id.persisted().unwrap()).unwrap();
    assert_eq!(stored.title, "Sirloin");
    f.session.with_cache(|cache| {
        assert_eq!(cache.dishes().get(&steak.id).unwrap().payload().title, "Flank");
    });
    assert!(f.session.has_unsaved_changes());
}

#[tokio::test]
async fn test_create_amended_during_commit_becomes_update() {
    let f = fixture_with(MemoryBackend::new().with_latency(Duration::from_millis(60))).await;
    let sides = Category::draft(1, "Sides");
    f.session
        .stage_category(sides.id, ActionKind::Create, sides.clone())
        .unwrap();

    let (report, staged) = tokio::join!(f.session.commit(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let renamed = Category {
            name: "Side dishes".to_string(),
            ..sides.clone()
        };
        f.session.stage_category(sides.id, ActionKind::Update, renamed)
    });
    let report = report.unwrap();
    staged.unwrap();

    let server_id = report.remap.get(&sides.id).unwrap();
    f.session.with_cache(|cache| {
        assert!(!cache.categories().contains(&sides.id));
        let entry = cache.categories().get(&server_id).unwrap();
        assert_eq!(entry.kind(), ActionKind::Update);
        assert_eq!(entry.payload().name, "Side dishes");
    });

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());
    let stored = f.backend.category(server_id.persisted().unwrap()).unwrap();
    assert_eq!(stored.name, "Side dishes");
    assert!(!f.session.has_unsaved_changes());
}

#[tokio::test]
async fn test_not_found_drops_entry_and_asks_for_refresh() {
    let f = fixture().await;
    let curry = &f.dishes[2];
    f.session
        .stage_dish(curry.id, ActionKind::Update, renamed(curry, "Korma"))
        .unwrap();
    f.backend.fail_on(
        EntityKind::Dish,
        curry.id,
        PersistError::NotFound(format!("dish {}", curry.id)),
    );

    let report = f.session.commit().await.unwrap();
    assert!(report.needs_refresh());
    assert_eq!(report.outcome(&curry.id).unwrap().status, OutcomeStatus::NotFound);

    assert!(!f.session.has_unsaved_changes());
    let titles: Vec<_> = f.session.merged_menu()[0]
        .dishes
        .iter()
        .map(|d| d.title.clone())
        .collect();
    assert_eq!(titles, vec!["Steak", "Risotto"]);
}

#[tokio::test]
async fn test_restaurant_not_found_drops_edit() {
    let f = fixture().await;
    f.session
        .update_restaurant(RestaurantUpdate::new(1).with_name("Bistro Nuevo"))
        .unwrap();
    f.backend.fail_on(
        EntityKind::Restaurant,
        EntityId::Persisted(1),
        PersistError::NotFound("restaurant 1".to_string()),
    );

    let report = f.session.commit().await.unwrap();
    assert!(report.needs_refresh());
    assert_eq!(report.outcomes[0].status, OutcomeStatus::NotFound);
    assert!(!f.session.has_unsaved_changes());
    assert_eq!(f.session.restaurant().unwrap().name, "bistro");

    // nothing left to send
    let calls = f.backend.calls().len();
    let report = f.session.commit().await.unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(f.backend.calls().len(), calls);
}

#[tokio::test]
async fn test_delete_of_dish_moved_to_new_category_leaves_session_clean() {
    let f = fixture().await;
    let grill = Category::draft(1, "Grill");
    f.session
        .stage_category(grill.id, ActionKind::Create, grill.clone())
        .unwrap();

    let steak = &f.dishes[0];
    let moved = Dish {
        category_id: grill.id,
        ..steak.clone()
    };
    f.session
        .stage_dish(steak.id, ActionKind::Update, moved)
        .unwrap();

    // delete with the payload the merged view shows
    let shown = f
        .session
        .merged_menu()
        .into_iter()
        .find(|c| c.id() == grill.id)
        .unwrap()
        .dishes[0]
        .clone();
    assert_eq!(shown.category_id, grill.id);
    f.session
        .stage_dish(steak.id, ActionKind::Delete, shown)
        .unwrap();

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());
    assert!(f.backend.dish(steak.id.persisted().unwrap()).is_none());
    assert!(f.session.with_cache(|cache| cache.dishes().is_empty()));
    assert!(!f.session.has_unsaved_changes());

    let calls = f.backend.calls().len();
    f.session.commit().await.unwrap();
    assert_eq!(f.backend.calls().len(), calls);
}

#[tokio::test]
async fn test_restaurant_edit_committed() {
    let f = fixture().await;
    f.session
        .update_restaurant(RestaurantUpdate::new(1).with_logo_url(Some("logos/bistro.png".to_string())))
        .unwrap();
    assert!(f.session.has_unsaved_changes());

    let report = f.session.commit().await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.outcomes[0].kind, EntityKind::Restaurant);
    assert_eq!(
        f.backend.restaurant(1).unwrap().logo_url.as_deref(),
        Some("logos/bistro.png")
    );
    assert!(!f.session.has_unsaved_changes());
}

#[tokio::test]
async fn test_clear_and_discard() {
    let f = fixture().await;
    f.session
        .stage_dish(f.dishes[0].id, ActionKind::Delete, f.dishes[0].clone())
        .unwrap();
    assert!(f.session.has_unsaved_changes());
    assert_eq!(f.session.merged_menu()[0].dishes.len(), 2);

    f.session.discard();
    assert!(!f.session.has_unsaved_changes());
    assert_eq!(f.session.merged_menu()[0].dishes.len(), 3);

    f.session
        .update_restaurant(RestaurantUpdate::new(1).with_name("Bistro Nuovo"))
        .unwrap();
    f.session.clear();
    assert!(!f.session.has_unsaved_changes());
    assert!(f.session.merged_menu().is_empty());
    assert!(matches!(f.session.commit().await, Err(EditorError::NotLoaded)));
}

#[tokio::test]
async fn test_merged_menu_reflects_latest_actions() {
    let f = fixture().await;
    let (steak, risotto) = (&f.dishes[0], &f.dishes[1]);

    f.session
        .stage_dish(steak.id, ActionKind::Update, renamed(steak, "Ribeye"))
        .unwrap();
    f.session
        .stage_dish(steak.id, ActionKind::Delete, renamed(steak, "Ribeye"))
        .unwrap();
    f.session
        .stage_dish(risotto.id, ActionKind::Update, renamed(risotto, "Saffron risotto"))
        .unwrap();

    let pie = Dish::draft(f.mains.id, "Pie", Decimal::new(9, 0));
    f.session.stage_dish(pie.id, ActionKind::Create, pie.clone()).unwrap();
    f.session
        .stage_dish(pie.id, ActionKind::Update, renamed(&pie, "Pot pie"))
        .unwrap();

    let titles: Vec<_> = f.session.merged_menu()[0]
        .dishes
        .iter()
        .map(|d| d.title.clone())
        .collect();
    assert_eq!(titles, vec!["Saffron risotto", "Curry", "Pot pie"]);

    f.session.with_cache(|cache| {
        assert_eq!(cache.dishes().kind_of(&steak.id), Some(ActionKind::Delete));
        assert_eq!(cache.dishes().kind_of(&pie.id), Some(ActionKind::Create));
        assert_eq!(cache.dishes().len(), 3);
    });
}

#[tokio::test]
async fn test_staging_errors_leave_session_unchanged() {
    let f = fixture().await;
    let revision = f.session.revision();

    let orphan = Dish::draft(EntityId::temp(), "Orphan", Decimal::new(1, 0));
    let err = f
        .session
        .stage_dish(orphan.id, ActionKind::Create, orphan)
        .unwrap_err();
    assert_eq!(err.code, shared::ErrorCode::CategoryNotFound);

    let untitled = Dish::draft(f.mains.id, " ", Decimal::new(1, 0));
    let err = f
        .session
        .stage_dish(untitled.id, ActionKind::Create, untitled)
        .unwrap_err();
    assert_eq!(err.code, shared::ErrorCode::RequiredField);

    assert!(!f.session.has_unsaved_changes());
    assert_eq!(f.session.revision(), revision);
}
