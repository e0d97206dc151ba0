use soapbox_db::Database;
use soapbox_db::models::{LikeOutcome, SubmitOutcome, UnlikeOutcome};
use soapbox_types::models::Plan;
use tempfile::TempDir;

fn open_db() -> (TempDir, Database) {
    let dir = TempDir::new().expect("tempdir");
    let db = Database::open(&dir.path().join("soapbox.db")).expect("open db");
    (dir, db)
}

fn add_user(db: &Database, id: &str) {
    db.create_user(id, &format!("{id}@example.com"), id, "hash")
        .expect("create user");
}

fn submit(db: &Database, user: &str, title: &str, quota: i64) -> SubmitOutcome {
    db.submit_message(
        user,
        &format!("{user}@example.com"),
        user,
        title,
        "content",
        "general",
        "medium",
        quota,
    )
    .expect("submit")
}

fn must_create(db: &Database, user: &str, title: &str) -> i64 {
    match submit(db, user, title, 100) {
        SubmitOutcome::Created { id, .. } => id,
        other => panic!("expected creation, got {other:?}"),
    }
}

fn like_rows(db: &Database) -> i64 {
    db.with_conn(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM message_likes", [], |row| row.get(0))?)
    })
    .expect("count likes")
}

fn stored_like_count(db: &Database, id: i64) -> i64 {
    db.with_conn(|conn| {
        Ok(conn.query_row(
            "SELECT like_count FROM messages WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?)
    })
    .expect("like_count")
}

#[test]
fn free_plan_allows_one_message() {
    let (_dir, db) = open_db();
    add_user(&db, "alice");

    let quota = Plan::Free.message_quota();
    match submit(&db, "alice", "first", quota) {
        SubmitOutcome::Created { remaining, .. } => assert_eq!(remaining, 0),
        other => panic!("expected creation, got {other:?}"),
    }

    assert_eq!(
        submit(&db, "alice", "second", quota),
        SubmitOutcome::QuotaExceeded { limit: 1, current: 1 }
    );
}

#[test]
fn pro_plan_allows_three_messages() {
    let (_dir, db) = open_db();
    add_user(&db, "bob");

    let quota = Plan::Pro.message_quota();
    for (n, remaining) in [(1, 2), (2, 1), (3, 0)] {
        match submit(&db, "bob", &format!("msg {n}"), quota) {
            SubmitOutcome::Created { remaining: r, .. } => assert_eq!(r, remaining),
            other => panic!("expected creation, got {other:?}"),
        }
    }

    assert_eq!(
        submit(&db, "bob", "fourth", quota),
        SubmitOutcome::QuotaExceeded { limit: 3, current: 3 }
    );
}

#[test]
fn quota_counts_messages_regardless_of_status() {
    let (_dir, db) = open_db();
    add_user(&db, "carol");

    let id = must_create(&db, "carol", "rejected one");
    db.set_message_status(id, "rejected").expect("set status");

    assert_eq!(
        submit(&db, "carol", "another", Plan::Free.message_quota()),
        SubmitOutcome::QuotaExceeded { limit: 1, current: 1 }
    );
}

#[test]
fn like_is_idempotent_per_user() {
    let (_dir, db) = open_db();
    add_user(&db, "dave");
    add_user(&db, "erin");
    let id = must_create(&db, "dave", "likeable");

    assert_eq!(db.like_message("erin", id).unwrap(), LikeOutcome::Liked(1));
    assert_eq!(db.like_message("erin", id).unwrap(), LikeOutcome::AlreadyLiked);
    assert_eq!(stored_like_count(&db, id), 1);
    assert_eq!(like_rows(&db), 1);
}

#[test]
fn like_missing_message_is_not_found() {
    let (_dir, db) = open_db();
    add_user(&db, "erin");

    assert_eq!(db.like_message("erin", 999).unwrap(), LikeOutcome::NotFound);
    assert_eq!(db.unlike_message("erin", 999).unwrap(), UnlikeOutcome::NotFound);
}

#[test]
fn unlike_without_like_leaves_counter_alone() {
    let (_dir, db) = open_db();
    add_user(&db, "dave");
    add_user(&db, "erin");
    let id = must_create(&db, "dave", "untouched");

    assert_eq!(db.unlike_message("erin", id).unwrap(), UnlikeOutcome::NotLiked);
    assert_eq!(stored_like_count(&db, id), 0);
}

#[test]
fn counter_returns_to_zero_and_never_goes_negative() {
    let (_dir, db) = open_db();
    add_user(&db, "owner");
    let id = must_create(&db, "owner", "popular");

    let fans = ["f1", "f2", "f3", "f4"];
    for fan in fans {
        add_user(&db, fan);
        db.like_message(fan, id).unwrap();
    }
    assert_eq!(stored_like_count(&db, id), 4);

    for fan in fans {
        db.unlike_message(fan, id).unwrap();
    }
    assert_eq!(stored_like_count(&db, id), 0);

    // Double-unlike attempts must not drive the counter below zero
    for fan in fans {
        assert_eq!(db.unlike_message(fan, id).unwrap(), UnlikeOutcome::NotLiked);
    }
    assert_eq!(stored_like_count(&db, id), 0);
}

#[test]
fn deleting_a_message_cascades_its_likes() {
    let (_dir, db) = open_db();
    add_user(&db, "owner");
    add_user(&db, "fan");
    let id = must_create(&db, "owner", "doomed");
    db.like_message("fan", id).unwrap();
    assert_eq!(like_rows(&db), 1);

    db.delete_message(id).expect("delete");

    assert_eq!(like_rows(&db), 0);
    assert!(db.get_message_owner(id).unwrap().is_none());
}

#[test]
fn feed_excludes_in_progress_and_rejected() {
    let (_dir, db) = open_db();
    add_user(&db, "owner");
    add_user(&db, "reader");

    let visible = must_create(&db, "owner", "pending one");
    let approved = must_create(&db, "owner", "approved one");
    let hidden = must_create(&db, "owner", "working on it");
    let rejected = must_create(&db, "owner", "nope");

    db.set_message_status(approved, "completed").unwrap();
    db.set_message_status(hidden, "in_progress").unwrap();
    db.set_message_status(rejected, "rejected").unwrap();

    let (rows, total) = db.feed_page("reader", 50, 0).unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    assert_eq!(total, 2);
    assert!(ids.contains(&visible));
    assert!(ids.contains(&approved));
    assert!(!ids.contains(&hidden));
    assert!(!ids.contains(&rejected));
}

#[test]
fn feed_orders_by_like_count_and_reports_caller_likes() {
    let (_dir, db) = open_db();
    add_user(&db, "owner");
    add_user(&db, "reader");
    add_user(&db, "other");

    let quiet = must_create(&db, "owner", "quiet");
    let hot = must_create(&db, "owner", "hot");
    let warm = must_create(&db, "owner", "warm");

    db.like_message("reader", hot).unwrap();
    db.like_message("other", hot).unwrap();
    db.like_message("other", warm).unwrap();

    let (rows, _) = db.feed_page("reader", 50, 0).unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![hot, warm, quiet]);

    let by_id = |id: i64| rows.iter().find(|r| r.id == id).unwrap();
    assert!(by_id(hot).is_liked_by_user);
    assert!(!by_id(warm).is_liked_by_user);
    assert!(!by_id(quiet).is_liked_by_user);
}

#[test]
fn feed_paginates_with_offset() {
    let (_dir, db) = open_db();
    add_user(&db, "owner");
    add_user(&db, "reader");

    for n in 0..5 {
        let id = must_create(&db, "owner", &format!("msg {n}"));
        // Distinct like counts give a deterministic order
        for f in 0..n {
            let fan = format!("fan{n}-{f}");
            add_user(&db, &fan);
            db.like_message(&fan, id).unwrap();
        }
    }

    let (first, total) = db.feed_page("reader", 2, 0).unwrap();
    let (second, _) = db.feed_page("reader", 2, 2).unwrap();
    let (third, _) = db.feed_page("reader", 2, 4).unwrap();

    assert_eq!(total, 5);
    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(third.len(), 1);

    let counts: Vec<i64> = first
        .iter()
        .chain(&second)
        .chain(&third)
        .map(|r| r.like_count)
        .collect();
    assert_eq!(counts, vec![4, 3, 2, 1, 0]);
}

#[test]
fn deleting_a_user_keeps_like_counters_consistent() {
    let (_dir, db) = open_db();
    add_user(&db, "owner");
    add_user(&db, "fan");
    let kept = must_create(&db, "owner", "kept");
    let doomed = must_create(&db, "fan", "fan's own");

    db.like_message("fan", kept).unwrap();
    db.like_message("owner", doomed).unwrap();
    assert_eq!(stored_like_count(&db, kept), 1);

    assert!(db.delete_user("fan").unwrap());

    // The fan's like on the kept message is gone and the counter followed
    assert_eq!(stored_like_count(&db, kept), 0);
    // The fan's own message went with them, likes on it included
    assert!(db.get_message_owner(doomed).unwrap().is_none());
    assert_eq!(like_rows(&db), 0);
    assert!(db.get_user_by_id("fan").unwrap().is_none());
}

#[test]
fn writes_against_a_vanished_message_are_reported() {
    let (_dir, db) = open_db();
    add_user(&db, "alice");
    let id = must_create(&db, "alice", "short-lived");

    assert!(db.set_message_status(id, "completed").unwrap());
    assert!(db.delete_message(id).unwrap());

    // A second writer racing the delete sees that nothing was touched
    assert!(!db.set_message_status(id, "completed").unwrap());
    assert!(!db.delete_message(id).unwrap());
}

#[test]
fn update_user_patches_role_and_subscription() {
    let (_dir, db) = open_db();
    add_user(&db, "alice");

    assert!(db.update_user("alice", Some("admin"), None).unwrap());
    assert!(db.update_user("alice", None, Some("active")).unwrap());
    assert!(!db.update_user("ghost", Some("admin"), None).unwrap());

    let user = db.get_user_by_id("alice").unwrap().unwrap();
    assert_eq!(user.role, "admin");
    assert_eq!(user.subscription_status, "active");
}
