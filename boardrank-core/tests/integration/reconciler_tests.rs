//! Integration tests for the optimistic commit/rollback lifecycle
//!
//! Time is paused in every async test, so scripted delays and timeouts
//! advance instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use boardrank_core::{
    Board, CommitOutcome, CommitPolicy, Item, ItemId, MockOutcome, MockPersistence, MoveIntent,
    PartitionId, PersistFailureKind, RankKey, ReconcilerConfig, ReorderError, ReorderReconciler,
};

fn rank(s: &str) -> RankKey {
    RankKey::parse(s).expect("valid rank")
}

fn ids(list: &[&str]) -> Vec<ItemId> {
    list.iter().map(|id| ItemId::from(*id)).collect()
}

fn column(board: &Board, partition: &str) -> Vec<ItemId> {
    board
        .arrangement()
        .items(&PartitionId::from(partition))
        .unwrap_or(&[])
        .to_vec()
}

/// BACKLOG = [A(m), B(t)], DONE = [C(V)]
fn sample_board() -> Board {
    Board::from_items(
        ["BACKLOG", "DONE"],
        [
            Item::new("A", "BACKLOG", rank("m")),
            Item::new("B", "BACKLOG", rank("t")),
            Item::new("C", "DONE", rank("V")),
        ],
    )
    .expect("unique ids")
}

fn reconciler(board: Board, mock: &Arc<MockPersistence>, config: ReconcilerConfig) -> ReorderReconciler {
    ReorderReconciler::new(board, mock.clone(), config)
}

// ========== Successful commits ==========

#[tokio::test(start_paused = true)]
async fn cross_partition_move_lands_between_neighbours() {
    let mock = Arc::new(MockPersistence::new());
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());

    let outcome = reconciler
        .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 1))
        .await
        .expect("commit succeeds");

    let board = reconciler.board();
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "C", "B"]));
    assert!(column(&board, "DONE").is_empty());

    let c_rank = board.rank(&ItemId::from("C")).expect("C has a rank");
    assert!(rank("m") < *c_rank && *c_rank < rank("t"));
    assert!(board.verify().is_empty());

    let payload = outcome.payload().expect("payload was sent");
    assert_eq!(payload.lower, Some(rank("m")));
    assert_eq!(payload.upper, Some(rank("t")));
    assert!(payload.transition.is_some());
    assert_eq!(mock.payloads(), vec![payload.clone()]);
}

#[tokio::test(start_paused = true)]
async fn first_item_in_empty_partition_gets_mid_rank() {
    let mock = Arc::new(MockPersistence::new());
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());

    reconciler
        .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 0))
        .await
        .expect("commit succeeds");
    reconciler
        .commit_move(MoveIntent::new("A", "BACKLOG", "DONE", 0))
        .await
        .expect("commit succeeds");

    let board = reconciler.board();
    assert_eq!(column(&board, "DONE"), ids(&["A"]));
    assert_eq!(board.rank(&ItemId::from("A")), Some(&RankKey::mid()));
}

#[tokio::test(start_paused = true)]
async fn noop_move_is_not_persisted() {
    let mock = Arc::new(MockPersistence::new());
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());
    let before = reconciler.board();

    let outcome = reconciler
        .commit_move(MoveIntent::new("A", "BACKLOG", "BACKLOG", 0))
        .await
        .expect("no-op succeeds");

    assert_eq!(outcome, CommitOutcome::Unchanged);
    assert_eq!(mock.call_count(), 0);
    assert_eq!(reconciler.board().revision(), before.revision());
}

#[tokio::test(start_paused = true)]
async fn store_assigned_rank_is_adopted() {
    let mock = Arc::new(MockPersistence::new());
    mock.push(MockOutcome::AcceptWithRank(rank("p")));
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());

    reconciler
        .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 1))
        .await
        .expect("commit succeeds");

    let board = reconciler.board();
    assert_eq!(board.rank(&ItemId::from("C")), Some(&rank("p")));
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "C", "B"]));
    assert!(board.verify().is_empty());
}

#[tokio::test(start_paused = true)]
async fn created_item_is_appended_and_persisted() {
    let mock = Arc::new(MockPersistence::new());
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());

    let outcome = reconciler
        .create_item(ItemId::from("D"), PartitionId::from("BACKLOG"))
        .await
        .expect("create succeeds");

    let board = reconciler.board();
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "B", "D"]));
    let payload = outcome.payload().expect("payload was sent");
    assert_eq!(payload.lower, Some(rank("t")));
    assert!(payload.rank > rank("t"));
}

// ========== Validation ==========

#[tokio::test(start_paused = true)]
async fn invalid_intent_is_rejected_without_side_effects() {
    let mock = Arc::new(MockPersistence::new());
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());
    let before = reconciler.board();

    let unknown = reconciler
        .commit_move(MoveIntent::new("Z", "BACKLOG", "DONE", 0))
        .await;
    assert!(matches!(unknown, Err(ReorderError::InvalidMoveIntent(_))));

    let wrong_source = reconciler
        .commit_move(MoveIntent::new("A", "DONE", "BACKLOG", 0))
        .await;
    assert!(matches!(wrong_source, Err(ReorderError::InvalidMoveIntent(_))));

    let out_of_range = reconciler
        .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 3))
        .await;
    assert!(matches!(out_of_range, Err(ReorderError::InvalidMoveIntent(_))));

    let duplicate = reconciler
        .create_item(ItemId::from("A"), PartitionId::from("DONE"))
        .await;
    assert!(matches!(duplicate, Err(ReorderError::InvalidMoveIntent(_))));

    assert_eq!(mock.call_count(), 0);
    assert_eq!(reconciler.board(), before);
}

// ========== Rollback ==========

#[tokio::test(start_paused = true)]
async fn rejected_commit_restores_previous_board() {
    let mock = Arc::new(MockPersistence::new());
    mock.push(MockOutcome::fail(PersistFailureKind::Conflict, "stale revision"));
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());
    let before = reconciler.board();
    let mut updates = reconciler.subscribe();

    let err = reconciler
        .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 1))
        .await
        .expect_err("store rejects");

    assert!(matches!(
        err,
        ReorderError::PersistenceRejected {
            kind: PersistFailureKind::Conflict,
            ..
        }
    ));
    assert!(err.rolled_back());
    assert!(err.user_message().is_some());

    let after = reconciler.board();
    assert!(after.same_content(&before));
    assert!(after.revision() > before.revision());
    assert!(updates.has_changed().expect("sender alive"));
    assert!(updates.borrow_and_update().same_content(&before));
}

#[tokio::test(start_paused = true)]
async fn timeout_counts_as_failure_and_rolls_back() {
    let mock = Arc::new(MockPersistence::with_default(MockOutcome::Hang));
    let config = ReconcilerConfig::new().with_persist_timeout(Duration::from_millis(200));
    let reconciler = reconciler(sample_board(), &mock, config);
    let before = reconciler.board();

    let err = reconciler
        .commit_move(MoveIntent::new("B", "BACKLOG", "DONE", 1))
        .await
        .expect_err("store never answers");

    assert!(matches!(
        err,
        ReorderError::PersistenceUnavailable {
            kind: PersistFailureKind::Timeout,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert!(reconciler.board().same_content(&before));
    assert_eq!(reconciler.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_create_removes_the_item() {
    let mock = Arc::new(MockPersistence::with_default(MockOutcome::fail(
        PersistFailureKind::Transient,
        "connection reset",
    )));
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());

    let err = reconciler
        .create_item(ItemId::from("D"), PartitionId::from("DONE"))
        .await
        .expect_err("store unavailable");

    assert!(err.rolled_back());
    let board = reconciler.board();
    assert!(board.rank(&ItemId::from("D")).is_none());
    assert_eq!(column(&board, "DONE"), ids(&["C"]));
}

#[tokio::test(start_paused = true)]
async fn rollback_of_one_item_keeps_other_commits() {
    // BACKLOG = [A(m), B(t), C(x)]
    let board = Board::from_items(
        ["BACKLOG", "DONE"],
        [
            Item::new("A", "BACKLOG", rank("m")),
            Item::new("B", "BACKLOG", rank("t")),
            Item::new("C", "BACKLOG", rank("x")),
        ],
    )
    .expect("unique ids");
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(
        Duration::from_millis(100),
        MockOutcome::fail(PersistFailureKind::Validation, "bad rank"),
    );
    let reconciler = reconciler(board, &mock, ReconcilerConfig::new());

    let (slow, fast) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("A", "BACKLOG", "BACKLOG", 2)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            reconciler
                .commit_move(MoveIntent::new("B", "BACKLOG", "DONE", 0))
                .await
        }
    );

    assert!(matches!(slow, Err(ReorderError::PersistenceRejected { .. })));
    assert!(fast.is_ok());

    let board = reconciler.board();
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "C"]));
    assert_eq!(column(&board, "DONE"), ids(&["B"]));
    assert_eq!(board.rank(&ItemId::from("A")), Some(&rank("m")));
    assert!(board.verify().is_empty());
}

// ========== Same-item concurrency ==========

#[tokio::test(start_paused = true)]
async fn queued_commits_run_in_order() {
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(
        Duration::from_millis(100),
        MockOutcome::fail(PersistFailureKind::Conflict, "changed elsewhere"),
    );
    let config = ReconcilerConfig::new().with_commit_policy(CommitPolicy::Queue);
    let reconciler = reconciler(sample_board(), &mock, config);

    let (first, second) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 0)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(mock.call_count(), 1);
            reconciler
                .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 2))
                .await
        }
    );

    assert!(matches!(first, Err(ReorderError::PersistenceRejected { .. })));
    assert!(second.is_ok());
    assert_eq!(mock.call_count(), 2);

    let board = reconciler.board();
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "B", "C"]));
    assert!(board.verify().is_empty());
}

#[tokio::test(start_paused = true)]
async fn supersede_cancels_the_pending_commit() {
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(Duration::from_secs(1), MockOutcome::Accept);
    let config = ReconcilerConfig::new().with_commit_policy(CommitPolicy::Supersede);
    let reconciler = reconciler(sample_board(), &mock, config);

    let (first, second) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 0)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            reconciler
                .commit_move(MoveIntent::new("C", "BACKLOG", "BACKLOG", 2))
                .await
        }
    );

    assert_eq!(first, Err(ReorderError::Superseded(ItemId::from("C"))));
    assert!(second.is_ok());
    assert_eq!(mock.call_count(), 2);

    let board = reconciler.board();
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "B", "C"]));
    assert!(board.verify().is_empty());

    // The store never saw the first move, so the second reports the whole trip
    let sent = &mock.payloads()[1];
    let transition = sent.transition.as_ref().expect("column changed");
    assert_eq!(transition.from, PartitionId::from("DONE"));
    assert!(sent.partitions.iter().any(|order| order.partition == PartitionId::from("DONE")));
}

#[tokio::test(start_paused = true)]
async fn failed_commit_after_supersede_restores_last_saved_board() {
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(Duration::from_secs(1), MockOutcome::Accept);
    mock.push(MockOutcome::fail(PersistFailureKind::Transient, "offline"));
    let config = ReconcilerConfig::new().with_commit_policy(CommitPolicy::Supersede);
    let reconciler = reconciler(sample_board(), &mock, config);
    let saved = reconciler.board();

    let (first, second) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 0)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            reconciler
                .commit_move(MoveIntent::new("C", "BACKLOG", "BACKLOG", 2))
                .await
        }
    );

    assert_eq!(first, Err(ReorderError::Superseded(ItemId::from("C"))));
    assert!(matches!(
        second,
        Err(ReorderError::PersistenceUnavailable {
            kind: PersistFailureKind::Transient,
            ..
        })
    ));

    let board = reconciler.board();
    assert!(board.same_content(&saved));
    assert_eq!(column(&board, "BACKLOG"), ids(&["A", "B"]));
    assert_eq!(column(&board, "DONE"), ids(&["C"]));
    assert_eq!(board.rank(&ItemId::from("C")), Some(&rank("V")));
    assert_eq!(reconciler.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn invalid_move_after_supersede_restores_last_saved_board() {
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(Duration::from_secs(1), MockOutcome::Accept);
    let config = ReconcilerConfig::new().with_commit_policy(CommitPolicy::Supersede);
    let reconciler = reconciler(sample_board(), &mock, config);
    let saved = reconciler.board();

    let (first, second) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 0)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            // C already sits in BACKLOG on the optimistic board
            reconciler
                .commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 1))
                .await
        }
    );

    assert_eq!(first, Err(ReorderError::Superseded(ItemId::from("C"))));
    assert!(matches!(second, Err(ReorderError::InvalidMoveIntent(_))));
    assert!(reconciler.board().same_content(&saved));
}

#[tokio::test(start_paused = true)]
async fn repeated_move_after_supersede_resends_unsaved_change() {
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(Duration::from_secs(1), MockOutcome::Accept);
    let config = ReconcilerConfig::new().with_commit_policy(CommitPolicy::Supersede);
    let reconciler = reconciler(sample_board(), &mock, config);

    let (first, second) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 0)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            reconciler
                .commit_move(MoveIntent::new("C", "BACKLOG", "BACKLOG", 0))
                .await
        }
    );

    assert_eq!(first, Err(ReorderError::Superseded(ItemId::from("C"))));
    let outcome = second.expect("resend succeeds");
    let payloads = mock.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(outcome.payload(), Some(&payloads[0]));
    assert_eq!(payloads[0], payloads[1]);
    assert_eq!(column(&reconciler.board(), "BACKLOG"), ids(&["C", "A", "B"]));
}

// ========== Teardown ==========

#[tokio::test(start_paused = true)]
async fn teardown_suppresses_rollback_and_new_commits() {
    let mock = Arc::new(MockPersistence::new());
    mock.push_delayed(
        Duration::from_millis(100),
        MockOutcome::fail(PersistFailureKind::Transient, "offline"),
    );
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());

    let (pending, ()) = tokio::join!(
        reconciler.commit_move(MoveIntent::new("C", "DONE", "BACKLOG", 1)),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            reconciler.teardown();
        }
    );

    assert_eq!(pending, Err(ReorderError::TornDown));
    assert!(!reconciler.is_live());
    // The optimistic board was left alone rather than rolled back
    assert_eq!(column(&reconciler.board(), "BACKLOG"), ids(&["A", "C", "B"]));

    let late = reconciler
        .commit_move(MoveIntent::new("A", "BACKLOG", "DONE", 0))
        .await;
    assert_eq!(late, Err(ReorderError::TornDown));
    assert_eq!(mock.call_count(), 1);
}

// ========== Rank exhaustion ==========

#[tokio::test(start_paused = true)]
async fn exhausted_gap_triggers_rebalance() {
    const MAX_LEN: usize = 4;
    let mock = Arc::new(MockPersistence::new());
    let config = ReconcilerConfig::new().with_max_rank_len(MAX_LEN);
    let reconciler = reconciler(sample_board(), &mock, config);

    for n in 0..40 {
        let id = ItemId::new(format!("N{n}"));
        reconciler
            .create_item(id.clone(), PartitionId::from("BACKLOG"))
            .await
            .expect("create succeeds");
        let len = reconciler.board().arrangement().len(&PartitionId::from("BACKLOG"));
        reconciler
            .commit_move(MoveIntent::new(id, "BACKLOG", "BACKLOG", 1.min(len - 1)))
            .await
            .expect("move succeeds");
    }

    let board = reconciler.board();
    assert!(board.verify().is_empty());
    assert!(
        board
            .partition_ranks(&PartitionId::from("BACKLOG"))
            .iter()
            .all(|r| r.len() <= MAX_LEN)
    );
    assert!(mock.payloads().iter().any(|p| !p.rebalanced.is_empty()));
}

// ========== Board publication ==========

#[tokio::test(start_paused = true)]
async fn preview_does_not_publish() {
    let mock = Arc::new(MockPersistence::new());
    let reconciler = reconciler(sample_board(), &mock, ReconcilerConfig::new());
    let updates = reconciler.subscribe();

    let projected = reconciler
        .preview(&MoveIntent::new("C", "DONE", "BACKLOG", 0))
        .expect("valid preview");

    assert_eq!(
        projected.items(&PartitionId::from("BACKLOG")),
        Some(ids(&["C", "A", "B"]).as_slice())
    );
    assert!(!updates.has_changed().expect("sender alive"));
    assert_eq!(column(&reconciler.board(), "BACKLOG"), ids(&["A", "B"]));
}
