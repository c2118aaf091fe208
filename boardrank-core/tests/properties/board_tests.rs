//! Property-based tests for move application and rank allocation
//!
//! A random board receives a random sequence of moves. After each one the
//! displayed order must agree with rank order, and no item may be lost or
//! duplicated.

use boardrank_core::{
    Arrangement, Board, Item, ItemId, MoveIntent, PartitionId, RankAllocator, RankKey,
    apply_intent, apply_move, is_noop, validate_move,
};
use proptest::prelude::*;

const PARTITIONS: [&str; 3] = ["BACKLOG", "TODO", "DONE"];

/// Strategy for a board: each generated entry places one item in a partition
fn board_strategy() -> impl Strategy<Value = Board> {
    prop::collection::vec(0..PARTITIONS.len(), 0..15).prop_map(|placement| {
        let mut items = Vec::new();
        for (p, name) in PARTITIONS.iter().enumerate() {
            let ids: Vec<usize> = placement
                .iter()
                .enumerate()
                .filter(|(_, part)| **part == p)
                .map(|(i, _)| i)
                .collect();
            for (i, rank) in ids.iter().zip(RankKey::spread(ids.len())) {
                items.push(Item::new(format!("I{i}"), *name, rank));
            }
        }
        Board::from_items(PARTITIONS, items).expect("unique ids")
    })
}

/// Strategy for abstract moves, resolved against the board when applied
fn moves_strategy() -> impl Strategy<Value = Vec<(prop::sample::Index, usize, prop::sample::Index)>> {
    prop::collection::vec(
        (any::<prop::sample::Index>(), 0..PARTITIONS.len(), any::<prop::sample::Index>()),
        1..40,
    )
}

/// Turns an abstract move into a valid intent for `board`
fn concrete_intent(
    board: &Board,
    (item, target, slot): &(prop::sample::Index, usize, prop::sample::Index),
) -> Option<MoveIntent> {
    let all: Vec<(PartitionId, ItemId)> = board
        .arrangement()
        .iter()
        .flat_map(|(p, ids)| ids.iter().map(move |id| (p.clone(), id.clone())))
        .collect();
    if all.is_empty() {
        return None;
    }
    let (source, item_id) = item.get(&all).clone();
    let target = PartitionId::from(PARTITIONS[*target]);
    let len = board.arrangement().len(&target) - usize::from(source == target);
    Some(MoveIntent {
        item_id,
        source,
        target,
        target_index: slot.index(len + 1),
    })
}

/// Applies a move the way the reconciler does, without persistence
fn commit(board: &Board, allocator: &RankAllocator, intent: &MoveIntent) -> Board {
    let next = apply_intent(board.arrangement(), intent);
    let allocation = allocator
        .allocate(board, &next, intent)
        .expect("board is consistent");
    board.with_changes(next, allocation.assignments(&intent.item_id))
}

fn sorted_ids(arrangement: &Arrangement) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = arrangement
        .iter()
        .flat_map(|(_, ids)| ids.iter().cloned())
        .collect();
    ids.sort();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Rank order and displayed order agree after every move
    #[test]
    fn prop_moves_keep_ranks_consistent(
        board in board_strategy(),
        moves in moves_strategy(),
        max_len in prop_oneof![Just(3usize), Just(8), Just(128)],
    ) {
        let allocator = RankAllocator::new().with_max_rank_len(max_len);
        let mut board = board;
        for abstract_move in &moves {
            let Some(intent) = concrete_intent(&board, abstract_move) else {
                break;
            };
            prop_assert!(validate_move(board.arrangement(), &intent).is_ok());
            if is_noop(board.arrangement(), &intent) {
                continue;
            }
            board = commit(&board, &allocator, &intent);
            let violations = board.verify();
            prop_assert!(violations.is_empty(), "violations: {:?}", violations);
        }
    }

    /// A move lands where it was aimed and touches nothing else
    #[test]
    fn prop_move_lands_at_target(
        board in board_strategy(),
        abstract_move in (any::<prop::sample::Index>(), 0..PARTITIONS.len(), any::<prop::sample::Index>()),
    ) {
        let Some(intent) = concrete_intent(&board, &abstract_move) else {
            return Ok(());
        };
        let before = board.arrangement();
        let after = apply_intent(before, &intent);

        prop_assert_eq!(sorted_ids(before), sorted_ids(&after));
        prop_assert_eq!(
            after.items(&intent.target).and_then(|ids| ids.get(intent.target_index)),
            Some(&intent.item_id)
        );
        for (partition, ids) in before.iter() {
            if *partition != intent.source && *partition != intent.target {
                prop_assert_eq!(after.items(partition), Some(ids));
            }
        }
    }

    /// Moving an item to where it already is changes nothing
    #[test]
    fn prop_noop_move_is_stable(board in board_strategy(), pick in any::<prop::sample::Index>()) {
        let placed: Vec<(PartitionId, ItemId, usize)> = board
            .arrangement()
            .iter()
            .flat_map(|(p, ids)| ids.iter().enumerate().map(move |(i, id)| (p.clone(), id.clone(), i)))
            .collect();
        prop_assume!(!placed.is_empty());
        let (partition, item, index) = pick.get(&placed).clone();

        let intent = MoveIntent::new(item, partition.clone(), partition, index);
        prop_assert!(is_noop(board.arrangement(), &intent));
        prop_assert_eq!(&apply_intent(board.arrangement(), &intent), board.arrangement());
    }

    /// Sending an item to the end of a column twice gives the same order
    #[test]
    fn prop_end_insert_is_idempotent(
        board in board_strategy(),
        pick in any::<prop::sample::Index>(),
        target in 0..PARTITIONS.len(),
    ) {
        let placed: Vec<(PartitionId, ItemId)> = board
            .arrangement()
            .iter()
            .flat_map(|(p, ids)| ids.iter().map(move |id| (p.clone(), id.clone())))
            .collect();
        prop_assume!(!placed.is_empty());
        let (source, item) = pick.get(&placed).clone();
        let target = PartitionId::from(PARTITIONS[target]);

        let once = apply_move(board.arrangement(), &item, &source, &target, usize::MAX);
        let twice = apply_move(&once, &item, &target, &target, usize::MAX);
        prop_assert_eq!(once, twice);
    }

    /// A cross-partition move adds one to the target and takes one from the source
    #[test]
    fn prop_cross_partition_counts(
        board in board_strategy(),
        abstract_move in (any::<prop::sample::Index>(), 0..PARTITIONS.len(), any::<prop::sample::Index>()),
    ) {
        let Some(intent) = concrete_intent(&board, &abstract_move) else {
            return Ok(());
        };
        prop_assume!(intent.crosses_partitions());
        let before = board.arrangement();
        let after = apply_intent(before, &intent);

        prop_assert_eq!(after.len(&intent.target), before.len(&intent.target) + 1);
        prop_assert_eq!(after.len(&intent.source), before.len(&intent.source) - 1);
        let holders = after
            .iter()
            .filter(|(_, ids)| ids.contains(&intent.item_id))
            .count();
        prop_assert_eq!(holders, 1);
    }

    /// Out-of-range indices are clamped to the end of the target
    #[test]
    fn prop_apply_move_clamps_index(board in board_strategy(), overshoot in 0usize..100) {
        let Some((partition, item)) = board
            .arrangement()
            .iter()
            .find_map(|(p, ids)| ids.first().map(|id| (p.clone(), id.clone())))
        else {
            return Ok(());
        };
        let target = PartitionId::from("DONE");
        let after = apply_move(board.arrangement(), &item, &partition, &target, usize::MAX - overshoot);
        prop_assert_eq!(after.items(&target).and_then(|ids| ids.last()), Some(&item));
    }
}

#[test]
fn backlog_scenario() {
    let board = Board::from_items(
        ["BACKLOG", "DONE"],
        [
            Item::new("A", "BACKLOG", RankKey::parse("m").expect("valid")),
            Item::new("B", "BACKLOG", RankKey::parse("t").expect("valid")),
            Item::new("C", "DONE", RankKey::parse("V").expect("valid")),
        ],
    )
    .expect("unique ids");
    let intent = MoveIntent::new("C", "DONE", "BACKLOG", 1);

    let next = commit(&board, &RankAllocator::new(), &intent);
    let backlog: Vec<&str> = next
        .arrangement()
        .items(&"BACKLOG".into())
        .unwrap_or(&[])
        .iter()
        .map(ItemId::as_str)
        .collect();
    assert_eq!(backlog, ["A", "C", "B"]);
    assert_eq!(next.arrangement().items(&"DONE".into()), Some(&[][..]));
    assert!(next.verify().is_empty());
}
