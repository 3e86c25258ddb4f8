use super::*;

use shared::domain::BlockId;

fn scenario_board() -> Board {
    Board::from_blocks([
        Block::unclaimed(BlockId(1), 0, 0),
        Block::owned(BlockId(2), 0, 1, "Ann", "#f00"),
    ])
}

#[test]
fn scenario_leaderboard() {
    let board = scenario_board();
    let view = DerivedView::compute(&board, Some("Ann"));
    assert_eq!(
        view.leaderboard,
        vec![LeaderboardEntry {
            name: "Ann".into(),
            color: "#f00".into(),
            count: 1
        }]
    );
    assert_eq!(view.counts.total, 2);
    assert_eq!(view.counts.claimed, 1);
    assert_eq!(view.counts.free, 1);
    assert_eq!(view.territory_ratio, 0.5);
    assert_eq!(view.dominance_ratio, 0.5);
    assert_eq!(view.territory_label(), "50");
    assert_eq!(view.dominance_label(), "50.0");
    assert_eq!(view.winner().map(|w| w.name.as_str()), Some("Ann"));
}

#[test]
fn sort_orders_by_row_then_column_for_any_permutation() {
    let blocks = vec![
        Block::unclaimed(BlockId(6), 1, 2),
        Block::unclaimed(BlockId(1), 0, 0),
        Block::unclaimed(BlockId(5), 1, 1),
        Block::unclaimed(BlockId(3), 0, 2),
        Block::unclaimed(BlockId(4), 1, 0),
        Block::unclaimed(BlockId(2), 0, 1),
    ];
    let expected: Vec<i64> = (1..=6).collect();
    for rotation in 0..blocks.len() {
        let mut permuted = blocks.clone();
        permuted.rotate_left(rotation);
        permuted.reverse();
        let ids: Vec<i64> = sort_blocks(&permuted).iter().map(|b| b.id.0).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn sort_keeps_input_order_for_equal_positions() {
    let blocks = vec![
        Block::unclaimed(BlockId(10), 0, 0),
        Block::unclaimed(BlockId(11), 0, 0),
    ];
    let ids: Vec<i64> = sort_blocks(&blocks).iter().map(|b| b.id.0).collect();
    assert_eq!(ids, vec![10, 11]);
}

#[test]
fn leaderboard_counts_sum_to_claimed_and_ties_break_by_name() {
    let board = Board::from_blocks([
        Block::owned(BlockId(1), 0, 0, "Zed", "#111"),
        Block::owned(BlockId(2), 0, 1, "Amy", "#222"),
        Block::owned(BlockId(3), 0, 2, "Bob", "#333"),
        Block::owned(BlockId(4), 1, 0, "Bob", "#333"),
        Block::unclaimed(BlockId(5), 1, 1),
    ]);
    let view = DerivedView::compute(&board, None);
    let names: Vec<&str> = view.leaderboard.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Amy", "Zed"]);
    let sum: usize = view.leaderboard.iter().map(|e| e.count).sum();
    assert_eq!(sum, view.counts.claimed);
}

#[test]
fn leaderboard_color_comes_from_first_block_in_grid_order() {
    let board = Board::from_blocks([
        Block::owned(BlockId(2), 1, 0, "Ann", "#late"),
        Block::owned(BlockId(1), 0, 0, "Ann", "#early"),
    ]);
    let view = DerivedView::compute(&board, None);
    assert_eq!(view.leaderboard[0].color, "#early");
}

#[test]
fn top_entries_are_capped() {
    let blocks: Vec<Block> = (0..14_i64)
        .map(|i| Block::owned(BlockId(i), 0, i as u32, format!("p{i:02}"), "#abc"))
        .collect();
    let board = Board::from_blocks(blocks);
    let view = DerivedView::compute(&board, None);
    assert_eq!(view.leaderboard.len(), 14);
    assert_eq!(view.top_entries().len(), LEADERBOARD_LIMIT);
}

#[test]
fn empty_board_ratios_are_zero() {
    let board = Board::default();
    let view = DerivedView::compute(&board, Some("Ann"));
    assert_eq!(view.territory_ratio, 0.0);
    assert_eq!(view.dominance_ratio, 0.0);
    assert!(!view.territory_ratio.is_nan());
    assert_eq!(view.territory_label(), "0");
    assert_eq!(view.dominance_label(), "0");
    let phantom = LeaderboardEntry {
        name: "Ann".into(),
        color: "#f00".into(),
        count: 3,
    };
    assert_eq!(view.entry_share(&phantom), 0.0);
    assert!(view.winner().is_none());
}

#[test]
fn seconds_remaining_rounds_up_and_clamps() {
    assert_eq!(seconds_remaining(10_500, 10_000), 1);
    assert_eq!(seconds_remaining(11_000, 10_000), 1);
    assert_eq!(seconds_remaining(11_001, 10_000), 2);
    assert_eq!(seconds_remaining(10_000, 10_000), 0);
    assert_eq!(seconds_remaining(9_000, 10_000), 0);
    assert_eq!(seconds_remaining(40_000, 10_000), 30);
}

#[test]
fn seconds_remaining_handles_extreme_timestamps() {
    assert_eq!(seconds_remaining(i64::MAX, 0), (i64::MAX as u64).div_ceil(1000));
    assert_eq!(seconds_remaining(i64::MAX, -1), (i64::MAX as u64).div_ceil(1000));
    assert_eq!(seconds_remaining(i64::MIN, i64::MAX), 0);
}

#[test]
fn timer_helpers() {
    assert_eq!(timer_label(12), "12s");
    assert_eq!(timer_label(0), "Time's up!");
    assert!(timer_is_urgent(5));
    assert!(timer_is_urgent(0));
    assert!(!timer_is_urgent(6));
    assert_eq!(timer_fraction(15, 30), 0.5);
    assert_eq!(timer_fraction(45, 30), 1.0);
    assert_eq!(timer_fraction(5, 0), 0.0);
}

#[test]
fn rank_and_badge_labels() {
    assert_eq!(rank_label(0), "\u{1F947}");
    assert_eq!(rank_label(2), "\u{1F949}");
    assert_eq!(rank_label(3), "#4");
    assert_eq!(connection_badge(true), "Live");
    assert_eq!(connection_badge(false), "Reconnecting...");
}
