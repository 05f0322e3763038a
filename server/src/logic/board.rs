use std::ops::Range;

use rand::Rng;
use snakesweeper_common::{grid, models::GameConfig, models::TileView, protocol::TileUpdate};

use crate::data::{Board, Tile, TileContent};

/// Result of a reveal attempt on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Nothing changed: index out of range, tile flagged or already revealed,
    /// or a chord whose flag count does not match.
    Ignored,
    /// Number of tiles newly revealed, cascade included.
    Revealed(usize),
    HitMine,
}

impl From<&Tile> for TileView {
    fn from(tile: &Tile) -> Self {
        match (tile.revealed, tile.flagged) {
            (false, false) => Self::Hidden,
            (false, true) => Self::Flagged,
            (true, true) if !tile.content.is_mine() => Self::WrongFlag,
            (true, _) => match tile.content {
                TileContent::Mine => Self::Mine,
                TileContent::Near(near) => Self::Revealed { near },
            },
        }
    }
}

/// The rows or columns covered by the first-click safe zone. The span slides
/// inward at the edges so it always covers `min(3, limit)` lines, which keeps
/// the reserved area constant no matter where the click lands.
fn zone_span(center: usize, limit: usize) -> Range<usize> {
    if limit <= 3 {
        0..limit
    } else {
        let start = center.saturating_sub(1).min(limit - 3);
        start..start + 3
    }
}

impl Board {
    /// Lays out a board with `config.mines` mines, none of them inside the
    /// safe zone around `first_click`. Callers validate the config first, so
    /// the eligible tiles always outnumber the mines.
    pub fn generate(config: &GameConfig, first_click: usize, rng: &mut impl Rng) -> Self {
        let (click_row, click_col) = grid::index_to_coord(first_click, config.width);
        let row_span = zone_span(click_row, config.height);
        let col_span = zone_span(click_col, config.width);

        let mut eligible: Vec<usize> = (0..config.tile_count())
            .filter(|&index| {
                let (row, col) = grid::index_to_coord(index, config.width);
                !(row_span.contains(&row) && col_span.contains(&col))
            })
            .collect();

        let mut board = Self {
            width: config.width,
            height: config.height,
            mines: config.mines,
            tiles: vec![Tile::hidden(TileContent::Near(0)); config.tile_count()],
        };

        for _ in 0..config.mines {
            let pick = rng.random_range(0..eligible.len());
            board.tiles[eligible.swap_remove(pick)].content = TileContent::Mine;
        }

        for index in 0..board.tiles.len() {
            if board.tiles[index].content.is_mine() {
                continue;
            }
            let near = board.count_adjacent_mines(index);
            board.tiles[index].content = TileContent::Near(near);
        }

        board
    }

    pub fn count_adjacent_mines(&self, index: usize) -> u8 {
        grid::neighbors(index, self.width, self.height)
            .filter(|&neighbor| self.tiles[neighbor].content.is_mine())
            .count() as u8
    }

    pub fn count_adjacent_flags(&self, index: usize) -> u8 {
        grid::neighbors(index, self.width, self.height)
            .filter(|&neighbor| {
                let tile = &self.tiles[neighbor];
                tile.flagged && !tile.revealed
            })
            .count() as u8
    }

    /// Reveals `index` and, for open tiles, everything connected to it. The
    /// cascade runs a worklist instead of recursing so a large open region
    /// cannot blow the stack.
    pub fn reveal_tile(&mut self, index: usize, updates: &mut Vec<TileUpdate>) -> RevealOutcome {
        let Some(tile) = self.tiles.get(index) else {
            return RevealOutcome::Ignored;
        };
        if tile.revealed || tile.flagged {
            return RevealOutcome::Ignored;
        }
        if tile.content.is_mine() {
            return RevealOutcome::HitMine;
        }

        // Tiles are marked revealed as they are pushed, so the revealed flag
        // doubles as the visited set and the count stays exact.
        self.mark_revealed(index, updates);
        let mut opened = 1;
        let mut stack = vec![index];

        while let Some(current) = stack.pop() {
            if self.tiles[current].content != TileContent::Near(0) {
                continue;
            }
            // Neighbors of an open tile are never mines, but flags still
            // block the cascade.
            for neighbor in grid::neighbors(current, self.width, self.height) {
                let tile = &self.tiles[neighbor];
                if tile.revealed || tile.flagged {
                    continue;
                }
                self.mark_revealed(neighbor, updates);
                opened += 1;
                stack.push(neighbor);
            }
        }

        RevealOutcome::Revealed(opened)
    }

    /// Chording: if `index` is revealed and its flagged neighbors match its
    /// number, reveals all remaining neighbors at once.
    pub fn reveal_adjacent(
        &mut self,
        index: usize,
        updates: &mut Vec<TileUpdate>,
    ) -> RevealOutcome {
        let Some(tile) = self.tiles.get(index) else {
            return RevealOutcome::Ignored;
        };
        let TileContent::Near(near) = tile.content else {
            return RevealOutcome::Ignored;
        };
        if !tile.revealed || self.count_adjacent_flags(index) != near {
            return RevealOutcome::Ignored;
        }

        let mut opened = 0;
        let mut hit_mine = false;
        for neighbor in grid::neighbors(index, self.width, self.height) {
            match self.reveal_tile(neighbor, updates) {
                RevealOutcome::Revealed(count) => opened += count,
                RevealOutcome::HitMine => hit_mine = true,
                RevealOutcome::Ignored => {}
            }
        }

        if hit_mine {
            RevealOutcome::HitMine
        } else if opened > 0 {
            RevealOutcome::Revealed(opened)
        } else {
            RevealOutcome::Ignored
        }
    }

    /// End-of-game sweep after a loss: expose every mine, flagged or not, and
    /// mark misplaced flags as wrong. Nothing else changes.
    pub fn reveal_mines(&mut self, updates: &mut Vec<TileUpdate>) {
        for index in 0..self.tiles.len() {
            let tile = &mut self.tiles[index];
            let expose = match tile.content {
                TileContent::Mine => !tile.revealed,
                TileContent::Near(_) => tile.flagged,
            };
            if expose {
                tile.revealed = true;
                updates.push(TileUpdate {
                    index,
                    view: (&*tile).into(),
                });
            }
        }
    }

    /// Flips the flag on a hidden tile. Returns the new flag state, or `None`
    /// when the tile cannot be flagged.
    pub fn toggle_flag(&mut self, index: usize, updates: &mut Vec<TileUpdate>) -> Option<bool> {
        let tile = self.tiles.get_mut(index)?;
        if tile.revealed {
            return None;
        }
        tile.flagged = !tile.flagged;
        updates.push(TileUpdate {
            index,
            view: (&*tile).into(),
        });
        Some(tile.flagged)
    }

    pub fn rows(&self) -> Vec<Vec<TileView>> {
        self.tiles
            .iter()
            .map(TileView::from)
            .collect::<Vec<TileView>>()
            .chunks(self.width)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    fn mark_revealed(&mut self, index: usize, updates: &mut Vec<TileUpdate>) {
        let tile = &mut self.tiles[index];
        tile.revealed = true;
        updates.push(TileUpdate {
            index,
            view: (&*tile).into(),
        });
    }
}

/// Builds a deterministic board from rows of `M` (mine) and `.` (safe).
#[cfg(test)]
pub(crate) fn board_from_rows(rows: &[&str]) -> Board {
    let height = rows.len();
    let width = rows[0].len();
    let tiles: Vec<Tile> = rows
        .concat()
        .chars()
        .map(|ch| {
            let content = match ch {
                'M' => TileContent::Mine,
                _ => TileContent::Near(0),
            };
            Tile::hidden(content)
        })
        .collect();
    let mines = tiles.iter().filter(|tile| tile.content.is_mine()).count();
    let mut board = Board {
        width,
        height,
        mines,
        tiles,
    };
    for index in 0..board.tiles.len() {
        if board.tiles[index].content.is_mine() {
            continue;
        }
        let near = board.count_adjacent_mines(index);
        board.tiles[index].content = TileContent::Near(near);
    }
    board
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn config(width: usize, height: usize, mines: usize) -> GameConfig {
        GameConfig {
            width,
            height,
            mines,
            mode_id: None,
        }
    }

    fn mine_count(board: &Board) -> usize {
        board
            .tiles
            .iter()
            .filter(|tile| tile.content.is_mine())
            .count()
    }

    #[test]
    fn generate_places_exactly_the_requested_mines() {
        let config = config(16, 16, 40);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let board = Board::generate(&config, 0, &mut rng);
            assert_eq!(mine_count(&board), 40);
        }
    }

    #[test]
    fn safe_zone_is_clear_around_any_first_click() {
        let config = config(9, 9, 27);
        // Corner, edge and center clicks all keep a full 3x3 window clear.
        for &first_click in &[0, 8, 72, 80, 4, 36, 40] {
            let (click_row, click_col) = grid::index_to_coord(first_click, 9);
            let row_span = zone_span(click_row, 9);
            let col_span = zone_span(click_col, 9);
            assert_eq!(row_span.len(), 3);
            assert_eq!(col_span.len(), 3);
            assert!(row_span.contains(&click_row) && col_span.contains(&click_col));

            for seed in 0..10 {
                let mut rng = StdRng::seed_from_u64(seed);
                let board = Board::generate(&config, first_click, &mut rng);
                assert_eq!(mine_count(&board), 27);

                for index in 0..board.tiles.len() {
                    let (row, col) = grid::index_to_coord(index, 9);
                    if row_span.contains(&row) && col_span.contains(&col) {
                        assert!(
                            !board.tiles[index].content.is_mine(),
                            "seed {seed} click {first_click} tile {index}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn maximal_mine_count_fills_everything_outside_the_zone() {
        let config = config(9, 9, 81 - 9);
        for &first_click in &[0, 40, 80] {
            let mut rng = StdRng::seed_from_u64(7);
            let board = Board::generate(&config, first_click, &mut rng);
            assert_eq!(mine_count(&board), 72);

            let (click_row, click_col) = grid::index_to_coord(first_click, 9);
            let row_span = zone_span(click_row, 9);
            let col_span = zone_span(click_col, 9);
            for index in 0..board.tiles.len() {
                let (row, col) = grid::index_to_coord(index, 9);
                let in_zone = row_span.contains(&row) && col_span.contains(&col);
                assert_eq!(board.tiles[index].content.is_mine(), !in_zone);
            }
        }
    }

    #[test]
    fn adjacency_counts_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = config(12, 8, 20);
        let board = Board::generate(&config, 50, &mut rng);

        for index in 0..board.tiles.len() {
            let expected = grid::neighbors(index, board.width, board.height)
                .filter(|&neighbor| board.tiles[neighbor].content.is_mine())
                .count() as u8;
            match board.tiles[index].content {
                TileContent::Mine => {}
                TileContent::Near(near) => assert_eq!(near, expected, "tile {index}"),
            }
        }
    }

    #[test]
    fn revealing_a_number_opens_a_single_tile() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        // Tile 1 borders the mine at 0.
        assert_eq!(
            board.reveal_tile(1, &mut updates),
            RevealOutcome::Revealed(1)
        );
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].view, TileView::Revealed { near: 1 });
    }

    #[test]
    fn revealing_an_open_tile_cascades_to_the_numeric_border() {
        // One mine in the corner; clicking the far corner floods everything
        // except the mine itself.
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        assert_eq!(
            board.reveal_tile(14, &mut updates),
            RevealOutcome::Revealed(14)
        );
        assert_eq!(updates.len(), 14);
        assert!(!board.tiles[0].revealed);
        for index in 1..15 {
            assert!(board.tiles[index].revealed, "tile {index}");
        }
    }

    #[test]
    fn cascade_stops_at_flags_and_never_revisits() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        board.toggle_flag(7, &mut updates);

        updates.clear();
        let outcome = board.reveal_tile(14, &mut updates);
        // 15 tiles minus the mine minus the flagged tile.
        assert_eq!(outcome, RevealOutcome::Revealed(13));
        assert_eq!(updates.len(), 13);
        assert!(!board.tiles[7].revealed);

        let mut seen = updates.iter().map(|update| update.index).collect::<Vec<_>>();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn reveal_ignores_flagged_and_revealed_tiles() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();

        board.toggle_flag(1, &mut updates);
        assert_eq!(board.reveal_tile(1, &mut updates), RevealOutcome::Ignored);

        board.reveal_tile(2, &mut updates);
        assert_eq!(board.reveal_tile(2, &mut updates), RevealOutcome::Ignored);

        assert_eq!(board.reveal_tile(999, &mut updates), RevealOutcome::Ignored);
    }

    #[test]
    fn revealing_a_mine_reports_the_hit_without_opening_it() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        assert_eq!(board.reveal_tile(0, &mut updates), RevealOutcome::HitMine);
        assert!(updates.is_empty());
        assert!(!board.tiles[0].revealed);
    }

    #[test]
    fn chord_opens_neighbors_when_flags_match() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        board.reveal_tile(6, &mut updates);
        board.toggle_flag(0, &mut updates);

        updates.clear();
        let outcome = board.reveal_adjacent(6, &mut updates);
        // Neighbor 2 is an open tile, so the chord cascades through the rest
        // of the board: everything but the flagged mine and tile 6 itself.
        assert_eq!(outcome, RevealOutcome::Revealed(13));
        assert!(board.tiles[1].revealed);
        assert!(!board.tiles[0].revealed);
    }

    #[test]
    fn chord_is_ignored_without_a_matching_flag_count() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        board.reveal_tile(6, &mut updates);

        updates.clear();
        assert_eq!(
            board.reveal_adjacent(6, &mut updates),
            RevealOutcome::Ignored
        );
        assert!(updates.is_empty());

        // Hidden tiles cannot chord either.
        assert_eq!(
            board.reveal_adjacent(12, &mut updates),
            RevealOutcome::Ignored
        );
    }

    #[test]
    fn chord_on_a_misplaced_flag_hits_the_mine() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();
        board.reveal_tile(6, &mut updates);
        // Flag the wrong neighbor; the count matches but the mine is open.
        board.toggle_flag(1, &mut updates);

        updates.clear();
        assert_eq!(
            board.reveal_adjacent(6, &mut updates),
            RevealOutcome::HitMine
        );
    }

    #[test]
    fn loss_sweep_exposes_mines_and_wrong_flags() {
        let mut board = board_from_rows(&["MM...", ".....", "....M"]);
        let mut updates = Vec::new();
        board.toggle_flag(0, &mut updates); // correct flag
        board.toggle_flag(4, &mut updates); // wrong flag

        updates.clear();
        board.reveal_mines(&mut updates);

        let views: Vec<(usize, TileView)> = updates
            .iter()
            .map(|update| (update.index, update.view))
            .collect();
        // Every mine comes up, the correctly flagged one included.
        assert!(views.contains(&(0, TileView::Mine)));
        assert!(views.contains(&(1, TileView::Mine)));
        assert!(views.contains(&(14, TileView::Mine)));
        assert!(views.contains(&(4, TileView::WrongFlag)));
        assert_eq!(views.len(), 4);
        // Hidden safe tiles are not touched by the sweep.
        assert!(!board.tiles[5].revealed);
    }

    #[test]
    fn flags_toggle_only_on_hidden_tiles() {
        let mut board = board_from_rows(&["M....", ".....", "....."]);
        let mut updates = Vec::new();

        assert_eq!(board.toggle_flag(3, &mut updates), Some(true));
        assert_eq!(updates.last().unwrap().view, TileView::Flagged);
        assert_eq!(board.toggle_flag(3, &mut updates), Some(false));
        assert_eq!(updates.last().unwrap().view, TileView::Hidden);

        board.reveal_tile(2, &mut updates);
        assert_eq!(board.toggle_flag(2, &mut updates), None);
        assert_eq!(board.toggle_flag(999, &mut updates), None);
    }

    #[test]
    fn rows_serialize_the_hidden_board_by_row() {
        let board = board_from_rows(&["M....", ".....", "....."]);
        let rows = board.rows();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.len() == 5));
        assert!(
            rows.iter()
                .flatten()
                .all(|view| *view == TileView::Hidden)
        );
    }
}
