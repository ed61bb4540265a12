use proptest::prelude::*;

use inline_games::checkers::{Command, GameState, RuleSet, Settings, Side};
use inline_games::game::{Coord, Seat};

fn kings(state: &GameState, side: Side) -> usize {
    state.board.pieces(side).filter(|&c| state.board[c].is_king()).count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_presses_keep_the_game_consistent(
        pool in any::<bool>(),
        presses in prop::collection::vec((0..8i32, 0..8i32, any::<bool>()), 1..600),
    ) {
        let rules = if pool { RuleSet::pool() } else { RuleSet::checkers() };
        let mut state = GameState::new(&rules, Settings::default());

        for (row, column, host) in presses {
            let seat = if host { Seat::Host } else { Seat::Guest };
            let before = state.clone();
            let mover = before.current_turn.side();

            match state.apply(&rules, seat, Command::Cell(Coord(row, column))) {
                Err(_) => prop_assert_eq!(&state, &before),
                Ok(_) => {
                    let mover = mover.expect("accepted press while the game was over");
                    let opponent = mover.other();
                    prop_assert_eq!(state.board.count(mover), before.board.count(mover));
                    prop_assert!(state.board.count(opponent) <= before.board.count(opponent));
                    prop_assert!(kings(&state, mover) >= kings(&before, mover));

                    if state.board != before.board {
                        if before.board.can_capture(&rules, mover) {
                            prop_assert!(state.board.count(opponent) < before.board.count(opponent));
                        }
                        if state.current_selection_lock {
                            prop_assert_eq!(state.current_turn, before.current_turn);
                        } else if !state.is_over() {
                            prop_assert_eq!(state.current_turn.side(), Some(opponent));
                            prop_assert_eq!(state.current_selection, None);
                        }
                    } else {
                        prop_assert_eq!(state.current_turn, before.current_turn);
                    }
                }
            }

            if state.is_over() {
                prop_assert!(state.outcome.is_some());
                break;
            }
        }
    }
}
