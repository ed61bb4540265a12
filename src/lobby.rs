use crate::action::Verb;
use crate::engine::Engine;
use crate::error::{SessionError, ValidationError};
use crate::game::{Player, Seat};
use crate::keyboard::{self, Caption, Labels, Notice, Screen};
use crate::store::Record;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Empty,
    Lobby,
    Pregame,
    InProgress,
    Ended,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Policy {
    // host may take the guest seat too
    pub allow_self_play: bool,
}

pub fn phase(record: &Record, engine: &dyn Engine) -> Result<Phase, SessionError> {
    Ok(match (&record.host, &record.guest, &record.game_state) {
        (None, _, _) => Phase::Empty,
        (Some(_), None, _) => Phase::Lobby,
        (Some(_), Some(_), None) => Phase::Pregame,
        (Some(_), Some(_), Some(state)) => {
            if engine.is_over(state)? { Phase::Ended } else { Phase::InProgress }
        }
    })
}

fn is(seat: &Option<Player>, actor: &Player) -> bool {
    seat.as_ref().map_or(false, |p| p.id == actor.id)
}

// on error the record is left untouched
pub fn transition(
    record: &mut Record,
    engine: &dyn Engine,
    verb: &Verb,
    actor: &Player,
    policy: Policy,
) -> Result<Option<Notice>, SessionError> {
    let is_host = is(&record.host, actor);
    let is_guest = is(&record.guest, actor);
    match verb {
        Verb::New => {
            if record.host.is_some() && !is_host {
                return Err(ValidationError::NotHost.into());
            }
            record.host = Some(actor.clone());
            record.guest = None;
            record.game_state = None;
            Ok(None)
        }
        Verb::Join => match (&record.host, &record.guest) {
            (None, _) => {
                record.host = Some(actor.clone());
                Ok(None)
            }
            (Some(_), None) if is_host && !policy.allow_self_play => Err(ValidationError::AlreadySeated.into()),
            (Some(_), None) => {
                record.guest = Some(actor.clone());
                Ok(Some(Notice::toast("You joined the game.")))
            }
            (Some(_), Some(_)) if is_host || is_guest => Err(ValidationError::AlreadySeated.into()),
            (Some(_), Some(_)) => Err(ValidationError::GameFull.into()),
        },
        Verb::Quit => {
            if is_guest && !is_host {
                record.guest = None;
            } else if is_host {
                // the guest, if any, takes over the table
                record.host = record.guest.take().filter(|guest| guest.id != actor.id);
            } else {
                return Err(ValidationError::NotSeated.into());
            }
            record.game_state = None;
            Ok(Some(Notice::toast("You left the game.")))
        }
        Verb::Kick => {
            if !is_host {
                return Err(ValidationError::NotHost.into());
            }
            if record.guest.take().is_none() {
                return Err(ValidationError::NoGuest.into());
            }
            record.game_state = None;
            Ok(None)
        }
        Verb::Start => {
            if !is_host {
                return Err(ValidationError::NotHost.into());
            }
            match phase(record, engine)? {
                Phase::Empty | Phase::Lobby => Err(ValidationError::NotEnoughPlayers.into()),
                Phase::InProgress => Err(ValidationError::GameInProgress.into()),
                Phase::Pregame | Phase::Ended => {
                    record.game_state = Some(engine.start(record.game_state.as_ref())?);
                    Ok(None)
                }
            }
        }
        Verb::Game(payload) => {
            if !is_host && !is_guest {
                return Err(ValidationError::NotAPlayer.into());
            }
            let seat = match phase(record, engine)? {
                Phase::Ended => return Err(ValidationError::GameEnded.into()),
                Phase::InProgress => resolve_seat(record, engine, is_host, is_guest)?,
                _ => return Err(ValidationError::NotStarted.into()),
            };
            match record.game_state.as_mut() {
                Some(state) => engine.play(state, seat, payload),
                None => Err(ValidationError::NotStarted.into()),
            }
        }
    }
}

// someone holding both seats plays whichever side is to move
fn resolve_seat(record: &Record, engine: &dyn Engine, is_host: bool, is_guest: bool) -> Result<Seat, SessionError> {
    Ok(match (is_host, is_guest, &record.game_state) {
        (true, true, Some(state)) => engine.seat_to_move(state)?.unwrap_or(Seat::Host),
        (true, _, _) => Seat::Host,
        _ => Seat::Guest,
    })
}

pub fn render(record: &Record, engine: &dyn Engine, labels: &dyn Labels) -> Result<Screen, SessionError> {
    let code = record.game_kind.code();
    let table = record.table();
    let phase = phase(record, engine)?;
    if let (Phase::InProgress, Some(state)) | (Phase::Ended, Some(state)) = (phase, &record.game_state) {
        return engine.render(state, &table, labels);
    }

    let host = format!("Host: {}", table.host.as_ref().map_or("-", |p| p.name.as_str()));
    let guest = format!("Guest: {}", table.guest.as_ref().map_or("-", |p| p.name.as_str()));
    let status = match phase {
        Phase::Empty => "Press join to open a table.",
        Phase::Lobby => "Waiting for an opponent.",
        _ => "Waiting for the host to start.",
    };
    let text = keyboard::lines(vec![engine.title(), host.as_str(), guest.as_str(), status]);

    let mut buttons = vec![
        keyboard::caption_button(labels, Caption::Join, code, "join"),
        keyboard::caption_button(labels, Caption::Quit, code, "quit"),
    ];
    if phase == Phase::Pregame {
        buttons.push(keyboard::caption_button(labels, Caption::Kick, code, "kick"));
        buttons.push(keyboard::caption_button(labels, Caption::Start, code, "start"));
    }
    let mut keyboard = keyboard::Keyboard::new();
    keyboard.add_row(buttons);
    Ok(Screen { text, keyboard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::GameKind;
    use crate::engine::Registry;
    use crate::keyboard::DefaultLabels;

    fn p1() -> Player {
        Player::new("1", "alice")
    }

    fn p2() -> Player {
        Player::new("2", "bob")
    }

    fn p3() -> Player {
        Player::new("3", "carol")
    }

    fn run(record: &mut Record, verb: Verb, actor: &Player) -> Result<Option<Notice>, SessionError> {
        let registry = Registry::standard();
        let engine = registry.get(GameKind::Checkers).unwrap();
        transition(record, engine, &verb, actor, Policy::default())
    }

    fn rejected(result: Result<Option<Notice>, SessionError>) -> ValidationError {
        match result {
            Err(SessionError::Validation(e)) => e,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    fn phase_of(record: &Record) -> Phase {
        let registry = Registry::standard();
        phase(record, registry.get(GameKind::Checkers).unwrap()).unwrap()
    }

    fn pregame() -> Record {
        let mut record = Record::hosted_by(p1(), GameKind::Checkers);
        record.guest = Some(p2());
        record
    }

    #[test]
    fn join_fills_host_then_guest() {
        let mut record = Record::new(GameKind::Checkers);
        assert_eq!(phase_of(&record), Phase::Empty);
        run(&mut record, Verb::Join, &p1()).unwrap();
        assert_eq!(record.host, Some(p1()));
        assert_eq!(phase_of(&record), Phase::Lobby);
        run(&mut record, Verb::Join, &p2()).unwrap();
        assert_eq!(record.guest, Some(p2()));
        assert_eq!(phase_of(&record), Phase::Pregame);

        let before = record.clone();
        assert_eq!(rejected(run(&mut record, Verb::Join, &p3())), ValidationError::GameFull);
        assert_eq!(rejected(run(&mut record, Verb::Join, &p2())), ValidationError::AlreadySeated);
        assert_eq!(record, before);
    }

    #[test]
    fn host_cannot_join_twice_without_override() {
        let registry = Registry::standard();
        let engine = registry.get(GameKind::Checkers).unwrap();
        let mut record = Record::hosted_by(p1(), GameKind::Checkers);
        let err = transition(&mut record, engine, &Verb::Join, &p1(), Policy::default()).unwrap_err();
        assert!(matches!(err, SessionError::Validation(ValidationError::AlreadySeated)));

        let policy = Policy { allow_self_play: true };
        transition(&mut record, engine, &Verb::Join, &p1(), policy).unwrap();
        assert_eq!(record.guest, Some(p1()));
        transition(&mut record, engine, &Verb::Start, &p1(), policy).unwrap();
        // plays X as host, then O as guest
        transition(&mut record, engine, &Verb::Game("5-2".into()), &p1(), policy).unwrap();
        transition(&mut record, engine, &Verb::Game("4-3".into()), &p1(), policy).unwrap();
        transition(&mut record, engine, &Verb::Game("2-1".into()), &p1(), policy).unwrap();
        transition(&mut record, engine, &Verb::Game("3-2".into()), &p1(), policy).unwrap();
        let state = record.game_state.as_ref().unwrap();
        assert_eq!(state["current_turn"], "X");

        transition(&mut record, engine, &Verb::Quit, &p1(), policy).unwrap();
        assert_eq!((record.host.clone(), record.guest.clone()), (None, None));
        assert_eq!(record.game_state, None);
    }

    #[test]
    fn quit_migrates_or_empties_the_table() {
        let mut record = pregame();
        run(&mut record, Verb::Quit, &p2()).unwrap();
        assert_eq!((record.host.clone(), record.guest.clone()), (Some(p1()), None));

        let mut record = pregame();
        run(&mut record, Verb::Quit, &p1()).unwrap();
        assert_eq!((record.host.clone(), record.guest.clone()), (Some(p2()), None));
        assert_eq!(phase_of(&record), Phase::Lobby);

        run(&mut record, Verb::Quit, &p2()).unwrap();
        assert_eq!(phase_of(&record), Phase::Empty);
        assert_eq!(rejected(run(&mut record, Verb::Quit, &p2())), ValidationError::NotSeated);
    }

    #[test]
    fn kick_is_host_only() {
        let mut record = pregame();
        assert_eq!(rejected(run(&mut record, Verb::Kick, &p2())), ValidationError::NotHost);
        run(&mut record, Verb::Kick, &p1()).unwrap();
        assert_eq!(record.guest, None);
        // a repeated kick re-evaluates the table
        assert_eq!(rejected(run(&mut record, Verb::Kick, &p1())), ValidationError::NoGuest);
    }

    #[test]
    fn new_resets_only_for_host_or_empty_table() {
        let mut record = pregame();
        assert_eq!(rejected(run(&mut record, Verb::New, &p3())), ValidationError::NotHost);
        run(&mut record, Verb::New, &p1()).unwrap();
        assert_eq!(record.guest, None);
        assert_eq!(phase_of(&record), Phase::Lobby);

        let mut record = Record::new(GameKind::Checkers);
        run(&mut record, Verb::New, &p3()).unwrap();
        assert_eq!(record.host, Some(p3()));
    }

    #[test]
    fn start_and_game_guards() {
        let mut record = Record::hosted_by(p1(), GameKind::Checkers);
        assert_eq!(rejected(run(&mut record, Verb::Start, &p1())), ValidationError::NotEnoughPlayers);
        record.guest = Some(p2());
        assert_eq!(rejected(run(&mut record, Verb::Game("5-2".into()), &p1())), ValidationError::NotStarted);
        assert_eq!(rejected(run(&mut record, Verb::Start, &p2())), ValidationError::NotHost);
        run(&mut record, Verb::Start, &p1()).unwrap();
        assert_eq!(phase_of(&record), Phase::InProgress);
        assert_eq!(rejected(run(&mut record, Verb::Start, &p1())), ValidationError::GameInProgress);
        assert_eq!(rejected(run(&mut record, Verb::Game("5-2".into()), &p3())), ValidationError::NotAPlayer);
        assert_eq!(rejected(run(&mut record, Verb::Game("2-1".into()), &p2())), ValidationError::NotYourTurn);

        run(&mut record, Verb::Game("surrender".into()), &p2()).unwrap();
        run(&mut record, Verb::Game("surrender".into()), &p2()).unwrap();
        assert_eq!(phase_of(&record), Phase::Ended);
        assert_eq!(rejected(run(&mut record, Verb::Game("5-2".into()), &p1())), ValidationError::GameEnded);

        // rematch keeps the seats and swaps colours
        run(&mut record, Verb::Start, &p1()).unwrap();
        assert_eq!(phase_of(&record), Phase::InProgress);
        assert_eq!(record.game_state.as_ref().unwrap()["settings"]["X"], "guest");
    }

    #[test]
    fn quitting_mid_game_returns_to_lobby() {
        let mut record = pregame();
        run(&mut record, Verb::Start, &p1()).unwrap();
        run(&mut record, Verb::Quit, &p2()).unwrap();
        assert_eq!(record.game_state, None);
        assert_eq!(phase_of(&record), Phase::Lobby);
    }

    #[test]
    fn lobby_screen_lists_seats_and_verbs() {
        let registry = Registry::standard();
        let engine = registry.get(GameKind::Checkers).unwrap();
        let screen = render(&pregame(), engine, &DefaultLabels).unwrap();
        assert_eq!(screen.text, "Checkers\nHost: alice\nGuest: bob\nWaiting for the host to start.");
        let actions: Vec<&str> = screen.keyboard.rows()[0].iter().map(|b| b.action.as_str()).collect();
        assert_eq!(actions, vec!["ck;join", "ck;quit", "ck;kick", "ck;start"]);

        let screen = render(&Record::new(GameKind::Checkers), engine, &DefaultLabels).unwrap();
        assert_eq!(screen.keyboard.rows()[0].len(), 2);
    }
}
