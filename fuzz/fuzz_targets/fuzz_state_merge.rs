#![no_main]

use chrono::Utc;

use attackline::game::{MatchId, MatchState, MatchStatus, PlayerId, PlayerState};
use attackline::session::merge_sync;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&status, rest)) = data.split_first() else {
        return;
    };
    let Ok(incoming) = serde_json::from_slice::<MatchState>(rest) else {
        return;
    };

    let local = PlayerId::new("player_local");
    let mut current = MatchState::new(MatchId::default(), 180);
    current.add_player(PlayerState::new(local.clone(), "Local"));
    match status % 3 {
        1 => {
            current.start(Utc::now(), 60);
        }
        2 => {
            current.start(Utc::now(), 1);
            current.tick();
        }
        _ => {}
    }
    let before = current.clone();

    match merge_sync(&mut current, incoming, Some(&local)) {
        Ok(_) => {
            assert!(current.status >= before.status);
            assert!(current.players.contains_key(&local));
            assert!(current.status != MatchStatus::Playing || current.seconds_remaining > 0);
            if before.status != MatchStatus::Waiting {
                assert!(current.players.keys().all(|id| before.players.contains_key(id)));
                assert!(current.seconds_remaining <= before.seconds_remaining);
            }
            if before.status == MatchStatus::Finished {
                assert_eq!(current.seconds_remaining, before.seconds_remaining);
            }
        }
        Err(_) => assert_eq!(current, before),
    }
});
